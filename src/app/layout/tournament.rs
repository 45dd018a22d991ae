use eframe::egui::{Vec2, vec2};

use crate::chain::NetworkGraph;

const HORIZONTAL_MARGIN_RATIO: f32 = 0.1;

pub(super) struct TournamentPlacement {
    pub(super) positions: Vec<Vec2>,
    pub(super) levels: Vec<usize>,
}

/// Column index per node plus the column order. Nodes the source cannot reach go to one
/// overflow column after the deepest reached level, in graph order.
fn assign_levels(graph: &NetworkGraph) -> (Vec<usize>, Vec<usize>) {
    let node_count = graph.node_count();
    let Some(source) = graph.source_index() else {
        return (vec![0; node_count], (0..node_count).collect());
    };

    let (reached, mut order) = graph.bfs_levels(source);
    let overflow = reached.iter().flatten().max().map_or(0, |level| level + 1);

    let mut levels = Vec::with_capacity(node_count);
    for (index, level) in reached.iter().enumerate() {
        match level {
            Some(level) => levels.push(*level),
            None => {
                levels.push(overflow);
                order.push(index);
            }
        }
    }

    (levels, order)
}

/// Breadth-first hierarchical placement in world units centered on the origin. Levels
/// spread along x across the viewport width, ranks within a level along y.
pub(super) fn place(graph: &NetworkGraph, viewport: Vec2) -> TournamentPlacement {
    let node_count = graph.node_count();
    let (levels, order) = assign_levels(graph);
    let max_level = levels.iter().copied().max().unwrap_or(0);

    let mut column_sizes = vec![0usize; max_level + 1];
    for &level in &levels {
        column_sizes[level] += 1;
    }

    let margin = viewport.x * HORIZONTAL_MARGIN_RATIO;
    let span = (viewport.x - margin * 2.0).max(1.0);
    let column_x = |level: usize| {
        if max_level == 0 {
            0.0
        } else {
            (-viewport.x * 0.5) + margin + (level as f32 * span / max_level as f32)
        }
    };

    let mut ranks = vec![0usize; max_level + 1];
    let mut positions = vec![Vec2::ZERO; node_count];
    for index in order {
        let level = levels[index];
        let rank = ranks[level];
        ranks[level] += 1;

        let spacing = viewport.y / (column_sizes[level] + 1) as f32;
        let y = (-viewport.y * 0.5) + (rank + 1) as f32 * spacing;
        positions[index] = vec2(column_x(level), y);
    }

    TournamentPlacement { positions, levels }
}
