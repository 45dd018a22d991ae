mod force;
mod tournament;

use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};
use log::debug;
use rand::Rng;

use crate::chain::NetworkGraph;

use super::camera::CameraCommand;
use force::{Bodies, ForceParams};

/// Simulation ceiling for center mode; the camera settles after this many ticks at most.
pub(super) const MAX_SIMULATION_TICKS: usize = 100;
const REHEAT_TICKS: usize = 30;
pub(super) const FOCUS_ZOOM: f32 = 1.5;
const FIT_PADDING: f32 = 40.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LayoutMode {
    /// Force-directed simulation around the searched address.
    #[default]
    Center,
    /// Breadth-first columns by hop count from the searched address.
    Tournament,
}

impl LayoutMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Center => "Center",
            Self::Tournament => "Tournament",
        }
    }
}

/// Owns every node position of the displayed graph. Positions are indexed like
/// `NetworkGraph::nodes` and only change through methods on this type.
pub(super) struct LayoutEngine {
    mode: LayoutMode,
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    pinned: Vec<bool>,
    levels: Vec<Option<usize>>,
    edges: Vec<(usize, usize)>,
    source: Option<usize>,
    params: ForceParams,
    ticks: usize,
    settled: bool,
    camera_issued: bool,
    pending_camera: Option<CameraCommand>,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self {
            mode: LayoutMode::Center,
            positions: Vec::new(),
            velocities: Vec::new(),
            pinned: Vec::new(),
            levels: Vec::new(),
            edges: Vec::new(),
            source: None,
            params: ForceParams::default(),
            ticks: 0,
            settled: true,
            camera_issued: false,
            pending_camera: None,
        }
    }
}

impl LayoutEngine {
    /// Replaces all engine state for `graph` in `mode`. No pin or velocity survives.
    pub(super) fn reset<R: Rng + ?Sized>(
        &mut self,
        graph: &NetworkGraph,
        mode: LayoutMode,
        viewport: Vec2,
        rng: &mut R,
    ) {
        let node_count = graph.node_count();
        *self = Self {
            mode,
            velocities: vec![Vec2::ZERO; node_count],
            pinned: vec![false; node_count],
            levels: vec![None; node_count],
            edges: graph.link_endpoints(),
            source: graph.source_index(),
            ..Self::default()
        };

        match mode {
            LayoutMode::Center => self.seed_center(node_count, rng),
            LayoutMode::Tournament => self.place_tournament(graph, viewport),
        }
        debug!("layout reset: {} nodes in {} mode", node_count, mode.label());
    }

    fn seed_center<R: Rng + ?Sized>(&mut self, node_count: usize, rng: &mut R) {
        let radius = seed_radius(node_count);
        self.positions = (0..node_count)
            .map(|index| {
                if Some(index) == self.source {
                    return Vec2::ZERO;
                }
                let angle = rng.random_range(0.0..TAU);
                let distance = radius * rng.random::<f32>().sqrt();
                vec2(angle.cos(), angle.sin()) * distance
            })
            .collect();
        self.params = ForceParams::default();
        self.settled = node_count == 0;
    }

    fn place_tournament(&mut self, graph: &NetworkGraph, viewport: Vec2) {
        let placement = tournament::place(graph, viewport);
        self.positions = placement.positions;
        self.levels = placement.levels.into_iter().map(Some).collect();
        self.pinned.fill(true);
        self.settled = true;
        self.issue_camera(self.fit_command());
    }

    fn fit_command(&self) -> Option<CameraCommand> {
        let (min, max) = self.bounds()?;
        Some(CameraCommand::Fit {
            min,
            max,
            padding: FIT_PADDING,
        })
    }

    fn issue_camera(&mut self, command: Option<CameraCommand>) {
        if self.camera_issued {
            return;
        }
        if let Some(command) = command {
            self.pending_camera = Some(command);
            self.camera_issued = true;
        }
    }

    /// One simulation tick in center mode. Returns whether another frame is needed.
    pub(super) fn step(&mut self) -> bool {
        if self.mode != LayoutMode::Center || self.settled {
            return false;
        }

        let moving = force::step(
            Bodies {
                positions: &mut self.positions,
                velocities: &mut self.velocities,
                pinned: &self.pinned,
            },
            &self.edges,
            self.source,
            self.params,
        );
        self.ticks += 1;

        if !moving || self.ticks >= MAX_SIMULATION_TICKS {
            self.settled = true;
            debug!("simulation settled after {} ticks", self.ticks);
            let center = self
                .source
                .and_then(|index| self.positions.get(index).copied())
                .unwrap_or(Vec2::ZERO);
            self.issue_camera(Some(CameraCommand::Focus {
                center,
                zoom: FOCUS_ZOOM,
            }));
        }

        !self.settled
    }

    /// Moves a node to `position` and fixes it there.
    pub(super) fn pin_at(&mut self, index: usize, position: Vec2) {
        let Some(slot) = self.positions.get_mut(index) else {
            return;
        };
        *slot = position;
        self.pinned[index] = true;
        self.velocities[index] = Vec2::ZERO;

        if self.mode == LayoutMode::Center {
            self.settled = false;
            self.ticks = self.ticks.min(MAX_SIMULATION_TICKS - REHEAT_TICKS);
        }
    }

    pub(super) fn take_camera_command(&mut self) -> Option<CameraCommand> {
        self.pending_camera.take()
    }

    pub(super) fn mode(&self) -> LayoutMode {
        self.mode
    }

    pub(super) fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    pub(super) fn is_pinned(&self, index: usize) -> bool {
        self.pinned.get(index).copied().unwrap_or(false)
    }

    pub(super) fn level(&self, index: usize) -> Option<usize> {
        self.levels.get(index).copied().flatten()
    }

    pub(super) fn is_settled(&self) -> bool {
        self.settled
    }

    pub(super) fn bounds(&self) -> Option<(Vec2, Vec2)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(min, max), point| (min.min(*point), max.max(*point))),
        )
    }
}

pub(super) fn seed_radius(node_count: usize) -> f32 {
    60.0 + 24.0 * (node_count as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::json;

    use crate::chain::normalize;

    use super::*;

    fn star() -> NetworkGraph {
        normalize(
            &json!({
                "nodes": [
                    { "id": "a" },
                    { "id": "root", "type": "source" },
                    { "id": "b" },
                    { "id": "c" },
                    { "id": "d" }
                ],
                "links": [
                    { "source": "root", "target": "a", "value": 1 },
                    { "source": "root", "target": "b", "value": 2 },
                    { "source": "b", "target": "c", "value": 3 },
                    { "source": "d", "target": "root", "value": 4 }
                ]
            }),
            None,
        )
        .unwrap()
    }

    fn viewport() -> Vec2 {
        vec2(900.0, 600.0)
    }

    #[test]
    fn center_mode_seeds_source_at_origin_within_radius() {
        let graph = star();
        let mut engine = LayoutEngine::default();
        engine.reset(&graph, LayoutMode::Center, viewport(), &mut StdRng::seed_from_u64(7));

        assert_eq!(engine.positions()[1], Vec2::ZERO);
        let radius = seed_radius(graph.node_count());
        assert!(engine.positions().iter().all(|p| p.length() <= radius + 1e-3));
        assert!(!engine.is_settled());
        assert_eq!(engine.take_camera_command(), None);
    }

    #[test]
    fn center_mode_settles_within_tick_ceiling_and_focuses_source() {
        let graph = star();
        let mut engine = LayoutEngine::default();
        engine.reset(&graph, LayoutMode::Center, viewport(), &mut StdRng::seed_from_u64(11));

        let mut ticks = 0;
        while engine.step() {
            ticks += 1;
            assert!(ticks < MAX_SIMULATION_TICKS);
        }

        assert!(engine.is_settled());
        let source_position = engine.positions()[1];
        assert_eq!(
            engine.take_camera_command(),
            Some(CameraCommand::Focus {
                center: source_position,
                zoom: FOCUS_ZOOM
            })
        );
        assert_eq!(engine.take_camera_command(), None);
        assert!(!engine.step());
    }

    #[test]
    fn tournament_mode_is_deterministic_and_pinned() {
        let graph = star();
        let mut rng = StdRng::seed_from_u64(3);
        let mut engine = LayoutEngine::default();

        engine.reset(&graph, LayoutMode::Tournament, viewport(), &mut rng);
        let first = engine.positions().to_vec();
        assert!(matches!(engine.take_camera_command(), Some(CameraCommand::Fit { .. })));

        engine.reset(&graph, LayoutMode::Tournament, viewport(), &mut rng);
        assert_eq!(engine.positions(), first.as_slice());
        assert!((0..graph.node_count()).all(|index| engine.is_pinned(index)));
        assert_eq!(engine.level(1), Some(0));
        assert_eq!(engine.level(3), Some(2));
        assert!(!engine.step());
    }

    #[test]
    fn mode_switch_clears_pins() {
        let graph = star();
        let mut rng = StdRng::seed_from_u64(5);
        let mut engine = LayoutEngine::default();

        engine.reset(&graph, LayoutMode::Tournament, viewport(), &mut rng);
        engine.reset(&graph, LayoutMode::Center, viewport(), &mut rng);
        assert!((0..graph.node_count()).all(|index| !engine.is_pinned(index)));
        assert_eq!(engine.level(0), None);
        assert_eq!(engine.mode(), LayoutMode::Center);
    }

    #[test]
    fn dragged_node_stays_pinned_while_simulation_resumes() {
        let graph = star();
        let mut engine = LayoutEngine::default();
        engine.reset(&graph, LayoutMode::Center, viewport(), &mut StdRng::seed_from_u64(9));
        while engine.step() {}
        let _ = engine.take_camera_command();

        engine.pin_at(0, vec2(300.0, -200.0));
        assert!(engine.is_pinned(0));
        for _ in 0..REHEAT_TICKS {
            engine.step();
        }
        assert_eq!(engine.positions()[0], vec2(300.0, -200.0));
        assert_eq!(engine.take_camera_command(), None);
    }

    #[test]
    fn bounds_cover_all_positions() {
        let graph = star();
        let mut engine = LayoutEngine::default();
        engine.reset(&graph, LayoutMode::Tournament, viewport(), &mut StdRng::seed_from_u64(1));

        let (min, max) = engine.bounds().unwrap();
        assert!(engine
            .positions()
            .iter()
            .all(|p| p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y));
    }
}
