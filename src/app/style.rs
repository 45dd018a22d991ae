use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

use crate::chain::Node;

use super::controller::InteractionState;

pub(super) const FOCUS_COLOR: Color32 = Color32::from_rgb(0xff, 0xb3, 0x00);
pub(super) const HOVER_COLOR: Color32 = Color32::from_rgb(0x4f, 0xc3, 0xf7);
pub(super) const SOURCE_COLOR: Color32 = Color32::from_rgb(0xe9, 0x1e, 0x63);
pub(super) const DEFAULT_COLOR: Color32 = Color32::from_rgb(0x90, 0xca, 0xf9);

pub(super) const BASE_RADIUS: f32 = 5.0;
const SOURCE_RADIUS_RATIO: f32 = 1.6;
const HOVER_RADIUS_RATIO: f32 = 2.0;
const FOCUS_RADIUS_RATIO: f32 = 2.4;

/// Visual overlay of a node. Variants are in priority order: the first rule that
/// applies wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(super) enum NodeEmphasis {
    Focused,
    Hovered,
    Source,
    Plain,
}

impl NodeEmphasis {
    pub(super) fn of(node: &Node, interaction: &InteractionState) -> Self {
        if interaction.focused.as_deref() == Some(node.id.as_str()) {
            Self::Focused
        } else if interaction.hovered.as_deref() == Some(node.id.as_str()) {
            Self::Hovered
        } else if node.is_source() {
            Self::Source
        } else {
            Self::Plain
        }
    }

    pub(super) fn color(self) -> Color32 {
        match self {
            Self::Focused => FOCUS_COLOR,
            Self::Hovered => HOVER_COLOR,
            Self::Source => SOURCE_COLOR,
            Self::Plain => DEFAULT_COLOR,
        }
    }

    /// World-space radius.
    pub(super) fn radius(self) -> f32 {
        BASE_RADIUS
            * match self {
                Self::Focused => FOCUS_RADIUS_RATIO,
                Self::Hovered => HOVER_RADIUS_RATIO,
                Self::Source => SOURCE_RADIUS_RATIO,
                Self::Plain => 1.0,
            }
    }
}

/// Link value scaled into `[0, 1]` against a fixed ceiling.
pub(super) fn link_strength(value: f64, ceiling: f64) -> f32 {
    if !value.is_finite() || ceiling <= 0.0 || !ceiling.is_finite() {
        return 0.0;
    }
    (value / ceiling).clamp(0.0, 1.0) as f32
}

pub(super) fn link_color(value: f64, ceiling: f64) -> Color32 {
    let alpha = 0.2 + (link_strength(value, ceiling) * 0.8);
    Color32::from_rgba_unmultiplied(0, 100, 255, (alpha * 255.0).round() as u8)
}

pub(super) fn link_width(value: f64, ceiling: f64) -> f32 {
    1.0 + (link_strength(value, ceiling) * 4.0)
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(0x1a, 0x1a, 0x2e));

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + pan;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 110, 60));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

/// Squared distance from `point` to the segment `start..end`.
pub(super) fn segment_distance_sq(point: Pos2, start: Pos2, end: Pos2) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_sq();
    if length_sq <= f32::EPSILON {
        return (point - start).length_sq();
    }
    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    (point - (start + segment * t)).length_sq()
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use crate::chain::NodeKind;

    use super::*;

    fn node(id: &str, kind: NodeKind) -> Node {
        Node {
            id: id.to_owned(),
            label: id.to_owned(),
            kind,
        }
    }

    fn interaction(focused: Option<&str>, hovered: Option<&str>) -> InteractionState {
        InteractionState {
            focused: focused.map(str::to_owned),
            hovered: hovered.map(str::to_owned),
        }
    }

    #[test]
    fn emphasis_follows_strict_priority() {
        let source = node("root", NodeKind::Source);
        let other = node("peer", NodeKind::Target);

        let both = interaction(Some("root"), Some("root"));
        assert_eq!(NodeEmphasis::of(&source, &both), NodeEmphasis::Focused);

        let hovered = interaction(Some("peer"), Some("root"));
        assert_eq!(NodeEmphasis::of(&source, &hovered), NodeEmphasis::Hovered);
        assert_eq!(NodeEmphasis::of(&other, &hovered), NodeEmphasis::Focused);

        let idle = InteractionState::default();
        assert_eq!(NodeEmphasis::of(&source, &idle), NodeEmphasis::Source);
        assert_eq!(NodeEmphasis::of(&other, &idle), NodeEmphasis::Plain);
        assert_eq!(source.kind, NodeKind::Source);
    }

    #[test]
    fn radii_grow_with_emphasis() {
        let radii = [
            NodeEmphasis::Plain,
            NodeEmphasis::Source,
            NodeEmphasis::Hovered,
            NodeEmphasis::Focused,
        ]
        .map(NodeEmphasis::radius);
        assert!(radii.windows(2).all(|pair| pair[0] < pair[1]));
        let ratio = NodeEmphasis::Source.radius() / NodeEmphasis::Plain.radius();
        assert!((ratio - 1.6).abs() < 1e-5);
    }

    #[test]
    fn link_visuals_clamp_at_the_ceiling() {
        assert_eq!(link_width(0.0, 10.0), 1.0);
        assert_eq!(link_width(5.0, 10.0), 3.0);
        assert_eq!(link_width(10.0, 10.0), 5.0);
        assert_eq!(link_width(250.0, 10.0), link_width(10.0, 10.0));
        assert_eq!(link_color(250.0, 10.0), link_color(10.0, 10.0));
        assert!(link_color(1.0, 10.0).a() < link_color(4.0, 10.0).a());
        assert_eq!(link_strength(f64::NAN, 10.0), 0.0);
    }

    #[test]
    fn segment_distance_measures_to_the_closest_point() {
        let start = pos2(0.0, 0.0);
        let end = pos2(10.0, 0.0);
        assert_eq!(segment_distance_sq(pos2(5.0, 3.0), start, end), 9.0);
        assert_eq!(segment_distance_sq(pos2(-4.0, 0.0), start, end), 16.0);
    }
}
