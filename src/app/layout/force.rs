use eframe::egui::{Vec2, vec2};

#[derive(Clone, Copy, Debug)]
pub(super) struct ForceParams {
    pub(super) repulsion_strength: f32,
    pub(super) softening: f32,
    pub(super) link_distance: f32,
    pub(super) spring_strength: f32,
    pub(super) spring_damping: f32,
    pub(super) center_pull: f32,
    pub(super) root_pull: f32,
    pub(super) damping: f32,
    pub(super) max_force: f32,
    pub(super) max_speed: f32,
}

impl Default for ForceParams {
    fn default() -> Self {
        Self {
            repulsion_strength: 36_000.0,
            softening: 400.0,
            link_distance: 70.0,
            spring_strength: 0.03,
            spring_damping: 0.22,
            center_pull: 0.0015,
            root_pull: 0.04,
            damping: 0.86,
            max_force: 220.0,
            max_speed: 24.0,
        }
    }
}

/// Mutable view of the layout arena for one simulation step.
pub(super) struct Bodies<'a> {
    pub(super) positions: &'a mut [Vec2],
    pub(super) velocities: &'a mut [Vec2],
    pub(super) pinned: &'a [bool],
}

fn separation(from: usize, to: usize, delta: Vec2, distance: f32) -> Vec2 {
    if distance > 0.0001 {
        delta / distance
    } else {
        let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
        vec2(angle.cos(), angle.sin())
    }
}

/// Advances the simulation by one tick. Returns whether any free body still moves.
pub(super) fn step(
    bodies: Bodies<'_>,
    edges: &[(usize, usize)],
    root: Option<usize>,
    params: ForceParams,
) -> bool {
    let Bodies {
        positions,
        velocities,
        pinned,
    } = bodies;
    let node_count = positions.len();
    if node_count == 0 {
        return false;
    }

    let mut forces = vec![Vec2::ZERO; node_count];

    for i in 0..node_count {
        for j in (i + 1)..node_count {
            let delta = positions[i] - positions[j];
            let distance_sq = delta.length_sq();
            let direction = separation(i, j, delta, distance_sq.sqrt());
            let repulsion = params.repulsion_strength / (distance_sq + params.softening);

            forces[i] += direction * repulsion;
            forces[j] -= direction * repulsion;
        }
    }

    for &(from, to) in edges {
        if from >= node_count || to >= node_count || from == to {
            continue;
        }

        let delta = positions[from] - positions[to];
        let distance = delta.length();
        if distance <= 0.0001 {
            continue;
        }
        let direction = delta / distance;

        let spring = (distance - params.link_distance) * params.spring_strength;
        let relative_velocity = velocities[from] - velocities[to];
        let damping_force = relative_velocity.dot(direction) * params.spring_damping;
        let correction = direction * (spring + damping_force);

        forces[from] -= correction;
        forces[to] += correction;
    }

    for (index, force) in forces.iter_mut().enumerate() {
        *force -= positions[index] * params.center_pull;
        if Some(index) == root {
            *force -= positions[index] * params.root_pull;
        }
    }

    let min_sleep_speed_sq = 0.02 * 0.02;
    let min_sleep_force_sq = 0.08 * 0.08;
    let mut any_motion = false;
    for (index, force) in forces.into_iter().enumerate() {
        if pinned.get(index).copied().unwrap_or(false) {
            velocities[index] = Vec2::ZERO;
            continue;
        }

        let mut force = force;
        let force_sq = force.length_sq();
        if force_sq > params.max_force * params.max_force {
            force *= params.max_force / force_sq.sqrt();
        }

        let mut velocity = (velocities[index] + force * 0.055) * params.damping;
        let mut speed_sq = velocity.length_sq();
        if speed_sq > params.max_speed * params.max_speed {
            velocity *= params.max_speed / speed_sq.sqrt();
            speed_sq = params.max_speed * params.max_speed;
        }

        if speed_sq < min_sleep_speed_sq && force_sq < min_sleep_force_sq {
            velocity = Vec2::ZERO;
            speed_sq = 0.0;
        }

        velocities[index] = velocity;
        positions[index] += velocity;
        if speed_sq > 0.000_001 {
            any_motion = true;
        }
    }

    any_motion
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linked_pair_relaxes_toward_link_distance() {
        let mut positions = vec![vec2(0.0, 0.0), vec2(400.0, 0.0)];
        let mut velocities = vec![Vec2::ZERO; 2];
        let pinned = vec![false; 2];

        for _ in 0..300 {
            step(
                Bodies {
                    positions: &mut positions,
                    velocities: &mut velocities,
                    pinned: &pinned,
                },
                &[(0, 1)],
                Some(0),
                ForceParams::default(),
            );
        }

        let distance = (positions[0] - positions[1]).length();
        assert!(distance < 200.0, "distance {distance}");
        assert!(distance > 20.0, "distance {distance}");
    }

    #[test]
    fn pinned_bodies_stay_put() {
        let mut positions = vec![vec2(0.0, 0.0), vec2(5.0, 0.0)];
        let mut velocities = vec![Vec2::ZERO; 2];
        let pinned = vec![true, false];

        let moving = step(
            Bodies {
                positions: &mut positions,
                velocities: &mut velocities,
                pinned: &pinned,
            },
            &[],
            None,
            ForceParams::default(),
        );

        assert!(moving);
        assert_eq!(positions[0], vec2(0.0, 0.0));
        assert!(positions[1].x > 5.0);
    }

    #[test]
    fn coincident_bodies_are_pushed_apart() {
        let mut positions = vec![Vec2::ZERO; 2];
        let mut velocities = vec![Vec2::ZERO; 2];
        let pinned = vec![false; 2];

        step(
            Bodies {
                positions: &mut positions,
                velocities: &mut velocities,
                pinned: &pinned,
            },
            &[],
            None,
            ForceParams::default(),
        );

        assert!((positions[0] - positions[1]).length() > 0.0);
    }
}
