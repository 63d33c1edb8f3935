//! Collision detection and response
//!
//! Each tick runs one pass over the participant pairs in `RESOLUTION_ORDER`.
//! Later stages may move a body an earlier stage just placed, so the order is
//! part of the behavior. There are no solver iterations; a fast body can
//! still tunnel through thin geometry.

use glam::DVec2;

use super::flipper::Flipper;
use super::geometry::{Bounds, FALLBACK_NORMAL, circle_circle, circle_segment, circle_walls};
use super::state::{Body, Bumper, GameEvent, GameState, Target};
use super::tick::Table;
use crate::perp;
use crate::tuning::Tuning;
use crate::unit_from_angle;

/// Participant pair resolved by one stage (the body is always one side)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Body vs. side and top walls
    Bounds,
    /// Body vs. bumpers
    Bumpers,
    /// Body vs. one-shot targets
    Targets,
    /// Body vs. flippers
    Flippers,
    /// Body vs. body
    Bodies,
}

/// Fixed per-tick resolution order
pub const RESOLUTION_ORDER: [Stage; 5] = [
    Stage::Bounds,
    Stage::Bumpers,
    Stage::Targets,
    Stage::Flippers,
    Stage::Bodies,
];

/// Run every stage once over all active bodies
pub fn resolve(table: &mut Table, tuning: &Tuning, events: &mut Vec<GameEvent>) {
    for stage in RESOLUTION_ORDER {
        resolve_stage(stage, table, tuning, events);
    }
}

/// Dispatch one stage to its resolver
pub fn resolve_stage(
    stage: Stage,
    table: &mut Table,
    tuning: &Tuning,
    events: &mut Vec<GameEvent>,
) {
    let Table {
        bounds,
        level,
        bodies,
        state,
    } = table;

    if stage == Stage::Bodies {
        resolve_body_pairs(bodies, events);
        return;
    }

    for body in bodies.iter_mut().filter(|b| b.active) {
        match stage {
            Stage::Bounds => {
                if resolve_walls(body, bounds, tuning.restitution) {
                    events.push(GameEvent::WallHit { body: body.id });
                }
            }
            Stage::Bumpers => resolve_bumpers(body, &level.bumpers, state, events),
            Stage::Targets => {
                resolve_targets(body, &mut level.targets, tuning.target_pop, state, events)
            }
            Stage::Flippers => {
                for flipper in &level.flippers {
                    if resolve_flipper(body, flipper, tuning) {
                        events.push(GameEvent::FlipperHit {
                            body: body.id,
                            side: flipper.side,
                        });
                    }
                }
            }
            Stage::Bodies => {}
        }
    }
}

/// Bounce off the side and top walls
///
/// The velocity component into the wall is reflected and scaled by
/// `restitution`; the body is clamped back inside. Returns true on contact.
pub fn resolve_walls(body: &mut Body, bounds: &Bounds, restitution: f64) -> bool {
    let (horizontal, vertical) = circle_walls(body.pos, body.radius, bounds);
    let mut hit = false;
    for contact in [horizontal, vertical].into_iter().flatten() {
        body.pos += contact.normal * contact.penetration;
        let into = body.vel.dot(contact.normal);
        if into < 0.0 {
            body.vel -= contact.normal * into * (1.0 + restitution);
        }
        hit = true;
    }
    hit
}

/// Kick the body away from every bumper it overlaps
///
/// Bumpers set the outgoing speed outright rather than reflecting, so they
/// add energy to the table.
pub fn resolve_bumpers(
    body: &mut Body,
    bumpers: &[Bumper],
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
) {
    for (index, bumper) in bumpers.iter().enumerate() {
        if let Some(contact) = circle_circle(body.pos, body.radius, &bumper.circle()) {
            body.pos += contact.normal * contact.penetration;
            body.vel = contact.normal * bumper.impulse;
            state.add_score(bumper.points);
            events.push(GameEvent::BumperHit {
                body: body.id,
                bumper: index,
                points: bumper.points,
            });
        }
    }
}

/// Score each target the first time it is touched
///
/// A hit target is inert for the rest of the level.
pub fn resolve_targets(
    body: &mut Body,
    targets: &mut [Target],
    pop: f64,
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
) {
    for (index, target) in targets.iter_mut().enumerate() {
        if target.hit {
            continue;
        }
        if let Some(contact) = circle_circle(body.pos, body.radius, &target.circle()) {
            target.mark_hit();
            state.add_score(target.points);
            body.vel += contact.normal * pop;
            log::debug!("Target {} hit for {} points", index, target.points);
            events.push(GameEvent::TargetHit {
                body: body.id,
                target: index,
                points: target.points,
            });
        }
    }
}

/// Bounce off a flipper, adding speed from its swing
///
/// Outgoing velocity is `normal * base_force` plus, when the body sits on
/// the face the flipper is swinging toward, the upswing rate times
/// `flipper_tangential_factor` along the flipper's direction of travel.
/// Returns true on contact.
pub fn resolve_flipper(body: &mut Body, flipper: &Flipper, tuning: &Tuning) -> bool {
    let Some(contact) = circle_segment(
        body.pos,
        body.radius,
        &flipper.segment(),
        tuning.flipper_thickness,
    ) else {
        return false;
    };

    body.pos += contact.normal * contact.penetration;

    let travel = perp(unit_from_angle(flipper.angle)) * flipper.side.sign();
    let upswing = flipper.upswing().max(0.0);
    let swing = if travel.dot(contact.normal) > 0.0 {
        travel * upswing * tuning.flipper_tangential_factor
    } else {
        DVec2::ZERO
    };

    body.vel = contact.normal * tuning.flipper_base_force + swing;
    true
}

/// Equal-mass elastic exchange between overlapping active bodies
///
/// Pairs already moving apart are left alone. Approaching pairs have their
/// overlap split evenly between the two.
pub fn resolve_body_pairs(bodies: &mut [Body], events: &mut Vec<GameEvent>) {
    for i in 0..bodies.len() {
        let (head, tail) = bodies.split_at_mut(i + 1);
        let a = &mut head[i];
        if !a.active {
            continue;
        }
        for b in tail.iter_mut().filter(|b| b.active) {
            if resolve_body_pair(a, b) {
                events.push(GameEvent::BodyContact { a: a.id, b: b.id });
            }
        }
    }
}

/// Returns true when an impulse was exchanged
pub fn resolve_body_pair(a: &mut Body, b: &mut Body) -> bool {
    let delta = b.pos - a.pos;
    let reach = a.radius + b.radius;
    let dist_sq = delta.length_squared();
    if dist_sq >= reach * reach {
        return false;
    }

    let dist = dist_sq.sqrt();
    let normal = if dist > 0.0 { delta / dist } else { FALLBACK_NORMAL };

    let closing = (a.vel - b.vel).dot(normal);
    if closing <= 0.0 {
        return false;
    }

    let overlap = reach - dist;
    a.pos -= normal * (overlap * 0.5);
    b.pos += normal * (overlap * 0.5);
    a.vel -= normal * closing;
    b.vel += normal * closing;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::flipper::Side;

    fn body_at(id: u32, pos: DVec2, vel: DVec2) -> Body {
        let mut body = Body::new(id, pos, 10.0);
        body.serve(pos, vel);
        body
    }

    #[test]
    fn test_resolution_order() {
        assert_eq!(
            RESOLUTION_ORDER,
            [Stage::Bounds, Stage::Bumpers, Stage::Targets, Stage::Flippers, Stage::Bodies]
        );
    }

    #[test]
    fn test_wall_bounce_is_lossy() {
        let bounds = Bounds::from_size(400.0, 600.0);
        let mut body = body_at(0, DVec2::new(395.0, 300.0), DVec2::new(100.0, 20.0));
        assert!(resolve_walls(&mut body, &bounds, 0.8));
        assert!((body.pos.x - 390.0).abs() < 1e-12);
        assert!((body.vel.x + 80.0).abs() < 1e-9);
        assert_eq!(body.vel.y, 20.0);
    }

    #[test]
    fn test_wall_contact_moving_away_keeps_velocity() {
        let bounds = Bounds::from_size(400.0, 600.0);
        let mut body = body_at(0, DVec2::new(5.0, 300.0), DVec2::new(50.0, 0.0));
        assert!(resolve_walls(&mut body, &bounds, 0.8));
        assert_eq!(body.pos.x, 10.0);
        assert_eq!(body.vel, DVec2::new(50.0, 0.0));
    }

    #[test]
    fn test_bumper_kicks_and_scores() {
        let bumpers = [Bumper {
            pos: DVec2::new(100.0, 100.0),
            radius: 20.0,
            impulse: 500.0,
            points: 10,
        }];
        let mut state = GameState::new(0, 3);
        let mut events = Vec::new();
        let mut body = body_at(0, DVec2::new(100.0, 75.0), DVec2::new(0.0, 300.0));

        resolve_bumpers(&mut body, &bumpers, &mut state, &mut events);

        assert!((body.pos - DVec2::new(100.0, 70.0)).length() < 1e-12);
        assert!((body.vel - DVec2::new(0.0, -500.0)).length() < 1e-9);
        assert_eq!(state.score, 10);
        assert_eq!(
            events,
            vec![GameEvent::BumperHit {
                body: 0,
                bumper: 0,
                points: 10
            }]
        );
    }

    #[test]
    fn test_target_scores_once() {
        let mut targets = [Target::new(DVec2::new(100.0, 100.0), 12.0, 100)];
        let mut state = GameState::new(0, 3);
        let mut events = Vec::new();
        let mut body = body_at(0, DVec2::new(100.0, 80.0), DVec2::new(0.0, 200.0));

        resolve_targets(&mut body, &mut targets, 60.0, &mut state, &mut events);
        assert!(targets[0].hit);
        assert_eq!(state.score, 100);
        // Pop pushes back along the normal (up)
        assert!((body.vel.y - 140.0).abs() < 1e-9);

        resolve_targets(&mut body, &mut targets, 60.0, &mut state, &mut events);
        assert_eq!(state.score, 100);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_resting_flipper_bounces_with_base_force() {
        let tuning = Tuning::default();
        let bounds = Bounds::from_size(400.0, 600.0);
        let flipper = Flipper::new(Side::Left, &bounds, &tuning);
        let mid = flipper.pivot + (flipper.tip() - flipper.pivot) * 0.5;
        let up = -perp(unit_from_angle(flipper.angle));
        let mut body = body_at(0, mid + up * 15.0, DVec2::new(0.0, 300.0));

        assert!(resolve_flipper(&mut body, &flipper, &tuning));
        assert!((body.vel.length() - tuning.flipper_base_force).abs() < 1e-9);
        assert!(body.vel.y < 0.0);
    }

    #[test]
    fn test_swinging_flipper_kicks_harder() {
        let tuning = Tuning::default();
        let bounds = Bounds::from_size(400.0, 600.0);
        let mut flipper = Flipper::new(Side::Left, &bounds, &tuning);
        let up = -perp(unit_from_angle(flipper.angle));
        let mid = flipper.pivot + (flipper.tip() - flipper.pivot) * 0.5;

        let mut resting = body_at(0, mid + up * 15.0, DVec2::ZERO);
        resolve_flipper(&mut resting, &flipper, &tuning);

        flipper.set_pressed(true);
        flipper.step(tuning.flipper_rate, 1.0 / 120.0);
        let mid = flipper.pivot + (flipper.tip() - flipper.pivot) * 0.5;
        let up = -perp(unit_from_angle(flipper.angle));
        let mut struck = body_at(1, mid + up * 15.0, DVec2::ZERO);
        resolve_flipper(&mut struck, &flipper, &tuning);

        assert!(struck.vel.length() > resting.vel.length() + 100.0);
        assert!(struck.vel.y < 0.0);
    }

    #[test]
    fn test_flipper_miss() {
        let tuning = Tuning::default();
        let bounds = Bounds::from_size(400.0, 600.0);
        let flipper = Flipper::new(Side::Right, &bounds, &tuning);
        let mut body = body_at(0, DVec2::new(200.0, 100.0), DVec2::ZERO);
        assert!(!resolve_flipper(&mut body, &flipper, &tuning));
        assert_eq!(body.vel, DVec2::ZERO);
    }

    #[test]
    fn test_head_on_bodies_swap_velocities() {
        let mut a = body_at(0, DVec2::new(100.0, 100.0), DVec2::new(50.0, 0.0));
        let mut b = body_at(1, DVec2::new(118.0, 100.0), DVec2::new(-50.0, 0.0));

        assert!(resolve_body_pair(&mut a, &mut b));

        assert!((a.vel - DVec2::new(-50.0, 0.0)).length() < 1e-9);
        assert!((b.vel - DVec2::new(50.0, 0.0)).length() < 1e-9);
        // Overlap of 2 split evenly
        assert!((a.pos.x - 99.0).abs() < 1e-12);
        assert!((b.pos.x - 119.0).abs() < 1e-12);
    }

    #[test]
    fn test_oblique_collision_conserves_momentum() {
        let mut a = body_at(0, DVec2::new(0.0, 0.0), DVec2::new(80.0, 10.0));
        let mut b = body_at(1, DVec2::new(15.0, 8.0), DVec2::new(-20.0, 5.0));
        let before = a.vel + b.vel;
        let energy = a.vel.length_squared() + b.vel.length_squared();

        assert!(resolve_body_pair(&mut a, &mut b));

        assert!((a.vel + b.vel - before).length() < 1e-9);
        assert!((a.vel.length_squared() + b.vel.length_squared() - energy).abs() < 1e-6);
    }

    #[test]
    fn test_separating_pair_is_not_resolved() {
        let mut a = body_at(0, DVec2::new(100.0, 100.0), DVec2::new(-50.0, 0.0));
        let mut b = body_at(1, DVec2::new(118.0, 100.0), DVec2::new(50.0, 0.0));
        assert!(!resolve_body_pair(&mut a, &mut b));
        assert_eq!(a.vel, DVec2::new(-50.0, 0.0));
        assert_eq!(b.vel, DVec2::new(50.0, 0.0));
        // Still overlapping, but not pushed apart
        assert_eq!(a.pos, DVec2::new(100.0, 100.0));
        assert_eq!(b.pos, DVec2::new(118.0, 100.0));
    }

    #[test]
    fn test_coincident_bodies_separate_vertically() {
        let mut a = body_at(0, DVec2::new(50.0, 50.0), DVec2::new(0.0, -10.0));
        let mut b = body_at(1, DVec2::new(50.0, 50.0), DVec2::ZERO);
        assert!(resolve_body_pair(&mut a, &mut b));
        assert!(a.pos.is_finite() && b.pos.is_finite());
        assert!((b.pos.y - a.pos.y + 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_inactive_bodies_are_skipped() {
        let mut bodies = vec![
            body_at(0, DVec2::new(100.0, 100.0), DVec2::new(50.0, 0.0)),
            Body::new(1, DVec2::new(110.0, 100.0), 10.0),
        ];
        let mut events = Vec::new();
        resolve_body_pairs(&mut bodies, &mut events);
        assert!(events.is_empty());
        assert_eq!(bodies[0].vel, DVec2::new(50.0, 0.0));
    }
}
