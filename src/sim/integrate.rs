//! Euler integration of body motion

use glam::DVec2;

use super::state::Body;

/// Advance one body by `dt`
///
/// Gravity is applied as an acceleration, friction as a per-tick multiplier
/// (an exponential settle, not a drag force). Speed is capped at `max_speed`
/// before the position step. Parked bodies are left untouched.
pub fn integrate(body: &mut Body, gravity: DVec2, friction: f64, max_speed: f64, dt: f64) {
    if !body.active {
        return;
    }

    body.vel += gravity * dt;
    body.vel *= friction;

    let speed_sq = body.vel.length_squared();
    if speed_sq > max_speed * max_speed {
        body.vel *= max_speed / speed_sq.sqrt();
    }

    body.pos += body.vel * dt;
}
