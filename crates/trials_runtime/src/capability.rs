//! The fixed surface a mini-game content layer sees.

use trials_core::PointKind;

/// Capability handle handed to a content layer.
///
/// Calls never fail: anything issued outside `playing`, after a terminal
/// transition, or after teardown is silently dropped.
pub trait Capabilities {
    /// Reports one play event. `x`/`y` only position the floating score.
    fn add_points(&self, base_points: i64, x: f32, y: f32, kind: PointKind);

    /// Forces a win at the end of the current turn.
    fn end_game(&self);

    /// Starts, retries or restarts the session.
    fn start_game(&self);

    /// Whether the session is `playing`. May lag one turn behind.
    fn is_game_started(&self) -> bool;
}
