//! Shots-to-kill / time-to-kill solver

use serde::{Deserialize, Serialize};

/// Body-shot search bound used by the legacy TTK reports. Searches with
/// this cap report anything needing 20 or more body shots as unreachable.
pub const LEGACY_BODY_SHOT_CAP: u32 = 20;

/// Outcome of one solver query
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum KillResult {
    Kill {
        shots: u32,
        body_shots: u32,
        ttk_ms: f64,
    },
    Unreachable,
}

impl KillResult {
    pub fn shots(&self) -> Option<u32> {
        match self {
            KillResult::Kill { shots, .. } => Some(*shots),
            KillResult::Unreachable => None,
        }
    }

    pub fn body_shots(&self) -> Option<u32> {
        match self {
            KillResult::Kill { body_shots, .. } => Some(*body_shots),
            KillResult::Unreachable => None,
        }
    }

    pub fn ttk_ms(&self) -> Option<f64> {
        match self {
            KillResult::Kill { ttk_ms, .. } => Some(*ttk_ms),
            KillResult::Unreachable => None,
        }
    }

    pub fn is_reachable(&self) -> bool {
        matches!(self, KillResult::Kill { .. })
    }
}

/// Milliseconds between shots at `rate_of_fire` rounds per minute
pub fn shot_interval_ms(rate_of_fire: f64) -> f64 {
    60_000.0 / rate_of_fire
}

/// Time from the first shot to the last one. The first shot lands at t = 0.
pub fn ttk_for_shots(shots: u32, rate_of_fire: f64) -> f64 {
    shots.saturating_sub(1) as f64 * shot_interval_ms(rate_of_fire)
}

/// Total damage of a shot composition. Only headshots are multiplied.
pub fn composition_damage(per_shot: f64, multiplier: f64, headshots: u32, body_shots: u32) -> f64 {
    per_shot * multiplier * headshots as f64 + per_shot * body_shots as f64
}

/// Fewest shots to reach `health_target` with exactly `headshot_count`
/// headshots, and the matching time to kill.
///
/// Invalid inputs (non-positive damage or fire rate, non-finite numbers)
/// yield [`KillResult::Unreachable`] so batch callers can skip them.
/// `body_shot_cap` reproduces the bounded legacy search; `None` searches
/// without limit.
pub fn solve(
    body_damage: f64,
    headshot_multiplier: f64,
    headshot_count: u32,
    health_target: f64,
    rate_of_fire: f64,
    body_shot_cap: Option<u32>,
) -> KillResult {
    let positive = |v: f64| v.is_finite() && v > 0.0;
    if !positive(body_damage) || !positive(rate_of_fire) {
        return KillResult::Unreachable;
    }
    if !health_target.is_finite() || !headshot_multiplier.is_finite() || headshot_multiplier < 0.0 {
        return KillResult::Unreachable;
    }

    let total = |b: u32| composition_damage(body_damage, headshot_multiplier, headshot_count, b);

    // A kill takes at least one shot
    let min_body = u32::from(headshot_count == 0);

    let remaining = health_target - body_damage * headshot_multiplier * headshot_count as f64;
    let estimate = if remaining > 0.0 {
        (remaining / body_damage).ceil()
    } else {
        0.0
    };
    if estimate >= u32::MAX as f64 {
        return KillResult::Unreachable;
    }

    // The closed form can be off by one through rounding; settle it against
    // the forward damage formula so the answer is exactly minimal.
    let mut body_shots = (estimate as u32).max(min_body);
    while body_shots > min_body && total(body_shots - 1) >= health_target {
        body_shots -= 1;
    }
    while total(body_shots) < health_target {
        body_shots = match body_shots.checked_add(1) {
            Some(b) => b,
            None => return KillResult::Unreachable,
        };
    }

    if let Some(cap) = body_shot_cap {
        if body_shots >= cap {
            return KillResult::Unreachable;
        }
    }

    let shots = match headshot_count.checked_add(body_shots) {
        Some(s) => s,
        None => return KillResult::Unreachable,
    };
    KillResult::Kill {
        shots,
        body_shots,
        ttk_ms: ttk_for_shots(shots, rate_of_fire),
    }
}
