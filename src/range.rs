//! Maximum effective range of a fixed shot composition

use crate::falloff::FalloffCurve;
use crate::solver::composition_damage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ranges past this bound are not modelled; inversion saturates here
pub const DEFAULT_RANGE_DOMAIN: f64 = 100.0;

/// A fixed number of headshots and body shots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Composition {
    pub headshots: u32,
    pub body_shots: u32,
}

impl Composition {
    pub const fn new(headshots: u32, body_shots: u32) -> Self {
        Self {
            headshots,
            body_shots,
        }
    }

    pub fn total_shots(&self) -> u32 {
        self.headshots + self.body_shots
    }

    /// Short label such as `2HS+1B`
    pub fn label(&self) -> String {
        format!("{}HS+{}B", self.headshots, self.body_shots)
    }
}

impl fmt::Display for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}HS+{}B", self.headshots, self.body_shots)
    }
}

/// Farthest range at which `headshots` headshots plus `body_shots` body
/// shots still deal at least `health_target`.
///
/// Returns 0 when the composition falls short even at point blank and
/// `domain_bound` when it still kills at the bound.
///
/// The curve is linear between its kinks and the multiplier is a constant
/// scalar, so total damage is linear inside each bracket as well and the
/// interpolated crossing is exact.
///
/// Panics if `health_target` or `multiplier` is NaN.
pub fn max_effective_range(
    curve: &FalloffCurve,
    multiplier: f64,
    headshots: u32,
    body_shots: u32,
    health_target: f64,
    floor: f64,
    domain_bound: f64,
) -> f64 {
    assert!(!health_target.is_nan(), "health target must be a number");
    assert!(!multiplier.is_nan(), "multiplier must be a number");
    let total_at = |r: f64| composition_damage(curve.damage_at(r, floor), multiplier, headshots, body_shots);

    let mut start = 0.0;
    let mut start_total = total_at(start);
    if domain_bound <= 0.0 || start_total < health_target {
        return 0.0;
    }

    let mut brackets: Vec<f64> = curve
        .kinks(floor)
        .into_iter()
        .filter(|&r| r > 0.0 && r < domain_bound)
        .collect();
    brackets.push(domain_bound);

    for end in brackets {
        let end_total = total_at(end);
        if end_total < health_target {
            // start_total >= target > end_total, so the drop is positive
            let fraction = (start_total - health_target) / (start_total - end_total);
            return start + (end - start) * fraction;
        }
        start = end;
        start_total = end_total;
    }

    domain_bound
}
