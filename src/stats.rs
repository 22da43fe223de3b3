//! TTK improvement statistics and ammo tier lists

use crate::ammo::AmmoVariant;
use crate::analysis::{ScenarioRow, WeaponReport};
use crate::weapon::WeaponClass;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How much one ammo variant speeds up kills over Base ammo, aggregated over
/// a weapon's scenario grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementStats {
    pub weapon: String,
    pub class: WeaponClass,
    pub variant: AmmoVariant,
    pub health_target: f64,
    pub average_improvement_ms: f64,
    pub max_improvement_ms: f64,
    /// Scenarios where the variant is strictly faster than Base
    pub scenario_count: usize,
}

impl ImprovementStats {
    /// Compare `variant` against Base over one scenario grid.
    ///
    /// Only scenarios where both sides can kill and the variant is strictly
    /// faster count; with none, average and max are 0.
    pub fn from_grid(weapon: &str, class: &WeaponClass, rows: &[ScenarioRow], variant: AmmoVariant) -> Self {
        let health_target = rows.first().map(|r| r.health_target).unwrap_or(0.0);

        let improvements: Vec<f64> = rows
            .iter()
            .filter(|r| r.variant == variant)
            .filter_map(|r| {
                let base = rows.iter().find(|b| {
                    b.variant == AmmoVariant::Base && b.range == r.range && b.headshots == r.headshots
                })?;
                Some(base.ttk_ms()? - r.ttk_ms()?)
            })
            .filter(|&gain| gain > 0.0)
            .collect();

        let average_improvement_ms = if improvements.is_empty() {
            0.0
        } else {
            improvements.iter().sum::<f64>() / improvements.len() as f64
        };

        Self {
            weapon: weapon.to_string(),
            class: class.clone(),
            variant,
            health_target,
            average_improvement_ms,
            max_improvement_ms: improvements.iter().copied().fold(0.0, f64::max),
            scenario_count: improvements.len(),
        }
    }
}

/// Weapons ranked by average improvement of `variant` at `health_target`,
/// best first. Weapons without that variant are left out.
pub fn tier_list(reports: &[WeaponReport], variant: AmmoVariant, health_target: f64) -> Vec<ImprovementStats> {
    let mut tiers: Vec<ImprovementStats> = reports
        .iter()
        .filter_map(|r| r.improvement(variant, health_target).cloned())
        .collect();

    tiers.sort_by(|a, b| {
        b.average_improvement_ms
            .partial_cmp(&a.average_improvement_ms)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.weapon.cmp(&b.weapon))
    });
    tiers
}
