//! Grouping weapons by shots to kill at a fixed engagement

use crate::analysis::{solve_scenario, EngagementScenario};
use crate::config::AnalysisConfig;
use crate::weapon::WeaponProfile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weapon names keyed by shots to kill
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StkCategories {
    pub scenario: Option<EngagementScenario>,
    pub by_shots: BTreeMap<u32, Vec<String>>,
    pub unreachable: Vec<String>,
}

impl StkCategories {
    /// Weapons that kill in exactly `shots`
    pub fn weapons_with(&self, shots: u32) -> &[String] {
        self.by_shots.get(&shots).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Bucket every weapon by its shots to kill in `scenario`. Within a bucket
/// weapons keep their input order.
pub fn categorize_by_stk(
    weapons: &[WeaponProfile],
    scenario: EngagementScenario,
    config: &AnalysisConfig,
) -> StkCategories {
    let mut categories = StkCategories {
        scenario: Some(scenario),
        ..StkCategories::default()
    };
    for weapon in weapons {
        match solve_scenario(weapon, &scenario, config).shots() {
            Some(shots) => categories.by_shots.entry(shots).or_default().push(weapon.name.clone()),
            None => categories.unreachable.push(weapon.name.clone()),
        }
    }
    categories
}
