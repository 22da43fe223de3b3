//! Scenario grids and per-weapon reports built on the damage model, the
//! solver and range inversion

use crate::ammo::{applicable_variants, AmmoType, AmmoVariant};
use crate::config::AnalysisConfig;
use crate::range::{max_effective_range, Composition};
use crate::solver::{solve, KillResult};
use crate::stats::ImprovementStats;
use crate::weapon::{WeaponClass, WeaponProfile};
use log::{debug, warn};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};

/// One solver query against a weapon
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngagementScenario {
    pub range: f64,
    pub headshots: u32,
    pub variant: AmmoVariant,
    pub health_target: f64,
}

/// A solved scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRow {
    pub range: f64,
    pub headshots: u32,
    pub variant: AmmoVariant,
    pub health_target: f64,
    /// Per-shot body damage at this range
    pub body_damage: f64,
    #[serde(flatten)]
    pub result: KillResult,
}

impl ScenarioRow {
    pub fn ttk_ms(&self) -> Option<f64> {
        self.result.ttk_ms()
    }

    pub fn shots_to_kill(&self) -> Option<u32> {
        self.result.shots()
    }
}

/// Solve a single scenario for a weapon
pub fn solve_scenario(profile: &WeaponProfile, scenario: &EngagementScenario, config: &AnalysisConfig) -> KillResult {
    let body_damage = profile.falloff.damage_at(scenario.range, config.damage_floor);
    solve(
        body_damage,
        scenario.variant.multiplier(&config.multipliers),
        scenario.headshots,
        scenario.health_target,
        profile.rate_of_fire,
        config.body_shot_cap,
    )
}

/// Ammo variants evaluated for `profile` under `config`
pub fn variants_for(profile: &WeaponProfile, config: &AnalysisConfig) -> Vec<AmmoVariant> {
    applicable_variants(profile.ammo_type, config.hypothetical_hollow_point)
}

/// Every (range, headshot count, variant) combination for one health pool
pub fn scenario_grid(profile: &WeaponProfile, config: &AnalysisConfig, health_target: f64) -> Vec<ScenarioRow> {
    let variants = variants_for(profile, config);
    let mut rows = Vec::with_capacity(config.range_grid.len() * (config.max_headshots as usize + 1) * variants.len());

    for &range in &config.range_grid {
        let body_damage = profile.falloff.damage_at(range, config.damage_floor);
        for headshots in 0..=config.max_headshots {
            for &variant in &variants {
                let result = solve(
                    body_damage,
                    variant.multiplier(&config.multipliers),
                    headshots,
                    health_target,
                    profile.rate_of_fire,
                    config.body_shot_cap,
                );
                rows.push(ScenarioRow {
                    range,
                    headshots,
                    variant,
                    health_target,
                    body_damage,
                    result,
                });
            }
        }
    }

    rows
}

/// TTK laid out as a headshot-count x range grid for one variant.
/// `cells[h][r]` is the TTK for `headshots[h]` at `ranges[r]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtkPivot {
    pub variant: AmmoVariant,
    pub headshots: Vec<u32>,
    pub ranges: Vec<f64>,
    pub cells: Vec<Vec<Option<f64>>>,
}

impl TtkPivot {
    pub fn get(&self, headshots: u32, range: f64) -> Option<f64> {
        let h = self.headshots.iter().position(|&v| v == headshots)?;
        let r = self.ranges.iter().position(|&v| v == range)?;
        self.cells[h][r]
    }

    /// Cell-wise TTK reduction of `other` relative to `self`
    /// (positive means `other` kills faster)
    pub fn improvement(&self, other: &TtkPivot) -> Vec<Vec<Option<f64>>> {
        self.cells
            .iter()
            .zip(&other.cells)
            .map(|(ours, theirs)| {
                ours.iter()
                    .zip(theirs)
                    .map(|(a, b)| match (a, b) {
                        (Some(a), Some(b)) => Some(a - b),
                        _ => None,
                    })
                    .collect()
            })
            .collect()
    }
}

/// Pivot the rows of one variant into a headshot x range grid
pub fn ttk_pivot(rows: &[ScenarioRow], variant: AmmoVariant) -> TtkPivot {
    let mut headshots: Vec<u32> = Vec::new();
    let mut ranges: Vec<f64> = Vec::new();
    for row in rows.iter().filter(|r| r.variant == variant) {
        if !headshots.contains(&row.headshots) {
            headshots.push(row.headshots);
        }
        if !ranges.contains(&row.range) {
            ranges.push(row.range);
        }
    }
    headshots.sort_unstable();
    ranges.sort_by(f64::total_cmp);

    let mut cells = vec![vec![None; ranges.len()]; headshots.len()];
    for row in rows.iter().filter(|r| r.variant == variant) {
        let h = headshots.iter().position(|&v| v == row.headshots);
        let r = ranges.iter().position(|&v| v == row.range);
        if let (Some(h), Some(r)) = (h, r) {
            cells[h][r] = row.ttk_ms();
        }
    }

    TtkPivot {
        variant,
        headshots,
        ranges,
        cells,
    }
}

/// Lowest and highest reachable TTK of a weapon
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TtkSpan {
    pub min_ms: f64,
    pub max_ms: f64,
}

/// TTK span across the grids of every health pool, so grids for different
/// pools can share one colour scale. `None` when nothing is reachable.
pub fn ttk_span(grids: &[HealthGrid]) -> Option<TtkSpan> {
    let mut values = grids.iter().flat_map(|g| g.rows.iter().filter_map(ScenarioRow::ttk_ms));
    let first = values.next()?;
    let (min_ms, max_ms) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
    Some(TtkSpan { min_ms, max_ms })
}

/// Fastest variant for a range and headshot count; ties keep the earlier
/// variant, so Base wins when special ammo does not help
pub fn best_variant(rows: &[ScenarioRow], range: f64, headshots: u32) -> Option<AmmoVariant> {
    let mut best: Option<(AmmoVariant, f64)> = None;
    for row in rows.iter().filter(|r| r.range == range && r.headshots == headshots) {
        if let Some(ttk) = row.ttk_ms() {
            match best {
                Some((_, best_ttk)) if ttk >= best_ttk => {}
                _ => best = Some((row.variant, ttk)),
            }
        }
    }
    best.map(|(variant, _)| variant)
}

/// Maximum effective range for one variant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariantRange {
    pub variant: AmmoVariant,
    pub range_m: f64,
    /// Extra range over Base ammo
    pub extension_m: f64,
    /// `extension_m` as a percentage of the Base range; 0 when Base never kills
    pub extension_pct: f64,
}

/// Range reach of one shot composition across the weapon's variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeReport {
    pub composition: Composition,
    pub health_target: f64,
    pub ranges: Vec<VariantRange>,
}

impl RangeReport {
    pub fn range_for(&self, variant: AmmoVariant) -> Option<f64> {
        self.ranges.iter().find(|r| r.variant == variant).map(|r| r.range_m)
    }
}

/// Maximum effective range of `composition` for each applicable variant
pub fn range_report(
    profile: &WeaponProfile,
    composition: Composition,
    health_target: f64,
    config: &AnalysisConfig,
) -> RangeReport {
    let reach = |variant: AmmoVariant| {
        max_effective_range(
            &profile.falloff,
            variant.multiplier(&config.multipliers),
            composition.headshots,
            composition.body_shots,
            health_target,
            config.damage_floor,
            config.range_domain_bound,
        )
    };
    let base = reach(AmmoVariant::Base);
    let ranges = variants_for(profile, config)
        .into_iter()
        .map(|variant| {
            let range_m = if variant == AmmoVariant::Base { base } else { reach(variant) };
            let extension_m = range_m - base;
            VariantRange {
                variant,
                range_m,
                extension_m,
                extension_pct: if base > 0.0 { extension_m / base * 100.0 } else { 0.0 },
            }
        })
        .collect();

    RangeReport {
        composition,
        health_target,
        ranges,
    }
}

/// Scenario grid for one health pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthGrid {
    pub health_target: f64,
    pub rows: Vec<ScenarioRow>,
}

/// Everything computed for one weapon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponReport {
    pub name: String,
    pub class: WeaponClass,
    pub ammo_type: AmmoType,
    pub variants: Vec<AmmoVariant>,
    pub grids: Vec<HealthGrid>,
    pub improvements: Vec<ImprovementStats>,
    pub ranges: Vec<RangeReport>,
    pub ttk_span: Option<TtkSpan>,
}

impl WeaponReport {
    pub fn grid(&self, health_target: f64) -> Option<&HealthGrid> {
        self.grids.iter().find(|g| g.health_target == health_target)
    }

    pub fn improvement(&self, variant: AmmoVariant, health_target: f64) -> Option<&ImprovementStats> {
        self.improvements
            .iter()
            .find(|s| s.variant == variant && s.health_target == health_target)
    }
}

/// Run every analysis for one weapon
pub fn analyze_weapon(profile: &WeaponProfile, config: &AnalysisConfig) -> WeaponReport {
    debug!(
        "Analyzing {} ({}, {} RPM, {})",
        profile.name, profile.class, profile.rate_of_fire, profile.ammo_type
    );
    let variants = variants_for(profile, config);

    let mut grids = Vec::with_capacity(config.health_targets.len());
    let mut improvements = Vec::new();
    for &health_target in &config.health_targets {
        let rows = scenario_grid(profile, config, health_target);
        if rows.iter().all(|r| !r.result.is_reachable()) {
            warn!("{}: no scenario reaches {} health", profile.name, health_target);
        }
        for &variant in variants.iter().filter(|v| **v != AmmoVariant::Base) {
            improvements.push(ImprovementStats::from_grid(&profile.name, &profile.class, &rows, variant));
        }
        grids.push(HealthGrid { health_target, rows });
    }

    let primary = config.primary_health_target();
    let ranges = config
        .compositions
        .iter()
        .map(|&composition| range_report(profile, composition, primary, config))
        .collect();

    let span = ttk_span(&grids);

    WeaponReport {
        name: profile.name.clone(),
        class: profile.class.clone(),
        ammo_type: profile.ammo_type,
        variants,
        grids,
        improvements,
        ranges,
        ttk_span: span,
    }
}

/// Analyze weapons across a rayon pool sized to the machine
pub fn analyze_weapons_parallel(weapons: &[WeaponProfile], config: &AnalysisConfig) -> Vec<WeaponReport> {
    let num_threads = num_cpus::get().max(1);
    match ThreadPoolBuilder::new().num_threads(num_threads).build() {
        Ok(pool) => pool.install(|| weapons.par_iter().map(|w| analyze_weapon(w, config)).collect()),
        Err(e) => {
            warn!("Falling back to sequential analysis: {}", e);
            analyze_weapons_sequential(weapons, config)
        }
    }
}

/// Analyze weapons one after another
pub fn analyze_weapons_sequential(weapons: &[WeaponProfile], config: &AnalysisConfig) -> Vec<WeaponReport> {
    weapons.iter().map(|w| analyze_weapon(w, config)).collect()
}

/// Analyze every weapon; reports come back in input order
pub fn analyze_weapons(weapons: &[WeaponProfile], config: &AnalysisConfig, parallel: bool) -> Vec<WeaponReport> {
    if parallel {
        analyze_weapons_parallel(weapons, config)
    } else {
        analyze_weapons_sequential(weapons, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::falloff::FalloffCurve;
    use approx::assert_relative_eq;

    fn weapon(name: &str, ammo_type: AmmoType) -> WeaponProfile {
        let curve = FalloffCurve::from_pairs(&[(0.0, 30.0), (10.0, 25.0), (75.0, 18.0)]).unwrap();
        WeaponProfile::new(name, WeaponClass::AssaultRifle, curve, 600.0, ammo_type)
    }

    #[test]
    fn grid_covers_every_combination() {
        let config = AnalysisConfig::default();
        let rows = scenario_grid(&weapon("A", AmmoType::Synthetic), &config, 100.0);
        // 9 ranges x 6 headshot counts x 3 variants
        assert_eq!(rows.len(), 9 * 6 * 3);
        let rows = scenario_grid(&weapon("B", AmmoType::None), &config, 100.0);
        assert_eq!(rows.len(), 9 * 6 * 2);
    }

    #[test]
    fn grid_contains_reference_scenarios() {
        let config = AnalysisConfig::default();
        let rows = scenario_grid(&weapon("A", AmmoType::Synthetic), &config, 100.0);
        let find = |range: f64, hs: u32, variant: AmmoVariant| {
            rows.iter()
                .find(|r| r.range == range && r.headshots == hs && r.variant == variant)
                .unwrap()
        };
        let point_blank = find(0.0, 1, AmmoVariant::Base);
        assert_eq!(point_blank.shots_to_kill(), Some(3));
        assert_relative_eq!(point_blank.ttk_ms().unwrap(), 200.0);
        assert_eq!(find(10.0, 2, AmmoVariant::Synthetic).shots_to_kill(), Some(3));
    }

    #[test]
    fn solve_scenario_matches_grid() {
        let config = AnalysisConfig::default();
        let profile = weapon("A", AmmoType::HollowPoint);
        let scenario = EngagementScenario {
            range: 40.0,
            headshots: 2,
            variant: AmmoVariant::HollowPoint,
            health_target: 80.0,
        };
        let rows = scenario_grid(&profile, &config, 80.0);
        let row = rows
            .iter()
            .find(|r| r.range == 40.0 && r.headshots == 2 && r.variant == AmmoVariant::HollowPoint)
            .unwrap();
        assert_eq!(solve_scenario(&profile, &scenario, &config), row.result);
    }

    #[test]
    fn pivot_is_headshots_by_range() {
        let config = AnalysisConfig::default();
        let rows = scenario_grid(&weapon("A", AmmoType::HollowPoint), &config, 100.0);
        let base = ttk_pivot(&rows, AmmoVariant::Base);
        let hp = ttk_pivot(&rows, AmmoVariant::HollowPoint);
        assert_eq!(base.headshots, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(base.ranges, config.range_grid);
        assert_eq!(base.get(1, 0.0), Some(200.0));
        let gain = base.improvement(&hp);
        // special ammo never makes a kill slower
        assert!(gain.iter().flatten().flatten().all(|&d| d >= 0.0));
        // zero headshots: multiplier is irrelevant
        assert!(gain[0].iter().flatten().all(|&d| d == 0.0));
    }

    #[test]
    fn best_variant_prefers_base_on_ties() {
        let config = AnalysisConfig::default();
        let rows = scenario_grid(&weapon("A", AmmoType::Synthetic), &config, 100.0);
        assert_eq!(best_variant(&rows, 0.0, 0), Some(AmmoVariant::Base));
        let best = best_variant(&rows, 75.0, 3).unwrap();
        let ttk_of = |v: AmmoVariant| {
            rows.iter()
                .find(|r| r.range == 75.0 && r.headshots == 3 && r.variant == v)
                .and_then(ScenarioRow::ttk_ms)
                .unwrap()
        };
        for v in [AmmoVariant::Base, AmmoVariant::HollowPoint, AmmoVariant::Synthetic] {
            assert!(ttk_of(best) <= ttk_of(v));
        }
    }

    #[test]
    fn span_covers_all_health_pools() {
        let config = AnalysisConfig::default();
        let report = analyze_weapon(&weapon("A", AmmoType::Synthetic), &config);
        let span = report.ttk_span.unwrap();
        let all: Vec<f64> = report.grids.iter().flat_map(|g| &g.rows).filter_map(ScenarioRow::ttk_ms).collect();
        assert_eq!(span.min_ms, all.iter().copied().fold(f64::INFINITY, f64::min));
        assert_eq!(span.max_ms, all.iter().copied().fold(0.0, f64::max));

        let full = ttk_span(std::slice::from_ref(report.grid(100.0).unwrap())).unwrap();
        let low = ttk_span(std::slice::from_ref(report.grid(80.0).unwrap())).unwrap();
        assert!(low.min_ms <= full.min_ms);
        assert_eq!(span.max_ms, full.max_ms.max(low.max_ms));

        let empty = HealthGrid {
            health_target: 100.0,
            rows: vec![],
        };
        assert_eq!(ttk_span(&[empty]), None);
    }

    #[test]
    fn range_report_extensions() {
        let config = AnalysisConfig::default();
        let profile = weapon("A", AmmoType::Synthetic);
        let report = range_report(&profile, Composition::new(2, 2), 100.0, &config);
        let base = report.range_for(AmmoVariant::Base).unwrap();
        let synth = report.range_for(AmmoVariant::Synthetic).unwrap();
        assert!(synth >= base);
        let entry = report.ranges.iter().find(|r| r.variant == AmmoVariant::Synthetic).unwrap();
        assert_relative_eq!(entry.extension_m, synth - base);
        assert_relative_eq!(entry.extension_pct, (synth - base) / base * 100.0);
        assert_eq!(report.ranges[0].extension_m, 0.0);
        assert_eq!(report.ranges[0].extension_pct, 0.0);

        // 1HS+1B never kills, so there is nothing to extend
        let short = range_report(&profile, Composition::new(1, 1), 100.0, &config);
        assert!(short.ranges.iter().all(|r| r.extension_pct == 0.0));
    }

    #[test]
    fn report_has_grid_per_health_pool() {
        let config = AnalysisConfig::default();
        let report = analyze_weapon(&weapon("A", AmmoType::Synthetic), &config);
        assert_eq!(report.grids.len(), 2);
        assert!(report.grid(80.0).is_some());
        // HP and Synth for each of two health pools
        assert_eq!(report.improvements.len(), 4);
        assert!(report.improvement(AmmoVariant::Synthetic, 100.0).is_some());
        assert_eq!(report.ranges.len(), config.compositions.len());
    }

    #[test]
    fn parallel_matches_sequential() {
        let config = AnalysisConfig::default();
        let weapons: Vec<WeaponProfile> = (0..12)
            .map(|i| {
                let curve = FalloffCurve::from_pairs(&[(0.0, 20.0 + i as f64), (10.0, 18.0 + i as f64), (75.0, 12.0)])
                    .unwrap();
                WeaponProfile::new(format!("W{}", i), WeaponClass::Smg, curve, 700.0 + i as f64 * 10.0, AmmoType::HollowPoint)
            })
            .collect();
        let parallel = analyze_weapons(&weapons, &config, true);
        let sequential = analyze_weapons(&weapons, &config, false);
        assert_eq!(parallel, sequential);
        assert_eq!(parallel[5].name, "W5");
    }
}
