//! Python bindings for the TTK analyzer using PyO3

use crate::ammo::AmmoVariant;
use crate::analysis::{analyze_weapons, EngagementScenario};
use crate::categorize::categorize_by_stk;
use crate::config::{AnalysisConfig, WeaponTable};
use crate::falloff::{DamageSample, FalloffCurve, DEFAULT_DAMAGE_FLOOR};
use crate::range::DEFAULT_RANGE_DOMAIN;
use pyo3::exceptions::{PyIOError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;

fn curve_from(samples: Vec<(f64, f64)>) -> PyResult<FalloffCurve> {
    let samples = samples.into_iter().map(|(r, d)| DamageSample::new(r, d)).collect();
    FalloffCurve::new(samples).map_err(|e| PyValueError::new_err(format!("Invalid falloff samples: {}", e)))
}

fn config_from(config_json: Option<&str>) -> PyResult<AnalysisConfig> {
    match config_json {
        Some(json) => AnalysisConfig::from_json(json)
            .map_err(|e| PyValueError::new_err(format!("Invalid config JSON: {}", e))),
        None => Ok(AnalysisConfig::default()),
    }
}

fn variant_from(name: &str) -> PyResult<AmmoVariant> {
    match name.to_lowercase().as_str() {
        "base" => Ok(AmmoVariant::Base),
        "hp" | "hollowpoint" | "hollow_point" => Ok(AmmoVariant::HollowPoint),
        "synth" | "synthetic" => Ok(AmmoVariant::Synthetic),
        _ => Err(PyValueError::new_err(format!("Invalid ammo variant: {}", name))),
    }
}

fn check_finite(name: &str, value: f64) -> PyResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PyValueError::new_err(format!("{} must be finite, got {}", name, value)))
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> PyResult<String> {
    serde_json::to_string(value).map_err(|e| PyRuntimeError::new_err(format!("Failed to serialize results: {}", e)))
}

/// Body damage at `range` for a list of (range, damage) samples
#[pyfunction]
#[pyo3(signature = (samples, range, floor=DEFAULT_DAMAGE_FLOOR))]
fn damage_at_range(samples: Vec<(f64, f64)>, range: f64, floor: f64) -> PyResult<f64> {
    if range.is_nan() {
        return Err(PyValueError::new_err("range is NaN"));
    }
    Ok(curve_from(samples)?.damage_at(range, floor))
}

/// Fewest shots and TTK; returns None when the target cannot be reached
#[pyfunction]
#[pyo3(signature = (body_damage, headshot_multiplier, headshot_count, health_target, rate_of_fire, body_shot_cap=None))]
fn solve(
    body_damage: f64,
    headshot_multiplier: f64,
    headshot_count: u32,
    health_target: f64,
    rate_of_fire: f64,
    body_shot_cap: Option<u32>,
) -> Option<(u32, u32, f64)> {
    match crate::solver::solve(
        body_damage,
        headshot_multiplier,
        headshot_count,
        health_target,
        rate_of_fire,
        body_shot_cap,
    ) {
        crate::solver::KillResult::Kill {
            shots,
            body_shots,
            ttk_ms,
        } => Some((shots, body_shots, ttk_ms)),
        crate::solver::KillResult::Unreachable => None,
    }
}

/// Farthest range at which the composition still kills
#[pyfunction]
#[pyo3(signature = (samples, multiplier, headshots, body_shots, health_target, floor=DEFAULT_DAMAGE_FLOOR, domain_bound=DEFAULT_RANGE_DOMAIN))]
fn max_effective_range(
    samples: Vec<(f64, f64)>,
    multiplier: f64,
    headshots: u32,
    body_shots: u32,
    health_target: f64,
    floor: f64,
    domain_bound: f64,
) -> PyResult<f64> {
    check_finite("multiplier", multiplier)?;
    check_finite("health_target", health_target)?;
    check_finite("floor", floor)?;
    check_finite("domain_bound", domain_bound)?;
    let curve = curve_from(samples)?;
    Ok(crate::range::max_effective_range(
        &curve,
        multiplier,
        headshots,
        body_shots,
        health_target,
        floor,
        domain_bound,
    ))
}

/// Analyze a JSON weapon table; returns the reports as JSON
#[pyfunction]
#[pyo3(signature = (weapons_json, config_json=None, parallel=false))]
fn analyze_json(py: Python<'_>, weapons_json: &str, config_json: Option<&str>, parallel: bool) -> PyResult<String> {
    let table = WeaponTable::from_json(weapons_json)
        .map_err(|e| PyValueError::new_err(format!("Invalid weapons JSON: {}", e)))?;
    let config = config_from(config_json)?;

    // Release the GIL during computation
    let reports = py.allow_threads(|| analyze_weapons(&table.weapons, &config, parallel));
    to_json(&reports)
}

/// Analyze a YAML or JSON weapon table from disk
#[pyfunction]
#[pyo3(signature = (weapons_path, config_path=None, parallel=false))]
fn analyze_file(py: Python<'_>, weapons_path: &str, config_path: Option<&str>, parallel: bool) -> PyResult<String> {
    let table = WeaponTable::from_file(weapons_path)
        .map_err(|e| PyIOError::new_err(format!("Failed to load weapons: {}", e)))?;
    let config = match config_path {
        Some(path) => AnalysisConfig::from_file(path)
            .map_err(|e| PyIOError::new_err(format!("Failed to load config: {}", e)))?,
        None => AnalysisConfig::default(),
    };

    let reports = py.allow_threads(|| analyze_weapons(&table.weapons, &config, parallel));
    to_json(&reports)
}

/// Group a JSON weapon table by shots to kill
#[pyfunction]
#[pyo3(signature = (weapons_json, range, headshots=1, variant="base", health_target=100.0, config_json=None))]
fn categorize_json(
    weapons_json: &str,
    range: f64,
    headshots: u32,
    variant: &str,
    health_target: f64,
    config_json: Option<&str>,
) -> PyResult<String> {
    let table = WeaponTable::from_json(weapons_json)
        .map_err(|e| PyValueError::new_err(format!("Invalid weapons JSON: {}", e)))?;
    let config = config_from(config_json)?;
    let scenario = EngagementScenario {
        range,
        headshots,
        variant: variant_from(variant)?,
        health_target,
    };
    to_json(&categorize_by_stk(&table.weapons, scenario, &config))
}

/// Get number of threads being used for parallel analysis
#[pyfunction]
fn get_thread_count() -> PyResult<usize> {
    Ok(rayon::current_num_threads())
}

/// Get number of available CPU cores
#[pyfunction]
fn get_available_cores() -> PyResult<usize> {
    Ok(num_cpus::get())
}

/// Python module definition
#[pymodule]
fn ttk_analyzer_lib(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(damage_at_range, m)?)?;
    m.add_function(wrap_pyfunction!(solve, m)?)?;
    m.add_function(wrap_pyfunction!(max_effective_range, m)?)?;
    m.add_function(wrap_pyfunction!(analyze_json, m)?)?;
    m.add_function(wrap_pyfunction!(analyze_file, m)?)?;
    m.add_function(wrap_pyfunction!(categorize_json, m)?)?;
    m.add_function(wrap_pyfunction!(get_thread_count, m)?)?;
    m.add_function(wrap_pyfunction!(get_available_cores, m)?)?;
    Ok(())
}
