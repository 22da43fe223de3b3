//! Configuration structures for loading weapon tables and analysis settings
//! from YAML or JSON files

use crate::ammo::Multipliers;
use crate::falloff::DEFAULT_DAMAGE_FLOOR;
use crate::range::{Composition, DEFAULT_RANGE_DOMAIN};
use crate::weapon::{WeaponClass, WeaponProfile};
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

/// Errors raised while loading or validating input files
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Yaml(serde_yaml::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "i/o error: {}", e),
            ConfigError::Json(e) => write!(f, "invalid JSON: {}", e),
            ConfigError::Yaml(e) => write!(f, "invalid YAML: {}", e),
            ConfigError::Invalid(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Json(e) => Some(e),
            ConfigError::Yaml(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Yaml(e)
    }
}

/// Read a YAML or JSON file, picking the parser from the extension
fn load_file<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, ConfigError> {
    let content = fs::read_to_string(&path)?;
    let path_str = path.as_ref().to_string_lossy().to_lowercase();

    if path_str.ends_with(".json") {
        Ok(serde_json::from_str(&content)?)
    } else {
        Ok(serde_yaml::from_str(&content)?)
    }
}

/// Global constants shared by every analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub multipliers: Multipliers,
    /// Extrapolated damage never drops below this
    pub damage_floor: f64,
    /// Health pools evaluated; the first one is the primary target
    pub health_targets: Vec<f64>,
    /// Ranges (meters) at which scenario grids are evaluated
    pub range_grid: Vec<f64>,
    /// Headshot counts 0..=max_headshots are evaluated
    pub max_headshots: u32,
    /// Range inversion saturates at this range (meters)
    pub range_domain_bound: f64,
    /// Reproduce the bounded legacy body-shot search when set
    pub body_shot_cap: Option<u32>,
    /// Evaluate Hollow Point for weapons that do not carry it
    pub hypothetical_hollow_point: bool,
    /// Shot compositions used by the range reports
    pub compositions: Vec<Composition>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            multipliers: Multipliers::default(),
            damage_floor: DEFAULT_DAMAGE_FLOOR,
            health_targets: vec![100.0, 80.0],
            range_grid: vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 75.0, 100.0],
            max_headshots: 5,
            range_domain_bound: DEFAULT_RANGE_DOMAIN,
            body_shot_cap: None,
            hypothetical_hollow_point: true,
            compositions: vec![
                Composition::new(1, 2),
                Composition::new(2, 1),
                Composition::new(2, 2),
                Composition::new(2, 3),
            ],
        }
    }
}

impl AnalysisConfig {
    /// Load analysis settings from a YAML or JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: AnalysisConfig = load_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from JSON string (for Python interop)
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// The health pool reports use when only one is shown
    pub fn primary_health_target(&self) -> f64 {
        self.health_targets.first().copied().unwrap_or(100.0)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));
        let m = &self.multipliers;
        for (name, value) in [("base", m.base), ("hollow_point", m.hollow_point), ("synthetic", m.synthetic)] {
            if !(value.is_finite() && value >= 0.0) {
                return invalid(format!("multiplier {} must be non-negative, got {}", name, value));
            }
        }
        if !self.damage_floor.is_finite() || self.damage_floor < 0.0 {
            return invalid(format!("damage_floor must be non-negative, got {}", self.damage_floor));
        }
        if self.health_targets.is_empty() {
            return invalid("health_targets is empty".to_string());
        }
        if let Some(t) = self.health_targets.iter().find(|t| !(t.is_finite() && **t > 0.0)) {
            return invalid(format!("health target must be positive, got {}", t));
        }
        if let Some(r) = self.range_grid.iter().find(|r| !(r.is_finite() && **r >= 0.0)) {
            return invalid(format!("range grid entry must be non-negative, got {}", r));
        }
        if !(self.range_domain_bound.is_finite() && self.range_domain_bound > 0.0) {
            return invalid(format!(
                "range_domain_bound must be positive, got {}",
                self.range_domain_bound
            ));
        }
        if self.body_shot_cap == Some(0) {
            return invalid("body_shot_cap of 0 makes every scenario unreachable".to_string());
        }
        Ok(())
    }
}

/// Weapon rows plus the name aliases that reconcile the source sheets
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeaponTable {
    pub weapons: Vec<WeaponProfile>,
    /// Alternate spelling -> canonical weapon name
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

impl WeaponTable {
    /// Load a weapon table from a YAML or JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let table: WeaponTable = load_file(path)?;
        table.normalized()
    }

    /// Load from JSON string (for Python interop)
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let table: WeaponTable = serde_json::from_str(json)?;
        table.normalized()
    }

    /// Canonical name for `name`
    pub fn canonical_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Rename aliased weapons once, validate, then resolve ammo types from
    /// measured multipliers
    fn normalized(mut self) -> Result<Self, ConfigError> {
        for weapon in &mut self.weapons {
            if let Some(canonical) = self.aliases.get(&weapon.name) {
                debug!("Renaming weapon {} -> {}", weapon.name, canonical);
                weapon.name = canonical.clone();
            }
        }
        self.validate()?;
        for weapon in &mut self.weapons {
            weapon.resolve_ammo();
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for weapon in &self.weapons {
            weapon.validate().map_err(ConfigError::Invalid)?;
            if !seen.insert(weapon.name.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate weapon name {}", weapon.name)));
            }
        }
        Ok(())
    }

    /// Look a weapon up by canonical name or alias
    pub fn get(&self, name: &str) -> Option<&WeaponProfile> {
        let name = self.canonical_name(name);
        self.weapons.iter().find(|w| w.name == name)
    }

    /// Weapons of one class, in table order
    pub fn of_class(&self, class: &WeaponClass) -> Vec<WeaponProfile> {
        self.weapons.iter().filter(|w| &w.class == class).cloned().collect()
    }
}
