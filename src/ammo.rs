//! Ammunition types and the headshot multipliers they unlock

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Which special ammunition a weapon actually has access to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum AmmoType {
    #[default]
    None,
    HollowPoint,
    Synthetic,
}

// Custom deserializer for the spellings found in the stat sheets
impl<'de> Deserialize<'de> for AmmoType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        AmmoType::parse(&s).ok_or_else(|| {
            serde::de::Error::unknown_variant(
                &s,
                &["none", "unknown", "hollow point", "hp", "synthetic", "synth"],
            )
        })
    }
}

impl AmmoType {
    /// Parse a loosely formatted ammo name
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "" | "none" | "unknown" | "base" => Some(AmmoType::None),
            "hollowpoint" | "hp" => Some(AmmoType::HollowPoint),
            "synthetic" | "synth" => Some(AmmoType::Synthetic),
            _ => None,
        }
    }

    /// Classify a weapon from its measured special-ammo multiplier
    /// (special-ammo damage divided by base damage on the stat card),
    /// rounded to three decimals first.
    pub fn classify(measured_multiplier: f64) -> Self {
        let ratio = (measured_multiplier * 1000.0).round() / 1000.0;
        if (1.49..=1.51).contains(&ratio) {
            AmmoType::HollowPoint
        } else if (1.74..=1.76).contains(&ratio) {
            AmmoType::Synthetic
        } else {
            AmmoType::None
        }
    }
}

impl fmt::Display for AmmoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmmoType::None => write!(f, "None"),
            AmmoType::HollowPoint => write!(f, "Hollow Point"),
            AmmoType::Synthetic => write!(f, "Synthetic"),
        }
    }
}

/// The ammunition loaded for a given scenario. Only the headshot portion
/// of damage is scaled by the variant's multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AmmoVariant {
    Base,
    HollowPoint,
    Synthetic,
}

impl AmmoVariant {
    pub const ALL: [AmmoVariant; 3] = [
        AmmoVariant::Base,
        AmmoVariant::HollowPoint,
        AmmoVariant::Synthetic,
    ];

    /// Headshot multiplier for this variant
    pub fn multiplier(self, multipliers: &Multipliers) -> f64 {
        match self {
            AmmoVariant::Base => multipliers.base,
            AmmoVariant::HollowPoint => multipliers.hollow_point,
            AmmoVariant::Synthetic => multipliers.synthetic,
        }
    }

    /// Short label used in report tables
    pub fn short_name(self) -> &'static str {
        match self {
            AmmoVariant::Base => "Base",
            AmmoVariant::HollowPoint => "HP",
            AmmoVariant::Synthetic => "Synth",
        }
    }
}

impl fmt::Display for AmmoVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Headshot multipliers per ammo variant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Multipliers {
    pub base: f64,
    pub hollow_point: f64,
    pub synthetic: f64,
}

impl Default for Multipliers {
    fn default() -> Self {
        Self {
            base: 1.34,
            hollow_point: 1.5,
            synthetic: 1.75,
        }
    }
}

/// Ammo variants worth evaluating for a weapon.
///
/// Base is always evaluated. HollowPoint and Synthetic weapons get their own
/// ammo. With `hypothetical_hollow_point` set, Hollow Point is evaluated for
/// every weapon, which is how the ammo-benefit reports compare guns that do
/// not actually carry it.
pub fn applicable_variants(ammo_type: AmmoType, hypothetical_hollow_point: bool) -> Vec<AmmoVariant> {
    let mut variants = vec![AmmoVariant::Base];
    if ammo_type == AmmoType::HollowPoint || hypothetical_hollow_point {
        variants.push(AmmoVariant::HollowPoint);
    }
    if ammo_type == AmmoType::Synthetic {
        variants.push(AmmoVariant::Synthetic);
    }
    variants
}
