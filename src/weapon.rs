//! Weapon profiles as loaded from the damage sheets

use crate::ammo::AmmoType;
use crate::falloff::FalloffCurve;
use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Weapon class. Classes outside the known set pass through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WeaponClass {
    AssaultRifle,
    Carbine,
    Lmg,
    Smg,
    Other(String),
}

impl WeaponClass {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "assault rifle" | "assaultrifle" | "ar" => WeaponClass::AssaultRifle,
            "carbine" => WeaponClass::Carbine,
            "lmg" => WeaponClass::Lmg,
            "smg" => WeaponClass::Smg,
            _ => WeaponClass::Other(s.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            WeaponClass::AssaultRifle => "Assault Rifle",
            WeaponClass::Carbine => "Carbine",
            WeaponClass::Lmg => "LMG",
            WeaponClass::Smg => "SMG",
            WeaponClass::Other(name) => name,
        }
    }
}

impl fmt::Display for WeaponClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Case-insensitive, with the sheet abbreviations ("AR", "CARBINE")
impl<'de> Deserialize<'de> for WeaponClass {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(WeaponClass::parse(&s))
    }
}

impl Serialize for WeaponClass {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// One weapon: identity, falloff samples, fire rate and ammo access.
/// Built once at load time and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponProfile {
    pub name: String,
    #[serde(alias = "type")]
    pub class: WeaponClass,
    #[serde(alias = "samples")]
    pub falloff: FalloffCurve,
    /// Rounds per minute
    #[serde(alias = "rof")]
    pub rate_of_fire: f64,
    #[serde(default, alias = "ammo")]
    pub ammo_type: AmmoType,
    /// Special-ammo damage over base damage as read off the stat card
    #[serde(default, alias = "syn_hp_ratio", skip_serializing_if = "Option::is_none")]
    pub ammo_multiplier: Option<f64>,
}

impl WeaponProfile {
    pub fn new(
        name: impl Into<String>,
        class: WeaponClass,
        falloff: FalloffCurve,
        rate_of_fire: f64,
        ammo_type: AmmoType,
    ) -> Self {
        Self {
            name: name.into(),
            class,
            falloff,
            rate_of_fire,
            ammo_type,
            ammo_multiplier: None,
        }
    }

    /// Fill in the ammo type from the measured multiplier when the table
    /// does not name one. An explicit ammo type always wins.
    pub fn resolve_ammo(&mut self) {
        let Some(ratio) = self.ammo_multiplier else { return };
        let classified = AmmoType::classify(ratio);

        if self.ammo_type == AmmoType::None {
            if classified == AmmoType::None {
                warn!(
                    "{}: non-standard ammo multiplier {:.2}x, assuming no special ammo",
                    self.name, ratio
                );
            } else {
                debug!("{}: {:.3}x multiplier classified as {}", self.name, ratio, classified);
            }
            self.ammo_type = classified;
        } else if classified != self.ammo_type {
            warn!(
                "{}: listed as {} but its {:.2}x multiplier reads as {}",
                self.name, self.ammo_type, ratio, classified
            );
        }
    }

    /// Check the fields the falloff curve does not already guarantee
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("weapon name is empty".to_string());
        }
        if !(self.rate_of_fire.is_finite() && self.rate_of_fire > 0.0) {
            return Err(format!(
                "{}: rate of fire must be positive, got {}",
                self.name, self.rate_of_fire
            ));
        }
        if let Some(ratio) = self.ammo_multiplier {
            if !(ratio.is_finite() && ratio > 0.0) {
                return Err(format!("{}: ammo multiplier must be positive, got {}", self.name, ratio));
            }
        }
        Ok(())
    }
}
