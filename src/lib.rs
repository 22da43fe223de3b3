//! TTK Analyzer - shots-to-kill and time-to-kill analysis for shooter weapons
//!
//! Damage falloff tables are interpolated per range, a closed-form solver finds
//! the fewest shots that reach a health target, and range inversion finds how
//! far a fixed shot composition still kills.

pub mod ammo;
pub mod falloff;
pub mod weapon;
pub mod solver;
pub mod range;
pub mod config;
pub mod analysis;
pub mod stats;
pub mod categorize;

#[cfg(feature = "python")]
mod python;

pub use ammo::*;
pub use falloff::*;
pub use weapon::*;
pub use solver::*;
pub use range::*;
pub use config::*;
pub use analysis::*;
pub use stats::*;
pub use categorize::*;
