//! Damage falloff model: per-shot damage at an arbitrary range from a few
//! measured (range, damage) samples.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Game-balance floor for extrapolated damage
pub const DEFAULT_DAMAGE_FLOOR: f64 = 10.0;

/// One measured damage value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "SampleRepr")]
pub struct DamageSample {
    pub range: f64,
    pub damage: f64,
}

impl DamageSample {
    pub const fn new(range: f64, damage: f64) -> Self {
        Self { range, damage }
    }
}

// Samples may be written either as `[range, damage]` or `{range, damage}`
#[derive(Deserialize)]
#[serde(untagged)]
enum SampleRepr {
    Pair(f64, f64),
    Named { range: f64, damage: f64 },
}

impl From<SampleRepr> for DamageSample {
    fn from(repr: SampleRepr) -> Self {
        match repr {
            SampleRepr::Pair(range, damage) | SampleRepr::Named { range, damage } => {
                DamageSample { range, damage }
            }
        }
    }
}

/// Why a set of samples cannot form a falloff curve
#[derive(Debug, Clone, PartialEq)]
pub enum FalloffError {
    TooFewSamples(usize),
    NonFinite { index: usize },
    NegativeRange { index: usize },
    NonPositiveDamage { index: usize },
    RangeNotIncreasing { index: usize },
    DamageIncreasing { index: usize },
}

impl fmt::Display for FalloffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FalloffError::TooFewSamples(n) => {
                write!(f, "need at least 2 damage samples, got {}", n)
            }
            FalloffError::NonFinite { index } => write!(f, "sample {} is not a finite number", index),
            FalloffError::NegativeRange { index } => write!(f, "sample {} has a negative range", index),
            FalloffError::NonPositiveDamage { index } => {
                write!(f, "sample {} has non-positive damage", index)
            }
            FalloffError::RangeNotIncreasing { index } => {
                write!(f, "sample {} range is not greater than the previous sample", index)
            }
            FalloffError::DamageIncreasing { index } => {
                write!(f, "sample {} damage is higher than the previous sample", index)
            }
        }
    }
}

impl std::error::Error for FalloffError {}

/// Check that samples describe a valid falloff curve
pub fn check_samples(samples: &[DamageSample]) -> Result<(), FalloffError> {
    if samples.len() < 2 {
        return Err(FalloffError::TooFewSamples(samples.len()));
    }
    for (index, s) in samples.iter().enumerate() {
        if !s.range.is_finite() || !s.damage.is_finite() {
            return Err(FalloffError::NonFinite { index });
        }
        if s.range < 0.0 {
            return Err(FalloffError::NegativeRange { index });
        }
        if s.damage <= 0.0 {
            return Err(FalloffError::NonPositiveDamage { index });
        }
        if index > 0 {
            let prev = samples[index - 1];
            if s.range <= prev.range {
                return Err(FalloffError::RangeNotIncreasing { index });
            }
            if s.damage > prev.damage {
                return Err(FalloffError::DamageIncreasing { index });
            }
        }
    }
    Ok(())
}

/// Effective per-shot damage at `range`.
///
/// Flat at or below the first sample, linear between samples, and linearly
/// extrapolated from the last two samples beyond the last one. Extrapolated
/// damage never drops below `floor`, even when the last sample is already
/// under it.
///
/// Panics if the samples are malformed; see [`check_samples`].
pub fn damage_at_range(samples: &[DamageSample], range: f64, floor: f64) -> f64 {
    if let Err(e) = check_samples(samples) {
        panic!("invalid falloff samples: {}", e);
    }
    assert!(!range.is_nan(), "range must be a number");
    interpolate(samples, range, floor)
}

fn interpolate(samples: &[DamageSample], range: f64, floor: f64) -> f64 {
    let first = samples[0];
    if range <= first.range {
        return first.damage;
    }

    for pair in samples.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if range == hi.range {
            return hi.damage;
        }
        if range < hi.range {
            let t = (range - lo.range) / (hi.range - lo.range);
            return lo.damage + (hi.damage - lo.damage) * t;
        }
    }

    let (prev, last) = last_two(samples);
    let slope = (last.damage - prev.damage) / (last.range - prev.range);
    let extrapolated = last.damage + slope * (range - last.range);
    extrapolated.max(floor)
}

fn last_two(samples: &[DamageSample]) -> (DamageSample, DamageSample) {
    let n = samples.len();
    (samples[n - 2], samples[n - 1])
}

/// A validated falloff curve for one weapon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DamageSample>", into = "Vec<DamageSample>")]
pub struct FalloffCurve {
    samples: Vec<DamageSample>,
}

impl FalloffCurve {
    pub fn new(samples: Vec<DamageSample>) -> Result<Self, FalloffError> {
        check_samples(&samples)?;
        Ok(Self { samples })
    }

    /// Build a curve from `(range, damage)` pairs
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Result<Self, FalloffError> {
        Self::new(pairs.iter().map(|&(r, d)| DamageSample::new(r, d)).collect())
    }

    pub fn samples(&self) -> &[DamageSample] {
        &self.samples
    }

    /// Effective per-shot damage at `range`; see [`damage_at_range`]
    pub fn damage_at(&self, range: f64, floor: f64) -> f64 {
        interpolate(&self.samples, range, floor)
    }

    /// Ranges where the curve changes slope: every sample, plus the range at
    /// which extrapolation hits the floor. The curve is linear between
    /// consecutive kinks. A last sample under the floor steps up to the floor
    /// right after its own range and stays there.
    pub fn kinks(&self, floor: f64) -> Vec<f64> {
        let mut kinks: Vec<f64> = self.samples.iter().map(|s| s.range).collect();
        let (prev, last) = last_two(&self.samples);
        let slope = (last.damage - prev.damage) / (last.range - prev.range);
        if slope < 0.0 && last.damage > floor {
            kinks.push(last.range + (floor - last.damage) / slope);
        }
        kinks
    }
}

impl TryFrom<Vec<DamageSample>> for FalloffCurve {
    type Error = FalloffError;

    fn try_from(samples: Vec<DamageSample>) -> Result<Self, Self::Error> {
        FalloffCurve::new(samples)
    }
}

impl From<FalloffCurve> for Vec<DamageSample> {
    fn from(curve: FalloffCurve) -> Self {
        curve.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn reference_curve() -> FalloffCurve {
        FalloffCurve::from_pairs(&[(0.0, 30.0), (10.0, 25.0), (75.0, 18.0)]).unwrap()
    }

    /// Random valid curve: increasing ranges, non-increasing damage
    fn random_curve(rng: &mut SmallRng) -> FalloffCurve {
        let n = rng.gen_range(2..=5);
        let mut range = rng.gen_range(0.0..5.0);
        let mut damage = rng.gen_range(15.0..60.0);
        let mut samples = Vec::with_capacity(n);
        for _ in 0..n {
            samples.push(DamageSample::new(range, damage));
            range += rng.gen_range(1.0..40.0);
            damage = (damage - rng.gen_range(0.0..8.0)).max(1.0);
        }
        FalloffCurve::new(samples).unwrap()
    }

    #[test]
    fn flat_below_first_sample() {
        let curve = FalloffCurve::from_pairs(&[(5.0, 30.0), (20.0, 20.0)]).unwrap();
        assert_eq!(curve.damage_at(0.0, DEFAULT_DAMAGE_FLOOR), 30.0);
        assert_eq!(curve.damage_at(5.0, DEFAULT_DAMAGE_FLOOR), 30.0);
    }

    #[test]
    fn exact_at_every_sample() {
        let curve = reference_curve();
        for s in curve.samples() {
            assert_eq!(curve.damage_at(s.range, DEFAULT_DAMAGE_FLOOR), s.damage);
        }
    }

    #[test]
    fn interpolates_inside_brackets() {
        let curve = reference_curve();
        assert_relative_eq!(curve.damage_at(5.0, DEFAULT_DAMAGE_FLOOR), 27.5);
        assert_relative_eq!(curve.damage_at(42.5, DEFAULT_DAMAGE_FLOOR), 21.5);
    }

    #[test]
    fn extrapolates_with_last_slope() {
        let curve = reference_curve();
        // slope of the 10m-75m bracket is -7/65 per meter
        let expected = 18.0 - 7.0 / 65.0 * 25.0;
        assert_relative_eq!(curve.damage_at(100.0, DEFAULT_DAMAGE_FLOOR), expected, epsilon = 1e-12);
    }

    #[test]
    fn extrapolation_is_floored() {
        let curve = reference_curve();
        assert_eq!(curve.damage_at(500.0, DEFAULT_DAMAGE_FLOOR), DEFAULT_DAMAGE_FLOOR);
        assert_eq!(curve.damage_at(1e9, DEFAULT_DAMAGE_FLOOR), DEFAULT_DAMAGE_FLOOR);
    }

    #[test]
    fn flat_tail_stays_flat() {
        let curve = FalloffCurve::from_pairs(&[(0.0, 25.0), (10.0, 20.0), (50.0, 20.0)]).unwrap();
        assert_eq!(curve.damage_at(90.0, DEFAULT_DAMAGE_FLOOR), 20.0);
        assert_eq!(curve.kinks(DEFAULT_DAMAGE_FLOOR), vec![0.0, 10.0, 50.0]);
    }

    #[test]
    fn extrapolation_under_floor_is_raised() {
        let samples = [DamageSample::new(0.0, 12.0), DamageSample::new(50.0, 8.0)];
        // measured values are kept as is
        assert_eq!(damage_at_range(&samples, 50.0, DEFAULT_DAMAGE_FLOOR), 8.0);
        for r in [50.5, 75.0, 200.0, 1e6] {
            assert_eq!(damage_at_range(&samples, r, DEFAULT_DAMAGE_FLOOR), DEFAULT_DAMAGE_FLOOR);
        }
        let curve = FalloffCurve::new(samples.to_vec()).unwrap();
        assert_eq!(curve.kinks(DEFAULT_DAMAGE_FLOOR), vec![0.0, 50.0]);
    }

    #[test]
    fn floor_kink_is_reported() {
        let curve = reference_curve();
        let kinks = curve.kinks(DEFAULT_DAMAGE_FLOOR);
        assert_eq!(kinks.len(), 4);
        // 18 - 7/65 * x = 10  =>  x = 8 * 65 / 7
        assert_relative_eq!(kinks[3], 75.0 + 8.0 * 65.0 / 7.0, epsilon = 1e-9);
        assert_relative_eq!(
            curve.damage_at(kinks[3], DEFAULT_DAMAGE_FLOOR),
            DEFAULT_DAMAGE_FLOOR,
            epsilon = 1e-9
        );
    }

    #[test]
    fn random_curves_are_monotone_and_floored() {
        let mut rng = SmallRng::seed_from_u64(17);
        for _ in 0..200 {
            let curve = random_curve(&mut rng);
            let last_range = curve.samples().last().unwrap().range;
            let mut previous = f64::INFINITY;
            for step in 0..=400 {
                let r = step as f64 * 0.5;
                let d = curve.damage_at(r, DEFAULT_DAMAGE_FLOOR);
                if r > last_range {
                    assert!(d >= DEFAULT_DAMAGE_FLOOR, "below floor at {}m: {}", r, d);
                    if previous < DEFAULT_DAMAGE_FLOOR {
                        // first step past a last sample that sits under the floor
                        previous = f64::INFINITY;
                    }
                }
                assert!(d <= previous + 1e-9, "damage rose at {}m", r);
                previous = d;
            }
        }
    }

    #[test]
    fn rejects_malformed_samples() {
        assert_eq!(
            FalloffCurve::from_pairs(&[(0.0, 30.0)]),
            Err(FalloffError::TooFewSamples(1))
        );
        assert_eq!(
            FalloffCurve::from_pairs(&[(0.0, 30.0), (0.0, 25.0)]),
            Err(FalloffError::RangeNotIncreasing { index: 1 })
        );
        assert_eq!(
            FalloffCurve::from_pairs(&[(0.0, 30.0), (10.0, 35.0)]),
            Err(FalloffError::DamageIncreasing { index: 1 })
        );
        assert_eq!(
            FalloffCurve::from_pairs(&[(0.0, 30.0), (10.0, 0.0)]),
            Err(FalloffError::NonPositiveDamage { index: 1 })
        );
        assert_eq!(
            FalloffCurve::from_pairs(&[(-1.0, 30.0), (10.0, 20.0)]),
            Err(FalloffError::NegativeRange { index: 0 })
        );
    }

    #[test]
    #[should_panic(expected = "invalid falloff samples")]
    fn free_function_fails_fast() {
        damage_at_range(&[DamageSample::new(0.0, 30.0)], 5.0, DEFAULT_DAMAGE_FLOOR);
    }

    #[test]
    fn free_function_matches_curve() {
        let curve = reference_curve();
        for r in [0.0, 3.0, 10.0, 60.0, 75.0, 99.0] {
            assert_eq!(
                damage_at_range(curve.samples(), r, DEFAULT_DAMAGE_FLOOR),
                curve.damage_at(r, DEFAULT_DAMAGE_FLOOR)
            );
        }
    }

    #[test]
    fn deserializes_both_sample_forms() {
        let curve: FalloffCurve =
            serde_json::from_str(r#"[[0, 30], {"range": 10, "damage": 25}, [75, 18]]"#).unwrap();
        assert_eq!(curve, reference_curve());
        assert!(serde_json::from_str::<FalloffCurve>("[[0, 30], [10, 35]]").is_err());
    }
}
