// Polar curve descriptors and sampling

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CurveError {
    #[error("unknown curve kind code {code}")]
    UnknownKind { code: i32 },
}

/// Closed-form radius function shapes.
///
/// The numeric codes match the legacy firmware's function tables; the
/// named forms are what job files normally use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CurveKind {
    Constant,
    Linear,
    Sine,
    AbsSine,
    Cosine,
    AbsCosine,
}

impl CurveKind {
    /// Map a legacy numeric code to a kind.
    pub fn from_code(code: i32) -> Result<Self, CurveError> {
        match code {
            0 => Ok(CurveKind::Constant),
            1 => Ok(CurveKind::Linear),
            2 => Ok(CurveKind::Sine),
            3 => Ok(CurveKind::AbsSine),
            4 => Ok(CurveKind::Cosine),
            5 => Ok(CurveKind::AbsCosine),
            _ => Err(CurveError::UnknownKind { code }),
        }
    }

    /// Parse a kind from its job-file name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "constant" | "circle" => Some(CurveKind::Constant),
            "linear" | "spiral" => Some(CurveKind::Linear),
            "sine" => Some(CurveKind::Sine),
            "abs-sine" => Some(CurveKind::AbsSine),
            "cosine" => Some(CurveKind::Cosine),
            "abs-cosine" => Some(CurveKind::AbsCosine),
            _ => None,
        }
    }
}

/// Declarative descriptor of one polar curve segment.
///
/// Immutable once submitted; a job is an ordered sequence of these and
/// insertion order is plot order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolarFunction {
    pub kind: CurveKind,
    pub amplitude: f64,
    pub frequency: f64,
    pub time_shift: f64,
    /// Angle domain start, radians.
    pub left_bound: f64,
    /// Angle domain end, radians.
    pub right_bound: f64,
    /// Target vertical layer index.
    pub layer: u32,
}

impl PolarFunction {
    /// Signed radius at `theta`.
    ///
    /// Negative values cannot be traveled by the radius slide; the
    /// executor folds them positive and realizes the sign with a
    /// half-revolution flip of the angle plate.
    pub fn radius_at(&self, theta: f64) -> f64 {
        let inside = self.frequency * (theta + self.time_shift);
        match self.kind {
            CurveKind::Constant => self.amplitude,
            CurveKind::Linear => self.amplitude * inside,
            CurveKind::Sine => self.amplitude * inside.sin(),
            CurveKind::AbsSine => self.amplitude * inside.sin().abs(),
            CurveKind::Cosine => self.amplitude * inside.cos(),
            CurveKind::AbsCosine => self.amplitude * inside.cos().abs(),
        }
    }

    /// Number of samples a sweep at `resolution` produces. Zero when the
    /// domain is degenerate (`right_bound <= left_bound`).
    pub fn sample_count(&self, resolution: f64) -> usize {
        let span = self.right_bound - self.left_bound;
        if span <= 0.0 || resolution <= 0.0 {
            0
        } else {
            (span / resolution).floor() as usize
        }
    }

    /// Lazy sweep from `left_bound` stepping by `resolution`.
    ///
    /// Sampling is pure given the descriptor; calling again restarts the
    /// sweep from the left bound.
    pub fn samples(&self, resolution: f64) -> CurveSamples<'_> {
        CurveSamples {
            function: self,
            resolution,
            index: 0,
            count: self.sample_count(resolution),
        }
    }
}

/// One (angle, signed radius) point of a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub theta: f64,
    pub radius: f64,
}

pub struct CurveSamples<'a> {
    function: &'a PolarFunction,
    resolution: f64,
    index: usize,
    count: usize,
}

impl Iterator for CurveSamples<'_> {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        if self.index >= self.count {
            return None;
        }
        let theta = self.function.left_bound + self.index as f64 * self.resolution;
        self.index += 1;
        Some(Sample {
            theta,
            radius: self.function.radius_at(theta),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CurveSamples<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(amplitude: f64) -> PolarFunction {
        PolarFunction {
            kind: CurveKind::Sine,
            amplitude,
            frequency: 1.0,
            time_shift: 0.0,
            left_bound: 0.0,
            right_bound: PI,
            layer: 0,
        }
    }

    #[test]
    fn kind_from_code() {
        assert_eq!(CurveKind::from_code(0).unwrap(), CurveKind::Constant);
        assert_eq!(CurveKind::from_code(5).unwrap(), CurveKind::AbsCosine);
        assert!(matches!(
            CurveKind::from_code(6),
            Err(CurveError::UnknownKind { code: 6 })
        ));
        assert!(CurveKind::from_code(-1).is_err());
    }

    #[test]
    fn kind_parse() {
        assert_eq!(CurveKind::parse("sine"), Some(CurveKind::Sine));
        assert_eq!(CurveKind::parse("abs-cosine"), Some(CurveKind::AbsCosine));
        assert_eq!(CurveKind::parse("circle"), Some(CurveKind::Constant));
        assert_eq!(CurveKind::parse("square"), None);
    }

    #[test]
    fn sample_count_is_floor_of_span() {
        let f = sine(10.0);
        assert_eq!(f.sample_count(PI / 100.0), 100);
        assert_eq!(f.samples(PI / 100.0).count(), 100);
        // 2.5 steps fit in the domain -> 2 samples
        assert_eq!(f.sample_count(PI / 2.5), 2);
    }

    #[test]
    fn degenerate_domain_is_empty() {
        let mut f = sine(10.0);
        f.right_bound = f.left_bound;
        assert_eq!(f.sample_count(PI / 100.0), 0);
        assert_eq!(f.samples(PI / 100.0).next(), None);

        f.right_bound = f.left_bound - 1.0;
        assert_eq!(f.sample_count(PI / 100.0), 0);
    }

    #[test]
    fn sine_sweep_matches_closed_form() {
        let f = sine(10.0);
        let samples: Vec<Sample> = f.samples(PI / 100.0).collect();
        assert_eq!(samples.len(), 100);
        for (i, sample) in samples.iter().enumerate() {
            let theta = i as f64 * PI / 100.0;
            assert!((sample.theta - theta).abs() < 1e-12);
            assert!((sample.radius - 10.0 * theta.sin()).abs() < 1e-9);
            assert!(sample.radius >= 0.0);
        }
        let quarter = samples[25];
        assert!((quarter.radius - 10.0 * (PI / 4.0).sin()).abs() < 1e-9);
    }

    #[test]
    fn abs_variants_fold_negative_lobes() {
        let mut f = sine(4.0);
        f.kind = CurveKind::AbsSine;
        f.right_bound = 2.0 * PI;
        for sample in f.samples(PI / 50.0) {
            assert!(sample.radius >= 0.0);
        }
    }

    #[test]
    fn linear_and_constant_forms() {
        let mut f = sine(3.0);
        f.kind = CurveKind::Constant;
        assert_eq!(f.radius_at(1.0), 3.0);

        f.kind = CurveKind::Linear;
        f.frequency = 2.0;
        f.time_shift = 0.5;
        // amplitude * frequency * (theta + shift)
        assert!((f.radius_at(1.0) - 3.0 * 2.0 * 1.5).abs() < 1e-12);
    }

    #[test]
    fn sweep_is_restartable() {
        let f = sine(10.0);
        let first: Vec<Sample> = f.samples(PI / 10.0).collect();
        let second: Vec<Sample> = f.samples(PI / 10.0).collect();
        assert_eq!(first, second);
    }
}
