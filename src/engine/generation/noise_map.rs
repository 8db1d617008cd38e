//! # Noise Map Module
//!
//! The sampling seam between the generation stages and the underlying noise
//! functions. Stages describe what they want with `NoiseParams` and call a
//! `NoiseSource`; the production source accumulates fractal octaves over the
//! `noise` crate's Perlin and Value functions, and tests swap in fixed
//! sources to make stage output exact.

use noise::{NoiseFn, Perlin, Value};
use serde::Deserialize;

/// Which base noise function a sampler should use.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseMethod {
    /// Gradient noise; smooth, the default for terrain.
    Perlin,
    /// Lattice value noise; blockier, half the effective amplitude.
    Value,
}

/// Parameters for one fractal noise evaluation.
///
/// `dimensions` selects 2D (the y component of the point is ignored) or 3D
/// sampling. Octaves beyond the first are attenuated by `persistence` and
/// sped up by `lacunarity`; the sum is re-normalized so the result stays in
/// the base function's [-1, 1] range.
#[derive(Copy, Clone, Debug, Deserialize)]
#[serde(default)]
pub struct NoiseParams {
    /// Base noise function.
    pub method: NoiseMethod,
    /// 2 for surface-style noise, 3 for volumetric noise.
    pub dimensions: u8,
    /// Frequency applied to the first octave.
    pub frequency: f64,
    /// Number of octaves to accumulate. Zero behaves like one.
    pub octaves: u8,
    /// Per-octave frequency multiplier.
    pub lacunarity: f64,
    /// Per-octave amplitude multiplier.
    pub persistence: f64,
}

impl Default for NoiseParams {
    fn default() -> Self {
        NoiseParams {
            method: NoiseMethod::Perlin,
            dimensions: 2,
            frequency: 1.0,
            octaves: 1,
            lacunarity: 2.0,
            persistence: 0.5,
        }
    }
}

/// Supplies scalar noise samples to the generation stages.
///
/// Implementations must return values in [-1, 1]; mapping into [0, 1] and any
/// domain-specific scaling is the caller's job.
pub trait NoiseSource: Send + Sync {
    /// Samples the noise field at a world-space point.
    fn sample(&self, point: [f64; 3], params: &NoiseParams) -> f64;
}

/// The production noise source: fractal octave accumulation over seeded
/// Perlin and Value functions.
pub struct FractalNoise {
    perlin: Perlin,
    value: Value,
}

impl FractalNoise {
    /// Creates a source whose Perlin and Value lattices share one seed.
    pub fn new(seed: u32) -> Self {
        FractalNoise {
            perlin: Perlin::new(seed),
            value: Value::new(seed),
        }
    }

    fn raw(&self, point: [f64; 3], method: NoiseMethod, dimensions: u8) -> f64 {
        match (method, dimensions) {
            (NoiseMethod::Perlin, 2) => self.perlin.get([point[0], point[2]]),
            (NoiseMethod::Perlin, _) => self.perlin.get(point),
            (NoiseMethod::Value, 2) => self.value.get([point[0], point[2]]),
            (NoiseMethod::Value, _) => self.value.get(point),
        }
    }
}

impl NoiseSource for FractalNoise {
    fn sample(&self, point: [f64; 3], params: &NoiseParams) -> f64 {
        let mut frequency = params.frequency;
        let mut amplitude = 1.0;
        let mut range = 1.0;

        let scaled = [point[0] * frequency, point[1] * frequency, point[2] * frequency];
        let mut sum = self.raw(scaled, params.method, params.dimensions);

        for _ in 1..params.octaves {
            frequency *= params.lacunarity;
            amplitude *= params.persistence;
            range += amplitude;
            let scaled = [point[0] * frequency, point[1] * frequency, point[2] * frequency];
            sum += self.raw(scaled, params.method, params.dimensions) * amplitude;
        }

        sum / range
    }
}

/// A noise source that returns one fixed value everywhere.
///
/// Makes stage behavior exact in tests: a constant sample pins surface
/// heights, strata thickness, and ore density decisions to known results.
pub struct ConstantNoise(pub f64);

impl NoiseSource for ConstantNoise {
    fn sample(&self, _point: [f64; 3], _params: &NoiseParams) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractal_output_stays_in_unit_range() {
        let source = FractalNoise::new(7);
        let params = NoiseParams {
            dimensions: 3,
            frequency: 0.13,
            octaves: 5,
            ..NoiseParams::default()
        };

        for i in 0..64 {
            let t = i as f64 * 3.7;
            let sample = source.sample([t, t * 0.5, 100.0 - t], &params);
            assert!(
                (-1.0..=1.0).contains(&sample),
                "sample {sample} escaped [-1, 1]"
            );
        }
    }

    #[test]
    fn two_dimensional_sampling_ignores_height() {
        let source = FractalNoise::new(3);
        let params = NoiseParams {
            frequency: 0.31,
            octaves: 3,
            ..NoiseParams::default()
        };

        let low = source.sample([5.5, 0.0, 9.1], &params);
        let high = source.sample([5.5, 250.0, 9.1], &params);
        assert_eq!(low, high);
    }

    #[test]
    fn octave_count_zero_behaves_like_one() {
        let source = FractalNoise::new(11);
        let one = NoiseParams {
            octaves: 1,
            frequency: 0.4,
            ..NoiseParams::default()
        };
        let zero = NoiseParams { octaves: 0, ..one };

        let point = [3.3, 0.0, -2.8];
        assert_eq!(source.sample(point, &one), source.sample(point, &zero));
    }

    #[test]
    fn constant_source_is_parameter_independent() {
        let source = ConstantNoise(0.25);
        let a = NoiseParams::default();
        let b = NoiseParams {
            method: NoiseMethod::Value,
            dimensions: 3,
            octaves: 7,
            ..NoiseParams::default()
        };
        assert_eq!(source.sample([0.0, 0.0, 0.0], &a), 0.25);
        assert_eq!(source.sample([99.0, 5.0, -4.0], &b), 0.25);
    }
}
