//! Seeded coherent noise built on FastNoiseLite
//!
//! Every noise field in the generator derives its own sub-seed from the world
//! seed plus a fixed per-field offset, so a single world seed fixes all of them.

use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};

use super::worldgen_config::NoiseLayerConfig;

/// Folds a 64-bit world seed into the 32-bit FastNoiseLite seed space and
/// applies a per-field offset.
pub fn sub_seed(world_seed: u64, offset: i32) -> i32 {
    let folded = (world_seed ^ (world_seed >> 32)) as u32 as i32;
    folded.wrapping_add(offset)
}

/// Deterministic 2D noise field with single-sample and fractal sampling
///
/// The underlying FastNoiseLite runs at frequency 1 with its own fractal
/// disabled; callers scale coordinates and `fractal` does the octave sum.
pub struct SeededNoiseField {
    seed: i32,
    noise: FastNoiseLite,
}

impl SeededNoiseField {
    pub fn new(seed: i32) -> Self {
        let mut noise = FastNoiseLite::with_seed(seed);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_frequency(Some(1.0));
        noise.set_fractal_type(Some(FractalType::None));
        Self { seed, noise }
    }

    /// Field seeded from `world_seed` shifted by `offset`
    pub fn from_world_seed(world_seed: u64, offset: i32) -> Self {
        Self::new(sub_seed(world_seed, offset))
    }

    pub fn seed(&self) -> i32 {
        self.seed
    }

    /// Single noise sample in [-1, 1]
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        self.noise.get_noise_2d(x, y).clamp(-1.0, 1.0)
    }

    /// Multi-octave sample normalised back into [-1, 1]
    ///
    /// Each octave multiplies frequency by `lacunarity` and amplitude by
    /// `persistence`. Zero octaves yields 0.
    pub fn fractal(&self, x: f32, y: f32, octaves: u8, persistence: f32, lacunarity: f32) -> f32 {
        if octaves == 0 {
            return 0.0;
        }

        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut amplitude_sum = 0.0;

        for octave in 0..octaves {
            // Shift each octave so their lattices don't line up at the origin
            let shift = octave as f32 * 31.7;
            total += self.sample(x * frequency + shift, y * frequency - shift) * amplitude;
            amplitude_sum += amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }

        if amplitude_sum <= f32::EPSILON {
            return 0.0;
        }
        (total / amplitude_sum).clamp(-1.0, 1.0)
    }
}

/// A noise field bound to its layer settings
pub struct NoiseLayer {
    field: SeededNoiseField,
    frequency: f32,
    octaves: u8,
    persistence: f32,
    lacunarity: f32,
}

impl NoiseLayer {
    pub fn new(world_seed: u64, config: &NoiseLayerConfig) -> Self {
        Self {
            field: SeededNoiseField::from_world_seed(world_seed, config.seed_offset),
            frequency: config.frequency,
            octaves: config.octaves,
            persistence: config.persistence,
            lacunarity: config.lacunarity,
        }
    }

    /// Fractal sample at world coordinates, in [-1, 1]
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        self.field.fractal(
            x * self.frequency,
            y * self.frequency,
            self.octaves,
            self.persistence,
            self.lacunarity,
        )
    }

    /// Sample remapped to [0, 1]
    pub fn sample01(&self, x: f32, y: f32) -> f32 {
        (self.sample(x, y) + 1.0) * 0.5
    }

    pub fn field(&self) -> &SeededNoiseField {
        &self.field
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_in_range() {
        let field = SeededNoiseField::new(42);
        for i in 0..500 {
            let v = field.sample(i as f32 * 0.37, i as f32 * -0.21);
            assert!((-1.0..=1.0).contains(&v), "sample out of range: {v}");
        }
    }

    #[test]
    fn test_same_seed_same_values() {
        let a = SeededNoiseField::from_world_seed(7, 100);
        let b = SeededNoiseField::from_world_seed(7, 100);
        for i in 0..50 {
            let x = i as f32 * 0.13;
            assert_eq!(a.sample(x, 3.0), b.sample(x, 3.0));
            assert_eq!(a.fractal(x, 3.0, 4, 0.5, 2.0), b.fractal(x, 3.0, 4, 0.5, 2.0));
        }
    }

    #[test]
    fn test_offsets_give_independent_fields() {
        let a = SeededNoiseField::from_world_seed(7, 100);
        let b = SeededNoiseField::from_world_seed(7, 200);
        let differs = (0..50).any(|i| {
            let x = i as f32 * 0.29;
            a.sample(x, 1.5) != b.sample(x, 1.5)
        });
        assert!(differs);
    }

    #[test]
    fn test_zero_octaves_is_zero() {
        let field = SeededNoiseField::new(1);
        assert_eq!(field.fractal(12.5, 3.25, 0, 0.5, 2.0), 0.0);
    }

    #[test]
    fn test_fractal_normalised() {
        let field = SeededNoiseField::new(99);
        for i in 0..200 {
            let v = field.fractal(i as f32 * 0.11, 0.0, 6, 0.6, 2.1);
            assert!((-1.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_sub_seed_uses_high_bits() {
        assert_ne!(sub_seed(1, 0), sub_seed(1 | (1 << 40), 0));
        assert_eq!(sub_seed(5, 3), sub_seed(5, 0).wrapping_add(3));
    }

    #[test]
    fn test_layer_sample01() {
        let config = NoiseLayerConfig::new(10, 0.05, 3);
        let layer = NoiseLayer::new(42, &config);
        for x in -100..100 {
            let v = layer.sample01(x as f32, 0.0);
            assert!((0.0..=1.0).contains(&v));
        }
    }
}
