use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use super::error::SamplingError;
use super::point::Point;

/// How many times a zero-norm gaussian draw is retried before giving up.
pub const MAX_DEGENERATE_REDRAWS: usize = 16;

/// Produces points uniformly distributed on the unit sphere in `dim` dimensions.
///
/// Uses the Gaussian method: sample `dim` independent N(0,1) components, then
/// normalize the vector to unit length. An isotropic gaussian has no preferred
/// direction, so the normalized vector is uniform on the sphere surface.
#[derive(Debug, Clone, Copy)]
pub struct SpherePointGenerator {
    dim: usize,
}

impl SpherePointGenerator {
    pub fn new(dim: usize) -> Result<Self, SamplingError> {
        if dim < 2 {
            return Err(SamplingError::InvalidDimension { dim });
        }
        Ok(SpherePointGenerator { dim })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Draws one point. A zero vector is re-drawn up to [`MAX_DEGENERATE_REDRAWS`] times.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Point, SamplingError> {
        draw_unit_vector(self.dim, MAX_DEGENERATE_REDRAWS, || {
            StandardNormal.sample(&mut *rng)
        })
    }
}

/// One-off helper for callers that don't keep a generator around.
pub fn generate_point<R: Rng + ?Sized>(dim: usize, rng: &mut R) -> Result<Point, SamplingError> {
    SpherePointGenerator::new(dim)?.generate(rng)
}

fn draw_unit_vector<F>(dim: usize, max_attempts: usize, mut draw: F) -> Result<Point, SamplingError>
where
    F: FnMut() -> f64,
{
    for attempt in 1..=max_attempts {
        let gaussian: Vec<f64> = (0..dim).map(|_| draw()).collect();
        match Point::normalized(gaussian) {
            Some(point) => return Ok(point),
            None => {
                tracing::debug!(attempt, dim, "Degenerate gaussian vector, re-drawing");
            }
        }
    }

    tracing::error!(
        "Gave up after {} degenerate gaussian draws in {} dimensions",
        max_attempts,
        dim
    );
    Err(SamplingError::DegenerateSample {
        attempts: max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn rejects_dimension_below_two() {
        assert_eq!(
            SpherePointGenerator::new(1).unwrap_err(),
            SamplingError::InvalidDimension { dim: 1 }
        );
        assert!(generate_point(0, &mut StdRng::seed_from_u64(0)).is_err());
    }

    #[test]
    fn generated_points_are_unit_length() {
        let mut rng = StdRng::seed_from_u64(7);
        for dim in [2, 3, 5, 16] {
            let generator = SpherePointGenerator::new(dim).unwrap();
            for _ in 0..200 {
                let p = generator.generate(&mut rng).unwrap();
                assert_eq!(p.dim(), dim);
                assert!((p.norm() - 1.0).abs() < 1e-9, "norm = {}", p.norm());
            }
        }
    }

    #[test]
    fn coordinates_are_symmetric_about_zero() {
        let mut rng = StdRng::seed_from_u64(2024);
        let generator = SpherePointGenerator::new(3).unwrap();

        let n = 10_000;
        let mut sum = 0.0;
        let mut positive = 0usize;
        for _ in 0..n {
            let x = generator.generate(&mut rng).unwrap()[0];
            sum += x;
            if x > 0.0 {
                positive += 1;
            }
        }

        // Std of one coordinate is 1/sqrt(3), so the mean's std is ~0.006.
        let mean = sum / n as f64;
        assert!(mean.abs() < 0.05, "mean = {}", mean);
        let fraction = positive as f64 / n as f64;
        assert!((0.45..0.55).contains(&fraction), "fraction = {}", fraction);
    }

    #[test]
    fn same_seed_same_point() {
        let generator = SpherePointGenerator::new(4).unwrap();
        let a = generator.generate(&mut StdRng::seed_from_u64(99)).unwrap();
        let b = generator.generate(&mut StdRng::seed_from_u64(99)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_draw_is_retried() {
        let mut calls = 0;
        let point = draw_unit_vector(2, 4, || {
            calls += 1;
            // First vector is (0, 0), second is (1, 0).
            if calls == 3 {
                1.0
            } else {
                0.0
            }
        })
        .unwrap();
        assert_eq!(point.coords(), &[1.0, 0.0]);
    }

    #[test]
    fn persistent_zero_draw_fails() {
        let err = draw_unit_vector(3, 5, || 0.0).unwrap_err();
        assert_eq!(err, SamplingError::DegenerateSample { attempts: 5 });
        assert!(!err.is_invalid_parameter());
    }
}
