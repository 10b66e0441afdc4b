use rand::Rng;

use super::distance::angular_distance;
use super::error::SamplingError;
use super::generator::SpherePointGenerator;
use super::point::Point;

/// Consecutive-failure threshold used by the fixed-patience variant of the sampler.
pub const DEFAULT_FIXED_TIMEOUT: usize = 50;

// Upfront reservation for the accepted set; the request size alone can be huge.
const INITIAL_CAPACITY: usize = 1024;

/// How many back-to-back rejected candidates the sampler tolerates before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeoutPolicy {
    /// Patience equals the number of requested points.
    #[default]
    TargetCount,
    /// Patience is a constant, independent of the request size.
    Fixed(usize),
}

impl TimeoutPolicy {
    pub fn threshold(&self, n_points: usize) -> usize {
        match *self {
            TimeoutPolicy::TargetCount => n_points,
            TimeoutPolicy::Fixed(n) => n,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerConfig {
    pub n_points: usize,
    pub dim: usize,
    /// Minimum pairwise great-circle distance, in radians.
    pub min_distance: f64,
    pub timeout: TimeoutPolicy,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig {
            n_points: 40,
            dim: 3,
            min_distance: 0.3,
            timeout: TimeoutPolicy::TargetCount,
        }
    }
}

impl SamplerConfig {
    pub fn new(n_points: usize, dim: usize, min_distance: f64) -> Self {
        SamplerConfig {
            n_points,
            dim,
            min_distance,
            timeout: TimeoutPolicy::TargetCount,
        }
    }

    pub fn with_timeout(mut self, timeout: TimeoutPolicy) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), SamplingError> {
        if self.n_points == 0 {
            return Err(SamplingError::InvalidPointCount);
        }
        if self.dim < 2 {
            return Err(SamplingError::InvalidDimension { dim: self.dim });
        }
        // `!(x > 0)` also catches NaN.
        if !(self.min_distance > 0.0) {
            return Err(SamplingError::InvalidMinDistance {
                min_distance: self.min_distance,
            });
        }
        if self.timeout == TimeoutPolicy::Fixed(0) {
            return Err(SamplingError::InvalidTimeout);
        }
        Ok(())
    }
}

/// How a finished run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingStatus {
    Succeeded,
    TimedOut,
}

// Loop state while drawing candidates; never leaves `sample`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Running,
    Finished(SamplingStatus),
}

#[derive(Debug, Clone)]
pub struct SampleOutcome {
    /// Accepted points in acceptance order.
    pub points: Vec<Point>,
    pub status: SamplingStatus,
    pub requested: usize,
    /// Total number of candidates drawn, accepted or not.
    pub attempts: usize,
}

impl SampleOutcome {
    pub fn is_complete(&self) -> bool {
        self.status == SamplingStatus::Succeeded
    }

    pub fn found(&self) -> usize {
        self.points.len()
    }

    pub fn into_points(self) -> Vec<Point> {
        self.points
    }
}

/// Returns true if `point` is at least `min_distance` away from every accepted point.
pub fn is_far_enough(point: &Point, accepted: &[Point], min_distance: f64) -> bool {
    accepted
        .iter()
        .all(|other| angular_distance(point, other) >= min_distance)
}

/// Rejection sampler for well-separated points on the unit sphere.
#[derive(Debug, Clone)]
pub struct MinDistanceSampler {
    config: SamplerConfig,
    generator: SpherePointGenerator,
}

impl MinDistanceSampler {
    pub fn new(config: SamplerConfig) -> Result<Self, SamplingError> {
        config.validate()?;
        let generator = SpherePointGenerator::new(config.dim)?;
        Ok(MinDistanceSampler { config, generator })
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Draws candidates until `n_points` are accepted or the consecutive
    /// failure count hits the timeout threshold.
    ///
    /// Running out of patience is not an error: the points found so far are
    /// returned with [`SamplingStatus::TimedOut`]. The only error is a
    /// degenerate draw that survives the generator's own retries.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<SampleOutcome, SamplingError> {
        let SamplerConfig {
            n_points,
            min_distance,
            timeout,
            ..
        } = self.config;
        let threshold = timeout.threshold(n_points);

        tracing::info!(
            n_points,
            dim = self.config.dim,
            min_distance,
            threshold,
            "Sampling points on the sphere"
        );

        let mut points: Vec<Point> = Vec::with_capacity(n_points.min(INITIAL_CAPACITY));
        let mut failures = 0usize;
        let mut attempts = 0usize;
        let mut state = LoopState::Running;

        let status = loop {
            if let LoopState::Finished(status) = state {
                break status;
            }
            if points.len() == n_points {
                state = LoopState::Finished(SamplingStatus::Succeeded);
            } else if failures >= threshold {
                state = LoopState::Finished(SamplingStatus::TimedOut);
            } else {
                let candidate = self.generator.generate(rng)?;
                attempts += 1;

                if is_far_enough(&candidate, &points, min_distance) {
                    points.push(candidate);
                    failures = 0;
                    tracing::debug!("Accepted point {}/{}", points.len(), n_points);
                } else {
                    failures += 1;
                    tracing::trace!("Rejected candidate ({} in a row)", failures);
                }
            }
        };

        match status {
            SamplingStatus::TimedOut => tracing::warn!(
                "Timed out after {} consecutive rejections. Found {} of {} points.",
                failures,
                points.len(),
                n_points
            ),
            SamplingStatus::Succeeded => {
                tracing::info!("Found all {} points in {} attempts", n_points, attempts)
            }
        }

        Ok(SampleOutcome {
            points,
            status,
            requested: n_points,
            attempts,
        })
    }
}

/// Samples with the default policy (patience equal to `n_points`).
pub fn sample<R: Rng + ?Sized>(
    n_points: usize,
    dim: usize,
    min_distance: f64,
    rng: &mut R,
) -> Result<SampleOutcome, SamplingError> {
    MinDistanceSampler::new(SamplerConfig::new(n_points, dim, min_distance))?.sample(rng)
}
