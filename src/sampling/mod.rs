pub mod distance;
pub mod error;
pub mod generator;
pub mod point;
pub mod sampler;

pub use distance::{angular_distance, angular_distance_slices};
pub use error::SamplingError;
pub use generator::{generate_point, SpherePointGenerator};
pub use point::Point;
pub use sampler::{
    is_far_enough, sample, MinDistanceSampler, SampleOutcome, SamplerConfig, SamplingStatus,
    TimeoutPolicy,
};
