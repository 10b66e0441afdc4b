pub mod sampling;
pub mod visualization;

pub use sampling::{
    angular_distance, generate_point, is_far_enough, sample, MinDistanceSampler, Point,
    SampleOutcome, SamplerConfig, SamplingError, SamplingStatus, SpherePointGenerator,
    TimeoutPolicy,
};
