pub mod balancer;
pub mod retry;

pub use balancer::{
    pick_instance, InstanceStats, IsolationBalancer, LoadBalancer, RandomSource, SeededRandom,
    SelectionStats, ThreadRandom,
};
pub use retry::{RetryingIsolationBalancer, RETRY_MAX};
