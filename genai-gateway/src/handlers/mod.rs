pub mod fallback;
pub mod generate;
pub mod health;
pub mod metrics;

pub use fallback::{method_not_allowed, not_found};
pub use generate::generate;
pub use health::{health_check, readiness_check};
pub use metrics::metrics_endpoint;
