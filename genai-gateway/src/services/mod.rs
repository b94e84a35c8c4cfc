pub mod caller;
pub mod credentials;
pub mod metrics;
pub mod providers;
pub mod shaper;
pub mod validation;

pub use caller::{call_with_deadline, CallError};
pub use shaper::{shape, ShapedResponse};
