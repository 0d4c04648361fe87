pub mod validator;
pub mod workflow;

pub use crate::domain::model::{CircuitRecord, ErrorMap, IpAddressConfig};
pub use crate::domain::ports::{CircuitRepository, NotificationSink};
pub use crate::utils::error::Result;
