pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};
pub use config::PortalConfig;

pub use adapters::{ChannelNotifier, InMemoryCircuitRepository, MatchKey, TracingNotifier};
pub use crate::core::validator::{project_client_ip, validate};
pub use crate::core::workflow::{Draft, WorkflowController, WorkflowSettings, WorkflowSnapshot, WorkflowState};
pub use domain::model::{
    AddressList, CircuitRecord, ErrorMap, Field, FieldKey, IpAddressConfig, IpMode, Notification,
    NotificationKind,
};
pub use domain::ports::{CircuitRepository, NotificationSink};
pub use utils::error::{PortalError, RepositoryError, Result, WorkflowError};
