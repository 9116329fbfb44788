//! Node Steward Common - maintenance decisions for Ethereum node clients
//!
//! Probes installed, running, available and latest versions plus service
//! state for one execution and one consensus client, classifies the single
//! next maintenance action for each, and applies it through pluggable
//! collaborators.

pub mod classifier;
pub mod clients;
pub mod command;
pub mod config;
pub mod error;
pub mod executor;
pub mod local_api;
pub mod orchestrator;
pub mod package_manager;
pub mod prompt;
pub mod release_feed;
pub mod retry;
pub mod service_probe;
pub mod session;
pub mod signature;
pub mod sync_check;
pub mod upgrade;
pub mod version;
pub mod version_probe;

pub use classifier::{classify, MaintenanceAction};
pub use clients::{ClientId, ClientRole, ConsensusClient, Distribution, ExecutionClient};
pub use config::StewardConfig;
pub use error::{ActionError, ProbeError};
pub use executor::{ActionExecutor, SystemActionExecutor};
pub use orchestrator::{
    ApplyReport, ClientMaintenanceState, CycleOutcome, DashboardReport, MaintenanceOrchestrator,
    ServiceEntry, StepOutcome,
};
pub use prompt::{MenuChoice, PromptOutcome, UserPrompt};
pub use retry::{Backoff, RetryPolicy};
pub use service_probe::{ServiceDetails, ServiceManager, ServiceState};
pub use session::Session;
pub use version::{ProbedVersion, Version};
pub use version_probe::{ClientVersionSet, VersionProbe};

/// Crate version, used in the User-Agent of outgoing requests
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
