//! Action executor - the capability the orchestrator drives to apply actions

use crate::clients::ClientId;
use crate::error::ActionError;
use crate::service_probe::ServiceManager;
use crate::upgrade::Upgrader;

pub trait ActionExecutor {
    fn start(&self, services: &[&str]) -> Result<(), ActionError>;
    fn stop(&self, services: &[&str]) -> Result<(), ActionError>;
    fn restart(&self, services: &[&str]) -> Result<(), ActionError>;

    /// Client-specific upgrade, including the service restart it needs
    fn upgrade(&self, client: ClientId) -> Result<(), ActionError>;

    fn reinstall(&self, client: ClientId) -> Result<(), ActionError>;
}

/// Executor backed by the real service manager and upgrader
pub struct SystemActionExecutor<'a> {
    services: &'a dyn ServiceManager,
    upgrader: Upgrader<'a>,
}

impl<'a> SystemActionExecutor<'a> {
    pub fn new(services: &'a dyn ServiceManager, upgrader: Upgrader<'a>) -> Self {
        Self { services, upgrader }
    }
}

impl<'a> ActionExecutor for SystemActionExecutor<'a> {
    fn start(&self, services: &[&str]) -> Result<(), ActionError> {
        self.services.start(services)
    }

    fn stop(&self, services: &[&str]) -> Result<(), ActionError> {
        self.services.stop(services)
    }

    fn restart(&self, services: &[&str]) -> Result<(), ActionError> {
        self.services.restart(services)
    }

    fn upgrade(&self, client: ClientId) -> Result<(), ActionError> {
        self.upgrader.upgrade(client)
    }

    // TODO: reuse the installation wizard's per-client install steps once they live in this crate
    fn reinstall(&self, client: ClientId) -> Result<(), ActionError> {
        Err(ActionError::NotImplemented {
            action: "reinstall".to_string(),
            client: client.display_name().to_string(),
        })
    }
}
