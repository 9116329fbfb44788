//! User interaction outcomes and the confirmation capability

use crate::orchestrator::DashboardReport;
use serde::{Deserialize, Serialize};

/// What the user picked in a menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuChoice {
    Maintain,
    Retry,
}

/// Result of any interactive step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome<T> {
    /// User chose to leave
    Quit,
    /// User picked a menu entry
    Proceed(MenuChoice),
    /// The step completed with data
    Success(T),
}

impl<T> PromptOutcome<T> {
    pub fn is_quit(&self) -> bool {
        matches!(self, PromptOutcome::Quit)
    }

    pub fn success(self) -> Option<T> {
        match self {
            PromptOutcome::Success(value) => Some(value),
            _ => None,
        }
    }
}

/// Presents text to the user and collects a decision
pub trait UserPrompt {
    /// Show the dashboard; `Proceed(Maintain)` to apply, `Quit` to leave
    ///
    /// Only called with reports that need maintenance.
    fn confirm_maintenance(&self, report: &DashboardReport) -> PromptOutcome<()>;

    /// Show a dashboard that needs nothing; informational only
    fn show_dashboard(&self, report: &DashboardReport);

    /// Show a transient failure; `Proceed(Retry)` to try again, `Quit` to leave
    fn offer_retry(&self, title: &str, details: &str) -> PromptOutcome<()>;

    /// Show a failure that only allows quitting
    fn report_failure(&self, title: &str, details: &str);
}
