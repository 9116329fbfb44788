//! Beacon node sync verification
//!
//! A node that answers but reports no sync data, or sits idle while behind,
//! usually just has not found peers yet. Those cases offer Retry. A node that
//! cannot be reached at all only offers Quit.

use crate::local_api::{LocalClientApi, SyncStatus, BEACON_SYNCING_ENDPOINT};
use crate::prompt::{MenuChoice, PromptOutcome, UserPrompt};
use crate::retry::RetryPolicy;
use std::thread;
use tracing::{info, warn};

/// Slots behind head tolerated for an idle node
const IDLE_DISTANCE_TOLERANCE: u64 = 1;

impl SyncStatus {
    /// Idle while clearly behind head
    pub fn is_stalled(&self) -> bool {
        !self.is_syncing && self.sync_distance > IDLE_DISTANCE_TOLERANCE
    }
}

/// Query the beacon node until it reports a healthy sync state
///
/// The number of retries offered is bounded by `policy.max_attempts`.
pub fn wait_for_sync(
    api: &dyn LocalClientApi,
    prompt: &dyn UserPrompt,
    policy: &RetryPolicy,
) -> PromptOutcome<SyncStatus> {
    let attempts = policy.max_attempts.max(1);

    for attempt in 0..attempts {
        let status = match api.beacon_sync_status() {
            Ok(status) => status,
            Err(e) => {
                warn!("Sync check failed: {}", e);
                prompt.report_failure(
                    "Cannot connect to beacon node",
                    &format!(
                        "We could not query the beacon node.\n\n\
                         Endpoint: {}\nMethod: GET\nError: {}\n\n\
                         We cannot proceed if the beacon node HTTP server \
                         is not responding properly.",
                        BEACON_SYNCING_ENDPOINT, e
                    ),
                );
                return PromptOutcome::Quit;
            }
        };

        let details = match status {
            Some(status) if !status.is_stalled() => {
                info!(
                    "Beacon node head slot {}, sync distance {}, syncing: {}",
                    status.head_slot, status.sync_distance, status.is_syncing
                );
                return PromptOutcome::Success(status);
            }
            Some(status) => format!(
                "The beacon node is {} slots behind but not syncing. It is probably still \
                 looking for peers.\n\nHead slot: {}",
                status.sync_distance, status.head_slot
            ),
            None => "The beacon node did not report any sync data yet. It has likely not \
                     started syncing."
                .to_string(),
        };

        warn!("Unexpected sync state (check {}/{})", attempt + 1, attempts);
        if attempt + 1 >= attempts {
            prompt.report_failure("Beacon node is not syncing", &details);
            return PromptOutcome::Quit;
        }

        match prompt.offer_retry("Unexpected response from beacon node", &details) {
            PromptOutcome::Proceed(MenuChoice::Retry) | PromptOutcome::Success(()) => {
                let delay = policy.delay_for(attempt);
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
            }
            PromptOutcome::Proceed(MenuChoice::Maintain) | PromptOutcome::Quit => {
                return PromptOutcome::Quit;
            }
        }
    }

    PromptOutcome::Quit
}
