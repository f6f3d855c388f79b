//! Work queue model.

use crate::environment::Environment;
use serde::{Deserialize, Serialize};

/// Redrive target: after `max_receive_count` failed receives, a message moves
/// to the named dead-letter queue. It is never dropped and never retried
/// indefinitely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedrivePolicy {
    pub dead_letter_queue: String,
    pub max_receive_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSpec {
    pub name: String,
    pub visibility_timeout_secs: u32,
    pub retention_days: u32,
    pub redrive: Option<RedrivePolicy>,
}

impl QueueSpec {
    /// The dead-letter queue. Longer retention than the primary so operators
    /// have time to inspect poisoned messages.
    pub fn dead_letter(env: Environment) -> Self {
        Self {
            name: format!("work-dlq-{env}"),
            visibility_timeout_secs: 30,
            retention_days: 14,
            redrive: None,
        }
    }

    /// The primary work queue, redriving to `dlq` after 5 failed receives.
    pub fn work_queue(env: Environment, dlq: &QueueSpec) -> Self {
        Self {
            name: format!("work-queue-{env}"),
            visibility_timeout_secs: 5 * 60,
            retention_days: 4,
            redrive: Some(RedrivePolicy {
                dead_letter_queue: dlq.name.clone(),
                max_receive_count: 5,
            }),
        }
    }
}
