//! Queue-driven compute unit and bastion model.

use crate::model::network::{SecurityGroupRole, SubnetTier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Binding of a compute unit to its one queue event source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSourceSpec {
    pub queue: String,
    pub batch_size: u32,
}

/// A recurring time-based trigger, independent of queue activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSpec {
    pub hour: u8,
    pub minute: u8,
}

impl ScheduleSpec {
    pub fn daily_at(hour: u8, minute: u8) -> Self {
        Self { hour, minute }
    }

    /// Cron expression in the scheduler's six-field form.
    pub fn expression(&self) -> String {
        format!("cron({} {} * * ? *)", self.minute, self.hour)
    }
}

/// A network-attached, security-group-scoped compute unit.
///
/// Attachment is one-shot: the queue source and the schedule are set exactly
/// once during composition, and a failure anywhere fails the whole
/// composition. There is no partial-attach retry path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeUnitSpec {
    pub name: String,
    pub memory_mib: u32,
    pub timeout_secs: u32,
    pub artifact_bucket: String,
    pub artifact_key: String,
    pub handler: String,
    pub security_group: SecurityGroupRole,
    pub environment: BTreeMap<String, String>,
    pub queue_source: Option<QueueSourceSpec>,
    pub schedule: Option<ScheduleSpec>,
}

impl ComputeUnitSpec {
    pub fn new(
        name: impl Into<String>,
        artifact_bucket: impl Into<String>,
        artifact_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            memory_mib: 512,
            timeout_secs: 5 * 60,
            artifact_bucket: artifact_bucket.into(),
            artifact_key: artifact_key.into(),
            handler: "dist/handler.handler".to_string(),
            security_group: SecurityGroupRole::Worker,
            environment: BTreeMap::new(),
            queue_source: None,
            schedule: None,
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    /// Attach the one queue event source. Consumes self: the transition is
    /// irreversible at composition time.
    pub fn attach_queue_source(mut self, queue: impl Into<String>, batch_size: u32) -> Self {
        self.queue_source = Some(QueueSourceSpec {
            queue: queue.into(),
            batch_size,
        });
        self
    }

    /// Attach the recurring maintenance schedule.
    pub fn attach_schedule(mut self, schedule: ScheduleSpec) -> Self {
        self.schedule = Some(schedule);
        self
    }
}

/// Operator access host in the public tier. Reaches the database on 5432 via
/// its own security-group role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BastionSpec {
    pub name: String,
    pub instance_class: String,
    pub subnet: SubnetTier,
    pub security_group: SecurityGroupRole,
}

impl BastionSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instance_class: "t4g.nano".to_string(),
            subnet: SubnetTier::Public,
            security_group: SecurityGroupRole::Bastion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_expression_fires_daily() {
        let schedule = ScheduleSpec::daily_at(2, 0);
        assert_eq!(schedule.expression(), "cron(0 2 * * ? *)");
    }

    #[test]
    fn attach_sequence_is_one_shot() {
        let unit = ComputeUnitSpec::new("worker-dev", "artifacts-dev", "worker.zip")
            .attach_queue_source("work-queue-dev", 5)
            .attach_schedule(ScheduleSpec::daily_at(2, 0));
        let source = unit.queue_source.expect("queue source attached");
        assert_eq!(source.batch_size, 5);
        assert!(unit.schedule.is_some());
        assert_eq!(unit.security_group, SecurityGroupRole::Worker);
    }
}
