//! Typed specifications for the resources the topology provisions.
//!
//! Specs are plain data: constructors consult the sizing-policy table, and the
//! graph layer serializes them into the batch handed to the reconciliation
//! engine.

pub mod compute;
pub mod database;
pub mod network;
pub mod queue;
pub mod secret;
pub mod service;
pub mod storage;

pub use compute::{BastionSpec, ComputeUnitSpec, QueueSourceSpec, ScheduleSpec};
pub use database::DatabaseSpec;
pub use network::{
    IngressPeer, IngressRule, NetworkSpec, Protocol, SecurityGroupRole, SecurityGroupSpec,
    SubnetSpec, SubnetTier,
};
pub use queue::{QueueSpec, RedrivePolicy};
pub use secret::{SecretRef, SecretScope, SecretSpec, SecretTemplate};
pub use service::{
    ClusterSpec, CpuScalingSpec, HealthCheckSpec, ListenerAction, ListenerSpec, LoadBalancerSpec,
    RepositorySpec, ServiceSpec, TaskSecret, TaskSpec,
};
pub use storage::{BucketSpec, ReplicationLink};
