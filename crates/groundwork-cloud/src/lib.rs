//! groundwork provisioning operations
//!
//! This crate is the boundary between the declarative topology and the cloud.
//! The topology compiles to a [`ResourceBatch`] that is submitted wholesale to
//! a [`ReconcileEngine`], the provider's own reconciliation machinery, which
//! resolves cross-resource references by its own topological sort. The one
//! thing that machinery cannot express is the ordered
//! versioning-before-replication sequence, which lives here as an explicit
//! workflow ([`ReplicationConfigurator`]) over narrow side-effect traits.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  ground CLI                      │
//! │              (ground up / down)                  │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │              groundwork-cloud                    │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  trait ReconcileEngine   (batch submit)   │   │
//! │  │  trait ObjectStorageOps  (ordered steps)  │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │ Replication  │  │  State Mgmt  │            │
//! │  │  workflow    │  │              │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼───────────┐
//! │ groundwork-cloud- │
//! │   aws (S3 + IAM)  │
//! └───────────────────┘
//! ```

pub mod action;
pub mod error;
pub mod provider;
pub mod replication;
pub mod state;

// Re-exports
pub use action::{Action, ActionResult, ActionType, ApplyResult, Plan, PlanSummary};
pub use error::{CloudError, Result};
pub use provider::{
    AuthStatus, FileEngine, GrantDecl, ObjectStorageOps, ReconcileEngine, ReplicationRoleOps,
    ResourceBatch, ResourceDecl, RetryConfig, VersioningStatus,
};
pub use replication::{ReplicationConfigurator, ReplicationOutcome, ReplicationRequest};
pub use state::{ProvisionState, ResourceRecord, StateLock, StateManager};
