//! Object storage model.

use crate::environment::Environment;
use crate::policy::{RemovalPolicy, ResourceKind, SizingPolicy};
use serde::{Deserialize, Serialize};

/// A storage bucket. Encryption at rest and the public-access block are
/// unconditional; only retention and removal vary by environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketSpec {
    pub name: String,
    pub versioned: bool,
    pub encrypted: bool,
    pub block_public_access: bool,
    pub noncurrent_version_expiry_days: Option<u32>,
    pub removal_policy: RemovalPolicy,
}

impl BucketSpec {
    /// A data bucket: versioned, encrypted, lifecycle-managed per policy.
    pub fn data_bucket(name: impl Into<String>, env: Environment) -> Self {
        let policy = SizingPolicy::lookup(ResourceKind::Bucket, env);
        Self {
            name: name.into(),
            versioned: true,
            encrypted: true,
            block_public_access: true,
            noncurrent_version_expiry_days: Some(policy.noncurrent_version_expiry_days),
            removal_policy: policy.removal_policy,
        }
    }

    /// The deployable-artifact bucket. Always versioned and always retained:
    /// worker code lives here, and losing old versions would break rollback
    /// of the compute units.
    pub fn artifact_bucket(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            versioned: true,
            encrypted: true,
            block_public_access: true,
            noncurrent_version_expiry_days: None,
            removal_policy: RemovalPolicy::Retain,
        }
    }

    /// ARN of the bucket as the storage service names it.
    pub fn arn(&self) -> String {
        format!("arn:aws:s3:::{}", self.name)
    }
}

/// Asynchronous copy-on-write relationship from exactly one source bucket to
/// exactly one destination, via one role scoped to read-source /
/// write-destination.
///
/// Applying the replication configuration before versioning is confirmed
/// enabled on the source is a hard failure of the storage API; the ordered
/// workflow in `groundwork-cloud` enforces that sequencing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationLink {
    pub source: String,
    pub destination: String,
    pub role_name: String,
}

impl ReplicationLink {
    pub fn new(env: Environment, source: &BucketSpec, destination: &BucketSpec) -> Self {
        Self {
            source: source.name.clone(),
            destination: destination.name.clone(),
            role_name: format!("groundwork-replication-{env}"),
        }
    }
}
