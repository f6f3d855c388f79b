//! Ordered bucket-replication workflow.
//!
//! Replication is the one place the declarative model is not enough: the
//! storage API rejects a replication configuration unless the source bucket's
//! versioning state already reads back `Enabled`. The configurator makes that
//! ordering explicit: step (c) is only issued after step (b) has been
//! observed complete, never concurrently.

use crate::error::{CloudError, Result};
use crate::provider::{ObjectStorageOps, ReplicationRoleOps, RetryConfig, VersioningStatus};

/// Request to wire one source bucket to one destination.
#[derive(Debug, Clone)]
pub struct ReplicationRequest {
    pub source: String,
    pub destination: String,
    pub role_name: String,
}

impl ReplicationRequest {
    fn source_arn(&self) -> String {
        format!("arn:aws:s3:::{}", self.source)
    }

    fn destination_arn(&self) -> String {
        format!("arn:aws:s3:::{}", self.destination)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicationOutcome {
    Configured,
    /// The pair was already wired; the whole run was a no-op.
    AlreadyConfigured,
}

/// Two-step replication configurator.
///
/// Sequence per [`configure`](Self::configure):
/// (a) ensure the replication role, scoped to exactly the two bucket ARNs;
/// (b) confirm versioning enabled on the source, blocking until the status
///     reads back `Enabled`;
/// (c) put the replicate-all configuration referencing role and destination.
///
/// Postcondition of (b) is the precondition of (c); the configurator never
/// submits them concurrently.
pub struct ReplicationConfigurator<'a> {
    storage: &'a dyn ObjectStorageOps,
    roles: &'a dyn ReplicationRoleOps,
    retry: RetryConfig,
}

impl<'a> ReplicationConfigurator<'a> {
    pub fn new(storage: &'a dyn ObjectStorageOps, roles: &'a dyn ReplicationRoleOps) -> Self {
        Self {
            storage,
            roles,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Run the full sequence. Idempotent: an already-configured pair returns
    /// [`ReplicationOutcome::AlreadyConfigured`] without further API calls.
    pub async fn configure(&self, request: &ReplicationRequest) -> Result<ReplicationOutcome> {
        if self.storage.replication_role(&request.source).await?.is_some() {
            tracing::debug!(
                "Replication {} -> {} already configured",
                request.source,
                request.destination
            );
            return Ok(ReplicationOutcome::AlreadyConfigured);
        }

        // (a) role scoped to exactly this bucket pair
        let role_arn = self
            .roles
            .ensure_role(
                &request.role_name,
                &request.source_arn(),
                &request.destination_arn(),
            )
            .await?;

        // (b) blocks until versioning is confirmed
        self.confirm_versioning(&request.source).await?;

        // (c) only reachable once (b) has completed
        self.storage
            .put_replication(&request.source, &role_arn, &request.destination_arn())
            .await?;

        tracing::info!(
            "Configured replication {} -> {}",
            request.source,
            request.destination
        );
        Ok(ReplicationOutcome::Configured)
    }

    /// Enable versioning on the bucket and poll until the storage service
    /// reports it `Enabled`.
    async fn confirm_versioning(&self, bucket: &str) -> Result<()> {
        if self.storage.versioning_status(bucket).await? == VersioningStatus::Enabled {
            return Ok(());
        }

        self.storage.enable_versioning(bucket).await?;

        for attempt in 0..self.retry.max_attempts {
            if self.storage.versioning_status(bucket).await? == VersioningStatus::Enabled {
                return Ok(());
            }
            tokio::time::sleep(self.retry.delay_for(attempt)).await;
        }

        Err(CloudError::OrderingViolation(format!(
            "versioning on {bucket} did not reach Enabled; refusing to configure replication"
        )))
    }
}
