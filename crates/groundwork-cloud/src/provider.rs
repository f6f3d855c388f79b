//! Engine and side-effect trait definitions.

use crate::action::ApplyResult;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The external reconciliation engine.
///
/// The engine owns resource creation: it receives the whole declarative batch
/// at once, resolves the dependency edges by its own topological sort, and
/// eventually either creates every requested resource or reports failure.
/// Failures are surfaced verbatim; siblings that were already created are
/// left in place for inspection.
#[async_trait]
pub trait ReconcileEngine: Send + Sync {
    /// Engine name (e.g. "file", "cloudformation").
    fn name(&self) -> &str;

    /// Check that the engine is reachable and authenticated.
    async fn check_auth(&self) -> Result<AuthStatus>;

    /// Submit the declarative resource batch.
    async fn submit(&self, batch: &ResourceBatch) -> Result<ApplyResult>;

    /// Tear down one resource. Callers must never pass retained resources.
    async fn destroy(&self, resource_key: &str) -> Result<()>;
}

/// Authentication status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    pub authenticated: bool,
    pub account_info: Option<String>,
    pub error: Option<String>,
}

impl AuthStatus {
    pub fn ok(account_info: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            account_info: Some(account_info.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            account_info: None,
            error: Some(error.into()),
        }
    }
}

/// Declarative batch submitted to the engine: the serialized form of the
/// topology's resource graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceBatch {
    pub environment: String,
    pub resources: Vec<ResourceDecl>,
    /// Access grants. Kept flat so a grant can name a resource that only
    /// exists outside this batch (a late-bound secret reference).
    #[serde(default)]
    pub grants: Vec<GrantDecl>,
    /// Stack outputs by name (bucket names, host ids).
    #[serde(default)]
    pub outputs: Vec<(String, String)>,
}

impl ResourceBatch {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            resources: Vec::new(),
            grants: Vec::new(),
            outputs: Vec::new(),
        }
    }
}

/// One declared resource with its outbound dependency edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDecl {
    pub resource_type: String,
    pub id: String,
    pub spec: serde_json::Value,
    /// Keys of resources this one depends on.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl ResourceDecl {
    pub fn new(
        resource_type: impl Into<String>,
        id: impl Into<String>,
        spec: serde_json::Value,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
            spec,
            depends_on: Vec::new(),
        }
    }

    /// Full resource key (type:id).
    pub fn key(&self) -> String {
        format!("{}:{}", self.resource_type, self.id)
    }
}

/// A declared access grant from a resource to a consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantDecl {
    pub resource: String,
    pub grantee: String,
    pub access: String,
}

/// Versioning state reported by the object store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersioningStatus {
    Enabled,
    Suspended,
    /// Versioning has never been configured on the bucket.
    Unset,
}

/// The object-store operations the ordered replication workflow needs.
///
/// Deliberately narrow: everything else about buckets is declarative and
/// belongs in the batch.
#[async_trait]
pub trait ObjectStorageOps: Send + Sync {
    async fn versioning_status(&self, bucket: &str) -> Result<VersioningStatus>;

    async fn enable_versioning(&self, bucket: &str) -> Result<()>;

    /// Role ARN of the bucket's current replication configuration, if any.
    async fn replication_role(&self, bucket: &str) -> Result<Option<String>>;

    /// Install a replicate-all configuration. Precondition: versioning on
    /// `bucket` reads back `Enabled`; the storage API rejects the call
    /// otherwise.
    async fn put_replication(
        &self,
        bucket: &str,
        role_arn: &str,
        destination_arn: &str,
    ) -> Result<()>;
}

/// Management of the replication role.
#[async_trait]
pub trait ReplicationRoleOps: Send + Sync {
    /// Ensure a role trusted by the storage service exists, scoped to
    /// read-on-source / read-write-on-destination for exactly the two given
    /// bucket ARNs. Returns the role ARN. Idempotent.
    async fn ensure_role(
        &self,
        role_name: &str,
        source_arn: &str,
        destination_arn: &str,
    ) -> Result<String>;
}

/// Retry configuration for provider operations.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay: std::time::Duration,
    pub max_delay: std::time::Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: std::time::Duration::from_secs(1),
            max_delay: std::time::Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay before the given zero-based attempt, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> std::time::Duration {
        let factor = self.backoff_multiplier.powi(attempt as i32);
        let delay = self.initial_delay.mul_f64(factor);
        delay.min(self.max_delay)
    }
}

/// Engine that writes the batch to disk for an out-of-process reconciler.
///
/// Used by `ground up`: the durable handoff format is one JSON document per
/// environment under the output directory. Destroys are recorded as log
/// lines only; actual teardown belongs to the external engine.
pub struct FileEngine {
    out_dir: PathBuf,
}

impl FileEngine {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    fn batch_path(&self, environment: &str) -> PathBuf {
        self.out_dir.join(format!("batch-{environment}.json"))
    }
}

#[async_trait]
impl ReconcileEngine for FileEngine {
    fn name(&self) -> &str {
        "file"
    }

    async fn check_auth(&self) -> Result<AuthStatus> {
        Ok(AuthStatus::ok("local filesystem"))
    }

    async fn submit(&self, batch: &ResourceBatch) -> Result<ApplyResult> {
        let start = std::time::Instant::now();
        tokio::fs::create_dir_all(&self.out_dir).await?;

        let path = self.batch_path(&batch.environment);
        let content = serde_json::to_string_pretty(batch)?;
        tokio::fs::write(&path, content).await?;
        tracing::info!(
            "Submitted {} resources to {}",
            batch.resources.len(),
            path.display()
        );

        let mut result = ApplyResult::new();
        for decl in &batch.resources {
            result.add_success(format!("create-{}", decl.key()), format!("declared {}", decl.key()));
        }
        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }

    async fn destroy(&self, resource_key: &str) -> Result<()> {
        tracing::info!("Marked {} for teardown", resource_key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_delay_backs_off_and_caps() {
        let retry = RetryConfig::default();
        assert!(retry.delay_for(0) < retry.delay_for(1));
        assert!(retry.delay_for(10) <= retry.max_delay);
    }

    #[tokio::test]
    async fn file_engine_writes_one_batch_per_environment() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FileEngine::new(dir.path());

        let mut batch = ResourceBatch::new("dev");
        batch
            .resources
            .push(ResourceDecl::new("bucket", "media-dev", serde_json::json!({})));

        let result = engine.submit(&batch).await.unwrap();
        assert!(result.is_success());
        assert!(dir.path().join("batch-dev.json").exists());
    }
}
