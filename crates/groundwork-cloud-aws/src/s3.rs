//! S3-backed object storage operations.

use crate::error::AwsError;
use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::types::{
    BucketVersioningStatus, DeleteMarkerReplication, DeleteMarkerReplicationStatus, Destination,
    ReplicationConfiguration, ReplicationRule, ReplicationRuleFilter, ReplicationRuleStatus,
    VersioningConfiguration,
};
use groundwork_cloud::{ObjectStorageOps, VersioningStatus};

const REPLICATION_NOT_FOUND: &str = "ReplicationConfigurationNotFoundError";

/// [`ObjectStorageOps`] over the S3 API.
pub struct AwsObjectStorage {
    client: aws_sdk_s3::Client,
}

impl AwsObjectStorage {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

fn map_status(status: Option<&BucketVersioningStatus>) -> VersioningStatus {
    match status {
        Some(BucketVersioningStatus::Enabled) => VersioningStatus::Enabled,
        Some(BucketVersioningStatus::Suspended) => VersioningStatus::Suspended,
        _ => VersioningStatus::Unset,
    }
}

/// The unconditional replicate-all rule: empty prefix, all current objects.
fn replicate_all_rule(destination_arn: &str) -> Result<ReplicationRule, AwsError> {
    let destination = Destination::builder()
        .bucket(destination_arn)
        .build()
        .map_err(|e| AwsError::InvalidReplicationConfig(e.to_string()))?;

    ReplicationRule::builder()
        .status(ReplicationRuleStatus::Enabled)
        .priority(1)
        .filter(ReplicationRuleFilter::builder().prefix("").build())
        .delete_marker_replication(
            DeleteMarkerReplication::builder()
                .status(DeleteMarkerReplicationStatus::Disabled)
                .build(),
        )
        .destination(destination)
        .build()
        .map_err(|e| AwsError::InvalidReplicationConfig(e.to_string()))
}

#[async_trait]
impl ObjectStorageOps for AwsObjectStorage {
    async fn versioning_status(&self, bucket: &str) -> groundwork_cloud::Result<VersioningStatus> {
        let out = self
            .client
            .get_bucket_versioning()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| AwsError::S3(format!("{}", DisplayErrorContext(&e))))?;
        Ok(map_status(out.status()))
    }

    async fn enable_versioning(&self, bucket: &str) -> groundwork_cloud::Result<()> {
        tracing::info!("Enabling versioning on {bucket}");
        self.client
            .put_bucket_versioning()
            .bucket(bucket)
            .versioning_configuration(
                VersioningConfiguration::builder()
                    .status(BucketVersioningStatus::Enabled)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| AwsError::S3(format!("{}", DisplayErrorContext(&e))))?;
        Ok(())
    }

    async fn replication_role(&self, bucket: &str) -> groundwork_cloud::Result<Option<String>> {
        match self
            .client
            .get_bucket_replication()
            .bucket(bucket)
            .send()
            .await
        {
            Ok(out) => Ok(out
                .replication_configuration()
                .map(|config| config.role().to_string())),
            Err(e) if e.code() == Some(REPLICATION_NOT_FOUND) => Ok(None),
            Err(e) => {
                Err(AwsError::S3(format!("{}", DisplayErrorContext(&e))).into())
            }
        }
    }

    async fn put_replication(
        &self,
        bucket: &str,
        role_arn: &str,
        destination_arn: &str,
    ) -> groundwork_cloud::Result<()> {
        tracing::info!("Configuring replication {bucket} -> {destination_arn}");
        let config = ReplicationConfiguration::builder()
            .role(role_arn)
            .rules(replicate_all_rule(destination_arn)?)
            .build()
            .map_err(|e| AwsError::InvalidReplicationConfig(e.to_string()))?;

        self.client
            .put_bucket_replication()
            .bucket(bucket)
            .replication_configuration(config)
            .send()
            .await
            .map_err(|e| AwsError::S3(format!("{}", DisplayErrorContext(&e))))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_versioning_maps_to_unset() {
        assert_eq!(map_status(None), VersioningStatus::Unset);
        assert_eq!(
            map_status(Some(&BucketVersioningStatus::Enabled)),
            VersioningStatus::Enabled
        );
        assert_eq!(
            map_status(Some(&BucketVersioningStatus::Suspended)),
            VersioningStatus::Suspended
        );
    }

    #[test]
    fn replicate_all_rule_targets_the_destination_and_is_enabled() {
        let rule = replicate_all_rule("arn:aws:s3:::media-backup-dev").unwrap();
        let debug = format!("{rule:?}");
        assert!(debug.contains("Enabled"));
        assert!(debug.contains("arn:aws:s3:::media-backup-dev"));
        assert!(debug.contains("prefix: Some(\"\")"));
    }
}
