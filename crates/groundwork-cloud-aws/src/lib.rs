//! AWS operations for groundwork
//!
//! Implements the narrow side-effect traits from `groundwork-cloud` on the
//! AWS SDK: bucket versioning and replication configuration against S3, and
//! the replication role against IAM. Everything declarative stays in the
//! batch; only the ordered replication workflow reaches these clients.

pub mod error;
pub mod iam;
pub mod s3;

// Re-exports
pub use error::AwsError;
pub use iam::AwsReplicationRoles;
pub use s3::AwsObjectStorage;

/// Build the S3 and IAM clients from the ambient AWS configuration
/// (environment, shared credentials file, instance metadata).
pub async fn clients() -> (aws_sdk_s3::Client, aws_sdk_iam::Client) {
    let config = aws_config::load_from_env().await;
    (
        aws_sdk_s3::Client::new(&config),
        aws_sdk_iam::Client::new(&config),
    )
}
