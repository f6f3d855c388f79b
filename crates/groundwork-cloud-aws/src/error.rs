//! AWS provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("S3 request failed: {0}")]
    S3(String),

    #[error("IAM request failed: {0}")]
    Iam(String),

    #[error("Malformed replication configuration: {0}")]
    InvalidReplicationConfig(String),

    #[error("Role has no ARN in the response: {0}")]
    MissingRoleArn(String),
}

impl From<AwsError> for groundwork_cloud::CloudError {
    fn from(err: AwsError) -> Self {
        match err {
            AwsError::InvalidReplicationConfig(msg) => {
                groundwork_cloud::CloudError::InvalidConfig(msg)
            }
            other => groundwork_cloud::CloudError::ApiError(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AwsError>;
