//! IAM-backed replication role management.

use crate::error::AwsError;
use async_trait::async_trait;
use aws_sdk_iam::error::{DisplayErrorContext, ProvideErrorMetadata};
use groundwork_cloud::ReplicationRoleOps;
use serde_json::json;

const ROLE_EXISTS: &str = "EntityAlreadyExists";
const POLICY_NAME: &str = "bucket-replication";

/// [`ReplicationRoleOps`] over the IAM API.
pub struct AwsReplicationRoles {
    client: aws_sdk_iam::Client,
}

impl AwsReplicationRoles {
    pub fn new(client: aws_sdk_iam::Client) -> Self {
        Self { client }
    }
}

/// Trust policy allowing the storage service to assume the role.
fn trust_policy() -> String {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Principal": { "Service": "s3.amazonaws.com" },
            "Action": "sts:AssumeRole"
        }]
    })
    .to_string()
}

/// Read-on-source / write-on-destination, scoped to exactly the two bucket
/// ARNs. Everything the replication engine needs and nothing else.
fn replication_policy(source_arn: &str, destination_arn: &str) -> String {
    json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Effect": "Allow",
                "Action": [
                    "s3:GetReplicationConfiguration",
                    "s3:ListBucket"
                ],
                "Resource": source_arn
            },
            {
                "Effect": "Allow",
                "Action": [
                    "s3:GetObjectVersionForReplication",
                    "s3:GetObjectVersionAcl",
                    "s3:GetObjectVersionTagging"
                ],
                "Resource": format!("{source_arn}/*")
            },
            {
                "Effect": "Allow",
                "Action": [
                    "s3:ReplicateObject",
                    "s3:ReplicateDelete",
                    "s3:ReplicateTags"
                ],
                "Resource": format!("{destination_arn}/*")
            }
        ]
    })
    .to_string()
}

#[async_trait]
impl ReplicationRoleOps for AwsReplicationRoles {
    async fn ensure_role(
        &self,
        role_name: &str,
        source_arn: &str,
        destination_arn: &str,
    ) -> groundwork_cloud::Result<String> {
        let arn = match self
            .client
            .create_role()
            .role_name(role_name)
            .assume_role_policy_document(trust_policy())
            .send()
            .await
        {
            Ok(out) => {
                tracing::info!("Created replication role {role_name}");
                out.role()
                    .map(|role| role.arn().to_string())
                    .ok_or_else(|| AwsError::MissingRoleArn(role_name.to_string()))?
            }
            Err(e) if e.code() == Some(ROLE_EXISTS) => {
                let out = self
                    .client
                    .get_role()
                    .role_name(role_name)
                    .send()
                    .await
                    .map_err(|e| AwsError::Iam(format!("{}", DisplayErrorContext(&e))))?;
                out.role()
                    .map(|role| role.arn().to_string())
                    .ok_or_else(|| AwsError::MissingRoleArn(role_name.to_string()))?
            }
            Err(e) => {
                return Err(AwsError::Iam(format!("{}", DisplayErrorContext(&e))).into());
            }
        };

        // PutRolePolicy replaces the named policy in place, so re-running
        // converges on the same scoped document.
        self.client
            .put_role_policy()
            .role_name(role_name)
            .policy_name(POLICY_NAME)
            .policy_document(replication_policy(source_arn, destination_arn))
            .send()
            .await
            .map_err(|e| AwsError::Iam(format!("{}", DisplayErrorContext(&e))))?;

        Ok(arn)
    }
}
