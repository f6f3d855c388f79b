//! Secret store model.
//!
//! Secrets are referenced by name, never by value. Consumers receive
//! individual read grants; the grant scope distinguishes bundle-wide reads
//! from single-field reads.

use crate::environment::Environment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a secret's value comes into existence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SecretTemplate {
    /// The store generates the named field and merges it over the fixed
    /// fields at creation time.
    Generated {
        fields: BTreeMap<String, String>,
        generate_key: String,
        exclude_punctuation: bool,
    },
    /// Created empty; an operator populates the listed fields out-of-band.
    External { fields: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretSpec {
    pub name: String,
    pub template: SecretTemplate,
}

impl SecretSpec {
    /// The generated database credential pair. The password excludes
    /// punctuation so it can be embedded in connection strings unescaped.
    pub fn db_credentials(env: Environment) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert("username".to_string(), "postgres".to_string());
        Self {
            name: format!("groundwork/{env}/shared/db-credentials"),
            template: SecretTemplate::Generated {
                fields,
                generate_key: "password".to_string(),
                exclude_punctuation: true,
            },
        }
    }

    /// The application secret bundle owned by the web stack. Created empty;
    /// third-party credentials and the externally-reachable base URL are
    /// populated by an operator.
    pub fn app_bundle(env: Environment) -> Self {
        Self {
            name: Self::app_bundle_name(env),
            template: SecretTemplate::External {
                fields: vec![
                    "base_url".to_string(),
                    "api_key".to_string(),
                    "oauth_client_id".to_string(),
                    "oauth_client_secret".to_string(),
                    "messaging_token".to_string(),
                ],
            },
        }
    }

    /// Predictable name of the application bundle, stable across stack
    /// ordering. Consumers built before the web stack resolve the bundle by
    /// this name.
    pub fn app_bundle_name(env: Environment) -> String {
        format!("groundwork/{env}/web/app-secrets")
    }
}

/// Scope of a read grant on a secret.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretScope {
    /// The whole bundle.
    Full,
    /// One named field only.
    Field(String),
}

/// Two-phase reference to a secret.
///
/// `Handle` when the producing stack has already run in this process and the
/// spec exists as a first-class object; `Named` when the consumer is composed
/// first and must resolve the secret by its predictable name. The variant
/// makes the late-binding contract explicit instead of implying it from
/// instantiation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "phase", content = "name")]
pub enum SecretRef {
    Handle(String),
    Named(String),
}

impl SecretRef {
    pub fn from_spec(spec: &SecretSpec) -> Self {
        SecretRef::Handle(spec.name.clone())
    }

    /// The name the reference resolves to, regardless of phase.
    pub fn resolved_name(&self) -> &str {
        match self {
            SecretRef::Handle(name) | SecretRef::Named(name) => name,
        }
    }

    pub fn is_late_bound(&self) -> bool {
        matches!(self, SecretRef::Named(_))
    }
}
