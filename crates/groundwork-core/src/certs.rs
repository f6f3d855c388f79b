//! TLS certificate lookup.
//!
//! Certificates are issued out-of-band; this table only maps an environment to
//! the certificate reference the load balancer terminates TLS with.

use crate::environment::Environment;
use crate::error::{CoreError, Result};
use std::collections::HashMap;

/// Environment-keyed table of TLS certificate references.
///
/// Entries are external input, read from `GROUNDWORK_CERT_ARN_<ENV>`. A
/// missing entry for the active environment is a fatal configuration error,
/// never a silent plaintext-only listener.
#[derive(Debug, Clone, Default)]
pub struct CertificateTable {
    entries: HashMap<Environment, String>,
}

impl CertificateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the table from the process environment
    /// (`GROUNDWORK_CERT_ARN_DEV`, `GROUNDWORK_CERT_ARN_PROD`).
    pub fn from_env() -> Self {
        let mut table = Self::new();
        for env in Environment::ALL {
            let var = format!("GROUNDWORK_CERT_ARN_{}", env.as_str().to_uppercase());
            if let Ok(arn) = std::env::var(&var) {
                tracing::debug!("Certificate for {} from {}", env, var);
                table.insert(env, arn);
            }
        }
        table
    }

    pub fn insert(&mut self, env: Environment, arn: impl Into<String>) {
        self.entries.insert(env, arn.into());
    }

    /// Resolve the certificate for an environment, failing closed when absent.
    pub fn lookup(&self, env: Environment) -> Result<&str> {
        self.entries
            .get(&env)
            .map(String::as_str)
            .ok_or_else(|| CoreError::CertificateMissing(env.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn lookup_fails_closed_when_missing() {
        let table = CertificateTable::new();
        let err = table.lookup(Environment::Prod).unwrap_err();
        assert!(matches!(err, CoreError::CertificateMissing(env) if env == "prod"));
    }

    #[test]
    fn lookup_returns_inserted_entry() {
        let mut table = CertificateTable::new();
        table.insert(Environment::Dev, "arn:aws:acm:us-east-1:111:certificate/dev");
        assert_eq!(
            table.lookup(Environment::Dev).unwrap(),
            "arn:aws:acm:us-east-1:111:certificate/dev"
        );
    }

    #[test]
    #[serial]
    fn from_env_reads_per_environment_variables() {
        unsafe {
            std::env::set_var("GROUNDWORK_CERT_ARN_DEV", "arn:dev-cert");
            std::env::remove_var("GROUNDWORK_CERT_ARN_PROD");
        }

        let table = CertificateTable::from_env();
        assert_eq!(table.lookup(Environment::Dev).unwrap(), "arn:dev-cert");
        assert!(table.lookup(Environment::Prod).is_err());

        unsafe {
            std::env::remove_var("GROUNDWORK_CERT_ARN_DEV");
        }
    }
}
