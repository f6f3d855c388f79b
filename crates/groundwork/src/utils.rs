use groundwork_core::Environment;

/// Resolve the active environment from the CLI input.
///
/// Defaults to `dev` when nothing was given; any unknown name is rejected by
/// the fail-closed parse before a single resource is declared.
pub fn determine_environment(name: Option<String>) -> anyhow::Result<Environment> {
    match name {
        Some(name) => Ok(name.parse()?),
        None => Ok(Environment::Dev),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_name_defaults_to_dev() {
        assert_eq!(determine_environment(None).unwrap(), Environment::Dev);
    }

    #[test]
    fn unknown_name_is_an_error() {
        let err = determine_environment(Some("staging".to_string())).unwrap_err();
        assert!(err.to_string().contains("Unknown environment"));
    }
}
