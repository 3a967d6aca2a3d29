//! Exit code standardization for spotctl
//!
//! - `0` = Success
//! - `1` = User error (invalid input, validation failure, unknown profile)
//! - `2` = System error (AWS API failure, network error, I/O)
//! - `3` = Configuration error (config parse error, invalid config value)

use crate::error::SpotctlError;

/// Standard exit codes for spotctl
pub mod codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 1;
    pub const SYSTEM_ERROR: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
}

/// Map a SpotctlError to an appropriate exit code
pub fn exit_code_for_error(error: &SpotctlError) -> i32 {
    use SpotctlError::*;
    match error {
        Config(_) => codes::CONFIG_ERROR,

        Validation { .. } => codes::USER_ERROR,
        InvalidInput(_) => codes::USER_ERROR,
        ProfileNotFound { .. } => codes::USER_ERROR,
        ResourceNotFound { .. } => codes::USER_ERROR,

        CloudProvider { .. } => codes::SYSTEM_ERROR,
        Aws(_) => codes::SYSTEM_ERROR,
        Io(_) => codes::SYSTEM_ERROR,
        Retryable { .. } => codes::SYSTEM_ERROR,
        Json(_) => codes::SYSTEM_ERROR,
    }
}

/// Exit code for any error reaching `main`
///
/// Looks for a `SpotctlError` anywhere in the chain, so context added with
/// `anyhow::Context` does not change the code.
pub fn exit_code_for_anyhow(error: &anyhow::Error) -> i32 {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<SpotctlError>())
        .map(exit_code_for_error)
        .unwrap_or(codes::USER_ERROR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::pricing::InvalidInputError;
    use anyhow::Context;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            exit_code_for_error(&ConfigError::ParseError("x".into()).into()),
            codes::CONFIG_ERROR
        );
        assert_eq!(
            exit_code_for_error(&InvalidInputError::EmptyHistory.into()),
            codes::USER_ERROR
        );
        assert_eq!(
            exit_code_for_error(&SpotctlError::Aws("denied".into())),
            codes::SYSTEM_ERROR
        );
    }

    #[test]
    fn test_exit_code_through_context() {
        let result: std::result::Result<(), SpotctlError> =
            Err(ConfigError::MissingField("profiles.gpu.image_id".into()).into());
        let err = result.context("Failed to load config").unwrap_err();
        assert_eq!(exit_code_for_anyhow(&err), codes::CONFIG_ERROR);

        assert_eq!(exit_code_for_anyhow(&anyhow::anyhow!("plain")), codes::USER_ERROR);
    }
}
