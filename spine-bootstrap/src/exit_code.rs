// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Process Exit Codes
//!
//! Maps a [`SpineError`] onto a stable process exit code so shell scripts and
//! operators can distinguish "fix your config" from "retry me" from "the
//! request was bad" without parsing stderr.

use spine_domain::error::SpineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    ValidationError = 2,
    ConfigError = 3,
    AuthError = 4,
    Retryable = 5,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

/// Maps an error onto the code an operator should act on: a config mistake
/// and a transient upstream hiccup call for different responses.
pub fn map_error_to_exit_code(err: &SpineError) -> ExitCode {
    if err.is_retryable() {
        return ExitCode::Retryable;
    }
    match err {
        SpineError::Validation { .. } => ExitCode::ValidationError,
        SpineError::Config { .. } => ExitCode::ConfigError,
        SpineError::Auth { .. } => ExitCode::AuthError,
        _ => ExitCode::GeneralError,
    }
}

pub fn result_to_exit_code<T>(result: &Result<T, SpineError>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::Success,
        Err(err) => map_error_to_exit_code(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors_win_over_their_variant() {
        let err = SpineError::storage("connection reset", true);
        assert_eq!(map_error_to_exit_code(&err), ExitCode::Retryable);
    }

    #[test]
    fn validation_maps_to_validation_exit_code() {
        let err = SpineError::validation("bad partition key");
        assert_eq!(map_error_to_exit_code(&err), ExitCode::ValidationError);
    }

    #[test]
    fn success_maps_to_zero() {
        let result: Result<(), SpineError> = Ok(());
        assert_eq!(result_to_exit_code(&result), ExitCode::Success);
    }
}
