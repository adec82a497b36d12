//! Exit code standardization for wastectl
//!
//! Provides consistent exit codes for different error types so scripts
//! driving the CLI can tell bad input from a broken environment.
//!
//! ## Exit Code Convention
//!
//! - `0` = Success
//! - `1` = User error (invalid input, resource record missing a required attribute)
//! - `2` = System error (I/O, JSON, pricing source failure)
//! - `3` = Configuration error (config parse error, invalid limits, bad pricing override)

use crate::error::WastectlError;

/// Standard exit codes for wastectl
pub mod codes {
    /// Success
    pub const SUCCESS: i32 = 0;
    /// User error (invalid input, validation failure)
    pub const USER_ERROR: i32 = 1;
    /// System error (I/O, pricing API failure)
    pub const SYSTEM_ERROR: i32 = 2;
    /// Configuration error (unparseable config or pricing table)
    pub const CONFIG_ERROR: i32 = 3;
}

/// Map a WastectlError to an appropriate exit code
pub fn exit_code_for_error(error: &WastectlError) -> i32 {
    use WastectlError::*;
    match error {
        Config(_) => codes::CONFIG_ERROR,

        Validation { .. } => codes::USER_ERROR,
        MissingAttribute { .. } => codes::USER_ERROR,

        PricingSource { .. } => codes::SYSTEM_ERROR,
        Io(_) => codes::SYSTEM_ERROR,
        Json(_) => codes::SYSTEM_ERROR,
    }
}

/// Exit code for an error that reached the CLI boundary
///
/// Falls back to `SYSTEM_ERROR` when the chain holds no `WastectlError`.
pub fn exit_code_for_anyhow(error: &anyhow::Error) -> i32 {
    error
        .chain()
        .find_map(|e| e.downcast_ref::<WastectlError>())
        .map(exit_code_for_error)
        .unwrap_or(codes::SYSTEM_ERROR)
}
