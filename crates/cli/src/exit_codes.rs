//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain    | Description                                       |
//! |---------|-----------|---------------------------------------------------|
//! | 0       | Universal | Success (every item ok)                           |
//! | 1       | check     | Discrepancies: mismatch, missing, invoice absent  |
//! | 2       | Universal | CLI usage error (bad args)                        |
//! | 3-9     | input     | Stuffing files and settings                       |
//! | 10-19   | source    | Reference table (sheet IN) access                 |
//! | 20-29   | serve     | HTTP service                                      |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use stuffcheck_recon::SourceError;

// =============================================================================
// Universal (0, 2)
// =============================================================================

/// Success - command completed, nothing to report.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Check (1)
// =============================================================================

/// Check found discrepancies: at least one item mismatched or missing, or
/// the invoice column does not exist. Like `diff(1)`, exit 1 means "differs".
pub const EXIT_CHECK_DISCREPANCY: u8 = 1;

// =============================================================================
// Input (3-9)
// =============================================================================

/// A stuffing file could not be read (missing, not a spreadsheet, corrupt).
pub const EXIT_INPUT_READ: u8 = 3;

/// Settings file unreadable or invalid.
pub const EXIT_CONFIG_INVALID: u8 = 4;

// =============================================================================
// Source (10-19)
// =============================================================================

/// Neither `source.path` nor `source.url` is configured.
pub const EXIT_SOURCE_NOT_CONFIGURED: u8 = 10;

/// The source URL needs a token and the token env var is unset.
pub const EXIT_SOURCE_CREDENTIALS: u8 = 11;

/// The reference workbook has no sheet with the configured name.
pub const EXIT_SOURCE_SHEET: u8 = 12;

/// The reference table could not be read or parsed.
pub const EXIT_SOURCE_READ: u8 = 13;

/// The remote spreadsheet service failed or was unreachable.
pub const EXIT_SOURCE_REMOTE: u8 = 14;

// =============================================================================
// Serve (20-29)
// =============================================================================

/// Could not bind the listen address.
pub const EXIT_SERVE_BIND: u8 = 20;

/// Map a SourceError to its exit code.
pub fn source_exit_code(err: &SourceError) -> u8 {
    match err {
        SourceError::NotConfigured => EXIT_SOURCE_NOT_CONFIGURED,
        SourceError::MissingCredentials(_) => EXIT_SOURCE_CREDENTIALS,
        SourceError::SheetNotFound(_) => EXIT_SOURCE_SHEET,
        SourceError::Read(_) => EXIT_SOURCE_READ,
        SourceError::Remote { .. } => EXIT_SOURCE_REMOTE,
    }
}
