//! CLI Exit Code Registry
//!
//! Single source of truth for `rlink` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                                  |
//! |------|----------------------------------------------------------|
//! | 0    | Success                                                  |
//! | 1    | General error (unspecified)                              |
//! | 2    | Usage error (bad args, unknown scorer name)              |
//! | 3    | Invalid job config (parse or validation failure)         |
//! | 4    | Runtime error (unreadable file, bad CSV, write failure)  |
//! | 5    | `--strict` run left at least one anchor unlinked         |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant with the next free number
//! 2. Document what triggers it
//! 3. Update the table above

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments.
pub const EXIT_USAGE: u8 = 2;

/// Job config could not be parsed or failed validation.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// I/O or CSV failure while loading inputs or writing output.
pub const EXIT_RUNTIME: u8 = 4;

/// `--strict` and some anchor is not fully linked.
pub const EXIT_UNLINKED: u8 = 5;
