//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                                  |
//! |------|----------------------------------------------------------|
//! | 0    | Success                                                  |
//! | 1    | General error (unspecified)                              |
//! | 2    | CLI usage error (bad args, unsupported input format)     |
//! | 3    | I/O error (cannot read an input, cannot write an output) |
//! | 4    | Schema or data error (missing column, no header row,     |
//! |      | amount outside the decimal range)                        |
//! | 5    | Config error (invalid TOML or failed validation)         |
//!
//! Nothing is written to disk when any non-zero code is returned.

use oa2_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unsupported file extension.
pub const EXIT_USAGE: u8 = 2;

/// An input could not be read or an output could not be written.
pub const EXIT_IO: u8 = 3;

/// A snapshot lacks a required column, has no header row, or holds an
/// amount (or amount total) outside the decimal range.
pub const EXIT_SCHEMA: u8 = 4;

/// Config file failed to parse or validate.
pub const EXIT_CONFIG: u8 = 5;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_CONFIG,
        ReconError::MissingColumn { .. }
        | ReconError::EmptyHeader { .. }
        | ReconError::AmountOverflow { .. } => EXIT_SCHEMA,
        ReconError::Io(_) => EXIT_IO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oa2_recon::Snapshot;

    #[test]
    fn engine_errors_map_to_registry() {
        assert_eq!(recon_exit_code(&ReconError::ConfigParse("x".into())), EXIT_CONFIG);
        assert_eq!(recon_exit_code(&ReconError::ConfigValidation("x".into())), EXIT_CONFIG);
        assert_eq!(
            recon_exit_code(&ReconError::MissingColumn {
                snapshot: Snapshot::Past,
                column: "MONTO".into(),
            }),
            EXIT_SCHEMA
        );
        assert_eq!(
            recon_exit_code(&ReconError::EmptyHeader { snapshot: Snapshot::Current }),
            EXIT_SCHEMA
        );
        assert_eq!(
            recon_exit_code(&ReconError::AmountOverflow { snapshot: None }),
            EXIT_SCHEMA
        );
        assert_eq!(recon_exit_code(&ReconError::Io("x".into())), EXIT_IO);
    }
}
