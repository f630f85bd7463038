//! Exit codes used by the dispatcher
//!
//! Only dispatcher-level outcomes live here. A delegated subcommand's exit code is
//! passed through untouched.

/// Successful termination (help, version, completions)
pub const OK: i32 = 0;

/// Any dispatcher-level failure: unknown command, missing executable, bad option
pub const FAILURE: i32 = 1;

/// Base for "terminated by signal N" (shell convention: 128 + N)
pub const SIGNAL_BASE: i32 = 128;
