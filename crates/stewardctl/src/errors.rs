//! Exit status for stewardctl

/// Success, or the user chose to quit
pub const EXIT_SUCCESS: i32 = 0;

/// Configuration, session or I/O errors
pub const EXIT_GENERAL_ERROR: i32 = 1;

/// A maintenance action failed for at least one client
pub const EXIT_MAINTENANCE_FAILED: i32 = 3;
