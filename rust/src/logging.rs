//! Logging macros for the scheduler with verbosity level control.
//!
//! Provides zero-cost logging when disabled (verbosity=0).
//! Verbosity levels match the shadow tooling's logger:
//! - 0: SILENT (only errors)
//! - 1: CHANGES (task commits, makespan)
//! - 2: CHECKS (candidate machine evaluations)
//! - 3: DEBUG (gap search and rank table internals)

/// Verbosity level constants.
pub const VERBOSITY_SILENT: u8 = 0;
pub const VERBOSITY_CHANGES: u8 = 1;
pub const VERBOSITY_CHECKS: u8 = 2;
pub const VERBOSITY_DEBUG: u8 = 3;

/// Log at CHANGES level (verbosity >= 1).
///
/// Used for: task commits and the final makespan.
#[macro_export]
macro_rules! log_changes {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_CHANGES {
            eprintln!($($arg)*);
        }
    };
}

/// Log at CHECKS level (verbosity >= 2).
///
/// Used for: per-machine EST/EFT candidates and the winning choice.
#[macro_export]
macro_rules! log_checks {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_CHECKS {
            eprintln!($($arg)*);
        }
    };
}

/// Log at DEBUG level (verbosity >= 3).
///
/// Used for: gap search steps, rank and OCT values.
#[macro_export]
macro_rules! log_debug {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_DEBUG {
            eprintln!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_ordering() {
        assert!(VERBOSITY_SILENT < VERBOSITY_CHANGES);
        assert!(VERBOSITY_CHANGES < VERBOSITY_CHECKS);
        assert!(VERBOSITY_CHECKS < VERBOSITY_DEBUG);
    }

    #[test]
    fn test_log_macros_compile() {
        let verbosity = VERBOSITY_SILENT;
        log_changes!(verbosity, "task {} committed", 1);
        log_checks!(verbosity, "machine {} eft={}", 0, 12);
        log_debug!(verbosity, "gap [{}, {:?})", 3, Some(9));
    }
}
