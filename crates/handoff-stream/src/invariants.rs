//! Debug assertion macros for the writer/stream bridge.
//!
//! They are only active in debug builds (`#[cfg(debug_assertions)]`), so there is
//! zero overhead in release builds.

// =============================================================================
// INV-STREAM-01: No Delivery After Termination
// =============================================================================

/// Assert that a chunk is only yielded while the stream is running.
///
/// **Invariant**: `terminated → poll_next returns None`
///
/// Used in: `OutputStreamSource::poll_next()` before yielding a chunk
macro_rules! debug_assert_running {
    ($terminated:expr) => {
        debug_assert!(
            !$terminated,
            "INV-STREAM-01 violated: chunk delivered after the stream terminated"
        )
    };
}

// =============================================================================
// INV-STREAM-02: Shutdown Releases The Writer
// =============================================================================

/// Assert that shutdown left the guard canceled and the queue poisoned.
///
/// **Invariant**: `shutdown → status = Canceled ∧ queue poisoned`
///
/// Used in: `OutputStreamSource::shutdown()`
macro_rules! debug_assert_shutdown_complete {
    ($canceled:expr, $poisoned:expr) => {
        debug_assert!(
            $canceled && $poisoned,
            "INV-STREAM-02 violated: shutdown left canceled={} poisoned={}",
            $canceled,
            $poisoned
        )
    };
}

// =============================================================================
// INV-CTL-01: At Most One Live Request Per Kind
// =============================================================================

/// Assert that a superseded control request had no listener left.
///
/// **Invariant**: `pending(kind) replaced → old request abandoned (timed out)`
///
/// With a single writer thread a live same-kind request cannot exist when a
/// new one arrives, because the writer is parked on the first one.
///
/// Used in: `OutputStreamSource::register()`
macro_rules! debug_assert_superseded_abandoned {
    ($kind:expr, $abandoned:expr) => {
        debug_assert!(
            $abandoned,
            "INV-CTL-01 violated: {:?} request replaced while its writer was still waiting",
            $kind
        )
    };
}

pub(crate) use debug_assert_running;
pub(crate) use debug_assert_shutdown_complete;
pub(crate) use debug_assert_superseded_abandoned;
