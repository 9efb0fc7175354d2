//! Debug assertion macros for handoff queue invariants.
//!
//! They are only active in debug builds (`#[cfg(debug_assertions)]`), so there is
//! zero overhead in release builds.

// =============================================================================
// INV-Q-01: Bounded Count
// =============================================================================

/// Assert that the number of buffered items never exceeds capacity.
///
/// **Invariant**: `0 ≤ len ≤ capacity` (the poison slot is not counted)
///
/// Used in: `HandoffQueue::put_inner()` after pushing
macro_rules! debug_assert_bounded_len {
    ($len:expr, $capacity:expr) => {
        debug_assert!(
            $len <= $capacity,
            "INV-Q-01 violated: len {} exceeds capacity {}",
            $len,
            $capacity
        )
    };
}

// =============================================================================
// INV-Q-02: Poison Is Terminal
// =============================================================================

/// Assert that no item is enqueued once the queue is poisoned.
///
/// **Invariant**: `poisoned → no further items`
///
/// Used in: `HandoffQueue::pop_front()` when an item is handed out
macro_rules! debug_assert_not_poisoned {
    ($poisoned:expr) => {
        debug_assert!(
            !$poisoned,
            "INV-Q-02 violated: item dequeued from a poisoned queue"
        )
    };
}

// =============================================================================
// INV-LC-01: One-Way Lifecycle
// =============================================================================

/// Assert that a status transition only moves forward.
///
/// **Invariant**: `Open → Canceled`, never back
///
/// Used in: `LifecycleGuard::cancel()`
macro_rules! debug_assert_forward_transition {
    ($old:expr, $new:expr) => {
        debug_assert!(
            $new as u8 >= $old as u8,
            "INV-LC-01 violated: status moved backwards from {:?} to {:?}",
            $old,
            $new
        )
    };
}

pub(crate) use debug_assert_bounded_len;
pub(crate) use debug_assert_forward_transition;
pub(crate) use debug_assert_not_poisoned;
