#[cfg(debug_assertions)]
use crate::invariants::debug_assert_forward_transition;
use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicU8, Ordering};

/// Status of the downstream consumer as seen by both sides of a handoff.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownstreamStatus {
    /// The consumer still accepts chunks.
    Open = 0,
    /// The consumer is gone. Terminal.
    Canceled = 1,
}

impl DownstreamStatus {
    #[inline]
    const fn from_u8(raw: u8) -> Self {
        if raw == Self::Open as u8 {
            Self::Open
        } else {
            Self::Canceled
        }
    }

    /// Returns `true` for [`DownstreamStatus::Canceled`].
    #[inline]
    pub const fn is_canceled(self) -> bool {
        matches!(self, Self::Canceled)
    }
}

/// Atomically updated downstream status cell.
///
/// The consumer side is the only writer; the producer side only reads. The
/// one transition `Open → Canceled` is applied with compare-and-set, so it
/// happens exactly once no matter how many shutdown paths race to it.
#[derive(Debug)]
pub struct LifecycleGuard {
    status: CachePadded<AtomicU8>,
}

impl LifecycleGuard {
    /// Creates a guard in the [`DownstreamStatus::Open`] state.
    pub fn new() -> Self {
        Self {
            status: CachePadded::new(AtomicU8::new(DownstreamStatus::Open as u8)),
        }
    }

    /// Current status snapshot.
    #[inline]
    pub fn status(&self) -> DownstreamStatus {
        DownstreamStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    #[inline]
    pub fn is_canceled(&self) -> bool {
        self.status().is_canceled()
    }

    /// Moves the status to `Canceled`.
    ///
    /// Returns `true` only for the call that performed the transition.
    pub fn cancel(&self) -> bool {
        let result = self.status.compare_exchange(
            DownstreamStatus::Open as u8,
            DownstreamStatus::Canceled as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );

        #[cfg(debug_assertions)]
        {
            let old = DownstreamStatus::from_u8(result.unwrap_or_else(|raw| raw));
            debug_assert_forward_transition!(old, self.status());
        }

        result.is_ok()
    }
}

impl Default for LifecycleGuard {
    fn default() -> Self {
        Self::new()
    }
}
