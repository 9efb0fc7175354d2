#[cfg(debug_assertions)]
use crate::invariants::{debug_assert_bounded_len, debug_assert_not_poisoned};
use crate::{PutError, QueueConfig, QueueError, TakeError};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Upper bound on a single blocked `take` wait before the cancellation
/// token is re-checked. Wakeups through [`HandoffQueue::wake_takers`] are
/// immediate; this only bounds a missed notification.
const WAIT_SLICE: Duration = Duration::from_millis(50);

/// Slots allocated up front; larger queues grow on demand.
const PREALLOC_LIMIT: usize = 1024;

enum Slot<T> {
    Item(T),
    Poison,
}

struct State<T> {
    slots: VecDeque<Slot<T>>,
    poisoned: bool,
}

impl<T> State<T> {
    /// Number of real items (the poison slot is not counted).
    #[inline]
    fn len(&self) -> usize {
        self.slots.len() - usize::from(self.poisoned)
    }
}

/// Bounded blocking handoff queue.
///
/// Transfers ownership of items from one blocking producer thread to one
/// consumer. The fixed capacity is the only backpressure mechanism: a full
/// queue parks the producer inside [`put`](Self::put) until the consumer
/// takes an item or the queue is poisoned.
///
/// Shutdown is driven by [`poison`](Self::poison), which clears the buffer
/// and inserts a sticky poison slot. Every blocked `take` returns
/// [`TakeError::Poisoned`] and every `put` fails with the item handed back.
/// A blocked `take` can also be released on its own through its
/// [`CancellationToken`].
pub struct HandoffQueue<T> {
    state: Mutex<State<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

impl<T> HandoffQueue<T> {
    /// Creates a queue. Fails if the configured capacity is zero.
    pub fn new(config: QueueConfig) -> Result<Self, QueueError> {
        if config.capacity == 0 {
            return Err(QueueError::ZeroCapacity);
        }

        Ok(Self {
            state: Mutex::new(State {
                slots: VecDeque::with_capacity(config.capacity.min(PREALLOC_LIMIT) + 1),
                poisoned: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity: config.capacity,
        })
    }

    /// Enqueues an item, blocking while the queue is full.
    pub fn put(&self, item: T) -> Result<(), PutError<T>> {
        self.put_inner(item, None)
    }

    /// Enqueues an item, blocking at most `timeout` while the queue is full.
    pub fn put_timeout(&self, item: T, timeout: Duration) -> Result<(), PutError<T>> {
        self.put_inner(item, Some(Instant::now() + timeout))
    }

    fn put_inner(&self, item: T, deadline: Option<Instant>) -> Result<(), PutError<T>> {
        let mut state = self.state.lock();

        loop {
            if state.poisoned {
                return Err(PutError::Poisoned(item));
            }

            if state.len() < self.capacity {
                state.slots.push_back(Slot::Item(item));

                #[cfg(debug_assertions)]
                debug_assert_bounded_len!(state.len(), self.capacity);

                drop(state);
                self.not_empty.notify_one();
                return Ok(());
            }

            match deadline {
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        return Err(PutError::Timeout(item));
                    }
                    self.not_full.wait_until(&mut state, deadline);
                }
                None => self.not_full.wait(&mut state),
            }
        }
    }

    /// Dequeues the oldest item, blocking until one is available.
    ///
    /// Returns early with [`TakeError::Poisoned`] once the queue is poisoned
    /// or with [`TakeError::Canceled`] once `cancel` is cancelled.
    pub fn take(&self, cancel: &CancellationToken) -> Result<T, TakeError> {
        let mut state = self.state.lock();

        loop {
            if let Some(result) = Self::pop_front(&mut state) {
                drop(state);
                if result.is_ok() {
                    self.not_full.notify_one();
                }
                return result;
            }

            if cancel.is_cancelled() {
                return Err(TakeError::Canceled);
            }

            self.not_empty.wait_for(&mut state, WAIT_SLICE);
        }
    }

    /// Dequeues the oldest item without blocking.
    ///
    /// Returns `None` when the queue is empty.
    pub fn try_take(&self) -> Option<Result<T, TakeError>> {
        let result = Self::pop_front(&mut self.state.lock());
        if matches!(result, Some(Ok(_))) {
            self.not_full.notify_one();
        }
        result
    }

    /// The poison slot is never consumed, so every later take sees it too.
    fn pop_front(state: &mut State<T>) -> Option<Result<T, TakeError>> {
        match state.slots.front()? {
            Slot::Poison => Some(Err(TakeError::Poisoned)),
            Slot::Item(_) => {
                // Poisoning clears every item, so none can be left behind it
                #[cfg(debug_assertions)]
                debug_assert_not_poisoned!(state.poisoned);

                match state.slots.pop_front() {
                    Some(Slot::Item(item)) => Some(Ok(item)),
                    _ => None,
                }
            }
        }
    }

    /// Discards every buffered item. A poison slot survives.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.slots.retain(|slot| matches!(slot, Slot::Poison));
        drop(state);
        self.not_full.notify_all();
    }

    /// Clears the queue and inserts the poison slot.
    ///
    /// Wakes every blocked producer and consumer. Returns `true` if this
    /// call poisoned the queue, `false` if it already was.
    pub fn poison(&self) -> bool {
        let mut state = self.state.lock();
        let first = !state.poisoned;
        state.slots.clear();
        state.slots.push_back(Slot::Poison);
        state.poisoned = true;
        drop(state);

        if first {
            tracing::debug!(capacity = self.capacity, "handoff queue poisoned");
        }

        self.not_empty.notify_all();
        self.not_full.notify_all();
        first
    }

    /// Wakes blocked takers so they re-check their cancellation token.
    pub fn wake_takers(&self) {
        // Taking the lock orders this wakeup after any in-progress token check.
        let _state = self.state.lock();
        self.not_empty.notify_all();
    }

    /// Snapshot: `true` if no real item is buffered.
    pub fn is_empty(&self) -> bool {
        self.state.lock().len() == 0
    }

    /// Snapshot of the number of buffered items.
    pub fn len(&self) -> usize {
        self.state.lock().len()
    }

    pub fn is_poisoned(&self) -> bool {
        self.state.lock().poisoned
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> std::fmt::Debug for HandoffQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("HandoffQueue")
            .field("len", &state.len())
            .field("capacity", &self.capacity)
            .field("poisoned", &state.poisoned)
            .finish()
    }
}
