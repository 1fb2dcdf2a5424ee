//! Fixed-capacity connection slot table.
//!
//! The pool is the only mutable state shared between the accept loop and
//! the connection workers. Slot contents and the active counter change
//! together under one lock; the counter is also kept in an atomic so the
//! accept loop can check capacity without locking.

use crate::error::server::PoolFull;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, warn};
use tokio::sync::watch;

pub type SlotIndex = usize;

/// What a slot holds while a connection is live.
#[derive(Debug)]
pub struct ConnectionEntry {
    peer: SocketAddr,
    close: watch::Sender<bool>,
}

impl ConnectionEntry {
    /// Create an entry and the signal its worker listens on for forced closure.
    pub fn new(peer: SocketAddr) -> (Self, CloseSignal) {
        let (close, receiver) = watch::channel(false);
        (Self { peer, close }, CloseSignal { receiver })
    }
}

/// Worker side of a [`ConnectionEntry`]'s close handle.
#[derive(Debug, Clone)]
pub struct CloseSignal {
    receiver: watch::Receiver<bool>,
}

impl CloseSignal {
    pub fn is_closed(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once the pool asks this connection to close.
    ///
    /// Also resolves if the entry was dropped, since nothing can signal it anymore
    /// and the slot is gone.
    pub async fn closed(&mut self) {
        let _ = self.receiver.wait_for(|closed| *closed).await;
    }
}

#[derive(Debug)]
pub struct SlotPool {
    capacity: usize,
    slots: Mutex<Vec<Option<ConnectionEntry>>>,
    active: AtomicUsize,
    occupancy: watch::Sender<usize>,
}

impl SlotPool {
    pub fn new(capacity: usize) -> Self {
        let (occupancy, _) = watch::channel(0);
        Self {
            capacity,
            slots: Mutex::new((0..capacity).map(|_| None).collect()),
            active: AtomicUsize::new(0),
            occupancy,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Option<ConnectionEntry>>> {
        // Critical sections never panic mid-update, so a poisoned table is still consistent.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    pub fn has_active(&self) -> bool {
        self.active_count() > 0
    }

    pub fn is_full(&self) -> bool {
        self.active_count() >= self.capacity()
    }

    /// Store `entry` in the first empty slot.
    pub fn acquire(&self, entry: ConnectionEntry) -> Result<SlotIndex, PoolFull> {
        let mut slots = self.lock();
        let Some(index) = slots.iter().position(Option::is_none) else {
            return Err(PoolFull {
                capacity: self.capacity,
            });
        };

        debug!("Slot {index} acquired by {}", entry.peer);
        slots[index] = Some(entry);
        let active = self.active.fetch_add(1, Ordering::AcqRel) + 1;
        self.occupancy.send_replace(active);
        Ok(index)
    }

    /// Like [`acquire`](Self::acquire), but the slot is released when the guard drops.
    pub fn acquire_guard(self: &Arc<Self>, entry: ConnectionEntry) -> Result<SlotGuard, PoolFull> {
        let index = self.acquire(entry)?;
        Ok(SlotGuard {
            pool: Arc::clone(self),
            index,
        })
    }

    /// Empty the slot at `index`. Releasing an empty slot is logged and ignored.
    pub fn release(&self, index: SlotIndex) {
        let mut slots = self.lock();
        match slots.get_mut(index).and_then(Option::take) {
            Some(entry) => {
                let active = self.active.fetch_sub(1, Ordering::AcqRel) - 1;
                self.occupancy.send_replace(active);
                debug!("Slot {index} released by {}", entry.peer);
            }
            None => warn!("Slot {index} released while already empty"),
        }
    }

    /// Ask every live connection to close. Slots stay occupied until each
    /// worker observes the request and releases its own.
    pub fn close_all(&self) -> usize {
        let slots = self.lock();
        let mut signalled = 0;
        for entry in slots.iter().flatten() {
            entry.close.send_replace(true);
            signalled += 1;
        }
        signalled
    }

    /// Resolves once at least one slot is free, waking on the release that frees it.
    pub async fn vacancy(&self) {
        let capacity = self.capacity();
        let mut occupancy = self.occupancy.subscribe();
        let _ = occupancy.wait_for(|active| *active < capacity).await;
    }

    /// Resolves once no slot is occupied.
    pub async fn wait_idle(&self) {
        let mut occupancy = self.occupancy.subscribe();
        let _ = occupancy.wait_for(|active| *active == 0).await;
    }
}

/// Holds a slot for the lifetime of one connection worker.
#[derive(Debug)]
pub struct SlotGuard {
    pool: Arc<SlotPool>,
    index: SlotIndex,
}

impl SlotGuard {
    pub fn index(&self) -> SlotIndex {
        self.index
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.pool.release(self.index);
    }
}
