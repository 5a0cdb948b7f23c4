use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use tracing::{trace, warn};

/// The single lock that serializes every native-engine call and every access
/// to the coordination state it guards.
///
/// Not reentrant: entering the gate from inside a guarded region deadlocks.
/// Never hold a guard across blocking I/O.
#[derive(Debug)]
pub struct EngineGate<T> {
    inner: Mutex<T>,
    poison_warned: AtomicBool,
}

impl<T> EngineGate<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
            poison_warned: AtomicBool::new(false),
        }
    }

    /// Enters the guarded region named `region`. The region ends when the
    /// returned guard is dropped.
    pub fn enter(&self, region: &'static str) -> GateGuard<'_, T> {
        let guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                self.warn_poison_once(region);
                poisoned.into_inner()
            }
        };
        trace!(region, "gate_enter");
        GateGuard { guard, region }
    }

    pub fn with<R>(&self, region: &'static str, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.enter(region);
        f(&mut guard)
    }

    fn warn_poison_once(&self, region: &'static str) {
        if self
            .poison_warned
            .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            warn!(region, "engine gate poisoned; recovered inner state");
        }
    }
}

pub struct GateGuard<'a, T> {
    guard: MutexGuard<'a, T>,
    region: &'static str,
}

impl<T> Deref for GateGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for GateGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> Drop for GateGuard<'_, T> {
    fn drop(&mut self) {
        trace!(region = self.region, "gate_exit");
    }
}
