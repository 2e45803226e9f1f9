//! # Shared Platform Handle
//!
//! Cloneable handle to one [`Platform`] behind a `parking_lot::RwLock`.
//!
//! Commands take the write lock for their full duration, so they apply one
//! at a time in lock-acquisition order. Queries take the read lock and never
//! observe a half-applied command. The lock is never held across an `.await`.
//! A long-running read delays writers; every command here is in-memory and
//! short, so this is acceptable.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::platform::Platform;

/// Thread-safe handle to the platform.
#[derive(Debug, Clone)]
pub struct SharedPlatform {
    inner: Arc<RwLock<Platform>>,
}

impl SharedPlatform {
    pub fn new(platform: Platform) -> Self {
        Self {
            inner: Arc::new(RwLock::new(platform)),
        }
    }

    /// Shared access for queries.
    pub fn read(&self) -> RwLockReadGuard<'_, Platform> {
        self.inner.read()
    }

    /// Shared access without blocking; `None` while a command holds the lock.
    pub fn try_read(&self) -> Option<RwLockReadGuard<'_, Platform>> {
        self.inner.try_read()
    }

    /// Exclusive access for commands.
    pub fn write(&self) -> RwLockWriteGuard<'_, Platform> {
        self.inner.write()
    }
}
