//! # Network Monitor
//!
//! Holds the two environment signals the poller reacts to: whether the
//! dashboard is visible and whether the host is online. Both are plain
//! atomics so the embedding application can flip them from any thread.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    Online,
    Offline,
}

#[derive(Debug)]
pub struct NetworkMonitor {
    visible: AtomicBool,
    online: AtomicBool,
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkMonitor {
    /// Starts visible and online
    pub fn new() -> Self {
        Self {
            visible: AtomicBool::new(true),
            online: AtomicBool::new(true),
        }
    }

    /// Returns the previous value
    pub fn set_visible(&self, visible: bool) -> bool {
        self.visible.swap(visible, Ordering::AcqRel)
    }

    /// Returns the previous value
    pub fn set_online(&self, online: bool) -> bool {
        self.online.swap(online, Ordering::AcqRel)
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Acquire)
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    pub fn get_status(&self) -> NetworkStatus {
        if self.is_online() {
            NetworkStatus::Online
        } else {
            NetworkStatus::Offline
        }
    }
}
