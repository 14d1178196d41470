//! Provisional device keys.
//!
//! Devices added in a reconfigure request need a negative key until the
//! server assigns a real one. A disk refers to a new controller through
//! that key, so every key handed out within one request must be unique.

use std::collections::{BTreeSet, HashMap};

/// Key of the IDE controller every VM is created with. Not allocated.
pub const IDE_CONTROLLER_KEY: i32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceCategory {
    Controller,
    Disk,
    NetworkAdapter,
    Cdrom,
}

impl DeviceCategory {
    /// First key handed out for the category.
    pub fn base_key(&self) -> i32 {
        match self {
            Self::Controller => -101,
            Self::Disk => -100,
            Self::NetworkAdapter => -47,
            Self::Cdrom => -1,
        }
    }
}

/// Per-request allocator. Keys are unique across categories and strictly
/// decreasing within one.
#[derive(Debug, Clone, Default)]
pub struct DeviceKeyAllocator {
    issued: BTreeSet<i32>,
    last: HashMap<DeviceCategory, i32>,
}

impl DeviceKeyAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, category: DeviceCategory) -> i32 {
        let mut key = match self.last.get(&category) {
            Some(prev) => prev - 1,
            None => category.base_key(),
        };
        while self.issued.contains(&key) {
            key -= 1;
        }
        self.issued.insert(key);
        self.last.insert(category, key);
        key
    }

    pub fn issued(&self) -> usize {
        self.issued.len()
    }
}
