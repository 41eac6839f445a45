//! Lifecycle status
//!
//! Stored in an atomic so order admission can check it without a lock.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum VmStatus {
    Idle = 0,
    Start = 1,
    Running = 2,
    Stopping = 3,
}

impl VmStatus {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => VmStatus::Start,
            2 => VmStatus::Running,
            3 => VmStatus::Stopping,
            _ => VmStatus::Idle,
        }
    }
}

impl fmt::Display for VmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VmStatus::Idle => "Idle",
            VmStatus::Start => "Start",
            VmStatus::Running => "Running",
            VmStatus::Stopping => "Stopping",
        };
        f.write_str(s)
    }
}

#[derive(Debug)]
pub struct AtomicStatus(AtomicU8);

impl AtomicStatus {
    pub fn new(status: VmStatus) -> Self {
        Self(AtomicU8::new(status as u8))
    }

    pub fn load(&self) -> VmStatus {
        VmStatus::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn store(&self, status: VmStatus) {
        self.0.store(status as u8, Ordering::Release);
    }
}

impl Default for AtomicStatus {
    fn default() -> Self {
        Self::new(VmStatus::Idle)
    }
}
