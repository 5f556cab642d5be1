use std::num::NonZeroU32;
use std::sync::{Condvar, Mutex};

use serde_derive::{Deserialize, Serialize};

use crate::errors::{ConfigError, MsgqError};

pub const DEFAULT_CAPACITY: u32 = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub capacity: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        QueueConfig {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl QueueConfig {
    pub fn builder() -> QueueConfigBuilder {
        QueueConfigBuilder::default()
    }

    /// Capacity as accepted by `MessageQueue::new`. A zero capacity read from
    /// a config file is rejected here.
    pub fn validated_capacity(&self) -> Result<NonZeroU32, ConfigError> {
        NonZeroU32::new(self.capacity).ok_or(ConfigError::ZeroCapacity)
    }
}

#[derive(Debug, Default)]
pub struct QueueConfigBuilder {
    capacity: Option<u32>,
}

impl QueueConfigBuilder {
    pub fn capacity(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn build(self) -> Result<QueueConfig, ConfigError> {
        let cfg = QueueConfig {
            capacity: self.capacity.unwrap_or(DEFAULT_CAPACITY),
        };
        cfg.validated_capacity()?;
        Ok(cfg)
    }
}

/// A counting semaphore whose value never leaves `0..=max`.
///
/// Waiters park on a condition variable; `post` wakes one of them.
#[derive(Debug)]
pub struct Semaphore {
    count: Mutex<u32>,
    available: Condvar,
    max: u32,
}

impl Semaphore {
    pub fn new(initial: u32, max: u32) -> Result<Semaphore, MsgqError> {
        if initial > max {
            return Err(MsgqError::SemCreate);
        }
        Ok(Semaphore {
            count: Mutex::new(initial),
            available: Condvar::new(),
            max,
        })
    }

    /// Decrements without waiting. Returns `Ok(false)` if the count is zero.
    pub fn try_wait(&self) -> Result<bool, MsgqError> {
        let mut count = self.count.lock().map_err(|_| MsgqError::SemTryWait)?;
        if *count == 0 {
            return Ok(false);
        }
        *count -= 1;
        Ok(true)
    }

    pub fn wait(&self) -> Result<(), MsgqError> {
        let mut count = self.count.lock().map_err(|_| MsgqError::SemWait)?;
        while *count == 0 {
            count = self
                .available
                .wait(count)
                .map_err(|_| MsgqError::SemWait)?;
        }
        *count -= 1;
        Ok(())
    }

    pub fn post(&self) -> Result<(), MsgqError> {
        {
            let mut count = self.count.lock().map_err(|_| MsgqError::SemPost)?;
            if *count >= self.max {
                return Err(MsgqError::SemPost);
            }
            *count += 1;
        }
        self.available.notify_one();
        Ok(())
    }

    pub fn value(&self) -> u32 {
        match self.count.lock() {
            Ok(count) => *count,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
