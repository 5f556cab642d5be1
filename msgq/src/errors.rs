use std::fmt;
use std::sync::PoisonError;

/// Failures of the primitives a `MessageQueue` is built from.
///
/// Each variant has a stable negative code. "Queue full" is not a failure and
/// is reported through `PutStatus::Full` instead.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MsgqError {
    Malloc,
    SemCreate,
    SemPost,
    SemTryWait,
    SemWait,
    MutexCreate,
    MutexLock,
    MutexUnlock,
}

pub const ALL_FAILURES: [MsgqError; 8] = [
    MsgqError::Malloc,
    MsgqError::SemCreate,
    MsgqError::SemPost,
    MsgqError::SemTryWait,
    MsgqError::SemWait,
    MsgqError::MutexCreate,
    MsgqError::MutexLock,
    MsgqError::MutexUnlock,
];

impl MsgqError {
    pub fn code(&self) -> i32 {
        match self {
            MsgqError::Malloc => -1,
            MsgqError::SemCreate => -2,
            MsgqError::SemPost => -3,
            MsgqError::SemTryWait => -4,
            MsgqError::SemWait => -5,
            MsgqError::MutexCreate => -6,
            MsgqError::MutexLock => -7,
            MsgqError::MutexUnlock => -8,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            MsgqError::Malloc => "malloc failed",
            MsgqError::SemCreate => "Create semaphore failed",
            MsgqError::SemPost => "Post semaphore failed",
            MsgqError::SemTryWait => "Try-wait semaphore failed",
            MsgqError::SemWait => "Wait semaphore failed",
            MsgqError::MutexCreate => "Create mutex failed",
            MsgqError::MutexLock => "Lock mutex failed",
            MsgqError::MutexUnlock => "Unlock mutex failed",
        }
    }

    pub fn from_code(code: i32) -> Option<MsgqError> {
        ALL_FAILURES.iter().copied().find(|e| e.code() == code)
    }
}

/// Returns the message for a failure code, or `None` if `code` is not one.
pub fn failure_message(code: i32) -> Option<&'static str> {
    MsgqError::from_code(code).map(|e| e.message())
}

impl fmt::Display for MsgqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.code())
    }
}

impl std::error::Error for MsgqError {}

// A poisoned ring lock means a thread panicked inside the critical section.
impl<T> From<PoisonError<T>> for MsgqError {
    fn from(_: PoisonError<T>) -> Self {
        MsgqError::MutexLock
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    ZeroCapacity,
    ZeroProducers,
    ZeroConsumers,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroCapacity => write!(f, "Config error: queue capacity must be at least 1"),
            ConfigError::ZeroProducers => write!(f, "Config error: at least one producer is required"),
            ConfigError::ZeroConsumers => write!(f, "Config error: at least one consumer is required"),
        }
    }
}

impl std::error::Error for ConfigError {}
