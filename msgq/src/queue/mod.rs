use std::error::Error;
use std::num::NonZeroU32;
use std::sync::Mutex;

use crate::core::{QueueConfig, Semaphore};
use crate::errors::MsgqError;
use crate::message::Message;

/// Domain outcome of `MessageQueue::put`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PutStatus {
    Ok,
    /// No slot was free. Retrying is up to the caller.
    Full,
}

impl PutStatus {
    pub fn code(&self) -> i32 {
        match self {
            PutStatus::Ok => 0,
            PutStatus::Full => 1,
        }
    }

    pub fn is_full(&self) -> bool {
        *self == PutStatus::Full
    }
}

struct Ring {
    buffer: Box<[Message]>,
    front: usize,
    rear: usize,
}

impl Ring {
    #[inline]
    fn push(&mut self, message: Message) {
        self.buffer[self.rear] = message;
        self.rear = (self.rear + 1) % self.buffer.len();
    }

    #[inline]
    fn pop(&mut self) -> Message {
        let message = self.buffer[self.front];
        self.front = (self.front + 1) % self.buffer.len();
        message
    }
}

struct Resources {
    ring: Mutex<Ring>,
    // Slots available to write.
    empty: Semaphore,
    // Slots available to read.
    full: Semaphore,
    capacity: u32,
}

fn allocate(capacity: u32) -> Result<Box<[Message]>, MsgqError> {
    let len = capacity as usize;
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len).map_err(|_| MsgqError::Malloc)?;
    buffer.resize(len, Message::default());
    Ok(buffer.into_boxed_slice())
}

impl Resources {
    // Acquired in order: buffer, empty, full, lock. Whatever was acquired
    // before a failing step is dropped on the early return.
    fn acquire(capacity: u32) -> Result<Resources, MsgqError> {
        let buffer = allocate(capacity)?;
        let empty = Semaphore::new(capacity, capacity)?;
        let full = Semaphore::new(0, capacity)?;
        let ring = Mutex::new(Ring {
            buffer,
            front: 0,
            rear: 0,
        });
        Ok(Resources {
            ring,
            empty,
            full,
            capacity,
        })
    }
}

/// A bounded, thread-safe FIFO of `Message`s.
///
/// `put` never blocks: it returns `PutStatus::Full` when no slot is free.
/// `get` blocks until a message is available and has no timeout. Share the
/// queue between threads with `Arc`; `destroy` needs `&mut self`, so all
/// producers and consumers must be joined before the queue can be torn down.
pub struct MessageQueue {
    resources: Option<Resources>,
}

impl MessageQueue {
    pub fn new(capacity: NonZeroU32) -> Result<MessageQueue, MsgqError> {
        let resources = Resources::acquire(capacity.get())?;
        log::debug!("message queue created: capacity={}", capacity);
        Ok(MessageQueue {
            resources: Some(resources),
        })
    }

    pub fn from_config(cfg: &QueueConfig) -> Result<MessageQueue, Box<dyn Error>> {
        let capacity = cfg.validated_capacity()?;
        Ok(MessageQueue::new(capacity)?)
    }

    /// Adds `message` at the back of the queue.
    ///
    /// On a destroyed queue this reports `MsgqError::SemTryWait`.
    pub fn put(&self, message: Message) -> Result<PutStatus, MsgqError> {
        let res = self.resources.as_ref().ok_or(MsgqError::SemTryWait)?;
        if !res.empty.try_wait()? {
            return Ok(PutStatus::Full);
        }
        res.ring.lock()?.push(message);
        res.full.post()?;
        Ok(PutStatus::Ok)
    }

    /// Removes the message at the front of the queue, blocking while the
    /// queue is empty.
    ///
    /// On a destroyed queue this reports `MsgqError::SemWait`.
    pub fn get(&self) -> Result<Message, MsgqError> {
        let res = self.resources.as_ref().ok_or(MsgqError::SemWait)?;
        res.full.wait()?;
        let message = res.ring.lock()?.pop();
        res.empty.post()?;
        Ok(message)
    }

    pub fn get_into(&self, out: &mut Message) -> Result<(), MsgqError> {
        *out = self.get()?;
        Ok(())
    }

    /// Number of queued messages. Advisory: other threads may change it
    /// before the caller looks at the result.
    pub fn size(&self) -> u32 {
        self.resources.as_ref().map_or(0, |res| res.full.value())
    }

    pub fn capacity(&self) -> u32 {
        self.resources.as_ref().map_or(0, |res| res.capacity)
    }

    pub fn is_destroyed(&self) -> bool {
        self.resources.is_none()
    }

    /// Releases the buffer and primitives. Calling it again is a no-op.
    pub fn destroy(&mut self) {
        if let Some(res) = self.resources.take() {
            log::debug!(
                "message queue destroyed: capacity={}, dropped {} queued message(s)",
                res.capacity,
                res.full.value()
            );
        }
    }
}

impl Drop for MessageQueue {
    fn drop(&mut self) {
        self.destroy();
    }
}
