use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde_derive::{Deserialize, Serialize};

use super::errors::MsgqError;
use super::message::Message;
use super::queue::{MessageQueue, PutStatus};

/// How `MessageWriter::add` handles a full queue.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// `None` retries until a slot frees up.
    pub max_attempts: Option<u32>,
    /// Pause between attempts. Zero yields the thread instead of sleeping.
    pub backoff_micros: u64,
}

impl RetryPolicy {
    #[inline]
    fn pause(&self) {
        if self.backoff_micros == 0 {
            thread::yield_now();
        } else {
            thread::sleep(Duration::from_micros(self.backoff_micros));
        }
    }
}

#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct WriterConfig {
    pub retry: RetryPolicy,
}

pub struct MessageWriter {
    queue: Arc<MessageQueue>,
    retry: RetryPolicy,
}

impl MessageWriter {
    pub fn new(queue: Arc<MessageQueue>, cfg: &WriterConfig) -> MessageWriter {
        MessageWriter {
            queue,
            retry: cfg.retry.clone(),
        }
    }

    pub fn queue(&self) -> &Arc<MessageQueue> {
        &self.queue
    }

    /// A single `put`, without retrying.
    #[inline]
    pub fn try_add(&self, message: Message) -> Result<PutStatus, MsgqError> {
        self.queue.put(message)
    }

    /// Puts `message`, retrying while the queue is full.
    ///
    /// Returns `PutStatus::Full` only once `max_attempts` is used up.
    /// Primitive failures are returned straight away.
    pub fn add(&self, message: Message) -> Result<PutStatus, MsgqError> {
        let mut attempts = 0u32;
        loop {
            if self.queue.put(message)? == PutStatus::Ok {
                return Ok(PutStatus::Ok);
            }
            attempts = attempts.saturating_add(1);
            if let Some(max) = self.retry.max_attempts {
                if attempts >= max {
                    log::trace!("giving up on {} after {} attempt(s)", message, attempts);
                    return Ok(PutStatus::Full);
                }
            }
            self.retry.pause();
        }
    }

    /// Sends one `Quit` per consumer so every reader loop ends.
    pub fn quit(&self, consumers: usize) -> Result<PutStatus, MsgqError> {
        for _ in 0..consumers {
            if self.add(Message::quit())?.is_full() {
                return Ok(PutStatus::Full);
            }
        }
        Ok(PutStatus::Ok)
    }
}
