use std::sync::Arc;

use super::errors::MsgqError;
use super::message::Message;
use super::queue::MessageQueue;

pub struct MessageReader {
    queue: Arc<MessageQueue>,
}

impl MessageReader {
    pub fn new(queue: Arc<MessageQueue>) -> MessageReader {
        MessageReader { queue }
    }

    /// Blocks until a message is available.
    #[inline]
    pub fn read(&self) -> Result<Message, MsgqError> {
        self.queue.get()
    }

    /// Hands every message to `f` until a `Quit` message arrives, and returns
    /// how many messages `f` saw. The `Quit` message itself is not passed on.
    pub fn read_until_quit<F>(&self, mut f: F) -> Result<usize, MsgqError>
    where
        F: FnMut(Message),
    {
        let mut handled = 0usize;
        loop {
            let message = self.queue.get()?;
            if message.is_quit() {
                return Ok(handled);
            }
            f(message);
            handled += 1;
        }
    }
}
