use std::io;
use std::os::raw::c_int;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};

use super::writer::MessageWriter;

pub const SHUTDOWN_SIGNALS: [c_int; 4] = [SIGHUP, SIGINT, SIGQUIT, SIGTERM];

/// Turns the first termination signal into one `Quit` message per consumer.
pub struct ShutdownListener {
    handle: Handle,
    closing: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

pub fn listen(writer: MessageWriter, consumers: usize) -> io::Result<ShutdownListener> {
    listen_on(&SHUTDOWN_SIGNALS, writer, consumers)
}

pub fn listen_on(
    signals: &[c_int],
    writer: MessageWriter,
    consumers: usize,
) -> io::Result<ShutdownListener> {
    let mut signals = Signals::new(signals)?;
    let handle = signals.handle();
    let closing = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&closing);
    let thread = thread::Builder::new()
        .name("msgq-shutdown".to_string())
        .spawn(move || {
            if let Some(signal) = signals.forever().next() {
                flag.store(true, Ordering::SeqCst);
                log::warn!(
                    "received signal {}, asking {} consumer(s) to quit",
                    signal,
                    consumers
                );
                match writer.quit(consumers) {
                    Ok(status) if status.is_full() => {
                        log::error!("queue stayed full, not every consumer was told to quit")
                    }
                    Ok(_) => {}
                    Err(e) => log::error!("failed to send quit message: {}", e),
                }
            }
        })?;
    Ok(ShutdownListener {
        handle,
        closing,
        thread: Some(thread),
    })
}

impl ShutdownListener {
    /// Set once a signal has been received. Producers can poll it to stop.
    pub fn closing(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closing)
    }

    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::SeqCst)
    }

    pub fn close(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("shutdown listener thread panicked");
            }
        }
    }
}

impl Drop for ShutdownListener {
    fn drop(&mut self) {
        self.stop();
    }
}
