use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use clap::Parser;
use serde_derive::{Deserialize, Serialize};

use msgq::core::QueueConfig;
use msgq::reader::MessageReader;
use msgq::shutdown;
use msgq::writer::{MessageWriter, RetryPolicy, WriterConfig};
use msgq::{ConfigError, Message, MessageQueue, MsgqError, PutStatus};

#[derive(clap::Parser)]
#[clap()]
struct Opts {
    #[clap(short = 'c', long = "config", default_value = "msgq-bench.toml")]
    config: String,
    #[clap(long)]
    producers: Option<usize>,
    #[clap(long)]
    consumers: Option<usize>,
    #[clap(long)]
    messages: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct RunConfig {
    producers: usize,
    consumers: usize,
    messages: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            producers: 2,
            consumers: 2,
            messages: 1_000_000,
        }
    }
}

#[derive(Default, Debug, Serialize, Deserialize)]
#[serde(default)]
struct BenchConfig {
    queue: QueueConfig,
    retry: RetryPolicy,
    bench: RunConfig,
}

impl BenchConfig {
    fn apply(&mut self, opts: &Opts) -> Result<(), ConfigError> {
        if let Some(n) = opts.producers {
            self.bench.producers = n;
        }
        if let Some(n) = opts.consumers {
            self.bench.consumers = n;
        }
        if let Some(n) = opts.messages {
            self.bench.messages = n;
        }
        self.queue.validated_capacity()?;
        if self.bench.producers == 0 {
            return Err(ConfigError::ZeroProducers);
        }
        if self.bench.consumers == 0 {
            return Err(ConfigError::ZeroConsumers);
        }
        Ok(())
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq)]
struct Tally {
    count: usize,
    sum: i128,
}

impl Tally {
    #[inline]
    fn add(&mut self, value: isize) {
        self.count += 1;
        self.sum += value as i128;
    }

    fn merge(&mut self, other: Tally) {
        self.count += other.count;
        self.sum += other.sum;
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let opts: Opts = Opts::parse();
    let mut cfg: BenchConfig = confy::load_path(&opts.config)?;
    cfg.apply(&opts)?;
    log::info!("{:?}", &cfg);

    let queue = Arc::new(MessageQueue::from_config(&cfg.queue)?);
    let result = run(&queue, &cfg);

    match Arc::try_unwrap(queue) {
        Ok(mut queue) => queue.destroy(),
        Err(_) => log::warn!("queue still shared at exit, leaving teardown to drop"),
    }
    result
}

fn produce(
    writer: MessageWriter,
    closing: Arc<AtomicBool>,
    first: usize,
    stride: usize,
    total: usize,
) -> Result<Tally, MsgqError> {
    let mut sent = Tally::default();
    let mut value = first;
    while value < total {
        let message = Message::some(value as isize);
        loop {
            match writer.try_add(message)? {
                PutStatus::Ok => break,
                PutStatus::Full if closing.load(Ordering::Relaxed) => return Ok(sent),
                PutStatus::Full => thread::yield_now(),
            }
        }
        sent.add(message.value);
        value += stride;
    }
    Ok(sent)
}

fn run(queue: &Arc<MessageQueue>, cfg: &BenchConfig) -> Result<(), Box<dyn Error>> {
    let writer_cfg = WriterConfig {
        retry: cfg.retry.clone(),
    };
    let RunConfig {
        producers,
        consumers,
        messages,
    } = cfg.bench.clone();

    let listener = shutdown::listen(MessageWriter::new(Arc::clone(queue), &writer_cfg), consumers)?;
    let start = Instant::now();

    let consumer_threads: Vec<_> = (0..consumers)
        .map(|_| {
            let reader = MessageReader::new(Arc::clone(queue));
            thread::spawn(move || -> Result<Tally, MsgqError> {
                let mut received = Tally::default();
                reader.read_until_quit(|m| received.add(m.value))?;
                Ok(received)
            })
        })
        .collect();

    let producer_threads: Vec<_> = (0..producers)
        .map(|p| {
            let writer = MessageWriter::new(Arc::clone(queue), &writer_cfg);
            let closing = listener.closing();
            thread::spawn(move || produce(writer, closing, p, producers, messages))
        })
        .collect();

    let mut sent = Tally::default();
    for t in producer_threads {
        sent.merge(t.join().map_err(|_| "producer thread panicked")??);
    }

    // Once closed no signal can race the quit messages sent below.
    let closing = listener.closing();
    listener.close();
    let interrupted = closing.load(Ordering::SeqCst);
    if !interrupted {
        let writer = MessageWriter::new(Arc::clone(queue), &writer_cfg);
        if writer.quit(consumers)?.is_full() {
            return Err("could not deliver quit messages to consumers".into());
        }
    }

    let mut received = Tally::default();
    for t in consumer_threads {
        received.merge(t.join().map_err(|_| "consumer thread panicked")??);
    }

    let duration = start.elapsed();
    let ops = ((received.count as f64) / (duration.as_millis().max(1) as f64)) * 1_000f64;
    println!(
        "{:#?}K messages/s ({} producer(s), {} consumer(s), capacity {}). Total time: {:#?}",
        (ops / 1000f64) as u64,
        producers,
        consumers,
        queue.capacity(),
        duration
    );

    if interrupted {
        println!("Interrupted after {} of {} message(s).", received.count, messages);
        return Ok(());
    }
    if sent != received {
        eprintln!("Mismatch! Sent {:?}, received {:?}", sent, received);
        return Err("received messages do not match sent messages".into());
    }
    println!("All {} message(s) received.", received.count);
    Ok(())
}
