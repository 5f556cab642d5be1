use std::{
    collections::HashSet,
    error::Error,
    num::NonZeroU32,
    sync::{
        atomic::{AtomicBool, Ordering as AtomicOrdering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use crate::{
    reader::MessageReader,
    writer::{MessageWriter, RetryPolicy, WriterConfig},
    Message, MessageQueue, MessageTag, MsgqError, PutStatus,
};

fn shared_queue(capacity: u32) -> Result<Arc<MessageQueue>, Box<dyn Error>> {
    let capacity = NonZeroU32::new(capacity).ok_or("zero capacity")?;
    Ok(Arc::new(MessageQueue::new(capacity)?))
}

// Packs producer id and sequence number into one payload.
const SEQ_SPAN: usize = 1_000_000;

fn encode(producer: usize, seq: usize) -> isize {
    (producer * SEQ_SPAN + seq) as isize
}

fn decode(value: isize) -> (usize, usize) {
    let v = value as usize;
    (v / SEQ_SPAN, v % SEQ_SPAN)
}

#[test]
fn get_blocks_until_put() -> Result<(), Box<dyn Error>> {
    let queue = shared_queue(4)?;
    let returned = Arc::new(AtomicBool::new(false));

    let consumer = {
        let queue = Arc::clone(&queue);
        let returned = Arc::clone(&returned);
        thread::spawn(move || {
            let message = queue.get();
            returned.store(true, AtomicOrdering::SeqCst);
            message
        })
    };

    thread::sleep(Duration::from_millis(200));
    assert!(!returned.load(AtomicOrdering::SeqCst), "get returned on an empty queue");

    let sent = Message::new(MessageTag::Some, 0x5eed);
    assert_eq!(queue.put(sent)?, PutStatus::Ok);
    let received = consumer.join().expect("consumer panicked")?;
    assert!(returned.load(AtomicOrdering::SeqCst));
    assert_eq!(received, sent);
    assert_eq!(queue.size(), 0);
    Ok(())
}

// Capacity 1 producer retrying on Full, consumer starting two seconds late.
#[test]
fn copies_survive_delayed_consumer() -> Result<(), Box<dyn Error>> {
    let queue = shared_queue(1)?;
    let expected = [Message::some(42), Message::some(0), Message::some(1)];

    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || -> Result<(), MsgqError> {
            for message in expected.iter() {
                while queue.put(*message)?.is_full() {
                    thread::yield_now();
                }
            }
            Ok(())
        })
    };

    thread::sleep(Duration::from_millis(2000));
    assert_eq!(queue.size(), 1);

    let mut a = Message::default();
    let mut b = Message::default();
    let mut c = Message::default();
    queue.get_into(&mut a)?;
    queue.get_into(&mut b)?;
    queue.get_into(&mut c)?;
    assert_eq!([a, b, c], expected);

    producer.join().expect("producer panicked")?;
    assert_eq!(queue.size(), 0);
    Ok(())
}

#[test]
fn many_producers_many_consumers_deliver_exactly_once() -> Result<(), Box<dyn Error>> {
    const PRODUCERS: usize = 4;
    const CONSUMERS: usize = 3;
    const PER_PRODUCER: usize = 5_000;

    let queue = shared_queue(8)?;

    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            let reader = MessageReader::new(Arc::clone(&queue));
            thread::spawn(move || -> Result<Vec<Message>, MsgqError> {
                let mut received = Vec::new();
                reader.read_until_quit(|m| received.push(m))?;
                Ok(received)
            })
        })
        .collect();

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let writer = MessageWriter::new(Arc::clone(&queue), &WriterConfig::default());
            thread::spawn(move || -> Result<(), MsgqError> {
                for seq in 0..PER_PRODUCER {
                    assert_eq!(writer.add(Message::some(encode(p, seq)))?, PutStatus::Ok);
                }
                Ok(())
            })
        })
        .collect();

    for producer in producers {
        producer.join().expect("producer panicked")?;
    }
    let writer = MessageWriter::new(Arc::clone(&queue), &WriterConfig::default());
    assert_eq!(writer.quit(CONSUMERS)?, PutStatus::Ok);

    let mut seen = HashSet::new();
    for consumer in consumers {
        let received = consumer.join().expect("consumer panicked")?;
        // Each consumer sees any single producer's messages in send order.
        let mut last = vec![None; PRODUCERS];
        for message in received {
            let (p, seq) = decode(message.value);
            if let Some(prev) = last[p] {
                assert!(seq > prev, "producer {} reordered: {} after {}", p, seq, prev);
            }
            last[p] = Some(seq);
            assert!(seen.insert((p, seq)), "duplicate delivery of {:?}", (p, seq));
        }
    }
    assert_eq!(seen.len(), PRODUCERS * PER_PRODUCER);
    assert_eq!(queue.size(), 0);
    Ok(())
}

#[test]
fn single_consumer_sees_global_admission_order() -> Result<(), Box<dyn Error>> {
    let queue = shared_queue(2)?;
    let producer = {
        let writer = MessageWriter::new(Arc::clone(&queue), &WriterConfig::default());
        thread::spawn(move || -> Result<(), MsgqError> {
            for i in 0..10_000isize {
                writer.add(Message::some(i))?;
            }
            writer.quit(1)?;
            Ok(())
        })
    };

    let reader = MessageReader::new(Arc::clone(&queue));
    let mut next = 0isize;
    let handled = reader.read_until_quit(|m| {
        assert_eq!(m.value, next);
        next += 1;
    })?;
    producer.join().expect("producer panicked")?;
    assert_eq!(handled, 10_000);
    Ok(())
}

#[test]
fn put_never_blocks_on_full_queue() -> Result<(), Box<dyn Error>> {
    let queue = shared_queue(2)?;
    queue.put(Message::some(1))?;
    queue.put(Message::some(2))?;

    let start = Instant::now();
    let writer = MessageWriter::new(
        Arc::clone(&queue),
        &WriterConfig {
            retry: RetryPolicy {
                max_attempts: Some(1),
                backoff_micros: 0,
            },
        },
    );
    for _ in 0..1_000 {
        assert_eq!(queue.put(Message::some(3))?, PutStatus::Full);
        assert_eq!(writer.add(Message::some(3))?, PutStatus::Full);
    }
    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(queue.size(), 2);
    Ok(())
}

#[test]
fn destroy_after_joining_workers() -> Result<(), Box<dyn Error>> {
    let mut queue = shared_queue(4)?;
    let workers: Vec<_> = (0..4)
        .map(|i| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.put(Message::some(i)))
        })
        .collect();
    for worker in workers {
        assert_eq!(worker.join().expect("worker panicked")?, PutStatus::Ok);
    }

    let q = Arc::get_mut(&mut queue).ok_or("queue still shared")?;
    assert_eq!(q.size(), 4);
    q.destroy();
    q.destroy();
    assert!(q.is_destroyed());
    assert_eq!(q.size(), 0);
    Ok(())
}
