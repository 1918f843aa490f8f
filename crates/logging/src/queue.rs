//! crates/logging/src/queue.rs
//! Bounded hand-off between producers and the drain loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, SendTimeoutError, Sender, TrySendError, bounded};

use crate::config::OverflowPolicy;
use crate::record::Record;

/// How long a blocked producer waits before re-checking the running flag.
pub const BLOCK_TICK: Duration = Duration::from_millis(50);

/// Outcome of offering a record to the queue.
#[derive(Debug)]
#[must_use]
pub enum Admission {
    /// The record is queued and will be written by the drain loop.
    Queued,
    /// The queue was full under [`OverflowPolicy::Discard`].
    Dropped(Record),
    /// The drain loop is stopping; the caller must write the record itself.
    Stopped(Record),
}

/// Fixed-capacity FIFO of records.
#[derive(Debug)]
pub struct DeliveryQueue {
    sender: Sender<Record>,
    receiver: Receiver<Record>,
    capacity: usize,
}

impl DeliveryQueue {
    /// Creates an empty queue holding at most `capacity` records.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Maximum number of queued records.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of records currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Whether no records are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Consumer end handed to the drain loop.
    #[must_use]
    pub fn receiver(&self) -> Receiver<Record> {
        self.receiver.clone()
    }

    /// Offers `record` according to `policy`.
    ///
    /// A cleared `running` flag gives the record back as
    /// [`Admission::Stopped`] under either policy. Under
    /// [`OverflowPolicy::Block`] the producer waits for space in
    /// [`BLOCK_TICK`] slices and re-checks the flag after each one, so a
    /// producer is never left waiting on a loop that has exited.
    pub fn admit(&self, record: Record, policy: OverflowPolicy, running: &AtomicBool) -> Admission {
        if !running.load(Ordering::Acquire) {
            return Admission::Stopped(record);
        }
        match policy {
            OverflowPolicy::Discard => match self.sender.try_send(record) {
                Ok(()) => Admission::Queued,
                Err(TrySendError::Full(record)) => Admission::Dropped(record),
                Err(TrySendError::Disconnected(record)) => Admission::Stopped(record),
            },
            OverflowPolicy::Block => {
                let mut record = record;
                loop {
                    if !running.load(Ordering::Acquire) {
                        return Admission::Stopped(record);
                    }
                    match self.sender.send_timeout(record, BLOCK_TICK) {
                        Ok(()) => return Admission::Queued,
                        Err(SendTimeoutError::Timeout(returned)) => record = returned,
                        Err(SendTimeoutError::Disconnected(returned)) => {
                            return Admission::Stopped(returned);
                        }
                    }
                }
            }
        }
    }

    /// Removes every queued record without waiting, oldest first.
    pub fn take_pending(&self) -> Vec<Record> {
        self.receiver.try_iter().collect()
    }
}

/// Console line announcing a record dropped by a full queue.
#[must_use]
pub fn drop_notice(record: &Record) -> String {
    format!(
        "zclog: delivery queue is full, discarded [{}] record from {}: {}",
        record.severity,
        record.caller.function,
        record.message()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Caller;
    use crate::severity::Severity;
    use std::sync::Arc;
    use std::sync::mpsc;
    use std::thread;

    fn record(text: &str) -> Record {
        Record::new(
            Severity::Info,
            Caller::new("queue.rs", 1, "tests"),
            text.to_owned(),
            Vec::new(),
        )
    }

    #[test]
    fn discard_drops_when_full() {
        let queue = DeliveryQueue::new(1);
        let running = AtomicBool::new(true);

        assert!(matches!(
            queue.admit(record("first"), OverflowPolicy::Discard, &running),
            Admission::Queued
        ));
        match queue.admit(record("second"), OverflowPolicy::Discard, &running) {
            Admission::Dropped(dropped) => assert_eq!(dropped.message(), "second"),
            other => panic!("expected drop, got {other:?}"),
        }

        let pending = queue.take_pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].message(), "first");
    }

    #[test]
    fn block_waits_until_space_frees_up() {
        let queue = Arc::new(DeliveryQueue::new(1));
        let running = Arc::new(AtomicBool::new(true));
        assert!(matches!(
            queue.admit(record("first"), OverflowPolicy::Block, &running),
            Admission::Queued
        ));

        let (done_tx, done_rx) = mpsc::channel();
        let producer = {
            let queue = Arc::clone(&queue);
            let running = Arc::clone(&running);
            thread::spawn(move || {
                let admission = queue.admit(record("second"), OverflowPolicy::Block, &running);
                done_tx.send(matches!(admission, Admission::Queued)).unwrap();
            })
        };

        assert!(done_rx.recv_timeout(Duration::from_millis(200)).is_err());

        let first = queue.receiver().recv().unwrap();
        assert_eq!(first.message(), "first");
        assert!(done_rx.recv_timeout(Duration::from_secs(5)).unwrap());
        producer.join().unwrap();

        assert_eq!(queue.take_pending()[0].message(), "second");
    }

    #[test]
    fn blocked_producer_gives_record_back_when_stopped() {
        let queue = Arc::new(DeliveryQueue::new(1));
        let running = Arc::new(AtomicBool::new(true));
        assert!(matches!(
            queue.admit(record("first"), OverflowPolicy::Block, &running),
            Admission::Queued
        ));

        let producer = {
            let queue = Arc::clone(&queue);
            let running = Arc::clone(&running);
            thread::spawn(move || queue.admit(record("second"), OverflowPolicy::Block, &running))
        };
        thread::sleep(Duration::from_millis(100));
        running.store(false, Ordering::Release);

        match producer.join().unwrap() {
            Admission::Stopped(returned) => assert_eq!(returned.message(), "second"),
            other => panic!("expected stop, got {other:?}"),
        }
    }

    #[test]
    fn cleared_flag_refuses_records_under_either_policy() {
        let queue = DeliveryQueue::new(4);
        let running = AtomicBool::new(false);

        for policy in [OverflowPolicy::Discard, OverflowPolicy::Block] {
            match queue.admit(record("late"), policy, &running) {
                Admission::Stopped(returned) => assert_eq!(returned.message(), "late"),
                other => panic!("expected stop under {policy:?}, got {other:?}"),
            }
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn drop_notice_carries_the_message() {
        let mut dropped = record("disk {} full");
        dropped.args.push("/var".to_owned());
        let notice = drop_notice(&dropped);
        assert!(notice.contains("disk /var full"), "{notice}");
        assert!(notice.contains("[INFO]"), "{notice}");
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        assert_eq!(DeliveryQueue::new(0).capacity(), 1);
    }
}
