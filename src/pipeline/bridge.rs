//! Thread boundary between acquisition (producer) and the consumer.
//!
//! The bridge carries two independent FIFO channels: formatted log lines
//! and [`Sample`]s. Both are unbounded, so the acquisition thread never
//! blocks on a push; the consumer drains them without blocking on its own
//! tick. These channels are the only data shared between the two threads.

use crate::types::Sample;
use chrono::Local;
use crossbeam_channel::{unbounded, Receiver, Sender};

/// Prefix a message with the local wall-clock time: `[HH:MM:SS] msg`.
pub fn stamp(message: &str) -> String {
    format!("[{}] {}", Local::now().format("%H:%M:%S"), message)
}

/// Producer half, owned by the acquisition thread.
#[derive(Debug, Clone)]
pub struct BridgeSender {
    log_tx: Sender<String>,
    sample_tx: Sender<Sample>,
}

impl BridgeSender {
    /// Queue a formatted log line. Never blocks.
    ///
    /// A send only fails once the consumer is gone, at which point there is
    /// nobody left to read the line.
    pub fn push_log(&self, line: impl Into<String>) {
        let _ = self.log_tx.send(line.into());
    }

    /// Queue `message` with a wall-clock prefix.
    pub fn log(&self, message: &str) {
        self.push_log(stamp(message));
    }

    /// Queue a sample. Never blocks.
    pub fn push_sample(&self, sample: Sample) {
        let _ = self.sample_tx.send(sample);
    }
}

/// Consumer half of the bridge.
#[derive(Debug)]
pub struct EventBridge {
    sender: BridgeSender,
    log_rx: Receiver<String>,
    sample_rx: Receiver<Sample>,
}

impl Default for EventBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBridge {
    pub fn new() -> Self {
        let (log_tx, log_rx) = unbounded();
        let (sample_tx, sample_rx) = unbounded();
        Self {
            sender: BridgeSender { log_tx, sample_tx },
            log_rx,
            sample_rx,
        }
    }

    /// A producer handle for a new acquisition thread.
    pub fn sender(&self) -> BridgeSender {
        self.sender.clone()
    }

    /// Drain all pending log lines in arrival order.
    pub fn drain_logs(&self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = self.log_rx.try_recv() {
            lines.push(line);
        }
        lines
    }

    /// Drain all pending samples in arrival order.
    pub fn drain_samples(&self) -> Vec<Sample> {
        let mut samples = Vec::new();
        while let Ok(sample) = self.sample_rx.try_recv() {
            samples.push(sample);
        }
        samples
    }

    /// Discard everything pending on both channels.
    pub fn clear(&self) {
        while self.log_rx.try_recv().is_ok() {}
        while self.sample_rx.try_recv().is_ok() {}
    }

    /// Number of queued log lines.
    pub fn pending_logs(&self) -> usize {
        self.log_rx.len()
    }

    /// Number of queued samples.
    pub fn pending_samples(&self) -> usize {
        self.sample_rx.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use std::thread;

    #[test]
    fn test_drain_preserves_order() {
        let bridge = EventBridge::new();
        let tx = bridge.sender();
        let base = Local::now();
        for i in 0..5 {
            tx.push_sample(
                Sample::new(base + chrono::Duration::milliseconds(i * 100))
                    .with_reading("Engine RPM", Some(i as f64)),
            );
            tx.push_log(format!("line {}", i));
        }

        let samples = bridge.drain_samples();
        let values: Vec<_> = samples.iter().map(|s| s.reading("Engine RPM")).collect();
        assert_eq!(
            values,
            vec![Some(0.0), Some(1.0), Some(2.0), Some(3.0), Some(4.0)]
        );
        assert_eq!(bridge.drain_logs()[4], "line 4");

        assert!(bridge.drain_samples().is_empty());
        assert!(bridge.drain_logs().is_empty());
    }

    #[test]
    fn test_clear_discards_both_channels() {
        let bridge = EventBridge::new();
        let tx = bridge.sender();
        tx.push_log("stale");
        tx.push_sample(Sample::new(Local::now()));
        assert_eq!(bridge.pending_logs(), 1);
        assert_eq!(bridge.pending_samples(), 1);

        bridge.clear();
        assert_eq!(bridge.pending_logs(), 0);
        assert_eq!(bridge.pending_samples(), 0);
    }

    #[test]
    fn test_stamped_log_line() {
        let bridge = EventBridge::new();
        bridge.sender().log("Connected to ECU.");
        let line = &bridge.drain_logs()[0];
        assert!(line.starts_with('['));
        assert_eq!(&line[9..], "] Connected to ECU.");
    }

    #[test]
    fn test_cross_thread_producer() {
        let bridge = EventBridge::new();
        let tx = bridge.sender();
        let producer = thread::spawn(move || {
            for i in 0..100 {
                tx.push_sample(Sample::new(Local::now()).with_reading("MAF", Some(i as f64)));
            }
        });
        producer.join().unwrap();

        let samples = bridge.drain_samples();
        assert_eq!(samples.len(), 100);
        assert_eq!(samples[99].reading("MAF"), Some(99.0));
    }
}
