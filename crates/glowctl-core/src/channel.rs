// ── Value channel ──
//
// Coalescing queue for one control. Samples that do not move far enough
// from the last queued value are dropped; a periodic flush sends only the
// newest queued value and only if it moved far enough from the last one
// sent. The flush timer exists only while there is something to flush.

use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

use crate::model::Channel;
use crate::scheduler::{Task, TimerId, TimerQueue};

/// A value released by a flush, with the value it supersedes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flushed {
    pub value: u16,
    pub previous: u16,
}

#[derive(Debug)]
pub struct ValueChannel {
    channel: Channel,
    threshold: u16,
    cadence: Duration,
    queue: Vec<u16>,
    last_sent: u16,
    timer: Option<TimerId>,
}

impl ValueChannel {
    pub fn new(channel: Channel, threshold: u16, cadence: Duration, last_sent: u16) -> Self {
        Self {
            channel,
            threshold,
            cadence,
            queue: Vec::new(),
            last_sent,
            timer: None,
        }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Last value handed out for transmission.
    pub fn last_sent(&self) -> u16 {
        self.last_sent
    }

    /// Values waiting for the next flush, oldest first.
    pub fn pending(&self) -> &[u16] {
        &self.queue
    }

    /// Whether the flush timer is live.
    pub fn is_active(&self) -> bool {
        self.timer.is_some()
    }

    /// Queue a candidate value. Returns `false` if it was dropped as jitter.
    ///
    /// The flush timer is (re)started either way.
    pub fn offer(&mut self, value: u16, timers: &mut TimerQueue, now: Instant) -> bool {
        let significant = self
            .queue
            .last()
            .is_none_or(|&last| last.abs_diff(value) >= self.threshold);
        if significant {
            self.queue.push(value);
        } else {
            trace!(channel = %self.channel, value, "sample within threshold, dropped");
        }
        self.ensure_timer(timers, now);
        significant
    }

    /// Discard whatever is queued and queue `value` alone.
    pub fn replace(&mut self, value: u16, timers: &mut TimerQueue, now: Instant) {
        self.queue.clear();
        self.queue.push(value);
        self.ensure_timer(timers, now);
    }

    /// Periodic flush body.
    ///
    /// Takes the newest queued value and clears the queue. An empty queue
    /// stops the timer instead.
    pub fn flush(&mut self, timers: &mut TimerQueue) -> Option<Flushed> {
        let Some(&latest) = self.queue.last() else {
            self.stop_timer(timers);
            return None;
        };
        self.queue.clear();

        if latest.abs_diff(self.last_sent) < self.threshold {
            trace!(channel = %self.channel, latest, last_sent = self.last_sent, "flush suppressed");
            return None;
        }

        let previous = self.last_sent;
        self.last_sent = latest;
        Some(Flushed {
            value: latest,
            previous,
        })
    }

    /// Append the committed value and flush immediately.
    pub fn force_flush(&mut self, value: u16, timers: &mut TimerQueue) -> Option<Flushed> {
        self.queue.push(value);
        self.flush(timers)
    }

    /// Clear the queue and stop the timer.
    pub fn reset(&mut self, timers: &mut TimerQueue) {
        self.queue.clear();
        self.stop_timer(timers);
    }

    /// Overwrite `last_sent` with a value known to be on the device.
    pub fn sync(&mut self, value: u16) {
        self.last_sent = value;
    }

    fn ensure_timer(&mut self, timers: &mut TimerQueue, now: Instant) {
        if self.timer.is_none() {
            self.timer = Some(timers.schedule_repeating(now, self.cadence, Task::Flush(self.channel)));
        }
    }

    fn stop_timer(&mut self, timers: &mut TimerQueue) {
        if let Some(id) = self.timer.take() {
            timers.cancel(id);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CADENCE: Duration = Duration::from_millis(300);

    fn kelvin_channel(last_sent: u16) -> ValueChannel {
        ValueChannel::new(Channel::Kelvin, 50, CADENCE, last_sent)
    }

    #[test]
    fn jitter_is_dropped_and_latest_significant_wins() {
        let t0 = Instant::now();
        let mut timers = TimerQueue::new();
        let mut ch = kelvin_channel(4000);

        assert!(ch.offer(4500, &mut timers, t0));
        assert!(!ch.offer(4520, &mut timers, t0));
        assert!(ch.offer(4600, &mut timers, t0));

        let flushed = ch.flush(&mut timers).unwrap();
        assert_eq!(flushed, Flushed { value: 4600, previous: 4000 });
        assert!(ch.pending().is_empty());
    }

    #[test]
    fn values_near_last_sent_are_never_flushed() {
        let t0 = Instant::now();
        let mut timers = TimerQueue::new();
        let mut ch = kelvin_channel(4500);

        for v in [4500, 4510, 4490, 4540, 4460] {
            ch.offer(v, &mut timers, t0);
        }
        assert_eq!(ch.flush(&mut timers), None);
        assert_eq!(ch.last_sent(), 4500);
    }

    #[test]
    fn empty_flush_stops_timer_and_offer_restarts_it() {
        let t0 = Instant::now();
        let mut timers = TimerQueue::new();
        let mut ch = kelvin_channel(4500);

        ch.offer(5000, &mut timers, t0);
        assert!(ch.is_active());
        ch.flush(&mut timers);
        assert!(ch.is_active(), "timer survives a flush that found work");

        assert_eq!(ch.flush(&mut timers), None);
        assert!(!ch.is_active());
        assert!(timers.is_empty());

        ch.offer(5600, &mut timers, t0);
        assert!(ch.is_active());
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn force_flush_sends_committed_value() {
        let t0 = Instant::now();
        let mut timers = TimerQueue::new();
        let mut ch = kelvin_channel(3000);

        ch.offer(3400, &mut timers, t0);
        ch.offer(3800, &mut timers, t0);
        let flushed = ch.force_flush(3820, &mut timers).unwrap();

        assert_eq!(flushed.value, 3820);
        assert_eq!(ch.last_sent(), 3820);
        assert!(ch.pending().is_empty());
    }

    #[test]
    fn reset_clears_queue_and_timer() {
        let t0 = Instant::now();
        let mut timers = TimerQueue::new();
        let mut ch = kelvin_channel(3000);

        ch.offer(4000, &mut timers, t0);
        ch.reset(&mut timers);
        ch.reset(&mut timers);

        assert!(ch.pending().is_empty());
        assert!(!ch.is_active());
        assert!(timers.is_empty());
    }

    #[test]
    fn commands_scale_with_plateaus_not_samples() {
        let t0 = Instant::now();
        let mut timers = TimerQueue::new();
        let mut ch = ValueChannel::new(Channel::Brightness, 5, CADENCE, 10);
        let mut sent = 0;

        // Three plateaus of 200 jittery samples each, flushed every 20 samples.
        for (i, base) in [10u16, 40, 90].iter().flat_map(|b| std::iter::repeat_n(*b, 200)).enumerate() {
            let jitter = u16::try_from(i % 3).unwrap();
            ch.offer(base + jitter, &mut timers, t0);
            if i % 20 == 19 && ch.flush(&mut timers).is_some() {
                sent += 1;
            }
        }
        if ch.force_flush(90, &mut timers).is_some() {
            sent += 1;
        }

        assert_eq!(sent, 2);
    }
}
