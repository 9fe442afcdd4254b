// ── Timer scheduling ──
//
// One queue holds every timer the engine owns: the animation frame and the
// two flush intervals. Time is always passed in, never read, so the same
// queue runs against the tokio clock in the driver and against a hand-
// advanced `Instant` in tests.

use std::time::Duration;

use tokio::time::Instant;

use crate::model::Channel;

/// Opaque handle returned by the schedule calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Work a timer triggers when it comes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    AnimationFrame,
    Flush(Channel),
}

#[derive(Debug)]
struct Timer {
    id: TimerId,
    due: Instant,
    every: Option<Duration>,
    task: Task,
}

/// Deadline-ordered set of one-shot and repeating timers.
#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    timers: Vec<Timer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `task` once, `after` from `now`.
    pub fn schedule_once(&mut self, now: Instant, after: Duration, task: Task) -> TimerId {
        self.insert(now + after, None, task)
    }

    /// Fire `task` every `every`, first at `now + every`.
    pub fn schedule_repeating(&mut self, now: Instant, every: Duration, task: Task) -> TimerId {
        self.insert(now + every, Some(every), task)
    }

    /// Remove a timer. Returns `false` if it had already fired or been cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.timers.iter().any(|t| t.id == id)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.iter().map(|t| t.due).min()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// Take the earliest timer due at or before `now`.
    ///
    /// One-shot timers are removed. Repeating timers are pushed forward by
    /// their period; a timer that has fallen more than a period behind
    /// restarts from `now` instead of replaying the backlog.
    pub fn pop_due(&mut self, now: Instant) -> Option<(TimerId, Task)> {
        let idx = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= now)
            .min_by_key(|(_, t)| (t.due, t.id))
            .map(|(i, _)| i)?;

        let timer = self.timers.get_mut(idx)?;
        let fired = (timer.id, timer.task);
        let every = timer.every;

        match every {
            Some(every) => {
                let next = timer.due + every;
                timer.due = if next <= now { now + every } else { next };
            }
            None => {
                self.timers.swap_remove(idx);
            }
        }

        Some(fired)
    }

    fn insert(&mut self, due: Instant, every: Option<Duration>, task: Task) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.timers.push(Timer {
            id,
            due,
            every,
            task,
        });
        id
    }
}
