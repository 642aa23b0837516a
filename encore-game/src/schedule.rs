//! Deferred work behind the presentation delay.
//!
//! The session hands the scheduler a task when a venue is chosen and polls
//! for due tasks. Hosts pick a clock: wall time, a manual clock for tests,
//! or immediate dispatch for headless runs.
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScheduledTask {
    /// Score and settle the release in flight.
    ResolveRelease,
}

pub trait Scheduler {
    fn schedule_after(&mut self, delay: Duration, task: ScheduledTask);

    /// Remove and return every task whose delay has elapsed, oldest first.
    fn take_due(&mut self) -> Vec<ScheduledTask>;

    fn pending(&self) -> usize;
}

/// Test clock advanced by hand.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    now: Duration,
    queue: Vec<(Duration, ScheduledTask)>,
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, by: Duration) {
        self.now = self.now.saturating_add(by);
    }

    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_after(&mut self, delay: Duration, task: ScheduledTask) {
        self.queue.push((self.now.saturating_add(delay), task));
    }

    fn take_due(&mut self) -> Vec<ScheduledTask> {
        let now = self.now;
        let (mut due, waiting): (Vec<_>, Vec<_>) =
            self.queue.drain(..).partition(|(at, _)| *at <= now);
        self.queue = waiting;
        due.sort_by_key(|(at, _)| *at);
        due.into_iter().map(|(_, task)| task).collect()
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }
}

/// Every task is due as soon as it is scheduled.
#[derive(Debug, Clone, Default)]
pub struct ImmediateScheduler {
    queue: Vec<ScheduledTask>,
}

impl Scheduler for ImmediateScheduler {
    fn schedule_after(&mut self, _delay: Duration, task: ScheduledTask) {
        self.queue.push(task);
    }

    fn take_due(&mut self) -> Vec<ScheduledTask> {
        std::mem::take(&mut self.queue)
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }
}

/// Wall-clock scheduler for interactive hosts.
#[derive(Debug, Clone, Default)]
pub struct ClockScheduler {
    queue: Vec<(Instant, ScheduledTask)>,
}

impl Scheduler for ClockScheduler {
    fn schedule_after(&mut self, delay: Duration, task: ScheduledTask) {
        let now = Instant::now();
        let at = now.checked_add(delay).unwrap_or(now);
        self.queue.push((at, task));
    }

    fn take_due(&mut self) -> Vec<ScheduledTask> {
        let now = Instant::now();
        let (mut due, waiting): (Vec<_>, Vec<_>) =
            self.queue.drain(..).partition(|(at, _)| *at <= now);
        self.queue = waiting;
        due.sort_by_key(|(at, _)| *at);
        due.into_iter().map(|(_, task)| task).collect()
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_scheduler_waits_for_delay() {
        let mut scheduler = ManualScheduler::new();
        scheduler.schedule_after(Duration::from_millis(1_200), ScheduledTask::ResolveRelease);
        assert!(scheduler.take_due().is_empty());
        scheduler.advance(Duration::from_millis(1_199));
        assert!(scheduler.take_due().is_empty());
        scheduler.advance(Duration::from_millis(1));
        assert_eq!(scheduler.take_due(), vec![ScheduledTask::ResolveRelease]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn immediate_scheduler_dispatches_at_once() {
        let mut scheduler = ImmediateScheduler::default();
        scheduler.schedule_after(Duration::from_secs(60), ScheduledTask::ResolveRelease);
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.take_due().len(), 1);
        assert!(scheduler.take_due().is_empty());
    }

    #[test]
    fn clock_scheduler_zero_delay_is_due() {
        let mut scheduler = ClockScheduler::default();
        scheduler.schedule_after(Duration::ZERO, ScheduledTask::ResolveRelease);
        scheduler.schedule_after(Duration::from_secs(3_600), ScheduledTask::ResolveRelease);
        assert_eq!(scheduler.take_due().len(), 1);
        assert_eq!(scheduler.pending(), 1);
    }
}
