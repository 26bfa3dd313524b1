use super::event::Event;
use super::queue::EventQueue;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

struct ScheduledEvent {
	emit_at: Instant,
	event: Event,
}

impl PartialEq for ScheduledEvent {
	fn eq(&self, other: &Self) -> bool {
		self.emit_at == other.emit_at
	}
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

// Reversed so the heap yields the earliest deadline
impl Ord for ScheduledEvent {
	fn cmp(&self, other: &Self) -> Ordering {
		other.emit_at.cmp(&self.emit_at)
	}
}

pub struct Scheduler {
	pending: BinaryHeap<ScheduledEvent>,
}

impl Scheduler {
	pub fn new() -> Self {
		Self {
			pending: BinaryHeap::new(),
		}
	}

	pub fn schedule(&mut self, event: Event, delay: Duration) {
		self.schedule_at(event, Instant::now() + delay);
	}

	pub fn schedule_at(&mut self, event: Event, emit_at: Instant) {
		self.pending.push(ScheduledEvent { emit_at, event });
	}

	/// Move every event due at `now` into the queue
	pub fn tick_at(&mut self, now: Instant, queue: &mut EventQueue) {
		while self.pending.peek().is_some_and(|s| s.emit_at <= now) {
			if let Some(scheduled) = self.pending.pop() {
				queue.push(scheduled.event);
			}
		}
	}

	pub fn tick(&mut self, queue: &mut EventQueue) {
		self.tick_at(Instant::now(), queue);
	}

	/// Time until the earliest pending event, if any
	pub fn next_due(&self) -> Option<Duration> {
		self.pending
			.peek()
			.map(|s| s.emit_at.saturating_duration_since(Instant::now()))
	}
}

impl Default for Scheduler {
	fn default() -> Self {
		Self::new()
	}
}
