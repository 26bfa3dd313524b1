use super::event::Event;
use std::collections::VecDeque;

/// Event queue with one FIFO per priority level
pub struct EventQueue {
	queues: [VecDeque<Event>; 4],
}

impl EventQueue {
	pub fn new() -> Self {
		Self {
			queues: Default::default(),
		}
	}

	pub fn push(&mut self, event: Event) {
		let priority = event.priority();
		self.queues[priority.as_index()].push_back(event);
	}

	/// Highest priority first, FIFO within a level
	pub fn pop(&mut self) -> Option<Event> {
		self.queues.iter_mut().find_map(|queue| queue.pop_front())
	}

	pub fn len(&self) -> usize {
		self.queues.iter().map(VecDeque::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.queues.iter().all(VecDeque::is_empty)
	}
}

impl Default for EventQueue {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::reactor::{ChatEvent, PlaybackEvent, UploadEvent, ViewEvent};
	use crate::types::SubmissionId;

	#[test]
	fn pops_by_priority_then_arrival() {
		let mut queue = EventQueue::new();
		queue.push(Event::Upload(UploadEvent::RotateWaitingMessage {
			submission: SubmissionId(1),
		}));
		queue.push(Event::Chat(ChatEvent::Send { text: "a".into() }));
		queue.push(Event::Playback(PlaybackEvent::PlayPause));
		queue.push(Event::View(ViewEvent::Alert {
			message: "x".into(),
		}));
		assert_eq!(queue.len(), 4);

		assert!(matches!(queue.pop(), Some(Event::View(ViewEvent::Alert { .. }))));
		assert!(matches!(queue.pop(), Some(Event::Chat(ChatEvent::Send { .. }))));
		assert!(matches!(
			queue.pop(),
			Some(Event::Playback(PlaybackEvent::PlayPause))
		));
		assert!(matches!(
			queue.pop(),
			Some(Event::Upload(UploadEvent::RotateWaitingMessage { .. }))
		));
		assert!(queue.pop().is_none());
		assert!(queue.is_empty());
	}
}
