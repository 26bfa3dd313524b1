use crate::api::{AnalysisResult, ChatMessage};
use crate::types::{Movement, SubmissionId, VideoFile};
use std::time::Duration;

#[derive(Clone, Debug)]
pub enum Event {
	Upload(UploadEvent),
	Gateway(GatewayEvent),
	Playback(PlaybackEvent),
	Chat(ChatEvent),
	View(ViewEvent),
}

impl Event {
	pub fn priority(&self) -> Priority {
		match self {
			Event::View(ViewEvent::Alert { .. }) => Priority::Critical,
			Event::Upload(UploadEvent::AnalysisFailed { .. }) => Priority::High,
			Event::Upload(UploadEvent::RotateWaitingMessage { .. }) => Priority::Low,
			Event::Upload(_) => Priority::Normal,
			Event::Gateway(_) => Priority::Normal,
			Event::Playback(PlaybackEvent::Unload) => Priority::High,
			Event::Playback(_) => Priority::Normal,
			Event::Chat(_) => Priority::Normal,
			Event::View(_) => Priority::Normal,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
	Critical = 0,
	High = 1,
	Normal = 2,
	Low = 3,
}

impl Priority {
	pub fn as_index(&self) -> usize {
		*self as usize
	}
}

#[derive(Clone, Debug)]
pub enum UploadEvent {
	SelectFile {
		file: VideoFile,
	},
	SelectMovement {
		movement: Movement,
	},
	Submit,
	/// Back to the idle form, dropping any result
	Reset,
	RotateWaitingMessage {
		submission: SubmissionId,
	},
	AnalysisReceived {
		submission: SubmissionId,
		result: AnalysisResult,
	},
	AnalysisFailed {
		submission: SubmissionId,
		message: String,
	},
}

#[derive(Clone, Debug)]
pub enum GatewayEvent {
	CheckForm {
		submission: SubmissionId,
		file: VideoFile,
		movement: Movement,
	},
	Chat {
		messages: Vec<ChatMessage>,
	},
}

#[derive(Clone, Debug)]
pub enum PlaybackEvent {
	Load { result: AnalysisResult },
	PlayPause,
	LoopFromStart,
	Unload,
}

#[derive(Clone, Debug)]
pub enum ChatEvent {
	Send { text: String },
	ReplyReceived { text: String },
	ReplyFailed { message: String },
}

#[derive(Clone, Debug)]
pub enum ViewEvent {
	/// Blocking message box
	Alert { message: String },
}

/// Response from component.handle()
#[derive(Default, Debug)]
pub struct ComponentResponse {
	/// Events to dispatch immediately
	pub events: Vec<Event>,
	/// Events to schedule (event, delay)
	pub scheduled: Vec<(Event, Duration)>,
}

impl ComponentResponse {
	pub fn none() -> Self {
		Self::default()
	}

	pub fn emit(event: Event) -> Self {
		Self {
			events: vec![event],
			scheduled: vec![],
		}
	}

	pub fn emit_many(events: Vec<Event>) -> Self {
		Self {
			events,
			scheduled: vec![],
		}
	}

	pub fn schedule(event: Event, delay: Duration) -> Self {
		Self {
			events: vec![],
			scheduled: vec![(event, delay)],
		}
	}

	pub fn alert(message: impl Into<String>) -> Self {
		Self::emit(Event::View(ViewEvent::Alert {
			message: message.into(),
		}))
	}

	pub fn and_schedule(mut self, event: Event, delay: Duration) -> Self {
		self.scheduled.push((event, delay));
		self
	}
}
