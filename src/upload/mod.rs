use crate::api::AnalysisResult;
use crate::reactor::{ComponentResponse, Event, GatewayEvent, PlaybackEvent, UploadEvent};
use crate::settings::Settings;
use crate::types::{Movement, SubmissionId, VideoFile};
use std::time::{Duration, Instant};

/// Shown in rotation while the analysis runs
pub const WAITING_MESSAGES: &[&str] = &[
	"Uploading your lift...",
	"Finding your joints...",
	"Measuring angles frame by frame...",
	"Checking your depth and lockout...",
	"Comparing against good form...",
	"Almost there...",
];

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum SubmitError {
	#[error("Please select a video file first.")]
	MissingFile,
	#[error("Please choose a movement.")]
	MissingMovement,
	#[error("'{0}' is empty.")]
	EmptyFile(String),
	#[error("'{0}' is not a video file.")]
	NotVideo(String),
}

/// Result of a finished submission
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
	pub result: AnalysisResult,
	/// Set when the request failed and `result` is the empty placeholder
	pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
	Idle,
	Submitting {
		submission: SubmissionId,
		started_at: Instant,
		waiting_index: usize,
	},
	Complete {
		outcome: Outcome,
	},
}

pub struct UploadController {
	phase: Phase,
	file: Option<VideoFile>,
	movement: Option<Movement>,
	last_submission: SubmissionId,
	frame_rate: f64,
	waiting_interval: Duration,
}

impl UploadController {
	pub fn new(settings: &Settings) -> Self {
		log::info!("Initializing upload controller");
		Self {
			phase: Phase::Idle,
			file: None,
			movement: None,
			last_submission: SubmissionId::default(),
			frame_rate: settings.frame_rate,
			waiting_interval: settings.waiting_message_interval(),
		}
	}

	pub fn handle(&mut self, event: &Event) -> ComponentResponse {
		let Event::Upload(event) = event else {
			return ComponentResponse::none();
		};

		match event {
			UploadEvent::SelectFile { file } => match self.select_file(file.clone()) {
				Ok(()) => ComponentResponse::none(),
				Err(e) => ComponentResponse::alert(e.to_string()),
			},
			UploadEvent::SelectMovement { movement } => {
				self.select_movement(*movement);
				ComponentResponse::none()
			}
			UploadEvent::Submit => self.submit(),
			UploadEvent::Reset => self.reset(),
			UploadEvent::RotateWaitingMessage { submission } => self.rotate(*submission),
			UploadEvent::AnalysisReceived { submission, result } => {
				self.complete(*submission, result.clone(), None)
			}
			UploadEvent::AnalysisFailed {
				submission,
				message,
			} => self.complete(
				*submission,
				AnalysisResult::empty(self.frame_rate),
				Some(message.clone()),
			),
		}
	}

	fn select_file(&mut self, file: VideoFile) -> Result<(), SubmitError> {
		if !matches!(self.phase, Phase::Idle) {
			log::debug!("File selection ignored outside the idle phase");
			return Ok(());
		}
		if !file.is_video() {
			log::warn!("Rejected non-video file '{}'", file.name);
			return Err(SubmitError::NotVideo(file.name));
		}
		log::info!("Selected file '{}'", file.name);
		self.file = Some(file);
		Ok(())
	}

	fn select_movement(&mut self, movement: Movement) {
		log::debug!("Selected movement {}", movement);
		self.movement = Some(movement);
	}

	fn validate(&self) -> Result<(VideoFile, Movement), SubmitError> {
		let file = self.file.as_ref().ok_or(SubmitError::MissingFile)?;
		let movement = self.movement.ok_or(SubmitError::MissingMovement)?;
		if file.is_empty() {
			return Err(SubmitError::EmptyFile(file.name.clone()));
		}
		Ok((file.clone(), movement))
	}

	fn submit(&mut self) -> ComponentResponse {
		if !matches!(self.phase, Phase::Idle) {
			log::warn!("Submit ignored: a submission is already in progress or complete");
			return ComponentResponse::none();
		}

		let (file, movement) = match self.validate() {
			Ok(valid) => valid,
			Err(e) => {
				log::warn!("Submit blocked: {}", e);
				return ComponentResponse::alert(e.to_string());
			}
		};

		let submission = self.last_submission.next();
		self.last_submission = submission;
		self.phase = Phase::Submitting {
			submission,
			started_at: Instant::now(),
			waiting_index: 0,
		};
		log::info!(
			"Submission {} started: '{}' as {}",
			submission,
			file.name,
			movement
		);

		ComponentResponse::emit(Event::Gateway(GatewayEvent::CheckForm {
			submission,
			file,
			movement,
		}))
		.and_schedule(
			Event::Upload(UploadEvent::RotateWaitingMessage { submission }),
			self.waiting_interval,
		)
	}

	fn rotate(&mut self, submission: SubmissionId) -> ComponentResponse {
		match &mut self.phase {
			Phase::Submitting {
				submission: current,
				waiting_index,
				..
			} if *current == submission => {
				*waiting_index = (*waiting_index + 1) % WAITING_MESSAGES.len();
				ComponentResponse::schedule(
					Event::Upload(UploadEvent::RotateWaitingMessage { submission }),
					self.waiting_interval,
				)
			}
			_ => ComponentResponse::none(),
		}
	}

	fn complete(
		&mut self,
		submission: SubmissionId,
		result: AnalysisResult,
		error: Option<String>,
	) -> ComponentResponse {
		let started_at = match &self.phase {
			Phase::Submitting {
				submission: current,
				started_at,
				..
			} if *current == submission => *started_at,
			_ => {
				log::warn!("Dropping stale completion for submission {}", submission);
				return ComponentResponse::none();
			}
		};

		match &error {
			Some(message) => log::error!(
				"Submission {} failed after {:.1}s: {}",
				submission,
				started_at.elapsed().as_secs_f32(),
				message
			),
			None => log::info!(
				"Submission {} complete after {:.1}s with {} warnings",
				submission,
				started_at.elapsed().as_secs_f32(),
				result.warning_frames.len()
			),
		}

		let failed = error.is_some();
		self.phase = Phase::Complete {
			outcome: Outcome {
				result: result.clone(),
				error,
			},
		};
		if failed {
			return ComponentResponse::none();
		}
		ComponentResponse::emit(Event::Playback(PlaybackEvent::Load { result }))
	}

	fn reset(&mut self) -> ComponentResponse {
		log::info!("Resetting to idle");
		self.phase = Phase::Idle;
		self.file = None;
		self.movement = None;
		ComponentResponse::emit(Event::Playback(PlaybackEvent::Unload))
	}

	pub fn phase(&self) -> &Phase {
		&self.phase
	}

	pub fn file(&self) -> Option<&VideoFile> {
		self.file.as_ref()
	}

	pub fn movement(&self) -> Option<Movement> {
		self.movement
	}

	pub fn waiting_message(&self) -> Option<&'static str> {
		match self.phase {
			Phase::Submitting { waiting_index, .. } => Some(WAITING_MESSAGES[waiting_index]),
			_ => None,
		}
	}

	pub fn is_submitting(&self) -> bool {
		matches!(self.phase, Phase::Submitting { .. })
	}
}
