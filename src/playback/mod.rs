#[cfg(feature = "video")]
pub mod decoded;
pub mod player;
pub mod sync;

pub use player::{MediaPlayer, TimelinePlayer, VideoHandle};
pub use sync::WarningSynchronizer;

use crate::api::AnalysisResult;
use crate::reactor::{ComponentResponse, Event, PlaybackEvent};
use crate::settings::Settings;
use eframe::egui;
use std::time::Instant;

/// The loaded video together with its synchronizer
pub struct PlaybackSession {
	pub player: Box<dyn MediaPlayer>,
	pub sync: WarningSynchronizer,
}

pub struct PlaybackController {
	session: Option<PlaybackSession>,
	tail_secs: f64,
	min_secs: f64,
	#[cfg_attr(not(feature = "video"), allow(dead_code))]
	egui_ctx: Option<egui::Context>,
}

impl PlaybackController {
	pub fn new(settings: &Settings, ctx: Option<&egui::Context>) -> Self {
		Self {
			session: None,
			tail_secs: settings.playback_tail_secs,
			min_secs: settings.min_playback_secs,
			egui_ctx: ctx.cloned(),
		}
	}

	/// Length of the fallback timeline: last warning plus the tail.
	fn timeline_length(&self, sync: &WarningSynchronizer) -> f64 {
		let last_warning = sync.warning_times().fold(0.0, f64::max);
		(last_warning + self.tail_secs).max(self.min_secs)
	}

	/// Decoded video when it can be opened, otherwise a timeline over the warnings.
	fn open_player(
		&self,
		result: &AnalysisResult,
		sync: &WarningSynchronizer,
	) -> Box<dyn MediaPlayer> {
		#[cfg(feature = "video")]
		if let Some(ctx) = self.egui_ctx.as_ref().filter(|_| result.has_video()) {
			match decoded::DecodedVideo::open(ctx, &result.video_url) {
				Ok(video) => return Box::new(video),
				Err(e) => log::error!("Failed to open video {}: {:#}", result.video_url, e),
			}
		}

		let length = self.timeline_length(sync);
		log::info!(
			"No decoded video for {:?}, using a {:.2}s warning timeline",
			result.video_url,
			length
		);
		Box::new(TimelinePlayer::new(length))
	}

	pub fn load(&mut self, result: &AnalysisResult, player: Box<dyn MediaPlayer>) {
		log::info!(
			"Loading playback: {} warnings over {:.2}s",
			result.warning_frames.len(),
			player.duration()
		);
		self.session = Some(PlaybackSession {
			player,
			sync: WarningSynchronizer::new(result),
		});
	}

	pub fn poll(&mut self) -> ComponentResponse {
		self.poll_at(Instant::now())
	}

	/// Advance the clock and let the synchronizer react.
	pub fn poll_at(&mut self, now: Instant) -> ComponentResponse {
		let Some(session) = self.session.as_mut() else {
			return ComponentResponse::none();
		};

		let outcome = session.player.tick(now);
		if outcome.time_advanced {
			session.sync.on_time_update(session.player.as_mut());
		}
		if outcome.reached_end {
			session.sync.on_ended(session.player.as_ref());
		}
		ComponentResponse::none()
	}

	pub fn handle(&mut self, event: &Event) -> ComponentResponse {
		match event {
			Event::Playback(PlaybackEvent::Load { result }) => {
				let sync = WarningSynchronizer::new(result);
				let player = self.open_player(result, &sync);
				self.load(result, player);
			}
			Event::Playback(PlaybackEvent::PlayPause) => {
				if let Some(session) = self.session.as_mut() {
					session.sync.play_pause(session.player.as_mut());
					log::debug!("Play/pause -> label {:?}", session.sync.label());
				}
			}
			Event::Playback(PlaybackEvent::LoopFromStart) => {
				if let Some(session) = self.session.as_mut() {
					session.sync.loop_from_start(session.player.as_mut());
					log::info!("Looped playback to start");
				}
			}
			Event::Playback(PlaybackEvent::Unload) => {
				if self.session.take().is_some() {
					log::info!("Playback unloaded");
				}
			}
			_ => {}
		}
		ComponentResponse::none()
	}

	pub fn session(&self) -> Option<&PlaybackSession> {
		self.session.as_ref()
	}

	pub fn session_mut(&mut self) -> Option<&mut PlaybackSession> {
		self.session.as_mut()
	}

	pub fn is_playing(&self) -> bool {
		self.session
			.as_ref()
			.is_some_and(|s| !s.player.is_paused())
	}
}
