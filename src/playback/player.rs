use eframe::egui;
use std::time::{Duration, Instant};

/// Control surface of a playing video.
///
/// The synchronizer is handed one of these for every operation and never
/// looks a player up by itself.
pub trait VideoHandle {
	/// Playback position in seconds
	fn current_time(&self) -> f64;
	fn duration(&self) -> f64;
	fn is_paused(&self) -> bool;
	fn is_ended(&self) -> bool;
	fn play(&mut self);
	fn pause(&mut self);
	fn seek(&mut self, seconds: f64);
}

/// A handle the playback controller owns and polls once per frame.
pub trait MediaPlayer: VideoHandle {
	fn tick(&mut self, now: Instant) -> TickOutcome;

	/// Draw the current frame into at most `max_size`. Returns false when
	/// the player has no picture to show.
	fn show(&mut self, _ui: &mut egui::Ui, _max_size: egui::Vec2) -> bool {
		false
	}

	fn progress(&self) -> f32 {
		let duration = self.duration();
		if duration <= 0.0 {
			return 0.0;
		}
		(self.current_time() / duration).clamp(0.0, 1.0) as f32
	}
}

/// What happened to a player during one clock advance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
	pub time_advanced: bool,
	pub reached_end: bool,
}

/// Wall-clock media timeline of a known duration, used when no decoded
/// video is available.
#[derive(Debug, Clone)]
pub struct TimelinePlayer {
	position: f64,
	duration: f64,
	playing: bool,
	last_tick: Option<Instant>,
}

impl TimelinePlayer {
	pub fn new(duration: f64) -> Self {
		Self {
			position: 0.0,
			duration: duration.max(0.0),
			playing: false,
			last_tick: None,
		}
	}

	pub fn advance(&mut self, elapsed: Duration) -> TickOutcome {
		if !self.playing || elapsed.is_zero() {
			return TickOutcome::default();
		}

		self.position = (self.position + elapsed.as_secs_f64()).min(self.duration);
		let reached_end = self.position >= self.duration;
		if reached_end {
			self.playing = false;
			self.last_tick = None;
		}
		TickOutcome {
			time_advanced: true,
			reached_end,
		}
	}
}

impl MediaPlayer for TimelinePlayer {
	/// Advance by the wall time elapsed since the previous call.
	fn tick(&mut self, now: Instant) -> TickOutcome {
		let elapsed = match self.last_tick.replace(now) {
			Some(prev) if self.playing => now.saturating_duration_since(prev),
			_ => Duration::ZERO,
		};
		self.advance(elapsed)
	}
}

impl VideoHandle for TimelinePlayer {
	fn current_time(&self) -> f64 {
		self.position
	}

	fn duration(&self) -> f64 {
		self.duration
	}

	fn is_paused(&self) -> bool {
		!self.playing
	}

	fn is_ended(&self) -> bool {
		self.position >= self.duration
	}

	fn play(&mut self) {
		if self.is_ended() {
			self.position = 0.0;
		}
		self.playing = true;
		self.last_tick = None;
	}

	fn pause(&mut self) {
		self.playing = false;
		self.last_tick = None;
	}

	fn seek(&mut self, seconds: f64) {
		self.position = seconds.clamp(0.0, self.duration);
	}
}
