//! Annotated video decoded with ffmpeg and drawn into the result panel.
//!
//! Position, duration and the end of the media all come from the decoder,
//! so warnings pause the picture the user is looking at.

use super::player::{MediaPlayer, TickOutcome, VideoHandle};
use eframe::egui;
use egui_video::{Player, PlayerState};
use std::time::Instant;

pub struct DecodedVideo {
	player: Player,
	last_time: f64,
	was_ended: bool,
}

impl DecodedVideo {
	/// Opens the stream paused on its first frame.
	pub fn open(ctx: &egui::Context, url: &str) -> anyhow::Result<Self> {
		let player = Player::new(ctx, &url.to_owned())?;
		log::info!(
			"Opened video {} ({} ms, {}x{})",
			url,
			player.duration_ms,
			player.size.x,
			player.size.y
		);
		Ok(Self {
			player,
			last_time: 0.0,
			was_ended: false,
		})
	}

	fn state(&self) -> PlayerState {
		self.player.player_state.get()
	}
}

impl MediaPlayer for DecodedVideo {
	fn tick(&mut self, _now: Instant) -> TickOutcome {
		let time = self.current_time();
		let time_advanced = time != self.last_time;
		self.last_time = time;

		let ended = self.is_ended();
		let reached_end = ended && !self.was_ended;
		self.was_ended = ended;

		TickOutcome {
			time_advanced,
			reached_end,
		}
	}

	fn show(&mut self, ui: &mut egui::Ui, max_size: egui::Vec2) -> bool {
		let size = crate::view::fit_within(self.player.size, max_size);
		self.player.ui(ui, size);
		true
	}
}

impl VideoHandle for DecodedVideo {
	fn current_time(&self) -> f64 {
		self.player.elapsed_ms() as f64 / 1000.0
	}

	fn duration(&self) -> f64 {
		self.player.duration_ms as f64 / 1000.0
	}

	fn is_paused(&self) -> bool {
		!matches!(self.state(), PlayerState::Playing)
	}

	fn is_ended(&self) -> bool {
		matches!(self.state(), PlayerState::EndOfFile)
	}

	fn play(&mut self) {
		match self.state() {
			PlayerState::Playing => {}
			PlayerState::Stopped | PlayerState::EndOfFile => self.player.start(),
			_ => self.player.resume(),
		}
	}

	fn pause(&mut self) {
		self.player.pause();
	}

	fn seek(&mut self, seconds: f64) {
		let duration_ms = self.player.duration_ms;
		if duration_ms <= 0 {
			return;
		}
		let fraction = (seconds * 1000.0 / duration_ms as f64).clamp(0.0, 1.0);
		self.player.seek(fraction as f32);
	}
}
