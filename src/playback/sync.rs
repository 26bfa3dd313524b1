//! Pauses playback at each "bad form" instant of an analysis result.
//!
//! Warning frames are frame indices; `frame / frame_rate` gives the offset in
//! seconds. On every time update the synchronizer looks for the first warning
//! that has been reached and is strictly later than the last one it handled.
//! Each warning therefore fires at most once per play-through, in ascending
//! order, and entries that are not above the last handled frame never fire.

use super::player::VideoHandle;
use crate::api::AnalysisResult;
use crate::types::PlayLabel;

/// Mutable playback bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackState {
	pub current_time: f64,
	/// `None` until a warning has fired in this play-through
	pub last_warning_frame_handled: Option<u32>,
	/// Index of the latest warning shown, `None` when none is shown
	pub warning_cursor: Option<usize>,
}

/// One warning as shown in the message panel
#[derive(Debug, Clone, PartialEq)]
pub struct WarningLine<'a> {
	pub timestamp: String,
	pub message: &'a str,
}

pub struct WarningSynchronizer {
	frames: Vec<u32>,
	messages: Vec<String>,
	frame_rate: f64,
	state: PlaybackState,
	label: PlayLabel,
}

impl WarningSynchronizer {
	pub fn new(result: &AnalysisResult) -> Self {
		Self {
			frames: result.warning_frames.clone(),
			messages: result.warning_messages.clone(),
			frame_rate: result.frame_rate,
			state: PlaybackState::default(),
			label: PlayLabel::Play,
		}
	}

	pub fn frame_time(&self, frame: u32) -> f64 {
		frame as f64 / self.frame_rate
	}

	/// Runs on every playback time advance. Returns the warning that fired.
	pub fn on_time_update<V: VideoHandle + ?Sized>(&mut self, video: &mut V) -> Option<usize> {
		let now = video.current_time();
		self.state.current_time = now;

		let last = self.state.last_warning_frame_handled;
		let (index, frame) = self
			.frames
			.iter()
			.copied()
			.enumerate()
			.find(|&(_, frame)| {
				self.frame_time(frame) <= now && last.is_none_or(|handled| frame > handled)
			})?;

		video.pause();
		self.state.warning_cursor = Some(index);
		self.state.last_warning_frame_handled = Some(frame);
		self.label = PlayLabel::Play;
		log::debug!(
			"Warning {} (frame {}) reached at {:.3}s, pausing",
			index,
			frame,
			now
		);
		Some(index)
	}

	/// The media reached its end.
	pub fn on_ended<V: VideoHandle + ?Sized>(&mut self, video: &V) {
		self.state.current_time = video.current_time();
		self.state.last_warning_frame_handled = None;
		self.label = PlayLabel::Restart;
		log::debug!("Playback ended at {:.3}s", self.state.current_time);
	}

	/// Restart from zero after the end, otherwise toggle play/pause.
	pub fn play_pause<V: VideoHandle + ?Sized>(&mut self, video: &mut V) {
		match self.label {
			PlayLabel::Restart => {
				video.seek(0.0);
				self.state = PlaybackState::default();
				video.play();
				self.label = PlayLabel::Pause;
			}
			_ if video.is_paused() => {
				video.play();
				self.label = PlayLabel::Pause;
			}
			_ => {
				video.pause();
				self.label = PlayLabel::Play;
			}
		}
	}

	/// Rewind to the start, paused, with every warning armed again.
	pub fn loop_from_start<V: VideoHandle + ?Sized>(&mut self, video: &mut V) {
		video.seek(0.0);
		video.pause();
		self.state = PlaybackState::default();
		self.label = PlayLabel::Play;
	}

	pub fn state(&self) -> &PlaybackState {
		&self.state
	}

	pub fn label(&self) -> PlayLabel {
		self.label
	}

	pub fn has_warnings(&self) -> bool {
		!self.frames.is_empty()
	}

	/// Offsets of every warning, for drawing markers
	pub fn warning_times(&self) -> impl Iterator<Item = f64> + '_ {
		self.frames.iter().map(|&frame| self.frame_time(frame))
	}

	/// Warnings up to and including the cursor
	pub fn visible_warnings(&self) -> Vec<WarningLine<'_>> {
		let Some(cursor) = self.state.warning_cursor else {
			return Vec::new();
		};
		self.frames
			.iter()
			.zip(&self.messages)
			.take(cursor + 1)
			.map(|(&frame, message)| WarningLine {
				timestamp: format_offset(self.frame_time(frame)),
				message,
			})
			.collect()
	}
}

/// Seconds with at most two decimals: `1s`, `1.5s`, `1.33s`.
pub fn format_offset(seconds: f64) -> String {
	let text = format!("{:.2}", seconds);
	let text = text.trim_end_matches('0').trim_end_matches('.');
	format!("{}s", text)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::playback::player::TimelinePlayer;
	use std::time::Duration;

	fn result(frames: &[u32], messages: &[&str]) -> AnalysisResult {
		AnalysisResult {
			video_url: "http://localhost/v.mp4".into(),
			warning_frames: frames.to_vec(),
			warning_messages: messages.iter().map(|m| m.to_string()).collect(),
			frame_rate: 30.0,
		}
	}

	/// Plays to the end in fixed steps, resuming after every pause.
	fn play_through(
		sync: &mut WarningSynchronizer,
		player: &mut TimelinePlayer,
		step: Duration,
	) -> Vec<usize> {
		let mut fired = Vec::new();
		sync.play_pause(player);
		for _ in 0..10_000 {
			let outcome = player.advance(step);
			if outcome.time_advanced {
				if let Some(index) = sync.on_time_update(player) {
					fired.push(index);
					sync.play_pause(player);
					continue;
				}
			}
			if outcome.reached_end {
				sync.on_ended(player);
				break;
			}
		}
		fired
	}

	#[test]
	fn pauses_at_each_warning_with_messages() {
		let mut sync = WarningSynchronizer::new(&result(&[30, 90], &["A", "B"]));
		let mut player = TimelinePlayer::new(6.0);

		sync.play_pause(&mut player);
		assert_eq!(sync.label(), PlayLabel::Pause);

		player.advance(Duration::from_millis(500));
		assert_eq!(sync.on_time_update(&mut player), None);
		player.advance(Duration::from_millis(500));
		assert_eq!(sync.on_time_update(&mut player), Some(0));
		assert!(player.is_paused());
		assert_eq!(sync.label(), PlayLabel::Play);
		assert_eq!(
			sync.visible_warnings(),
			vec![WarningLine {
				timestamp: "1s".into(),
				message: "A"
			}]
		);

		sync.play_pause(&mut player);
		player.advance(Duration::from_secs(2));
		assert_eq!(sync.on_time_update(&mut player), Some(1));
		let lines = sync.visible_warnings();
		assert_eq!(lines.len(), 2);
		assert_eq!((lines[0].timestamp.as_str(), lines[0].message), ("1s", "A"));
		assert_eq!((lines[1].timestamp.as_str(), lines[1].message), ("3s", "B"));
		assert_eq!(sync.state().last_warning_frame_handled, Some(90));
	}

	#[test]
	fn each_frame_fires_once_in_order() {
		let frames = [0, 15, 45, 46, 120, 300];
		let messages = ["a", "b", "c", "d", "e", "f"];
		let mut sync = WarningSynchronizer::new(&result(&frames, &messages));
		let mut player = TimelinePlayer::new(12.0);

		let fired = play_through(&mut sync, &mut player, Duration::from_millis(20));
		assert_eq!(fired, vec![0, 1, 2, 3, 4, 5]);
		assert_eq!(sync.label(), PlayLabel::Restart);
	}

	#[test]
	fn large_steps_still_fire_one_at_a_time() {
		let mut sync = WarningSynchronizer::new(&result(&[30, 60, 90], &["a", "b", "c"]));
		let mut player = TimelinePlayer::new(10.0);
		sync.play_pause(&mut player);
		player.advance(Duration::from_secs(5));

		assert_eq!(sync.on_time_update(&mut player), Some(0));
		assert_eq!(sync.on_time_update(&mut player), Some(1));
		assert_eq!(sync.on_time_update(&mut player), Some(2));
		assert_eq!(sync.on_time_update(&mut player), None);
	}

	#[test]
	fn unsorted_and_repeated_frames_fire_by_value_once() {
		let mut sync =
			WarningSynchronizer::new(&result(&[60, 30, 60, 90], &["a", "b", "c", "d"]));
		let mut player = TimelinePlayer::new(10.0);

		let fired = play_through(&mut sync, &mut player, Duration::from_millis(10));
		assert_eq!(fired, vec![1, 0, 3]);
	}

	#[test]
	fn no_warnings_never_pauses() {
		let mut sync = WarningSynchronizer::new(&result(&[], &[]));
		let mut player = TimelinePlayer::new(3.0);

		let fired = play_through(&mut sync, &mut player, Duration::from_millis(50));
		assert!(fired.is_empty());
		assert!(!sync.has_warnings());
		assert!(sync.visible_warnings().is_empty());
		assert_eq!(sync.label(), PlayLabel::Restart);
	}

	#[test]
	fn loop_from_start_rearms_warnings() {
		let mut sync = WarningSynchronizer::new(&result(&[30, 90], &["A", "B"]));
		let mut player = TimelinePlayer::new(6.0);
		sync.play_pause(&mut player);
		player.advance(Duration::from_secs(2));
		assert_eq!(sync.on_time_update(&mut player), Some(0));

		sync.loop_from_start(&mut player);
		assert_eq!(player.current_time(), 0.0);
		assert!(player.is_paused());
		assert_eq!(*sync.state(), PlaybackState::default());
		assert!(sync.visible_warnings().is_empty());

		let fired = play_through(&mut sync, &mut player, Duration::from_millis(100));
		assert_eq!(fired, vec![0, 1]);
	}

	#[test]
	fn restart_after_end_replays_everything() {
		let mut sync = WarningSynchronizer::new(&result(&[30, 90], &["A", "B"]));
		let mut player = TimelinePlayer::new(4.0);
		assert_eq!(
			play_through(&mut sync, &mut player, Duration::from_millis(100)),
			vec![0, 1]
		);
		assert_eq!(sync.state().last_warning_frame_handled, None);
		assert_eq!(sync.label(), PlayLabel::Restart);

		sync.play_pause(&mut player);
		assert_eq!(player.current_time(), 0.0);
		assert!(!player.is_paused());
		assert_eq!(sync.label(), PlayLabel::Pause);
		assert!(sync.visible_warnings().is_empty());

		player.advance(Duration::from_secs(1));
		assert_eq!(sync.on_time_update(&mut player), Some(0));
	}

	#[test]
	fn frame_rate_comes_from_result() {
		let mut analysis = result(&[60], &["A"]);
		analysis.frame_rate = 60.0;
		let mut sync = WarningSynchronizer::new(&analysis);
		let mut player = TimelinePlayer::new(5.0);
		sync.play_pause(&mut player);
		player.advance(Duration::from_secs(1));
		assert_eq!(sync.on_time_update(&mut player), Some(0));
		assert_eq!(sync.visible_warnings()[0].timestamp, "1s");
	}

	#[test]
	fn offsets_are_trimmed() {
		assert_eq!(format_offset(1.0), "1s");
		assert_eq!(format_offset(1.5), "1.5s");
		assert_eq!(format_offset(40.0 / 30.0), "1.33s");
		assert_eq!(format_offset(0.0), "0s");
		assert_eq!(format_offset(10.0), "10s");
	}
}
