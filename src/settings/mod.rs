use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SETTINGS_FILE: &str = "settings.toml";

/// User-editable client configuration, persisted as TOML.
///
/// Every field has a default so a partial file is still valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	/// Scheme and host of the analysis server, e.g. `http://127.0.0.1:8000`
	pub base_url: String,
	pub check_form_path: String,
	pub chat_path: String,
	/// Frames per second used to turn warning frame indices into offsets
	pub frame_rate: f64,
	pub waiting_message_interval_secs: u64,
	/// Extra playback time after the last warning
	pub playback_tail_secs: f64,
	pub min_playback_secs: f64,
	/// Most recent chat messages resent on each turn
	pub chat_history_limit: usize,
	/// No timeout when absent
	pub request_timeout_secs: Option<u64>,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			base_url: "http://127.0.0.1:8000".to_owned(),
			check_form_path: "/check-form".to_owned(),
			chat_path: "/chat".to_owned(),
			frame_rate: 30.0,
			waiting_message_interval_secs: 3,
			playback_tail_secs: 3.0,
			min_playback_secs: 5.0,
			chat_history_limit: 20,
			request_timeout_secs: None,
		}
	}
}

impl Settings {
	/// Location of the settings file in the platform config directory.
	pub fn default_path() -> Option<PathBuf> {
		ProjectDirs::from("", "", "formcheck").map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
	}

	pub fn from_toml(text: &str) -> anyhow::Result<Self> {
		let mut settings: Settings = toml::from_str(text)?;
		settings.sanitize();
		Ok(settings)
	}

	pub fn load(path: &Path) -> anyhow::Result<Self> {
		let text = fs::read_to_string(path)
			.with_context(|| format!("reading settings from {}", path.display()))?;
		Self::from_toml(&text)
	}

	pub fn save(&self, path: &Path) -> anyhow::Result<()> {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)?;
		}
		let text = toml::to_string_pretty(self)?;
		fs::write(path, text).with_context(|| format!("writing settings to {}", path.display()))?;
		Ok(())
	}

	/// Loads the settings file, falling back to defaults.
	///
	/// A missing file is created with the defaults; a broken one is left alone.
	pub fn load_or_default() -> Self {
		let Some(path) = Self::default_path() else {
			log::warn!("No config directory available, using default settings");
			return Self::default();
		};

		if !path.exists() {
			let settings = Self::default();
			match settings.save(&path) {
				Ok(()) => log::info!("Wrote default settings to {}", path.display()),
				Err(e) => log::warn!("Could not write default settings: {:#}", e),
			}
			return settings;
		}

		match Self::load(&path) {
			Ok(settings) => {
				log::info!("Loaded settings from {}", path.display());
				settings
			}
			Err(e) => {
				log::warn!("Ignoring unreadable settings file: {:#}", e);
				Self::default()
			}
		}
	}

	fn sanitize(&mut self) {
		if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
			log::warn!("Invalid frame_rate {}, using 30", self.frame_rate);
			self.frame_rate = 30.0;
		}
		self.waiting_message_interval_secs = self.waiting_message_interval_secs.max(1);
		self.playback_tail_secs = self.playback_tail_secs.max(0.0);
		self.min_playback_secs = self.min_playback_secs.max(0.0);
		self.chat_history_limit = self.chat_history_limit.max(1);
		while self.base_url.ends_with('/') {
			self.base_url.pop();
		}
	}

	pub fn check_form_url(&self) -> String {
		format!("{}{}", self.base_url, self.check_form_path)
	}

	pub fn chat_url(&self) -> String {
		format!("{}{}", self.base_url, self.chat_path)
	}

	pub fn waiting_message_interval(&self) -> Duration {
		Duration::from_secs(self.waiting_message_interval_secs)
	}

	pub fn request_timeout(&self) -> Option<Duration> {
		self.request_timeout_secs.map(Duration::from_secs)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_file_keeps_defaults() {
		let settings = Settings::from_toml("base_url = \"http://example.com:9000/\"\n").unwrap();
		assert_eq!(settings.base_url, "http://example.com:9000");
		assert_eq!(settings.frame_rate, 30.0);
		assert_eq!(settings.check_form_url(), "http://example.com:9000/check-form");
		assert_eq!(settings.chat_url(), "http://example.com:9000/chat");
		assert_eq!(settings.request_timeout(), None);
	}

	#[test]
	fn bad_values_are_clamped() {
		let settings = Settings::from_toml(
			"frame_rate = 0.0\nwaiting_message_interval_secs = 0\nchat_history_limit = 0\n",
		)
		.unwrap();
		assert_eq!(settings.frame_rate, 30.0);
		assert_eq!(settings.waiting_message_interval(), Duration::from_secs(1));
		assert_eq!(settings.chat_history_limit, 1);
	}

	#[test]
	fn save_then_load() {
		let dir = std::env::temp_dir().join(format!("formcheck-settings-{}", std::process::id()));
		let path = dir.join(SETTINGS_FILE);
		let settings = Settings {
			frame_rate: 60.0,
			request_timeout_secs: Some(30),
			..Settings::default()
		};
		settings.save(&path).unwrap();
		let loaded = Settings::load(&path).unwrap();
		assert_eq!(loaded, settings);
		let _ = fs::remove_dir_all(dir);
	}

	#[test]
	fn malformed_file_is_an_error() {
		assert!(Settings::from_toml("frame_rate = \"fast\"").is_err());
	}
}
