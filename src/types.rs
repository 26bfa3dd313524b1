use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Lift being analyzed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Movement {
	Bench,
	Squat,
	Deadlift,
}

impl Movement {
	pub const ALL: [Movement; 3] = [Movement::Bench, Movement::Squat, Movement::Deadlift];

	/// Value sent in the `movement` form field
	pub fn as_str(&self) -> &'static str {
		match self {
			Movement::Bench => "bench",
			Movement::Squat => "squat",
			Movement::Deadlift => "deadlift",
		}
	}

	pub fn label(&self) -> &'static str {
		match self {
			Movement::Bench => "Bench press",
			Movement::Squat => "Squat",
			Movement::Deadlift => "Deadlift",
		}
	}
}

impl fmt::Display for Movement {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Identifies one submission so stale completions can be dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SubmissionId(pub u64);

impl SubmissionId {
	pub fn next(self) -> Self {
		SubmissionId(self.0 + 1)
	}
}

impl fmt::Display for SubmissionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Label of the context-sensitive play control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayLabel {
	#[default]
	Play,
	Pause,
	Restart,
}

impl PlayLabel {
	pub fn as_str(&self) -> &'static str {
		match self {
			PlayLabel::Play => "Play",
			PlayLabel::Pause => "Pause",
			PlayLabel::Restart => "Restart",
		}
	}
}

const VIDEO_EXTENSIONS: &[&str] = &[
	"mp4", "mov", "m4v", "webm", "mkv", "avi", "mpeg", "mpg", "3gp",
];

/// Where the selected video's bytes come from
#[derive(Clone)]
pub enum VideoSource {
	Path(PathBuf),
	/// Dropped files on some platforms arrive as bytes only
	Bytes(Arc<[u8]>),
}

impl fmt::Debug for VideoSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			VideoSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
			VideoSource::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
		}
	}
}

/// A video file chosen by the user
#[derive(Debug, Clone)]
pub struct VideoFile {
	pub name: String,
	pub mime: Option<String>,
	pub source: VideoSource,
}

impl VideoFile {
	pub fn from_path(path: PathBuf) -> Self {
		let name = path
			.file_name()
			.map(|n| n.to_string_lossy().into_owned())
			.unwrap_or_else(|| path.display().to_string());
		Self {
			name,
			mime: None,
			source: VideoSource::Path(path),
		}
	}

	pub fn from_bytes(name: impl Into<String>, mime: Option<String>, bytes: Arc<[u8]>) -> Self {
		Self {
			name: name.into(),
			mime: mime.filter(|m| !m.is_empty()),
			source: VideoSource::Bytes(bytes),
		}
	}

	/// MIME type when known, otherwise the extension decides.
	pub fn is_video(&self) -> bool {
		match &self.mime {
			Some(mime) => mime.starts_with("video/"),
			None => has_video_extension(Path::new(&self.name)),
		}
	}

	/// Size in bytes, `None` if the file can't be inspected
	pub fn len(&self) -> Option<u64> {
		match &self.source {
			VideoSource::Path(path) => std::fs::metadata(path).ok().map(|m| m.len()),
			VideoSource::Bytes(bytes) => Some(bytes.len() as u64),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == Some(0)
	}

	/// MIME type for the upload part
	pub fn content_type(&self) -> String {
		if let Some(mime) = &self.mime {
			return mime.clone();
		}
		let ext = extension_of(Path::new(&self.name));
		match ext.as_deref() {
			Some("mov") => "video/quicktime",
			Some("webm") => "video/webm",
			Some("mkv") => "video/x-matroska",
			Some("avi") => "video/x-msvideo",
			Some("mpeg") | Some("mpg") => "video/mpeg",
			Some("3gp") => "video/3gpp",
			_ => "video/mp4",
		}
		.to_owned()
	}
}

pub fn video_extensions() -> &'static [&'static str] {
	VIDEO_EXTENSIONS
}

fn extension_of(path: &Path) -> Option<String> {
	path.extension()
		.map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

fn has_video_extension(path: &Path) -> bool {
	extension_of(path).is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
}
