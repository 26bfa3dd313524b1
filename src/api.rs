use crate::settings::Settings;
use crate::types::{Movement, VideoFile, VideoSource};
use anyhow::Context;
use reqwest::Url;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

/// Raw body of a successful `check-form` call
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CheckFormResponse {
	pub url: String,
	pub warning_frames: Vec<u32>,
	pub warning_messages: Vec<String>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ResponseError {
	#[error("server returned {frames} warning frames but {messages} messages")]
	MisalignedWarnings { frames: usize, messages: usize },
}

/// Analysis of one uploaded video, ready for playback
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
	/// Playable location of the annotated video, empty when unavailable
	pub video_url: String,
	pub warning_frames: Vec<u32>,
	pub warning_messages: Vec<String>,
	pub frame_rate: f64,
}

impl AnalysisResult {
	/// Placeholder used when a submission fails
	pub fn empty(frame_rate: f64) -> Self {
		Self {
			video_url: String::new(),
			warning_frames: Vec::new(),
			warning_messages: Vec::new(),
			frame_rate,
		}
	}

	pub fn from_response(
		response: CheckFormResponse,
		base_url: &str,
		frame_rate: f64,
	) -> Result<Self, ResponseError> {
		let CheckFormResponse {
			url,
			warning_frames,
			warning_messages,
		} = response;

		if warning_frames.len() != warning_messages.len() {
			return Err(ResponseError::MisalignedWarnings {
				frames: warning_frames.len(),
				messages: warning_messages.len(),
			});
		}
		if warning_frames.windows(2).any(|w| w[0] >= w[1]) {
			log::warn!("Warning frames are not strictly ascending: {:?}", warning_frames);
		}

		Ok(Self {
			video_url: resolve_url(base_url, &url),
			warning_frames,
			warning_messages,
			frame_rate,
		})
	}

	pub fn has_video(&self) -> bool {
		!self.video_url.is_empty()
	}
}

/// Servers usually answer with a storage path relative to themselves.
pub fn resolve_url(base_url: &str, url: &str) -> String {
	if url.is_empty() {
		return String::new();
	}
	if Url::parse(url).is_ok() {
		return url.to_owned();
	}
	match Url::parse(base_url).and_then(|base| base.join(url)) {
		Ok(joined) => joined.to_string(),
		Err(e) => {
			log::warn!("Could not resolve '{}' against '{}': {}", url, base_url, e);
			url.to_owned()
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
	System,
	User,
	Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
	pub role: ChatRole,
	pub content: String,
}

impl ChatMessage {
	pub fn user(content: impl Into<String>) -> Self {
		Self {
			role: ChatRole::User,
			content: content.into(),
		}
	}

	pub fn system(content: impl Into<String>) -> Self {
		Self {
			role: ChatRole::System,
			content: content.into(),
		}
	}

	pub fn assistant(content: impl Into<String>) -> Self {
		Self {
			role: ChatRole::Assistant,
			content: content.into(),
		}
	}
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
	messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
	result: ChatResult,
}

#[derive(Debug, Deserialize)]
struct ChatResult {
	response: String,
}

pub fn parse_chat_reply(text: &str) -> anyhow::Result<String> {
	let reply: ChatResponse = serde_json::from_str(text)?;
	Ok(reply.result.response)
}

pub struct FormCheckClient {
	client: reqwest::Client,
	check_form_url: String,
	chat_url: String,
	base_url: String,
	frame_rate: f64,
}

impl FormCheckClient {
	pub fn new(settings: &Settings) -> anyhow::Result<Self> {
		let mut builder = reqwest::Client::builder().user_agent("FormCheck/0.1");
		if let Some(timeout) = settings.request_timeout() {
			builder = builder.timeout(timeout);
		}
		let client = builder.build().context("building HTTP client")?;
		Ok(Self {
			client,
			check_form_url: settings.check_form_url(),
			chat_url: settings.chat_url(),
			base_url: settings.base_url.clone(),
			frame_rate: settings.frame_rate,
		})
	}

	pub async fn check_form(
		&self,
		video: &VideoFile,
		movement: Movement,
	) -> anyhow::Result<AnalysisResult> {
		log::info!(
			"Uploading '{}' for {} analysis to {}",
			video.name,
			movement,
			self.check_form_url
		);

		let bytes = match &video.source {
			VideoSource::Path(path) => tokio::fs::read(path)
				.await
				.with_context(|| format!("reading {}", path.display()))?,
			VideoSource::Bytes(bytes) => bytes.to_vec(),
		};
		log::debug!("Upload body: {} bytes", bytes.len());

		let part = Part::bytes(bytes)
			.file_name(video.name.clone())
			.mime_str(&video.content_type())?;
		let form = Form::new()
			.part("video-upload", part)
			.text("movement", movement.as_str());

		let response = self
			.client
			.post(&self.check_form_url)
			.multipart(form)
			.send()
			.await?;

		let status = response.status();
		log::info!("Check-form response status: {}", status);

		if !status.is_success() {
			let error_text = response
				.text()
				.await
				.unwrap_or_else(|_| "<failed to read error text>".into());
			log::error!("Check-form failed. Status: {}, Body: {}", status, error_text);
			anyhow::bail!("Analysis failed with status: {}", status);
		}

		let text = response.text().await?;
		log::debug!("Check-form response body length: {}", text.len());

		let parsed: CheckFormResponse =
			serde_json::from_str(&text).context("unexpected analysis response")?;
		let result = AnalysisResult::from_response(parsed, &self.base_url, self.frame_rate)?;
		log::info!(
			"Analysis ready: {} warnings, video at '{}'",
			result.warning_frames.len(),
			result.video_url
		);

		Ok(result)
	}

	pub async fn chat(&self, messages: &[ChatMessage]) -> anyhow::Result<String> {
		log::info!("Sending {} chat messages to {}", messages.len(), self.chat_url);

		let response = self
			.client
			.post(&self.chat_url)
			.json(&ChatRequest { messages })
			.send()
			.await?;

		let status = response.status();
		if !status.is_success() {
			log::error!("Chat failed. Status: {}", status);
			anyhow::bail!("Chat failed with status: {}", status);
		}

		let text = response.text().await?;
		parse_chat_reply(&text)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_analysis_payload() {
		let body = r#"{"url":"v.mp4","warning_frames":[30,90],"warning_messages":["A","B"]}"#;
		let parsed: CheckFormResponse = serde_json::from_str(body).unwrap();
		let result =
			AnalysisResult::from_response(parsed, "http://127.0.0.1:8000", 30.0).unwrap();

		assert_eq!(result.video_url, "http://127.0.0.1:8000/v.mp4");
		assert_eq!(result.warning_frames, vec![30, 90]);
		assert_eq!(result.warning_messages, vec!["A", "B"]);
		assert_eq!(result.frame_rate, 30.0);
	}

	#[test]
	fn missing_fields_are_rejected() {
		let body = r#"{"warning_frames":[30]}"#;
		assert!(serde_json::from_str::<CheckFormResponse>(body).is_err());
	}

	#[test]
	fn negative_frames_are_rejected() {
		let body = r#"{"url":"","warning_frames":[-1],"warning_messages":["A"]}"#;
		assert!(serde_json::from_str::<CheckFormResponse>(body).is_err());
	}

	#[test]
	fn misaligned_warnings_are_an_error() {
		let parsed = CheckFormResponse {
			url: "v.mp4".into(),
			warning_frames: vec![30, 60],
			warning_messages: vec!["A".into()],
		};
		assert_eq!(
			AnalysisResult::from_response(parsed, "http://localhost", 30.0),
			Err(ResponseError::MisalignedWarnings {
				frames: 2,
				messages: 1
			})
		);
	}

	#[test]
	fn url_resolution() {
		assert_eq!(
			resolve_url("http://127.0.0.1:8000", "/media/uploads/a.mp4"),
			"http://127.0.0.1:8000/media/uploads/a.mp4"
		);
		assert_eq!(
			resolve_url("http://127.0.0.1:8000", "https://cdn.example.com/a.mp4"),
			"https://cdn.example.com/a.mp4"
		);
		assert_eq!(resolve_url("http://127.0.0.1:8000", ""), "");
	}

	#[test]
	fn chat_wire_format() {
		let messages = [ChatMessage::user("How deep should I squat?")];
		let body = serde_json::to_string(&ChatRequest {
			messages: &messages,
		})
		.unwrap();
		assert_eq!(
			body,
			r#"{"messages":[{"role":"user","content":"How deep should I squat?"}]}"#
		);

		let reply = parse_chat_reply(r#"{"result":{"response":"Hip crease below knee."}}"#);
		assert_eq!(reply.unwrap(), "Hip crease below knee.");
		assert!(parse_chat_reply(r#"{"errors":[]}"#).is_err());
	}
}
