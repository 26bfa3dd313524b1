use crate::api::FormCheckClient;
use crate::reactor::{ChatEvent, ComponentResponse, Event, GatewayEvent, UploadEvent};
use crate::settings::Settings;
use crate::types::SubmissionId;
use eframe::egui;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Message from async tasks back to the component
pub enum GatewayMessage {
	AnalysisComplete {
		submission: SubmissionId,
		result: crate::api::AnalysisResult,
	},
	AnalysisError {
		submission: SubmissionId,
		message: String,
	},
	ChatReply {
		text: String,
	},
	ChatError {
		message: String,
	},
}

/// Runs the network exchanges off the UI thread.
pub struct FormCheckGateway {
	client: Arc<FormCheckClient>,
	sender: mpsc::Sender<GatewayMessage>,
	receiver: mpsc::Receiver<GatewayMessage>,
	upload_pending: Option<SubmissionId>,
	chat_pending: bool,
	egui_ctx: Option<egui::Context>,
}

impl FormCheckGateway {
	pub fn new(settings: &Settings, ctx: Option<&egui::Context>) -> anyhow::Result<Self> {
		log::info!("Initializing gateway for {}", settings.base_url);
		let (sender, receiver) = mpsc::channel(16);
		Ok(Self {
			client: Arc::new(FormCheckClient::new(settings)?),
			sender,
			receiver,
			upload_pending: None,
			chat_pending: false,
			egui_ctx: ctx.cloned(),
		})
	}

	pub fn poll(&mut self) -> ComponentResponse {
		let mut responses = Vec::new();
		while let Ok(msg) = self.receiver.try_recv() {
			responses.push(self.on_message(msg));
		}

		if responses.is_empty() {
			ComponentResponse::none()
		} else {
			ComponentResponse::emit_many(responses)
		}
	}

	fn on_message(&mut self, msg: GatewayMessage) -> Event {
		match msg {
			GatewayMessage::AnalysisComplete { submission, result } => {
				log::info!("Analysis {} received", submission);
				self.finish_upload(submission);
				Event::Upload(UploadEvent::AnalysisReceived { submission, result })
			}
			GatewayMessage::AnalysisError {
				submission,
				message,
			} => {
				log::error!("Analysis {} error: {}", submission, message);
				self.finish_upload(submission);
				Event::Upload(UploadEvent::AnalysisFailed {
					submission,
					message,
				})
			}
			GatewayMessage::ChatReply { text } => {
				self.chat_pending = false;
				Event::Chat(ChatEvent::ReplyReceived { text })
			}
			GatewayMessage::ChatError { message } => {
				log::error!("Chat error: {}", message);
				self.chat_pending = false;
				Event::Chat(ChatEvent::ReplyFailed { message })
			}
		}
	}

	fn finish_upload(&mut self, submission: SubmissionId) {
		if self.upload_pending == Some(submission) {
			self.upload_pending = None;
		}
	}

	pub fn handle(&mut self, event: &Event) -> ComponentResponse {
		match event {
			Event::Gateway(GatewayEvent::CheckForm {
				submission,
				file,
				movement,
			}) => {
				if let Some(pending) = self.upload_pending {
					log::warn!(
						"Upload {} dropped: upload {} still in flight",
						submission,
						pending
					);
					return ComponentResponse::emit(Event::Upload(UploadEvent::AnalysisFailed {
						submission: *submission,
						message: "Another upload is still in progress".into(),
					}));
				}
				self.upload_pending = Some(*submission);

				let client = self.client.clone();
				let sender = self.sender.clone();
				let ctx = self.egui_ctx.clone();
				let submission = *submission;
				let file = file.clone();
				let movement = *movement;

				log::info!("Spawning upload {}", submission);
				tokio::spawn(async move {
					let msg = match client.check_form(&file, movement).await {
						Ok(result) => GatewayMessage::AnalysisComplete { submission, result },
						Err(e) => GatewayMessage::AnalysisError {
							submission,
							message: format!("{:#}", e),
						},
					};
					let _ = sender.send(msg).await;
					if let Some(ctx) = ctx {
						ctx.request_repaint();
					}
				});
			}
			Event::Gateway(GatewayEvent::Chat { messages }) => {
				if self.chat_pending {
					log::debug!("Chat request ignored: reply already pending");
					return ComponentResponse::none();
				}
				self.chat_pending = true;

				let client = self.client.clone();
				let sender = self.sender.clone();
				let ctx = self.egui_ctx.clone();
				let messages = messages.clone();

				tokio::spawn(async move {
					let msg = match client.chat(&messages).await {
						Ok(text) => GatewayMessage::ChatReply { text },
						Err(e) => GatewayMessage::ChatError {
							message: format!("{:#}", e),
						},
					};
					let _ = sender.send(msg).await;
					if let Some(ctx) = ctx {
						ctx.request_repaint();
					}
				});
			}
			_ => {}
		}
		ComponentResponse::none()
	}

	pub fn is_uploading(&self) -> bool {
		self.upload_pending.is_some()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::api::AnalysisResult;

	fn gateway() -> FormCheckGateway {
		FormCheckGateway::new(&Settings::default(), None).unwrap()
	}

	#[test]
	fn task_results_become_events() {
		let mut gateway = gateway();
		gateway.upload_pending = Some(SubmissionId(3));
		gateway.chat_pending = true;

		let sender = gateway.sender.clone();
		sender
			.try_send(GatewayMessage::AnalysisComplete {
				submission: SubmissionId(3),
				result: AnalysisResult::empty(30.0),
			})
			.ok();
		sender
			.try_send(GatewayMessage::ChatError {
				message: "timeout".into(),
			})
			.ok();

		let response = gateway.poll();
		assert!(matches!(
			response.events.as_slice(),
			[
				Event::Upload(UploadEvent::AnalysisReceived {
					submission: SubmissionId(3),
					..
				}),
				Event::Chat(ChatEvent::ReplyFailed { .. }),
			]
		));
		assert!(!gateway.is_uploading());
		assert!(!gateway.chat_pending);
		assert!(gateway.poll().events.is_empty());
	}

	#[test]
	fn second_upload_is_refused_while_one_is_pending() {
		let mut gateway = gateway();
		gateway.upload_pending = Some(SubmissionId(1));

		let file = crate::types::VideoFile::from_bytes(
			"a.mp4",
			None,
			Arc::from(vec![1u8]),
		);
		let response = gateway.handle(&Event::Gateway(GatewayEvent::CheckForm {
			submission: SubmissionId(2),
			file,
			movement: crate::types::Movement::Squat,
		}));
		assert!(matches!(
			response.events.as_slice(),
			[Event::Upload(UploadEvent::AnalysisFailed {
				submission: SubmissionId(2),
				..
			})]
		));
		assert_eq!(gateway.upload_pending, Some(SubmissionId(1)));
	}
}
