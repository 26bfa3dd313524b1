use crate::chat::ChatSession;
use crate::playback::sync::WarningLine;
use crate::playback::{MediaPlayer, PlaybackController, PlaybackSession, VideoHandle};
use crate::reactor::{
	ChatEvent, ComponentResponse, Event, PlaybackEvent, UploadEvent, ViewEvent,
};
use crate::types::{Movement, VideoFile, video_extensions};
use crate::upload::{Outcome, Phase, UploadController};
use eframe::egui::{self, ScrollArea};

pub mod text_utils;

const ACCENT: egui::Color32 = egui::Color32::from_rgb(255, 170, 60);
const PROGRESS: egui::Color32 = egui::Color32::from_rgb(70, 120, 210);

pub struct ViewManager {
	alert: Option<String>,
	chat_open: bool,
	chat_input: String,
}

impl ViewManager {
	pub fn new() -> Self {
		Self {
			alert: None,
			chat_open: true,
			chat_input: String::new(),
		}
	}

	pub fn handle(&mut self, event: &Event) -> ComponentResponse {
		match event {
			Event::View(ViewEvent::Alert { message }) => {
				log::debug!("Alert: {}", message);
				self.alert = Some(message.clone());
				ComponentResponse::none()
			}
			_ => ComponentResponse::none(),
		}
	}

	/// Message of the blocking alert, if one is open
	pub fn alert(&self) -> Option<&str> {
		self.alert.as_deref()
	}

	/// Main render function of the whole thing
	pub fn render(
		&mut self,
		ctx: &egui::Context,
		upload: &UploadController,
		playback: &mut PlaybackController,
		chat: &ChatSession,
	) -> Vec<Event> {
		let mut events = Vec::new();
		let modal_active = self.alert().is_some();

		if !modal_active {
			if matches!(upload.phase(), Phase::Idle) {
				self.handle_dropped_files(ctx, &mut events);
			}
			let is_typing = ctx.memory(|m| m.focused().is_some());
			if !is_typing && matches!(upload.phase(), Phase::Complete { .. }) {
				self.handle_playback_keys(ctx, &mut events);
			}
		}

		self.render_top_panel(ctx, !modal_active);
		self.render_central_panel(ctx, upload, playback, &mut events, !modal_active);
		self.render_chat(ctx, chat, &mut events, !modal_active);

		if matches!(upload.phase(), Phase::Idle) {
			self.render_drop_overlay(ctx);
		}

		self.render_modal(ctx);

		events
	}

	fn handle_dropped_files(&mut self, ctx: &egui::Context, events: &mut Vec<Event>) {
		let dropped = ctx.input(|i| i.raw.dropped_files.clone());
		let Some(file) = dropped.into_iter().next() else {
			return;
		};

		let mime = Some(file.mime).filter(|m| !m.is_empty());
		let video = if let Some(path) = file.path {
			let mut video = VideoFile::from_path(path);
			video.mime = mime;
			video
		} else if let Some(bytes) = file.bytes {
			VideoFile::from_bytes(file.name, mime, bytes)
		} else {
			log::warn!("Dropped file '{}' has neither path nor contents", file.name);
			return;
		};

		events.push(Event::Upload(UploadEvent::SelectFile { file: video }));
	}

	fn handle_playback_keys(&mut self, ctx: &egui::Context, events: &mut Vec<Event>) {
		if ctx.input(|i| i.key_pressed(egui::Key::Space)) {
			events.push(Event::Playback(PlaybackEvent::PlayPause));
		}
		if ctx.input(|i| i.key_pressed(egui::Key::R)) {
			events.push(Event::Playback(PlaybackEvent::LoopFromStart));
		}
	}

	fn render_top_panel(&mut self, ctx: &egui::Context, enabled: bool) {
		egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
			if !enabled {
				ui.disable();
			}
			ui.horizontal(|ui| {
				ui.heading("How's My Form?");
				ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
					ui.toggle_value(&mut self.chat_open, "Chat");
				});
			});
		});
	}

	fn render_central_panel(
		&mut self,
		ctx: &egui::Context,
		upload: &UploadController,
		playback: &mut PlaybackController,
		events: &mut Vec<Event>,
		enabled: bool,
	) {
		egui::CentralPanel::default().show(ctx, |ui| {
			if !enabled {
				ui.disable();
			}
			match upload.phase() {
				Phase::Idle => self.render_upload_form(ui, upload, events),
				Phase::Submitting { started_at, .. } => {
					ui.vertical_centered(|ui| {
						ui.add_space(ui.available_height() * 0.35);
						ui.spinner();
						ui.add_space(8.0);
						if let Some(message) = upload.waiting_message() {
							ui.label(egui::RichText::new(message).size(18.0));
						}
						ui.label(
							egui::RichText::new(format!(
								"{:.0}s elapsed",
								started_at.elapsed().as_secs_f32()
							))
							.weak(),
						);
					});
				}
				Phase::Complete { outcome } => {
					self.render_result(ui, outcome, playback.session_mut(), events);
				}
			}
		});
	}

	fn render_upload_form(
		&self,
		ui: &mut egui::Ui,
		upload: &UploadController,
		events: &mut Vec<Event>,
	) {
		ui.vertical_centered(|ui| {
			ui.add_space(40.0);
			ui.label(
				egui::RichText::new(
					"Upload a video of your workout, and we'll analyze your form to help you improve!",
				)
				.size(18.0),
			);
			ui.add_space(24.0);

			let current = upload.movement();
			let selected_text = current.map_or("Select a movement", |m| m.label());
			egui::ComboBox::from_id_salt("movement")
				.selected_text(selected_text)
				.width(200.0)
				.show_ui(ui, |ui| {
					for movement in Movement::ALL {
						if ui
							.selectable_label(current == Some(movement), movement.label())
							.clicked()
						{
							events.push(Event::Upload(UploadEvent::SelectMovement { movement }));
						}
					}
				});
			ui.add_space(12.0);

			if ui.button("Choose video...").clicked() {
				let picked = rfd::FileDialog::new()
					.set_title("Choose a workout video")
					.add_filter("Video", video_extensions())
					.pick_file();
				if let Some(path) = picked {
					events.push(Event::Upload(UploadEvent::SelectFile {
						file: VideoFile::from_path(path),
					}));
				}
			}

			match upload.file() {
				Some(file) => ui.label(egui::RichText::new(&file.name).strong()),
				None => ui.label(egui::RichText::new("or drop a video onto this window").weak()),
			};
			ui.add_space(24.0);

			if ui
				.add(egui::Button::new(egui::RichText::new("Submit").size(18.0)))
				.clicked()
			{
				events.push(Event::Upload(UploadEvent::Submit));
			}
		});
	}

	fn render_result(
		&self,
		ui: &mut egui::Ui,
		outcome: &Outcome,
		mut session: Option<&mut PlaybackSession>,
		events: &mut Vec<Event>,
	) {
		if let Some(error) = &outcome.error {
			egui::Frame::none()
				.fill(egui::Color32::from_rgb(90, 30, 30))
				.inner_margin(8.0)
				.rounding(4.0)
				.show(ui, |ui| {
					ui.label(
						egui::RichText::new(format!("Analysis failed: {}", error))
							.color(egui::Color32::WHITE),
					);
				});
			ui.add_space(8.0);
		}

		if let Some(session) = session.as_deref_mut() {
			let max_size = egui::vec2(ui.available_width(), ui.available_height() * 0.55);
			if !session.player.show(ui, max_size) && outcome.result.has_video() {
				ui.hyperlink_to("Open annotated video", &outcome.result.video_url);
			}
			ui.add_space(8.0);
			render_timeline(ui, session);
			ui.add_space(8.0);
		}

		ui.horizontal(|ui| {
			if let Some(session) = session.as_deref() {
				if ui.button(session.sync.label().as_str()).clicked() {
					events.push(Event::Playback(PlaybackEvent::PlayPause));
				}
				if ui.button("Loop").clicked() {
					events.push(Event::Playback(PlaybackEvent::LoopFromStart));
				}
			}
			if ui.button("Upload another").clicked() {
				events.push(Event::Upload(UploadEvent::Reset));
			}
		});
		ui.add_space(12.0);

		let panel = warnings_panel(outcome, session.as_deref());
		if matches!(panel, WarningsPanel::Hidden) {
			return;
		}

		ui.heading("Form warnings");
		egui::Frame::none()
			.fill(egui::Color32::from_gray(30))
			.inner_margin(12.0)
			.rounding(4.0)
			.show(ui, |ui| {
				ui.set_min_width(ui.available_width());
				ScrollArea::vertical().max_height(240.0).show(ui, |ui| match panel {
					WarningsPanel::Hidden => {}
					WarningsPanel::Empty => {
						ui.label("No bad form detected. Nice lifting!");
					}
					WarningsPanel::Pending => {
						ui.label(
							egui::RichText::new("Warnings appear here as the video plays.").weak(),
						);
					}
					WarningsPanel::Lines(lines) => {
						for line in lines {
							text_utils::render_rich_text(
								ui,
								&format!("*{}*  {}", line.timestamp, line.message),
								ACCENT,
							);
						}
					}
				});
			});
	}

	fn render_chat(
		&mut self,
		ctx: &egui::Context,
		chat: &ChatSession,
		events: &mut Vec<Event>,
		enabled: bool,
	) {
		let mut open = self.chat_open;
		let input = &mut self.chat_input;

		egui::Window::new("Chadbot")
			.open(&mut open)
			.anchor(egui::Align2::RIGHT_BOTTOM, [-16.0, -16.0])
			.resizable(false)
			.collapsible(true)
			.default_width(320.0)
			.show(ctx, |ui| {
				if !enabled {
					ui.disable();
				}
				ScrollArea::vertical()
					.max_height(280.0)
					.stick_to_bottom(true)
					.show(ui, |ui| {
						for message in chat.messages() {
							let own = ChatSession::is_own(message);
							let (align, fill) = if own {
								(egui::Align::RIGHT, egui::Color32::from_rgb(170, 200, 240))
							} else {
								(egui::Align::LEFT, egui::Color32::from_rgb(250, 205, 160))
							};
							ui.with_layout(egui::Layout::top_down(align), |ui| {
								egui::Frame::none()
									.fill(fill)
									.inner_margin(6.0)
									.rounding(6.0)
									.show(ui, |ui| {
										ui.set_max_width(230.0);
										ui.label(
											egui::RichText::new(&message.content)
												.color(egui::Color32::BLACK),
										);
									});
							});
							ui.add_space(4.0);
						}
					});

				ui.separator();
				ui.horizontal(|ui| {
					let waiting = chat.is_waiting();
					let response = ui.add(
						egui::TextEdit::singleline(&mut *input)
							.hint_text("Type a message...")
							.desired_width(220.0),
					);
					let entered =
						response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
					let clicked = ui
						.add_enabled(!waiting, egui::Button::new(if waiting { "..." } else { "Send" }))
						.clicked();

					if (entered || clicked) && !waiting && !input.trim().is_empty() {
						events.push(Event::Chat(ChatEvent::Send {
							text: std::mem::take(input),
						}));
					}
				});
			});

		self.chat_open = open;
	}

	fn render_drop_overlay(&self, ctx: &egui::Context) {
		if ctx.input(|i| i.raw.hovered_files.is_empty()) {
			return;
		}

		let painter = ctx.layer_painter(egui::LayerId::new(
			egui::Order::Foreground,
			egui::Id::new("drop_target"),
		));
		let screen_rect = ctx.screen_rect();
		painter.rect_filled(
			screen_rect,
			0.0,
			egui::Color32::from_rgba_unmultiplied(0, 0, 0, 180),
		);
		painter.text(
			screen_rect.center(),
			egui::Align2::CENTER_CENTER,
			"Drop your workout video",
			egui::FontId::proportional(28.0),
			egui::Color32::WHITE,
		);
	}

	/// Blocking alert on top of everything
	fn render_modal(&mut self, ctx: &egui::Context) {
		let Some(message) = self.alert.clone() else {
			return;
		};

		let screen_rect = ctx.screen_rect();

		egui::Area::new(egui::Id::new("modal_backdrop"))
			.fixed_pos(screen_rect.min)
			.order(egui::Order::Foreground)
			.show(ctx, |ui| {
				ui.painter().rect_filled(
					screen_rect,
					0.0,
					egui::Color32::from_rgba_unmultiplied(0, 0, 0, 180),
				);
			});

		egui::Window::new("alert_modal")
			.title_bar(false)
			.resizable(false)
			.collapsible(false)
			.anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
			.order(egui::Order::Foreground)
			.show(ctx, |ui| {
				ui.set_width(360.0);
				ui.vertical_centered(|ui| {
					ui.add_space(10.0);
					ui.label(egui::RichText::new(message).size(16.0));
					ui.add_space(10.0);
					let dismiss = ui.button("   OK   ").clicked()
						|| ui.input(|i| i.key_pressed(egui::Key::Enter));
					if dismiss {
						self.alert = None;
					}
				});
			});
	}
}

impl Default for ViewManager {
	fn default() -> Self {
		Self::new()
	}
}

/// What the warnings panel below the video shows
#[derive(Debug, Clone, PartialEq)]
pub enum WarningsPanel<'a> {
	/// Failed submission: no panel at all
	Hidden,
	/// The analysis found nothing
	Empty,
	/// Warnings exist but none has been reached yet
	Pending,
	Lines(Vec<WarningLine<'a>>),
}

pub fn warnings_panel<'a>(
	outcome: &Outcome,
	session: Option<&'a PlaybackSession>,
) -> WarningsPanel<'a> {
	if outcome.error.is_some() {
		return WarningsPanel::Hidden;
	}
	let Some(session) = session.filter(|s| s.sync.has_warnings()) else {
		return WarningsPanel::Empty;
	};
	let lines = session.sync.visible_warnings();
	if lines.is_empty() {
		WarningsPanel::Pending
	} else {
		WarningsPanel::Lines(lines)
	}
}

/// Largest size with the frame's aspect ratio that fits in `max`.
pub fn fit_within(frame: egui::Vec2, max: egui::Vec2) -> egui::Vec2 {
	if frame.x <= 0.0 || frame.y <= 0.0 {
		return max;
	}
	let scale = (max.x / frame.x).min(max.y / frame.y);
	frame * scale
}

fn render_timeline(ui: &mut egui::Ui, session: &PlaybackSession) {
	let desired = egui::vec2(ui.available_width(), 28.0);
	let (rect, _) = ui.allocate_exact_size(desired, egui::Sense::hover());
	let painter = ui.painter_at(rect);

	painter.rect_filled(rect, 4.0, egui::Color32::from_gray(45));
	let mut played = rect;
	played.set_width(rect.width() * session.player.progress());
	painter.rect_filled(played, 4.0, PROGRESS);

	let duration = session.player.duration();
	let cursor = session.sync.state().warning_cursor;
	for (index, time) in session.sync.warning_times().enumerate() {
		let fraction = if duration > 0.0 {
			(time / duration).clamp(0.0, 1.0) as f32
		} else {
			0.0
		};
		let x = rect.left() + rect.width() * fraction;
		let shown = cursor.is_some_and(|c| index <= c);
		let color = if shown {
			ACCENT
		} else {
			egui::Color32::from_gray(200)
		};
		painter.line_segment(
			[egui::pos2(x, rect.top()), egui::pos2(x, rect.bottom())],
			egui::Stroke::new(3.0, color),
		);
	}

	ui.label(format!(
		"{:.1}s / {:.1}s",
		session.sync.state().current_time,
		duration
	));
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::api::AnalysisResult;
	use crate::playback::{TimelinePlayer, WarningSynchronizer};

	fn analysis(frames: Vec<u32>, messages: Vec<&str>) -> AnalysisResult {
		AnalysisResult {
			video_url: "http://localhost/v.mp4".into(),
			warning_frames: frames,
			warning_messages: messages.into_iter().map(String::from).collect(),
			frame_rate: 30.0,
		}
	}

	fn session(result: &AnalysisResult) -> PlaybackSession {
		PlaybackSession {
			player: Box::new(TimelinePlayer::new(10.0)),
			sync: WarningSynchronizer::new(result),
		}
	}

	fn outcome(result: AnalysisResult, error: Option<&str>) -> Outcome {
		Outcome {
			result,
			error: error.map(String::from),
		}
	}

	#[test]
	fn failed_submission_hides_warnings() {
		let failed = outcome(AnalysisResult::empty(30.0), Some("connection refused"));
		assert_eq!(warnings_panel(&failed, None), WarningsPanel::Hidden);

		let result = analysis(vec![30], vec!["a"]);
		let session = session(&result);
		let failed = outcome(result.clone(), Some("timeout"));
		assert_eq!(warnings_panel(&failed, Some(&session)), WarningsPanel::Hidden);
	}

	#[test]
	fn no_warnings_shows_placeholder() {
		let result = analysis(vec![], vec![]);
		let session = session(&result);
		let done = outcome(result, None);
		assert_eq!(warnings_panel(&done, Some(&session)), WarningsPanel::Empty);
		assert_eq!(warnings_panel(&done, None), WarningsPanel::Empty);
	}

	#[test]
	fn warnings_appear_as_they_are_reached() {
		let result = analysis(vec![30, 90], vec!["A", "B"]);
		let mut session = session(&result);
		let done = outcome(result, None);
		assert_eq!(warnings_panel(&done, Some(&session)), WarningsPanel::Pending);

		session.sync.play_pause(session.player.as_mut());
		session.player.seek(1.5);
		session.sync.on_time_update(session.player.as_mut());

		match warnings_panel(&done, Some(&session)) {
			WarningsPanel::Lines(lines) => {
				assert_eq!(lines.len(), 1);
				assert_eq!(lines[0].timestamp, "1s");
				assert_eq!(lines[0].message, "A");
			}
			other => panic!("unexpected panel: {:?}", other),
		}
	}

	#[test]
	fn video_keeps_its_aspect_ratio() {
		let fitted = fit_within(egui::vec2(1920.0, 1080.0), egui::vec2(960.0, 960.0));
		assert_eq!(fitted, egui::vec2(960.0, 540.0));
		let fitted = fit_within(egui::vec2(720.0, 1280.0), egui::vec2(960.0, 640.0));
		assert_eq!(fitted, egui::vec2(360.0, 640.0));
		assert_eq!(
			fit_within(egui::Vec2::ZERO, egui::vec2(100.0, 50.0)),
			egui::vec2(100.0, 50.0)
		);
	}
}
