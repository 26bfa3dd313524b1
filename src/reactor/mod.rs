pub mod event;
pub mod queue;
pub mod scheduler;

pub use event::{
	ChatEvent, ComponentResponse, Event, GatewayEvent, PlaybackEvent, UploadEvent, ViewEvent,
};
pub use queue::EventQueue;
pub use scheduler::Scheduler;

use crate::chat::ChatSession;
use crate::gateway::FormCheckGateway;
use crate::playback::PlaybackController;
use crate::settings::Settings;
use crate::upload::UploadController;
use crate::view::ViewManager;
use eframe::egui;

pub struct Reactor {
	queue: EventQueue,
	scheduler: Scheduler,

	pub gateway: FormCheckGateway,
	pub upload: UploadController,
	pub playback: PlaybackController,
	pub chat: ChatSession,
	pub view: ViewManager,
}

impl Reactor {
	pub fn new(ctx: &egui::Context, settings: &Settings) -> anyhow::Result<Self> {
		log::info!("Initializing all components");
		let reactor = Self {
			queue: EventQueue::new(),
			scheduler: Scheduler::new(),
			gateway: FormCheckGateway::new(settings, Some(ctx))?,
			upload: UploadController::new(settings),
			playback: PlaybackController::new(settings, Some(ctx)),
			chat: ChatSession::new(settings),
			view: ViewManager::new(),
		};
		log::info!("Initialization complete");
		Ok(reactor)
	}

	fn process_response(&mut self, response: ComponentResponse) {
		for e in response.events {
			self.queue.push(e);
		}
		for (e, d) in response.scheduled {
			self.scheduler.schedule(e, d);
		}
	}

	pub fn tick(&mut self, ctx: &egui::Context) {
		// Drain scheduled events
		self.scheduler.tick(&mut self.queue);

		// Poll async components and the playback clock
		let gateway_response = self.gateway.poll();
		let playback_response = self.playback.poll();
		self.process_response(gateway_response);
		self.process_response(playback_response);

		self.drain_queue();

		// Render
		let events = self
			.view
			.render(ctx, &self.upload, &mut self.playback, &self.chat);

		// Process any events from rendering immediately
		for event in events {
			log::trace!("Processing render event: {:?}", event);
			let response = self.route(&event);
			self.process_response(response);
		}
		self.drain_queue();

		self.request_repaint(ctx);
	}

	fn drain_queue(&mut self) {
		let mut iterations = 0;
		while let Some(event) = self.queue.pop() {
			log::trace!("Processing event: {:?}", event);
			let response = self.route(&event);
			self.process_response(response);

			iterations += 1;
			if iterations > 1000 {
				log::warn!(
					"Event loop exceeded 1000 iterations, breaking with {} events pending",
					self.queue.len()
				);
				break;
			}
		}
	}

	fn request_repaint(&self, ctx: &egui::Context) {
		if self.playback.is_playing()
			|| self.upload.is_submitting()
			|| self.gateway.is_uploading()
			|| !self.queue.is_empty()
		{
			ctx.request_repaint();
		} else if let Some(delay) = self.scheduler.next_due() {
			ctx.request_repaint_after(delay);
		}
	}

	fn route(&mut self, event: &Event) -> ComponentResponse {
		match event {
			Event::Upload(_) => self.upload.handle(event),
			Event::Gateway(_) => self.gateway.handle(event),
			Event::Playback(_) => self.playback.handle(event),
			Event::Chat(_) => self.chat.handle(event),
			Event::View(_) => self.view.handle(event),
		}
	}
}

impl eframe::App for Reactor {
	fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
		self.tick(ctx);
	}
}
