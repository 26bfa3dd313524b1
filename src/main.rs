#![windows_subsystem = "windows"]

mod api;
mod chat;
mod gateway;
mod playback;
mod reactor;
mod settings;
mod types;
mod upload;
mod view;

use reactor::Reactor;
use settings::Settings;

#[tokio::main]
async fn main() -> eframe::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let settings = Settings::load_or_default();
	log::info!("Analysis server: {}", settings.base_url);

	let native_options = eframe::NativeOptions {
		viewport: eframe::egui::ViewportBuilder::default()
			.with_inner_size([1100.0, 760.0])
			.with_drag_and_drop(true),
		..Default::default()
	};

	eframe::run_native(
		"How's My Form?",
		native_options,
		Box::new(move |cc| Ok(Box::new(Reactor::new(&cc.egui_ctx, &settings)?))),
	)
}
