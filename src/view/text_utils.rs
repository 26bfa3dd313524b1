use eframe::egui;

/// Splits `text` on `*` markers into (emphasized, segment) pairs.
pub fn split_emphasis(text: &str) -> Vec<(bool, &str)> {
	text.split('*')
		.enumerate()
		.filter(|(_, segment)| !segment.is_empty())
		.map(|(i, segment)| (i % 2 == 1, segment))
		.collect()
}

/// Renders text with simple formatting.
///
/// Supports:
/// - `*text*` for emphasized text in `accent`
/// - standard text as light gray
pub fn render_rich_text(ui: &mut egui::Ui, text: &str, accent: egui::Color32) {
	let mut job = egui::text::LayoutJob::default();
	job.wrap = egui::text::TextWrapping {
		max_width: ui.available_width(),
		..Default::default()
	};
	job.halign = egui::Align::LEFT;

	for (emphasized, segment) in split_emphasis(text) {
		let format = egui::TextFormat {
			font_id: egui::FontId::proportional(15.0),
			color: if emphasized {
				accent
			} else {
				egui::Color32::LIGHT_GRAY
			},
			..Default::default()
		};
		job.append(segment, 0.0, format);
	}

	ui.label(job);
}
