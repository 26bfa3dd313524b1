use crate::api::{ChatMessage, ChatRole};
use crate::reactor::{ChatEvent, ComponentResponse, Event, GatewayEvent};
use crate::settings::Settings;

const GREETING: &str =
	"Hello! I'm Chadbot, your friendly assistant for anything fitness and health related.";
const ERROR_REPLY: &str = "Sorry, there was an error.";

/// Transcript and request state of the chat widget
pub struct ChatSession {
	messages: Vec<ChatMessage>,
	waiting: bool,
	history_limit: usize,
}

impl ChatSession {
	pub fn new(settings: &Settings) -> Self {
		Self {
			messages: vec![ChatMessage::system(GREETING)],
			waiting: false,
			history_limit: settings.chat_history_limit,
		}
	}

	pub fn handle(&mut self, event: &Event) -> ComponentResponse {
		match event {
			Event::Chat(ChatEvent::Send { text }) => self.send(text),
			Event::Chat(ChatEvent::ReplyReceived { text }) => {
				self.waiting = false;
				self.messages.push(ChatMessage::assistant(text.clone()));
				ComponentResponse::none()
			}
			Event::Chat(ChatEvent::ReplyFailed { message }) => {
				log::warn!("Chat reply failed: {}", message);
				self.waiting = false;
				self.messages.push(ChatMessage::assistant(ERROR_REPLY));
				ComponentResponse::none()
			}
			_ => ComponentResponse::none(),
		}
	}

	fn send(&mut self, text: &str) -> ComponentResponse {
		let text = text.trim();
		if text.is_empty() {
			return ComponentResponse::none();
		}
		if self.waiting {
			log::debug!("Chat send ignored while waiting for a reply");
			return ComponentResponse::none();
		}

		self.messages.push(ChatMessage::user(text));
		self.waiting = true;
		ComponentResponse::emit(Event::Gateway(GatewayEvent::Chat {
			messages: self.outgoing_history(),
		}))
	}

	/// Latest messages to send, greeting excluded
	fn outgoing_history(&self) -> Vec<ChatMessage> {
		let conversation = &self.messages[1..];
		let skip = conversation.len().saturating_sub(self.history_limit);
		conversation[skip..].to_vec()
	}

	pub fn messages(&self) -> &[ChatMessage] {
		&self.messages
	}

	pub fn is_waiting(&self) -> bool {
		self.waiting
	}

	pub fn is_own(message: &ChatMessage) -> bool {
		message.role == ChatRole::User
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sent_messages(response: &ComponentResponse) -> Vec<ChatMessage> {
		match response.events.as_slice() {
			[Event::Gateway(GatewayEvent::Chat { messages })] => messages.clone(),
			other => panic!("unexpected events: {:?}", other),
		}
	}

	#[test]
	fn greeting_is_a_local_system_message() {
		let mut chat = ChatSession::new(&Settings::default());
		assert_eq!(chat.messages(), &[ChatMessage::system(GREETING)]);
		assert!(!ChatSession::is_own(&chat.messages()[0]));

		let response = chat.handle(&Event::Chat(ChatEvent::Send { text: "hi".into() }));
		assert!(
			sent_messages(&response)
				.iter()
				.all(|m| m.role != ChatRole::System)
		);
	}

	#[test]
	fn blank_input_is_ignored() {
		let mut chat = ChatSession::new(&Settings::default());
		let response = chat.handle(&Event::Chat(ChatEvent::Send { text: "   ".into() }));
		assert!(response.events.is_empty());
		assert_eq!(chat.messages().len(), 1);
	}

	#[test]
	fn sends_history_including_new_message() {
		let mut chat = ChatSession::new(&Settings::default());
		let response = chat.handle(&Event::Chat(ChatEvent::Send {
			text: " Is a belt worth it? ".into(),
		}));
		assert_eq!(
			sent_messages(&response),
			vec![ChatMessage::user("Is a belt worth it?")]
		);
		assert!(chat.is_waiting());

		let again = chat.handle(&Event::Chat(ChatEvent::Send { text: "hello?".into() }));
		assert!(again.events.is_empty());

		chat.handle(&Event::Chat(ChatEvent::ReplyReceived {
			text: "For heavy singles, yes.".into(),
		}));
		assert!(!chat.is_waiting());
		assert_eq!(
			chat.messages().last(),
			Some(&ChatMessage::assistant("For heavy singles, yes."))
		);
	}

	#[test]
	fn failure_appends_apology() {
		let mut chat = ChatSession::new(&Settings::default());
		chat.handle(&Event::Chat(ChatEvent::Send { text: "hi".into() }));
		chat.handle(&Event::Chat(ChatEvent::ReplyFailed {
			message: "connection refused".into(),
		}));
		assert_eq!(chat.messages().last().unwrap().content, ERROR_REPLY);
		assert!(!chat.is_waiting());
	}

	#[test]
	fn history_is_capped() {
		let settings = Settings {
			chat_history_limit: 3,
			..Settings::default()
		};
		let mut chat = ChatSession::new(&settings);
		for i in 0..3 {
			chat.handle(&Event::Chat(ChatEvent::Send {
				text: format!("q{}", i),
			}));
			chat.handle(&Event::Chat(ChatEvent::ReplyReceived {
				text: format!("a{}", i),
			}));
		}
		let response = chat.handle(&Event::Chat(ChatEvent::Send { text: "q3".into() }));
		let contents: Vec<String> = sent_messages(&response)
			.into_iter()
			.map(|m| m.content)
			.collect();
		assert_eq!(contents, vec!["q2", "a2", "q3"]);
	}
}
