use chrono::Utc;
use serde::{ Serialize, Deserialize };
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub text: String,
    pub timestamp: i64,
}

impl Message {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            text: text.into(),
            timestamp: Utc::now().timestamp(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Conversation {
    pub messages: Vec<Message>,
}

impl Conversation {
    /// A fresh conversation holding only the assistant welcome message.
    pub fn seeded(welcome: &str) -> Self {
        Self {
            messages: vec![Message::assistant(welcome)],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_conversation_holds_single_assistant_welcome() {
        let conversation = Conversation::seeded("Welcome!");
        assert_eq!(conversation.len(), 1);
        let welcome = conversation.last().unwrap();
        assert_eq!(welcome.role, Role::Assistant);
        assert_eq!(welcome.text, "Welcome!");
        assert!(!welcome.id.is_empty());
    }

    #[test]
    fn push_appends_in_order() {
        let mut conversation = Conversation::seeded("hi");
        conversation.push(Message::user("first"));
        conversation.push(Message::assistant("second"));
        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation.messages[1].text, "first");
        assert_eq!(conversation.last().unwrap().text, "second");
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
        let back: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(back, Role::User);
    }
}
