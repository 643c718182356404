use super::types::Message;
use parking_lot::RwLock;
use std::sync::Arc;

/// Append-only conversation history
///
/// Entries are never edited or removed for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct ConversationLog {
    messages: Arc<RwLock<Vec<Message>>>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn append(&self, message: Message) {
        self.messages.write().push(message);
    }

    pub fn get_all(&self) -> Vec<Message> {
        self.messages.read().clone()
    }

    pub fn last(&self) -> Option<Message> {
        self.messages.read().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }
}

impl Default for ConversationLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Role;

    #[test]
    fn test_append_preserves_order() {
        let log = ConversationLog::new();
        log.append(Message::user("first"));
        log.append(Message::system("second"));
        log.append(Message::assistant("third", "third"));

        let texts: Vec<_> = log.get_all().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
        assert_eq!(log.last().map(|m| m.role), Some(Role::Assistant));
    }

    #[test]
    fn test_clones_share_history() {
        let log = ConversationLog::new();
        let view = log.clone();
        log.append(Message::user("hola"));
        assert_eq!(view.len(), 1);
        assert!(!view.is_empty());
    }
}
