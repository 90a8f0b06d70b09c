//! Append-only conversation history

use crate::types::ChatMessage;

/// Ordered messages of one chat session
///
/// Entries can only be appended; nothing is ever edited or removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationHistory {
    messages: Vec<ChatMessage>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = ChatMessage>) {
        self.messages.extend(messages);
    }

    pub fn as_slice(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChatMessage> {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl<'a> IntoIterator for &'a ConversationHistory {
    type Item = &'a ChatMessage;
    type IntoIter = std::slice::Iter<'a, ChatMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageRole;

    #[test]
    fn test_append_only() {
        let mut history = ConversationHistory::new();
        assert!(history.is_empty());

        history.push(ChatMessage::user("hi"));
        history.extend(vec![ChatMessage::assistant("hello"), ChatMessage::user("bye")]);

        assert_eq!(history.len(), 3);
        assert_eq!(history.last().map(|m| m.role), Some(MessageRole::User));
        assert_eq!(
            history.iter().map(|m| m.role).collect::<Vec<_>>(),
            vec![MessageRole::User, MessageRole::Assistant, MessageRole::User]
        );
    }
}
