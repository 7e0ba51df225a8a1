//! Transcript-related types.

use std::fmt::{self, Display};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use ragchat_proto::ContextItem;

/// Identifies a message within one controller.
///
/// Ids are never reused, not even after the transcript is cleared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(u64);

impl Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who wrote a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// The person asking questions.
    User,
    /// The backend, or the client speaking on its behalf.
    Assistant,
}

/// A reaction to an assistant message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Reaction {
    /// Thumbs up.
    Like,
    /// Thumbs down.
    Dislike,
}

impl FromStr for Reaction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Reaction::Like),
            "dislike" => Ok(Reaction::Dislike),
            _ => Err(()),
        }
    }
}

/// One turn in the transcript.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    /// Unique id.
    pub id: MessageId,
    /// Author.
    pub role: Role,
    /// Plain text for user messages, markdown for assistant messages.
    pub content: String,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Evidence the answer was grounded on, in backend order.
    pub sources: Vec<ContextItem>,
    /// Whether the message was liked. Never set together with `disliked`.
    pub liked: bool,
    /// Whether the message was disliked. Never set together with `liked`.
    pub disliked: bool,
    /// Set right after the message is copied, cleared shortly after.
    pub copied: bool,
}

impl Message {
    /// Flips the given reaction and clears the opposite one.
    pub fn toggle_reaction(&mut self, reaction: Reaction) {
        let (liked, disliked) = (self.liked, self.disliked);
        self.liked = reaction == Reaction::Like && !liked;
        self.disliked = reaction == Reaction::Dislike && !disliked;
    }
}

/// The ordered conversation history.
#[derive(Clone, Debug)]
pub(crate) struct Transcript {
    messages: Vec<Message>,
    next_id: u64,
}

impl Transcript {
    /// Creates a transcript seeded with an assistant greeting.
    pub fn with_greeting(greeting: &str) -> Self {
        let mut transcript = Self {
            messages: vec![],
            next_id: 1,
        };
        transcript.push(Role::Assistant, greeting.to_owned(), vec![]);
        transcript
    }

    /// Replaces everything with a fresh assistant greeting.
    pub fn reset(&mut self, greeting: &str) {
        self.messages.clear();
        self.push(Role::Assistant, greeting.to_owned(), vec![]);
    }

    pub fn push(
        &mut self,
        role: Role,
        content: String,
        sources: Vec<ContextItem>,
    ) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.messages.push(Message {
            id,
            role,
            content,
            timestamp: Utc::now(),
            sources,
            liked: false,
            disliked: false,
            copied: false,
        });
        id
    }

    #[inline]
    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> Message {
        Transcript::with_greeting("hi").messages()[0].clone()
    }

    #[test]
    fn test_like_then_dislike() {
        let mut msg = message();
        msg.toggle_reaction(Reaction::Like);
        assert!(msg.liked && !msg.disliked);
        msg.toggle_reaction(Reaction::Dislike);
        assert!(!msg.liked && msg.disliked);
        msg.toggle_reaction(Reaction::Dislike);
        assert!(!msg.liked && !msg.disliked);
    }

    #[test]
    fn test_reactions_are_exclusive_for_all_sequences() {
        let reactions = [Reaction::Like, Reaction::Dislike];
        for len in 1..=5u32 {
            for bits in 0..(1u32 << len) {
                let mut msg = message();
                let mut last = None;
                for i in 0..len {
                    let reaction = reactions[((bits >> i) & 1) as usize];
                    msg.toggle_reaction(reaction);
                    last = Some(reaction);
                }
                assert!(!(msg.liked && msg.disliked));
                // The last toggled reaction is the only one that can be set.
                match last {
                    Some(Reaction::Like) => assert!(!msg.disliked),
                    Some(Reaction::Dislike) => assert!(!msg.liked),
                    None => unreachable!(),
                }
            }
        }
    }

    #[test]
    fn test_ids_survive_reset() {
        let mut transcript = Transcript::with_greeting("hi");
        let first = transcript.messages()[0].id;
        let user = transcript.push(Role::User, "q".to_owned(), vec![]);
        transcript.reset("hello again");

        let messages = transcript.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::Assistant);
        assert_eq!(messages[0].content, "hello again");
        assert!(messages[0].id != first && messages[0].id != user);
        assert!(transcript.get(user).is_none());
    }

    #[test]
    fn test_parse_reaction() {
        assert_eq!("like".parse(), Ok(Reaction::Like));
        assert_eq!("dislike".parse(), Ok(Reaction::Dislike));
        assert_eq!("love".parse::<Reaction>(), Err(()));
    }
}
