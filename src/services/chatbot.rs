//! Scripted FAQ chatbot
//!
//! Intents are scored by counting how many of their keywords occur in the
//! lower-cased message. The highest score wins and ties go to the intent listed
//! first. A message that matches nothing gets the fallback answer.

use serde::{Deserialize, Serialize};

use crate::core::config::ChatConfig;
use crate::core::{Error, Result};
use crate::storage::Store;
use crate::system::metrics;
use crate::types::chat::MAX_MESSAGE_CHARS;
use crate::types::{ChatMessage, ChatSession, RecordId};

/// Intent name reported when nothing matched
pub const FALLBACK_INTENT: &str = "fallback";

const FALLBACK_RESPONSE: &str = "I'm not sure I understood that. I can help with pricing, \
    virtual power plants, our pilot program, savings estimates, security and integrations. \
    You can also reach the team at support@eco-grid.io.";

/// One scripted answer
#[derive(Debug, Clone)]
pub struct Intent {
    /// Name reported back to the client
    pub name: &'static str,
    /// Lower-case substrings that vote for this intent
    pub keywords: &'static [&'static str],
    /// Canned answer
    pub response: &'static str,
}

/// Result of scoring a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntentMatch {
    /// Winning intent, or `fallback`
    pub intent: &'static str,
    /// Answer to send
    pub response: &'static str,
    /// Keywords matched by the winner
    pub score: usize,
}

/// Keyword scorer over a fixed intent list
#[derive(Debug, Clone)]
pub struct Chatbot {
    intents: Vec<Intent>,
    limits: ChatConfig,
}

impl Default for Chatbot {
    fn default() -> Self {
        Self::new(default_intents())
    }
}

impl Chatbot {
    /// Bot over a custom intent list, scored in list order
    pub fn new(intents: Vec<Intent>) -> Self {
        Self {
            intents,
            limits: ChatConfig::default(),
        }
    }

    /// Same bot with the given session and history caps
    pub fn with_limits(mut self, limits: ChatConfig) -> Self {
        self.limits = limits;
        self
    }

    /// Intents in priority order
    pub fn intents(&self) -> &[Intent] {
        &self.intents
    }

    /// Pick the best intent for `message`
    pub fn match_intent(&self, message: &str) -> IntentMatch {
        let text = message.to_lowercase();
        let mut best: Option<(&Intent, usize)> = None;

        for intent in &self.intents {
            let score = intent.keywords.iter().filter(|k| text.contains(*k)).count();
            // Strictly greater keeps the earliest intent on ties
            if score > best.map_or(0, |(_, s)| s) {
                best = Some((intent, score));
            }
        }

        match best {
            Some((intent, score)) => IntentMatch {
                intent: intent.name,
                response: intent.response,
                score,
            },
            None => IntentMatch {
                intent: FALLBACK_INTENT,
                response: FALLBACK_RESPONSE,
                score: 0,
            },
        }
    }
}

/// Body of `POST /api/chat/sessions/:id/messages`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// Visitor message
    pub message: String,
}

/// Bot answer to one message
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    /// Session the exchange was appended to
    pub session_id: RecordId,
    /// Bot answer
    pub reply: String,
    /// Matched intent
    pub intent: &'static str,
}

/// Start an empty conversation, evicting the least recently active ones over the cap
pub fn create_session(store: &Store, bot: &Chatbot) -> Result<ChatSession> {
    let session = store.chat_sessions.insert(ChatSession::new())?;
    let evicted = store.chat_sessions.retain_newest(bot.limits.max_sessions);
    if evicted > 0 {
        tracing::debug!(evicted, "idle chat sessions evicted");
    }
    Ok(session)
}

/// Conversation history
pub fn get_session(store: &Store, id: RecordId) -> Result<ChatSession> {
    store.chat_sessions.require(id)
}

/// Answer a message and append both turns to the session
pub fn post_message(store: &Store, bot: &Chatbot, session_id: RecordId, message: &str) -> Result<ChatReply> {
    let message = message.trim();
    let chars = message.chars().count();
    if chars == 0 || chars > MAX_MESSAGE_CHARS {
        return Err(Error::field(
            "message",
            format!("must be between 1 and {} characters", MAX_MESSAGE_CHARS),
        ));
    }

    let matched = bot.match_intent(message);
    store.chat_sessions.update(session_id, |s| {
        s.push(ChatMessage::user(message));
        s.push(ChatMessage::assistant(matched.response, matched.intent));
        s.keep_last(bot.limits.max_messages);
        Ok(())
    })?;

    metrics::record_chat_message(matched.intent);
    tracing::debug!(%session_id, intent = matched.intent, score = matched.score, "chat message answered");
    Ok(ChatReply {
        session_id,
        reply: matched.response.to_string(),
        intent: matched.intent,
    })
}

fn default_intents() -> Vec<Intent> {
    vec![
        Intent {
            name: "greeting",
            keywords: &["hello", "hi ", "hey", "good morning", "good afternoon", "greetings"],
            response: "Hi! I'm the Eco-Grid assistant. Ask me about pricing, virtual power plants, \
                our pilot program or how much you could save.",
        },
        Intent {
            name: "pricing",
            keywords: &["price", "pricing", "cost", "plan", "subscription", "tier", "how much", "free"],
            response: "We offer Free, Starter ($49/month), Professional ($149/month) and Enterprise \
                ($499/month) plans. See /api/plans for the limits of each tier.",
        },
        Intent {
            name: "vpp",
            keywords: &["vpp", "virtual power plant", "aggregate", "aggregation", "grid services", "demand response"],
            response: "A virtual power plant aggregates distributed batteries, solar and flexible \
                loads so they can be dispatched together to support the grid.",
        },
        Intent {
            name: "pilot",
            keywords: &["pilot", "trial", "deployment", "site", "city", "map"],
            response: "Our pilot program runs in several cities across multiple countries. Browse the \
                pilot map to see device types and measured savings at each site.",
        },
        Intent {
            name: "savings",
            keywords: &["save", "savings", "bill", "reduce", "roi", "payback", "calculator"],
            response: "Most customers save 15% to 40% on their energy bill depending on how many \
                devices they connect. Try the savings calculator for an estimate.",
        },
        Intent {
            name: "security",
            keywords: &["security", "secure", "privacy", "encrypt", "gdpr", "compliance", "data protection"],
            response: "All device traffic is encrypted in transit and at rest, access is role based, \
                and every administrative change is written to an audit log.",
        },
        Intent {
            name: "support",
            keywords: &["help", "support", "contact", "problem", "issue", "broken", "human"],
            response: "Our support team is available on weekdays at support@eco-grid.io. Professional \
                and Enterprise plans include priority support.",
        },
        Intent {
            name: "integration",
            keywords: &["integrat", "api", "inverter", "ocpp", "modbus", "connect", "compatible", "webhook"],
            response: "Eco-Grid integrates with common inverters, batteries, heat pumps and OCPP EV \
                chargers, and exposes a REST API for your own systems.",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_matches() {
        let bot = Chatbot::default();
        assert_eq!(bot.match_intent("How much does the Starter plan cost?").intent, "pricing");
        assert_eq!(bot.match_intent("What is a Virtual Power Plant?").intent, "vpp");
        assert_eq!(bot.match_intent("Do you support OCPP chargers via API?").intent, "integration");
    }

    #[test]
    fn test_highest_score_wins() {
        let bot = Chatbot::default();
        // "savings", "bill", "reduce" beat the single pricing keyword "cost"
        let m = bot.match_intent("Can it reduce my bill? What savings and cost?");
        assert_eq!(m.intent, "savings");
        assert_eq!(m.score, 3);
    }

    #[test]
    fn test_ties_go_to_first_intent() {
        let bot = Chatbot::new(vec![
            Intent {
                name: "first",
                keywords: &["alpha"],
                response: "1",
            },
            Intent {
                name: "second",
                keywords: &["beta"],
                response: "2",
            },
        ]);
        assert_eq!(bot.match_intent("beta alpha").intent, "first");
    }

    #[test]
    fn test_no_match_falls_back() {
        let m = Chatbot::default().match_intent("Quantum banana");
        assert_eq!(m.intent, FALLBACK_INTENT);
        assert_eq!(m.score, 0);
    }

    #[test]
    fn test_session_history() {
        let store = Store::new();
        let bot = Chatbot::default();
        let session = create_session(&store, &bot).unwrap();

        let reply = post_message(&store, &bot, session.id, "hello there").unwrap();
        assert_eq!(reply.intent, "greeting");

        let history = get_session(&store, session.id).unwrap();
        assert_eq!(history.messages.len(), 2);
        assert_eq!(history.messages[1].intent.as_deref(), Some("greeting"));
    }

    #[test]
    fn test_message_validation_and_unknown_session() {
        let store = Store::new();
        let bot = Chatbot::default();
        let session = create_session(&store, &bot).unwrap();

        assert_eq!(post_message(&store, &bot, session.id, "   ").unwrap_err().status_code(), 400);
        let long = "a".repeat(MAX_MESSAGE_CHARS + 1);
        assert_eq!(post_message(&store, &bot, session.id, &long).unwrap_err().status_code(), 400);

        let missing = crate::types::new_id();
        assert_eq!(post_message(&store, &bot, missing, "hello").unwrap_err().status_code(), 404);
    }

    #[test]
    fn test_history_and_session_caps() {
        let store = Store::new();
        let bot = Chatbot::default().with_limits(ChatConfig {
            max_sessions: 2,
            max_messages: 4,
        });
        let session = create_session(&store, &bot).unwrap();

        for text in ["hello", "pricing?", "is it secure?"] {
            post_message(&store, &bot, session.id, text).unwrap();
        }
        let history = get_session(&store, session.id).unwrap();
        assert_eq!(history.messages.len(), 4);
        assert_eq!(history.messages[0].text, "pricing?");
        assert_eq!(history.messages[3].intent.as_deref(), Some("security"));

        for _ in 0..3 {
            create_session(&store, &bot).unwrap();
        }
        assert_eq!(store.chat_sessions.len(), 2);
    }
}
