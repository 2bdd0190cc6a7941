//! Application services
//!
//! Handlers authorize and parse; everything that reads or writes the store goes
//! through a function in one of these modules.

pub mod ai_writer;
pub mod articles;
pub mod audit;
pub mod chatbot;
pub mod content;
pub mod pilots;
pub mod roadmap;
pub mod savings;
pub mod seed;
pub mod subscriptions;
pub mod telemetry;
pub mod users;

pub use ai_writer::{AiWriter, CompletionClient, OpenAiClient};
pub use chatbot::Chatbot;
pub use telemetry::{TelemetryGenerator, TelemetryMonitor};
