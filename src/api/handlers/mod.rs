//! HTTP request handlers, grouped by resource
//!
//! Handlers check permissions, parse the request and delegate to
//! [`crate::services`]; none of them touch the store directly.

pub mod articles;
pub mod audit;
pub mod auth;
pub mod case_studies;
pub mod pilots;
pub mod roadmap;
pub mod subscriptions;
pub mod system;
pub mod telemetry;
pub mod testimonials;
pub mod tools;
