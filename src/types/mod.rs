//! Type definitions for the Eco-Grid backend
//!
//! This module contains all record types organized by domain area.

/// Declares a fieldless enum stored and transported as a lower-case string.
///
/// Generates serde impls, `Display`, `FromStr`, `as_str` and an `ALL` slice in
/// declaration order.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant ),+
        }

        impl $name {
            /// Every variant in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire representation
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("unknown {}: {}", stringify!($name), other)),
                }
            }
        }
    };
}

/// Field validation helpers
pub mod validation;
/// Pagination and list filters
pub mod query;
/// Accounts and roles
pub mod user;
/// Articles, case studies and testimonials
pub mod content;
/// Pilot deployment sites
pub mod pilot;
/// Roadmap milestones
pub mod roadmap;
/// Plans, tiers and subscriptions
pub mod subscription;
/// Synthetic telemetry rows
pub mod telemetry;
/// Audit trail entries
pub mod audit;
/// Chatbot sessions
pub mod chat;

use chrono::{DateTime, Utc};

/// Record identifier
pub type RecordId = uuid::Uuid;

/// UTC timestamp used on every record
pub type Timestamp = DateTime<Utc>;

/// Generate a fresh record identifier
pub fn new_id() -> RecordId {
    uuid::Uuid::new_v4()
}

/// Current UTC time
pub fn now() -> Timestamp {
    Utc::now()
}

// Re-export commonly used types for convenience
pub use audit::{AuditAction, AuditLog};
pub use chat::{ChatMessage, ChatRole, ChatSession};
pub use content::{
    Article, ArticleCategory, ArticlePatch, ArticleVersion, CaseStudy, CaseStudyPatch,
    CaseStudyResult, ContentStatus, NewArticle, NewCaseStudy, NewTestimonial, Testimonial, TestimonialPatch,
    TestimonialStatus,
};
pub use pilot::{
    DeviceType, GeoPoint, NewPilot, Pilot, PilotMetrics, PilotPatch, PilotStatus,
    PilotSummary,
};
pub use query::{ListParams, Page, PageMeta};
pub use roadmap::{Milestone, MilestoneCategory, MilestonePatch, MilestoneStatus, NewMilestone, Quarter};
pub use subscription::{Feature, FeatureCheck, Plan, Subscription, SubscriptionStatus, Tier};
pub use telemetry::{
    ComponentState, ImpactMetric, ImpactSummary, SecurityEvent, Severity, SystemStatus,
};
pub use user::{Role, User, UserProfile};
pub use validation::{Validate, Violations};
