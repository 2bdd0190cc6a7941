//! The application's set of collections

use std::sync::Arc;

use serde::Serialize;

use super::{Collection, Record};
use crate::types::{
    Article, ArticleVersion, AuditLog, CaseStudy, ChatSession, ImpactMetric, Milestone, Pilot,
    SecurityEvent, Subscription, SystemStatus, Testimonial, User,
};

/// All collections, one per record type
#[derive(Default)]
pub struct Store {
    /// Accounts
    pub users: Collection<User>,
    /// One subscription per account
    pub subscriptions: Collection<Subscription>,
    /// Blog articles
    pub articles: Collection<Article>,
    /// Article snapshots
    pub article_versions: Collection<ArticleVersion>,
    /// Case studies
    pub case_studies: Collection<CaseStudy>,
    /// Testimonials
    pub testimonials: Collection<Testimonial>,
    /// Pilot sites
    pub pilots: Collection<Pilot>,
    /// Roadmap milestones
    pub milestones: Collection<Milestone>,
    /// Synthetic impact samples
    pub impact_metrics: Collection<ImpactMetric>,
    /// Synthetic component health samples
    pub system_status: Collection<SystemStatus>,
    /// Synthetic security events
    pub security_events: Collection<SecurityEvent>,
    /// Audit trail
    pub audit_logs: Collection<AuditLog>,
    /// Chatbot conversations
    pub chat_sessions: Collection<ChatSession>,
}

/// Store shared between handlers and background tasks
pub type SharedStore = Arc<Store>;

/// Record counts by collection, reported by `/info`
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    /// `(collection, records)` pairs
    pub collections: Vec<(&'static str, usize)>,
    /// Sum over all collections
    pub total: usize,
}

impl Store {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty store behind an `Arc`
    pub fn shared() -> SharedStore {
        Arc::new(Self::new())
    }

    /// Record counts for every collection
    pub fn stats(&self) -> StoreStats {
        fn entry<T: Record>(c: &Collection<T>) -> (&'static str, usize) {
            (T::COLLECTION, c.len())
        }

        let collections = vec![
            entry(&self.users),
            entry(&self.subscriptions),
            entry(&self.articles),
            entry(&self.article_versions),
            entry(&self.case_studies),
            entry(&self.testimonials),
            entry(&self.pilots),
            entry(&self.milestones),
            entry(&self.impact_metrics),
            entry(&self.system_status),
            entry(&self.security_events),
            entry(&self.audit_logs),
            entry(&self.chat_sessions),
        ];
        let total = collections.iter().map(|(_, n)| n).sum();

        StoreStats { collections, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Role, Tier};

    #[test]
    fn test_empty_store_stats() {
        let store = Store::new();
        let stats = store.stats();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.collections.len(), 13);
        assert!(stats.collections.iter().any(|(name, _)| *name == "articles"));
    }

    #[test]
    fn test_stats_count_records() {
        let store = Store::shared();
        let user = store
            .users
            .insert(User::new("ada@eco-grid.io", "Ada", Role::User, "s".into(), "h".into()))
            .unwrap();
        store.subscriptions.insert(Subscription::new(user.id, Tier::Free)).unwrap();

        let stats = store.stats();
        assert_eq!(stats.total, 2);
        assert!(stats.collections.contains(&("users", 1)));
    }
}
