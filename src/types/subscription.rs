//! Pricing tiers, plan catalog and per-user subscriptions

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{now, RecordId, Timestamp};
use crate::storage::Record;

string_enum! {
    /// Subscription level
    pub enum Tier {
        /// Default for every account
        Free => "free",
        /// Small teams
        Starter => "starter",
        /// Growing utilities and installers
        Professional => "professional",
        /// No limits
        Enterprise => "enterprise",
    }
}

string_enum! {
    /// Metered capability
    pub enum Feature {
        /// Article creation
        Articles => "articles",
        /// AI writer generations
        AiGenerations => "ai_generations",
        /// Pilot registrations
        Pilots => "pilots",
        /// API requests
        ApiCalls => "api_calls",
    }
}

string_enum! {
    /// Billing state
    pub enum SubscriptionStatus {
        /// Features may be used
        Active => "active",
        /// Every gate denies
        Cancelled => "cancelled",
    }
}

/// Per-feature ceiling; `None` means unlimited
pub type Limit = Option<u64>;

impl Tier {
    /// Monthly list price in cents
    pub fn monthly_price_cents(&self) -> u32 {
        match self {
            Tier::Free => 0,
            Tier::Starter => 4_900,
            Tier::Professional => 14_900,
            Tier::Enterprise => 49_900,
        }
    }

    /// Limit for one feature on this tier
    pub fn limit(&self, feature: Feature) -> Limit {
        use Feature::*;
        match (self, feature) {
            (Tier::Enterprise, _) => None,

            (Tier::Free, Articles) => Some(3),
            (Tier::Free, AiGenerations) => Some(0),
            (Tier::Free, Pilots) => Some(1),
            (Tier::Free, ApiCalls) => Some(1_000),

            (Tier::Starter, Articles) => Some(25),
            (Tier::Starter, AiGenerations) => Some(10),
            (Tier::Starter, Pilots) => Some(5),
            (Tier::Starter, ApiCalls) => Some(10_000),

            (Tier::Professional, Articles) => Some(100),
            (Tier::Professional, AiGenerations) => Some(50),
            (Tier::Professional, Pilots) => Some(25),
            (Tier::Professional, ApiCalls) => Some(100_000),
        }
    }

    fn display_name(&self) -> &'static str {
        match self {
            Tier::Free => "Free",
            Tier::Starter => "Starter",
            Tier::Professional => "Professional",
            Tier::Enterprise => "Enterprise",
        }
    }

    fn highlights(&self) -> &'static [&'static str] {
        match self {
            Tier::Free => &["3 articles", "1 pilot site", "Community support"],
            Tier::Starter => &["25 articles", "10 AI drafts per month", "5 pilot sites", "Email support"],
            Tier::Professional => &[
                "100 articles",
                "50 AI drafts per month",
                "25 pilot sites",
                "Priority support",
            ],
            Tier::Enterprise => &["Unlimited usage", "Dedicated success manager", "Custom integrations"],
        }
    }
}

/// Catalog entry returned by `GET /api/plans`
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    /// Tier
    pub tier: Tier,
    /// Display name
    pub name: &'static str,
    /// Monthly price in cents
    pub monthly_price_cents: u32,
    /// Marketing bullet points
    pub features: &'static [&'static str],
    /// Limits by feature; `null` is unlimited
    pub limits: BTreeMap<Feature, Limit>,
}

impl Plan {
    /// Catalog entry for a tier
    pub fn for_tier(tier: Tier) -> Self {
        Self {
            tier,
            name: tier.display_name(),
            monthly_price_cents: tier.monthly_price_cents(),
            features: tier.highlights(),
            limits: Feature::ALL.iter().map(|f| (*f, tier.limit(*f))).collect(),
        }
    }

    /// Every plan, cheapest first
    pub fn catalog() -> Vec<Plan> {
        Tier::ALL.iter().copied().map(Plan::for_tier).collect()
    }
}

/// Outcome of a feature gate check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureCheck {
    /// Feature checked
    pub feature: Feature,
    /// Whether one more use is allowed
    pub allowed: bool,
    /// Uses recorded this period
    pub usage: u64,
    /// Tier limit; `None` is unlimited
    pub limit: Limit,
}

/// One subscription per user
///
/// Stored under the owner's id, so a user can never hold two.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    /// Subscription id; always equal to `user_id`
    pub id: RecordId,
    /// Owning account
    pub user_id: RecordId,
    /// Current tier
    pub tier: Tier,
    /// Billing state
    pub status: SubscriptionStatus,
    /// Uses per feature in the current period
    pub usage: BTreeMap<Feature, u64>,
    /// When counters were last reset
    pub period_start: Timestamp,
    /// Creation time
    pub created_at: Timestamp,
    /// Last modification
    pub updated_at: Timestamp,
}

impl Subscription {
    /// Active subscription with zeroed counters
    pub fn new(user_id: RecordId, tier: Tier) -> Self {
        let now = now();
        Self {
            id: user_id,
            user_id,
            tier,
            status: SubscriptionStatus::Active,
            usage: BTreeMap::new(),
            period_start: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Uses recorded for a feature
    pub fn usage_of(&self, feature: Feature) -> u64 {
        self.usage.get(&feature).copied().unwrap_or(0)
    }

    /// `active && usage < limit`
    pub fn can_use(&self, feature: Feature) -> bool {
        self.check(feature).allowed
    }

    /// Gate result with the numbers behind it
    pub fn check(&self, feature: Feature) -> FeatureCheck {
        let usage = self.usage_of(feature);
        let limit = self.tier.limit(feature);
        let within = limit.map_or(true, |limit| usage < limit);

        FeatureCheck {
            feature,
            allowed: self.status == SubscriptionStatus::Active && within,
            usage,
            limit,
        }
    }

    /// Count one use
    pub fn record_usage(&mut self, feature: Feature) {
        *self.usage.entry(feature).or_insert(0) += 1;
        self.updated_at = now();
    }

    /// Switch tier, keeping counters; reactivates a cancelled subscription
    pub fn change_tier(&mut self, tier: Tier) {
        self.tier = tier;
        self.status = SubscriptionStatus::Active;
        self.updated_at = now();
    }

    /// Stop all gated usage
    pub fn cancel(&mut self) {
        self.status = SubscriptionStatus::Cancelled;
        self.updated_at = now();
    }

    /// Zero counters and start a new period
    pub fn reset_usage(&mut self) {
        let now = now();
        self.usage.clear();
        self.period_start = now;
        self.updated_at = now;
    }
}

impl Record for Subscription {
    const COLLECTION: &'static str = "subscriptions";

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::new_id;

    #[test]
    fn test_limits_table() {
        assert_eq!(Tier::Free.limit(Feature::Articles), Some(3));
        assert_eq!(Tier::Free.limit(Feature::AiGenerations), Some(0));
        assert_eq!(Tier::Starter.limit(Feature::Pilots), Some(5));
        assert_eq!(Tier::Professional.limit(Feature::ApiCalls), Some(100_000));
        for feature in Feature::ALL {
            assert_eq!(Tier::Enterprise.limit(*feature), None);
        }
    }

    #[test]
    fn test_gate_counts_up_to_limit() {
        let mut sub = Subscription::new(new_id(), Tier::Free);
        for _ in 0..3 {
            assert!(sub.can_use(Feature::Articles));
            sub.record_usage(Feature::Articles);
        }
        let check = sub.check(Feature::Articles);
        assert!(!check.allowed);
        assert_eq!((check.usage, check.limit), (3, Some(3)));
    }

    #[test]
    fn test_free_tier_has_no_ai() {
        let sub = Subscription::new(new_id(), Tier::Free);
        assert!(!sub.can_use(Feature::AiGenerations));
    }

    #[test]
    fn test_cancelled_denies_and_resubscribe_reactivates() {
        let mut sub = Subscription::new(new_id(), Tier::Enterprise);
        sub.cancel();
        assert!(!sub.can_use(Feature::Pilots));

        sub.change_tier(Tier::Starter);
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert!(sub.can_use(Feature::Pilots));
    }

    #[test]
    fn test_plan_change_keeps_counters_and_reset_clears() {
        let mut sub = Subscription::new(new_id(), Tier::Starter);
        sub.record_usage(Feature::AiGenerations);
        sub.change_tier(Tier::Professional);
        assert_eq!(sub.usage_of(Feature::AiGenerations), 1);

        let before = sub.period_start;
        sub.reset_usage();
        assert_eq!(sub.usage_of(Feature::AiGenerations), 0);
        assert!(sub.period_start >= before);
    }

    #[test]
    fn test_catalog_serializes_unlimited_as_null() {
        let plans = Plan::catalog();
        assert_eq!(plans.len(), 4);
        let json = serde_json::to_value(&plans[3]).unwrap();
        assert_eq!(json["tier"], "enterprise");
        assert_eq!(json["monthly_price_cents"], 49_900);
        assert!(json["limits"]["articles"].is_null());
    }
}
