//! Subscription lookup and feature gating

use serde_json::json;

use crate::core::{Error, Result};
use crate::storage::Store;
use crate::system::metrics;
use crate::types::{AuditAction, Feature, FeatureCheck, RecordId, Subscription, Tier};

use super::audit;

/// Subscription of `user_id`, creating a free one on first access
pub fn get_or_create(store: &Store, user_id: RecordId) -> Result<Subscription> {
    Ok(store.subscriptions.get_or_insert_with(user_id, || {
        tracing::debug!(%user_id, "creating free subscription");
        Subscription::new(user_id, Tier::Free)
    }))
}

/// Gate result for one feature
pub fn check_feature(store: &Store, user_id: RecordId, feature: Feature) -> Result<FeatureCheck> {
    Ok(get_or_create(store, user_id)?.check(feature))
}

/// `FeatureLimit` unless the user may use `feature` once more
pub fn ensure_feature(store: &Store, user_id: RecordId, feature: Feature) -> Result<()> {
    let check = check_feature(store, user_id, feature)?;
    if check.allowed {
        return Ok(());
    }

    metrics::record_feature_denial(feature.as_str());
    tracing::info!(%user_id, %feature, usage = check.usage, "feature limit reached");
    Err(Error::FeatureLimit {
        feature,
        // A denial only happens on a limited tier or a cancelled subscription
        limit: check.limit.unwrap_or(u64::MAX),
        usage: check.usage,
    })
}

/// Count one use of `feature` after the gated action succeeded
pub fn record_usage(store: &Store, user_id: RecordId, feature: Feature) -> Result<Subscription> {
    let sub = get_or_create(store, user_id)?;
    store.subscriptions.update(sub.id, |s| {
        s.record_usage(feature);
        Ok(())
    })
}

/// Count one authenticated API request, refusing it once `api_calls` is used up
///
/// Check and increment happen in one update, so concurrent requests cannot
/// overshoot the limit.
pub fn meter_api_call(store: &Store, user_id: RecordId) -> Result<()> {
    get_or_create(store, user_id)?;
    store
        .subscriptions
        .update(user_id, |s| {
            let check = s.check(Feature::ApiCalls);
            if !check.allowed {
                return Err(Error::FeatureLimit {
                    feature: Feature::ApiCalls,
                    limit: check.limit.unwrap_or(u64::MAX),
                    usage: check.usage,
                });
            }
            s.record_usage(Feature::ApiCalls);
            Ok(())
        })
        .map(|_| ())
        .inspect_err(|err| {
            if matches!(err, Error::FeatureLimit { .. }) {
                metrics::record_feature_denial(Feature::ApiCalls.as_str());
                tracing::info!(%user_id, "api call quota reached");
            }
        })
}

/// Move to another tier, keeping counters and reactivating if cancelled
pub fn change_tier(store: &Store, user_id: RecordId, tier: Tier) -> Result<Subscription> {
    let sub = get_or_create(store, user_id)?;
    let previous = sub.tier;
    let updated = store.subscriptions.update(sub.id, |s| {
        s.change_tier(tier);
        Ok(())
    })?;

    tracing::info!(%user_id, from = %previous, to = %tier, "subscription tier changed");
    audit::record(
        store,
        Some(user_id),
        AuditAction::PlanChange,
        &updated,
        json!({ "from": previous, "to": tier }),
    );
    Ok(updated)
}

/// Cancel the user's subscription
pub fn cancel(store: &Store, user_id: RecordId) -> Result<Subscription> {
    let sub = get_or_create(store, user_id)?;
    let updated = store.subscriptions.update(sub.id, |s| {
        s.cancel();
        Ok(())
    })?;

    tracing::info!(%user_id, "subscription cancelled");
    audit::record(store, Some(user_id), AuditAction::PlanChange, &updated, json!({ "status": "cancelled" }));
    Ok(updated)
}

/// Zero the counters of `user_id` and start a new period
pub fn reset_usage(store: &Store, admin_id: RecordId, user_id: RecordId) -> Result<Subscription> {
    store.users.require(user_id)?;
    let sub = get_or_create(store, user_id)?;
    let updated = store.subscriptions.update(sub.id, |s| {
        s.reset_usage();
        Ok(())
    })?;

    tracing::info!(%user_id, %admin_id, "subscription usage reset");
    audit::record(store, Some(admin_id), AuditAction::PlanChange, &updated, json!({ "reset_usage": true }));
    Ok(updated)
}
