//! Pilot deployment sites

use serde_json::json;

use crate::core::{Error, Result};
use crate::storage::Store;
use crate::system::metrics;
use crate::types::{
    AuditAction, DeviceType, Feature, ListParams, NewPilot, Page, Pilot, PilotPatch, PilotStatus, PilotSummary,
    RecordId, Validate,
};

use super::{audit, subscriptions};

/// Pilots, newest first; archived ones only when `include_archived`
pub fn list(store: &Store, params: &ListParams, include_archived: bool) -> Result<Page<Pilot>> {
    let status = ListParams::parse_filter::<PilotStatus>(params.status.as_deref(), "status")?;
    let device = ListParams::parse_filter::<DeviceType>(params.device_type.as_deref(), "device_type")?;
    let country = params.country.as_deref().map(str::to_lowercase);

    let mut pilots = store.pilots.find(|p| {
        visible(p, include_archived)
            && status.map_or(true, |s| p.status == s)
            && device.map_or(true, |d| p.device_types.contains(&d))
            && country.as_ref().map_or(true, |c| p.country.to_lowercase() == *c)
            && params.matches_search(&[&p.name, &p.city])
    });
    pilots.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Page::paginate(pilots, params)
}

/// One pilot
pub fn get(store: &Store, id: RecordId, include_archived: bool) -> Result<Pilot> {
    store
        .pilots
        .get(id)
        .filter(|p| visible(p, include_archived))
        .ok_or_else(|| Error::not_found(format!("pilots {}", id)))
}

/// Totals over non-archived pilots
pub fn summary(store: &Store) -> PilotSummary {
    let pilots = store.pilots.find(|p| visible(p, false));
    PilotSummary::from_pilots(&pilots)
}

/// Register a pilot, counted against the `pilots` limit
pub fn create(store: &Store, editor_id: RecordId, input: NewPilot) -> Result<Pilot> {
    subscriptions::ensure_feature(store, editor_id, Feature::Pilots)?;

    let pilot = Pilot::new(input, editor_id);
    pilot.validate()?;
    let pilot = store.pilots.insert(pilot)?;
    subscriptions::record_usage(store, editor_id, Feature::Pilots)?;

    metrics::record_created("pilots");
    audit::record(store, Some(editor_id), AuditAction::Create, &pilot, json!({ "city": pilot.city }));
    tracing::info!(pilot_id = %pilot.id, city = %pilot.city, "pilot registered");
    Ok(pilot)
}

/// Apply a partial update
pub fn update(store: &Store, editor_id: RecordId, id: RecordId, patch: PilotPatch) -> Result<Pilot> {
    let pilot = store.pilots.update(id, |p| {
        patch.apply(p);
        p.validate()
    })?;
    audit::record(store, Some(editor_id), AuditAction::Update, &pilot, json!({}));
    Ok(pilot)
}

/// Soft-delete
pub fn archive(store: &Store, admin_id: RecordId, id: RecordId) -> Result<Pilot> {
    let pilot = store.pilots.update(id, |p| {
        p.status = PilotStatus::Archived;
        p.updated_at = chrono::Utc::now();
        Ok(())
    })?;
    audit::record(store, Some(admin_id), AuditAction::Archive, &pilot, json!({}));
    Ok(pilot)
}

fn visible(pilot: &Pilot, include_archived: bool) -> bool {
    include_archived || pilot.status != PilotStatus::Archived
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::subscriptions::change_tier;
    use crate::types::{GeoPoint, PilotMetrics, Role, Tier, User};

    fn input(city: &str, country: &str, devices: Vec<DeviceType>) -> NewPilot {
        NewPilot {
            name: format!("{city} pilot"),
            city: city.into(),
            country: country.into(),
            location: GeoPoint { lat: 48.1, lng: 11.6 },
            device_types: devices,
            device_count: 10,
            metrics: PilotMetrics::default(),
            start_date: None,
            status: Some(PilotStatus::Active),
        }
    }

    fn editor(store: &Store, tier: Tier) -> RecordId {
        let user = store
            .users
            .insert(User::new("ed@eco-grid.io", "Ed", Role::Editor, "s".into(), "h".into()))
            .unwrap();
        change_tier(store, user.id, tier).unwrap();
        user.id
    }

    #[test]
    fn test_filters() {
        let store = Store::new();
        let ed = editor(&store, Tier::Starter);
        create(&store, ed, input("Munich", "Germany", vec![DeviceType::Solar])).unwrap();
        create(&store, ed, input("Nairobi", "Kenya", vec![DeviceType::Battery, DeviceType::Solar])).unwrap();

        let battery = ListParams {
            device_type: Some("battery".into()),
            ..Default::default()
        };
        assert_eq!(list(&store, &battery, false).unwrap().meta.total, 1);

        let germany = ListParams {
            country: Some("germany".into()),
            ..Default::default()
        };
        assert_eq!(list(&store, &germany, false).unwrap().items[0].city, "Munich");

        let bad = ListParams {
            device_type: Some("windmill".into()),
            ..Default::default()
        };
        assert_eq!(list(&store, &bad, false).unwrap_err().status_code(), 400);
    }

    #[test]
    fn test_free_tier_allows_one_pilot() {
        let store = Store::new();
        let ed = editor(&store, Tier::Free);
        create(&store, ed, input("Munich", "Germany", vec![DeviceType::Solar])).unwrap();
        let err = create(&store, ed, input("Berlin", "Germany", vec![DeviceType::Solar])).unwrap_err();
        assert_eq!(err.code(), "feature_limit_reached");
    }

    #[test]
    fn test_archived_hidden_from_public_and_summary() {
        let store = Store::new();
        let ed = editor(&store, Tier::Starter);
        let a = create(&store, ed, input("Munich", "Germany", vec![DeviceType::Solar])).unwrap();
        create(&store, ed, input("Nairobi", "Kenya", vec![DeviceType::Battery])).unwrap();

        archive(&store, ed, a.id).unwrap();
        assert_eq!(get(&store, a.id, false).unwrap_err().status_code(), 404);
        assert!(get(&store, a.id, true).is_ok());

        let totals = summary(&store);
        assert_eq!(totals.pilots, 1);
        assert_eq!(totals.countries, 1);
    }
}
