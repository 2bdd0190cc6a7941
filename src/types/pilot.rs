//! Pilot program sites shown on the deployment map

use serde::{Deserialize, Serialize};

use super::{new_id, now, RecordId, Timestamp, Validate, Violations};
use crate::core::Result;
use crate::storage::Record;

string_enum! {
    /// Device family installed at a pilot site
    pub enum DeviceType {
        /// Rooftop or ground-mounted PV
        Solar => "solar",
        /// Stationary storage
        Battery => "battery",
        /// Heat pump
        HeatPump => "heat_pump",
        /// EV charging point
        EvCharger => "ev_charger",
        /// Metering gateway
        SmartMeter => "smart_meter",
    }
}

string_enum! {
    /// Lifecycle of a pilot site
    pub enum PilotStatus {
        /// Announced, not yet deployed
        Planned => "planned",
        /// Devices deployed and reporting
        Active => "active",
        /// Pilot finished
        Completed => "completed",
        /// Soft-deleted
        Archived => "archived",
    }
}

/// WGS84 coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lng: f64,
}

/// Reported outcomes of a pilot
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PilotMetrics {
    /// Energy saved so far
    pub energy_saved_kwh: f64,
    /// Emissions avoided so far
    pub co2_reduced_kg: f64,
    /// Money saved so far, in dollars
    pub cost_saved: f64,
}

/// Geolocated device deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pilot {
    /// Pilot id
    pub id: RecordId,
    /// Site name
    pub name: String,
    /// City
    pub city: String,
    /// Country
    pub country: String,
    /// Map position
    pub location: GeoPoint,
    /// Installed device families
    pub device_types: Vec<DeviceType>,
    /// Number of installed devices
    pub device_count: u32,
    /// Reported outcomes
    pub metrics: PilotMetrics,
    /// Go-live date
    pub start_date: Option<chrono::NaiveDate>,
    /// Lifecycle state
    pub status: PilotStatus,
    /// Account that registered the site; kept out of responses
    #[serde(skip_serializing)]
    pub created_by: RecordId,
    /// Creation time
    pub created_at: Timestamp,
    /// Last modification
    pub updated_at: Timestamp,
}

/// Body of `POST /api/pilots`
#[derive(Debug, Clone, Deserialize)]
pub struct NewPilot {
    /// Site name
    pub name: String,
    /// City
    pub city: String,
    /// Country
    pub country: String,
    /// Map position
    pub location: GeoPoint,
    /// Installed device families
    pub device_types: Vec<DeviceType>,
    /// Number of installed devices
    #[serde(default)]
    pub device_count: u32,
    /// Reported outcomes
    #[serde(default)]
    pub metrics: PilotMetrics,
    /// Go-live date
    pub start_date: Option<chrono::NaiveDate>,
    /// Initial status, planned by default
    pub status: Option<PilotStatus>,
}

/// Body of `PUT /api/pilots/:id`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PilotPatch {
    /// New site name
    pub name: Option<String>,
    /// New city
    pub city: Option<String>,
    /// New country
    pub country: Option<String>,
    /// New position
    pub location: Option<GeoPoint>,
    /// Replacement device families
    pub device_types: Option<Vec<DeviceType>>,
    /// New device count
    pub device_count: Option<u32>,
    /// Replacement metrics
    pub metrics: Option<PilotMetrics>,
    /// New go-live date
    pub start_date: Option<chrono::NaiveDate>,
    /// New status
    pub status: Option<PilotStatus>,
}

/// Totals across visible pilots, used by the map header
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PilotSummary {
    /// Pilots counted
    pub pilots: usize,
    /// Pilots currently active
    pub active: usize,
    /// Distinct countries
    pub countries: usize,
    /// Sum of device counts
    pub devices: u64,
    /// Sum of energy saved
    pub energy_saved_kwh: f64,
    /// Sum of emissions avoided
    pub co2_reduced_kg: f64,
    /// Sum of money saved
    pub cost_saved: f64,
}

impl Pilot {
    /// Build from a creation request
    pub fn new(input: NewPilot, created_by: RecordId) -> Self {
        let now = now();
        Self {
            id: new_id(),
            name: input.name.trim().to_string(),
            city: input.city.trim().to_string(),
            country: input.country.trim().to_string(),
            location: input.location,
            device_types: dedup(input.device_types),
            device_count: input.device_count,
            metrics: input.metrics,
            start_date: input.start_date,
            status: input.status.unwrap_or(PilotStatus::Planned),
            created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

impl PilotPatch {
    /// Apply onto a pilot
    pub fn apply(self, pilot: &mut Pilot) {
        if let Some(name) = self.name {
            pilot.name = name.trim().to_string();
        }
        if let Some(city) = self.city {
            pilot.city = city.trim().to_string();
        }
        if let Some(country) = self.country {
            pilot.country = country.trim().to_string();
        }
        if let Some(location) = self.location {
            pilot.location = location;
        }
        if let Some(device_types) = self.device_types {
            pilot.device_types = dedup(device_types);
        }
        if let Some(device_count) = self.device_count {
            pilot.device_count = device_count;
        }
        if let Some(metrics) = self.metrics {
            pilot.metrics = metrics;
        }
        if let Some(start_date) = self.start_date {
            pilot.start_date = Some(start_date);
        }
        if let Some(status) = self.status {
            pilot.status = status;
        }
        pilot.updated_at = now();
    }
}

impl PilotSummary {
    /// Aggregate a set of pilots
    pub fn from_pilots<'a>(pilots: impl IntoIterator<Item = &'a Pilot>) -> Self {
        let mut summary = PilotSummary::default();
        let mut countries: Vec<String> = Vec::new();

        for pilot in pilots {
            summary.pilots += 1;
            if pilot.status == PilotStatus::Active {
                summary.active += 1;
            }
            let country = pilot.country.to_lowercase();
            if !countries.contains(&country) {
                countries.push(country);
            }
            summary.devices += u64::from(pilot.device_count);
            summary.energy_saved_kwh += pilot.metrics.energy_saved_kwh;
            summary.co2_reduced_kg += pilot.metrics.co2_reduced_kg;
            summary.cost_saved += pilot.metrics.cost_saved;
        }

        summary.countries = countries.len();
        summary
    }
}

impl Validate for Pilot {
    fn validate(&self) -> Result<()> {
        Violations::new()
            .length("name", &self.name, 1, 120)
            .length("city", &self.city, 1, 100)
            .length("country", &self.country, 1, 100)
            .range("location.lat", self.location.lat, -90.0, 90.0)
            .range("location.lng", self.location.lng, -180.0, 180.0)
            .check(!self.device_types.is_empty(), "device_types", "at least one device type is required")
            .non_negative("metrics.energy_saved_kwh", self.metrics.energy_saved_kwh)
            .non_negative("metrics.co2_reduced_kg", self.metrics.co2_reduced_kg)
            .non_negative("metrics.cost_saved", self.metrics.cost_saved)
            .finish()
    }
}

impl Record for Pilot {
    const COLLECTION: &'static str = "pilots";

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

fn dedup(mut devices: Vec<DeviceType>) -> Vec<DeviceType> {
    devices.sort();
    devices.dedup();
    devices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_pilot(lat: f64, lng: f64, devices: Vec<DeviceType>) -> Pilot {
        Pilot::new(
            NewPilot {
                name: "Harbour Flats".into(),
                city: "Aarhus".into(),
                country: "Denmark".into(),
                location: GeoPoint { lat, lng },
                device_types: devices,
                device_count: 40,
                metrics: PilotMetrics {
                    energy_saved_kwh: 1200.0,
                    co2_reduced_kg: 480.0,
                    cost_saved: 310.0,
                },
                start_date: None,
                status: None,
            },
            new_id(),
        )
    }

    #[test]
    fn test_coordinates_are_bounded() {
        new_pilot(56.15, 10.2, vec![DeviceType::Solar]).validate().unwrap();
        assert!(new_pilot(91.0, 10.2, vec![DeviceType::Solar]).validate().is_err());
        assert!(new_pilot(56.15, -181.0, vec![DeviceType::Solar]).validate().is_err());
    }

    #[test]
    fn test_device_types_required_and_deduplicated() {
        assert!(new_pilot(0.0, 0.0, vec![]).validate().is_err());
        let pilot = new_pilot(0.0, 0.0, vec![DeviceType::Battery, DeviceType::Solar, DeviceType::Battery]);
        assert_eq!(pilot.device_types, vec![DeviceType::Solar, DeviceType::Battery]);
        assert_eq!(pilot.status, PilotStatus::Planned);
    }

    #[test]
    fn test_summary_totals() {
        let mut a = new_pilot(0.0, 0.0, vec![DeviceType::Solar]);
        a.status = PilotStatus::Active;
        let mut b = new_pilot(0.0, 0.0, vec![DeviceType::Battery]);
        b.country = "denmark".into();
        let mut c = new_pilot(0.0, 0.0, vec![DeviceType::HeatPump]);
        c.country = "Kenya".into();

        let summary = PilotSummary::from_pilots([&a, &b, &c]);
        assert_eq!(summary.pilots, 3);
        assert_eq!(summary.active, 1);
        assert_eq!(summary.countries, 2);
        assert_eq!(summary.devices, 120);
        assert!((summary.energy_saved_kwh - 3600.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_device_type_wire_names() {
        assert_eq!(serde_json::to_string(&DeviceType::EvCharger).unwrap(), "\"ev_charger\"");
        assert_eq!("heat_pump".parse::<DeviceType>().unwrap(), DeviceType::HeatPump);
    }
}
