//! Public product roadmap

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{new_id, now, RecordId, Timestamp, Validate, Violations};
use crate::core::Result;
use crate::storage::Record;

string_enum! {
    /// Roadmap swimlane
    pub enum MilestoneCategory {
        /// Software platform
        Platform => "platform",
        /// Devices and gateways
        Hardware => "hardware",
        /// Utility and OEM partnerships
        Partnerships => "partnerships",
        /// R&D
        Research => "research",
    }
}

string_enum! {
    /// Milestone progress state
    pub enum MilestoneStatus {
        /// Not started
        Planned => "planned",
        /// Work underway
        InProgress => "in_progress",
        /// Delivered
        Completed => "completed",
        /// Soft-deleted
        Archived => "archived",
    }
}

/// Calendar quarter written as `Qn YYYY`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Quarter {
    // Field order gives chronological ordering
    year: u16,
    quarter: u8,
}

impl Quarter {
    /// Build a quarter, rejecting anything outside Q1..Q4
    pub fn new(quarter: u8, year: u16) -> Option<Self> {
        (1..=4).contains(&quarter).then_some(Self { year, quarter })
    }

    /// Quarter number, 1 to 4
    pub fn quarter(&self) -> u8 {
        self.quarter
    }

    /// Calendar year
    pub fn year(&self) -> u16 {
        self.year
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{} {}", self.quarter, self.year)
    }
}

impl FromStr for Quarter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || format!("invalid quarter '{}', expected e.g. 'Q3 2025'", s);

        let (q, year) = s.trim().split_once(' ').ok_or_else(invalid)?;
        let q = q.strip_prefix('Q').or_else(|| q.strip_prefix('q')).ok_or_else(invalid)?;
        let quarter: u8 = q.parse().map_err(|_| invalid())?;
        let year = year.trim();
        if year.len() != 4 {
            return Err(invalid());
        }
        let year: u16 = year.parse().map_err(|_| invalid())?;

        Quarter::new(quarter, year).ok_or_else(invalid)
    }
}

impl Serialize for Quarter {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Quarter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Roadmap entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    /// Milestone id
    pub id: RecordId,
    /// Short title
    pub title: String,
    /// Longer description
    pub description: String,
    /// Target quarter
    pub quarter: Quarter,
    /// Swimlane
    pub category: MilestoneCategory,
    /// Percent complete
    pub progress: u8,
    /// Progress state
    pub status: MilestoneStatus,
    /// Position within a quarter
    pub order: i32,
    /// Creation time
    pub created_at: Timestamp,
    /// Last modification
    pub updated_at: Timestamp,
}

/// Body of `POST /api/roadmap`
#[derive(Debug, Clone, Deserialize)]
pub struct NewMilestone {
    /// Short title
    pub title: String,
    /// Longer description
    #[serde(default)]
    pub description: String,
    /// Target quarter
    pub quarter: Quarter,
    /// Swimlane
    pub category: MilestoneCategory,
    /// Percent complete
    #[serde(default)]
    pub progress: u8,
    /// Initial state, planned by default
    pub status: Option<MilestoneStatus>,
    /// Position within a quarter
    #[serde(default)]
    pub order: i32,
}

/// Body of `PUT /api/roadmap/:id`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MilestonePatch {
    /// New title
    pub title: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New quarter
    pub quarter: Option<Quarter>,
    /// New swimlane
    pub category: Option<MilestoneCategory>,
    /// New progress
    pub progress: Option<u8>,
    /// New state
    pub status: Option<MilestoneStatus>,
    /// New position
    pub order: Option<i32>,
}

impl Milestone {
    /// Build from a creation request
    pub fn new(input: NewMilestone) -> Self {
        let now = now();
        let mut milestone = Self {
            id: new_id(),
            title: input.title.trim().to_string(),
            description: input.description,
            quarter: input.quarter,
            category: input.category,
            progress: input.progress,
            status: input.status.unwrap_or(MilestoneStatus::Planned),
            order: input.order,
            created_at: now,
            updated_at: now,
        };
        milestone.settle_progress();
        milestone
    }

    /// Sort key used by the public roadmap
    pub fn sort_key(&self) -> (Quarter, i32) {
        (self.quarter, self.order)
    }

    /// Completed milestones are always at 100%
    fn settle_progress(&mut self) {
        if self.status == MilestoneStatus::Completed {
            self.progress = 100;
        }
    }
}

impl MilestonePatch {
    /// Apply onto a milestone
    pub fn apply(self, milestone: &mut Milestone) {
        if let Some(title) = self.title {
            milestone.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            milestone.description = description;
        }
        if let Some(quarter) = self.quarter {
            milestone.quarter = quarter;
        }
        if let Some(category) = self.category {
            milestone.category = category;
        }
        if let Some(progress) = self.progress {
            milestone.progress = progress;
        }
        if let Some(status) = self.status {
            milestone.status = status;
        }
        if let Some(order) = self.order {
            milestone.order = order;
        }
        milestone.settle_progress();
        milestone.updated_at = now();
    }
}

impl Validate for Milestone {
    fn validate(&self) -> Result<()> {
        Violations::new()
            .length("title", &self.title, 1, 200)
            .max_length("description", Some(&self.description), 2000)
            .check(self.progress <= 100, "progress", "must be between 0 and 100")
            .finish()
    }
}

impl Record for Milestone {
    const COLLECTION: &'static str = "milestones";

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> Timestamp {
        self.created_at
    }
}
