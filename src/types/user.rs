use serde::{Deserialize, Serialize};

use super::{new_id, now, RecordId, Timestamp, Validate, Violations};
use crate::core::Result;
use crate::storage::Record;

string_enum! {
    /// Account role, ordered from least to most privileged
    pub enum Role {
        /// Registered visitor or customer
        User => "user",
        /// Content staff
        Editor => "editor",
        /// Full administrative access
        Admin => "admin",
    }
}

/// Stored account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Account id
    pub id: RecordId,
    /// Lower-cased, unique email
    pub email: String,
    /// Display name
    pub name: String,
    /// Role granting permissions
    pub role: Role,
    /// Hex encoded password salt
    pub password_salt: String,
    /// Hex encoded password hash
    pub password_hash: String,
    /// Disabled accounts cannot authenticate
    pub active: bool,
    /// When the account was created
    pub created_at: Timestamp,
    /// Last modification
    pub updated_at: Timestamp,
    /// Last successful login
    pub last_login_at: Option<Timestamp>,
}

impl User {
    /// Create a new active account from already hashed credentials
    pub fn new(email: &str, name: &str, role: Role, password_salt: String, password_hash: String) -> Self {
        let now = now();
        Self {
            id: new_id(),
            email: normalize_email(email),
            name: name.trim().to_string(),
            role,
            password_salt,
            password_hash,
            active: true,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }

    /// Public view without credentials
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
            active: self.active,
            created_at: self.created_at,
            last_login_at: self.last_login_at,
        }
    }
}

impl Validate for User {
    fn validate(&self) -> Result<()> {
        Violations::new()
            .length("email", &self.email, 3, 254)
            .check(is_plausible_email(&self.email), "email", "must be a valid email address")
            .length("name", &self.name, 1, 100)
            .finish()
    }
}

impl Record for User {
    const COLLECTION: &'static str = "users";

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

/// Account as returned by the API
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    /// Account id
    pub id: RecordId,
    /// Email
    pub email: String,
    /// Display name
    pub name: String,
    /// Role
    pub role: Role,
    /// Whether the account may sign in
    pub active: bool,
    /// When the account was created
    pub created_at: Timestamp,
    /// Last successful login
    pub last_login_at: Option<Timestamp>,
}

/// Trimmed, lower-cased email used for lookups
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}
