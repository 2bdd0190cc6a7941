//! Accounts: registration, login, roles and the bootstrap admin

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::core::{Error, Result};
use crate::security::{hash_password, verify_password, IssuedToken, TokenSigner};
use crate::storage::Store;
use crate::types::user::normalize_email;
use crate::types::{AuditAction, ListParams, Page, RecordId, Role, Subscription, Tier, User, UserProfile, Validate};

use super::{audit, subscriptions};

/// Body of `POST /api/auth/register`
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// Email, unique
    pub email: String,
    /// Display name
    pub name: String,
    /// Plain text password
    pub password: String,
}

/// Body of `POST /api/auth/login`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// Email
    pub email: String,
    /// Plain text password
    pub password: String,
}

/// Token plus the profile it belongs to
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    /// Bearer token
    #[serde(flatten)]
    pub token: IssuedToken,
    /// Signed-in account
    pub user: UserProfile,
}

/// Create a `user` account and sign it in
pub fn register(store: &Store, signer: &TokenSigner, req: RegisterRequest) -> Result<AuthResponse> {
    let user = create_user(store, &req.email, &req.name, &req.password, Role::User)?;
    subscriptions::get_or_create(store, user.id)?;
    audit::record(store, Some(user.id), AuditAction::Create, &user, json!({ "via": "register" }));

    tracing::info!(user_id = %user.id, "user registered");
    Ok(AuthResponse {
        token: signer.issue(&user)?,
        user: user.profile(),
    })
}

/// Check credentials and issue a token
///
/// Unknown emails and wrong passwords produce the same error.
pub fn login(store: &Store, signer: &TokenSigner, req: LoginRequest) -> Result<AuthResponse> {
    let email = normalize_email(&req.email);
    let invalid = || Error::unauthorized("invalid email or password");

    let user = store.users.find_one(|u| u.email == email).ok_or_else(invalid)?;
    if !verify_password(&req.password, &user.password_salt, &user.password_hash) {
        tracing::warn!(user_id = %user.id, "failed login");
        return Err(invalid());
    }
    if !user.active {
        return Err(Error::forbidden("account is disabled"));
    }

    let user = store.users.update(user.id, |u| {
        u.last_login_at = Some(chrono::Utc::now());
        Ok(())
    })?;
    audit::record(store, Some(user.id), AuditAction::Login, &user, json!({}));

    Ok(AuthResponse {
        token: signer.issue(&user)?,
        user: user.profile(),
    })
}

/// Active account behind a token subject
pub fn authenticate(store: &Store, user_id: RecordId) -> Result<User> {
    let user = store
        .users
        .get(user_id)
        .ok_or_else(|| Error::unauthorized("account no longer exists"))?;
    if !user.active {
        return Err(Error::unauthorized("account is disabled"));
    }
    Ok(user)
}

/// Accounts, newest first, searchable by email or name
pub fn list(store: &Store, params: &ListParams) -> Result<Page<UserProfile>> {
    let role = ListParams::parse_filter::<Role>(params.role.as_deref(), "role")?;
    let mut users = store.users.find(|u| {
        params.matches_search(&[&u.email, &u.name]) && role.map_or(true, |r| u.role == r)
    });
    users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Page::paginate(users, params)?.map(|u| u.profile()))
}

/// Change the role of `user_id`
pub fn change_role(store: &Store, admin_id: RecordId, user_id: RecordId, role: Role) -> Result<UserProfile> {
    if admin_id == user_id && role != Role::Admin {
        return Err(Error::conflict("admins cannot demote themselves"));
    }

    let mut previous = role;
    let user = store.users.update(user_id, |u| {
        previous = u.role;
        u.role = role;
        u.updated_at = chrono::Utc::now();
        Ok(())
    })?;

    tracing::info!(%user_id, from = %previous, to = %role, "role changed");
    audit::record(store, Some(admin_id), AuditAction::Update, &user, json!({ "role": { "from": previous, "to": role } }));
    Ok(user.profile())
}

/// Make sure the configured admin exists with an enterprise subscription
///
/// Returns `true` when a new account was created.
pub fn ensure_admin(store: &Store, email: &str, password: &str) -> Result<bool> {
    let email = normalize_email(email);
    if store.users.find_one(|u| u.email == email).is_some() {
        return Ok(false);
    }

    let admin = create_user(store, &email, "Administrator", password, Role::Admin)?;
    store.subscriptions.insert(Subscription::new(admin.id, Tier::Enterprise))?;

    tracing::info!(email = %admin.email, "bootstrap admin created");
    Ok(true)
}

fn create_user(store: &Store, email: &str, name: &str, password: &str, role: Role) -> Result<User> {
    let stored = hash_password(password)?;
    let user = User::new(email, name, role, stored.salt, stored.hash);
    user.validate()?;

    if store.users.find_one(|u| u.email == user.email).is_some() {
        return Err(Error::conflict(format!("email {} is already registered", user.email)));
    }
    store.users.insert(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn signer() -> TokenSigner {
        TokenSigner::new("unit-test-secret-value", Duration::from_secs(600))
    }

    fn register_ada(store: &Store) -> AuthResponse {
        register(
            store,
            &signer(),
            RegisterRequest {
                email: "Ada@Eco-Grid.io".into(),
                name: "Ada".into(),
                password: "correct horse".into(),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_register_then_login() {
        let store = Store::new();
        let registered = register_ada(&store);
        assert_eq!(registered.user.role, Role::User);
        assert_eq!(store.subscriptions.len(), 1);

        let logged_in = login(
            &store,
            &signer(),
            LoginRequest {
                email: "ada@eco-grid.io".into(),
                password: "correct horse".into(),
            },
        )
        .unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);
        assert!(logged_in.user.last_login_at.is_some());

        let claims = signer().verify(&logged_in.token.token).unwrap();
        assert_eq!(claims.sub, registered.user.id);
    }

    #[test]
    fn test_duplicate_email_conflicts() {
        let store = Store::new();
        register_ada(&store);
        let err = register(
            &store,
            &signer(),
            RegisterRequest {
                email: "ada@eco-grid.io".into(),
                name: "Other".into(),
                password: "another password".into(),
            },
        )
        .unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[test]
    fn test_wrong_password_is_unauthorized() {
        let store = Store::new();
        register_ada(&store);
        let err = login(
            &store,
            &signer(),
            LoginRequest {
                email: "ada@eco-grid.io".into(),
                password: "wrong password".into(),
            },
        )
        .unwrap_err();
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn test_ensure_admin_is_idempotent() {
        let store = Store::new();
        assert!(ensure_admin(&store, "root@eco-grid.io", "super-secret").unwrap());
        assert!(!ensure_admin(&store, "ROOT@eco-grid.io", "super-secret").unwrap());

        let admin = store.users.find_one(|u| u.role == Role::Admin).unwrap();
        let sub = subscriptions::get_or_create(&store, admin.id).unwrap();
        assert_eq!(sub.tier, Tier::Enterprise);
    }

    #[test]
    fn test_change_role() {
        let store = Store::new();
        ensure_admin(&store, "root@eco-grid.io", "super-secret").unwrap();
        let admin = store.users.find_one(|u| u.role == Role::Admin).unwrap();
        let user = register_ada(&store).user;

        let updated = change_role(&store, admin.id, user.id, Role::Editor).unwrap();
        assert_eq!(updated.role, Role::Editor);
        assert!(change_role(&store, admin.id, admin.id, Role::User).is_err());
    }
}
