//! Request extractors
//!
//! Every rejection is turned into the crate [`Error`] so clients always get the
//! JSON error envelope, never axum's plain-text bodies.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, Request,
    },
    http::{header::AUTHORIZATION, request::Parts},
    Json,
};
use serde::de::DeserializeOwned;

use crate::core::{AppState, Error};
use crate::security::{Permission, PermissionSet};
use crate::services;
use crate::types::{RecordId, User};

/// JSON body that rejects with a 400 envelope
pub struct JsonRequest<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for JsonRequest<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonRequest(value)),
            Err(rejection) => {
                let message = match rejection {
                    JsonRejection::JsonDataError(err) => format!("Invalid JSON data: {}", err.body_text()),
                    JsonRejection::JsonSyntaxError(_) => "Malformed JSON".to_string(),
                    JsonRejection::MissingJsonContentType(_) => {
                        "Missing or invalid Content-Type header. Expected 'application/json'".to_string()
                    }
                    JsonRejection::BytesRejection(_) => "Failed to read request body".to_string(),
                    _ => "Invalid JSON request".to_string(),
                };
                Err(Error::invalid_input(message))
            }
        }
    }
}

/// Query string that rejects with a 400 envelope
pub struct QueryParams<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| QueryParams(value))
            .map_err(|e: QueryRejection| Error::invalid_input(e.body_text()))
    }
}

/// Path parameters that reject with a 400 envelope
pub struct PathParams<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for PathParams<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| PathParams(value))
            .map_err(|e: PathRejection| Error::invalid_input(e.body_text()))
    }
}

/// Signed-in caller
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Current account record
    pub user: User,
    /// Permissions of the account's current role
    pub permissions: PermissionSet,
}

impl AuthUser {
    /// Account id
    pub fn id(&self) -> RecordId {
        self.user.id
    }

    /// `Forbidden` unless the caller holds `permission`
    pub fn require(&self, permission: Permission) -> crate::core::Result<()> {
        self.permissions.require(permission)
    }

    /// Whether the caller holds `permission`
    pub fn can(&self, permission: Permission) -> bool {
        self.permissions.has_permission(permission)
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then_some(token)
}

/// Whether a signed-in request counts against the `api_calls` quota
///
/// Account and subscription routes stay open so an exhausted or cancelled
/// caller can still upgrade.
fn is_metered(path: &str) -> bool {
    let path = path.strip_prefix("/api").unwrap_or(path);
    !(path.starts_with("/auth/") || path.starts_with("/subscriptions"))
}

fn resolve(state: &AppState, parts: &Parts, token: &str) -> crate::core::Result<AuthUser> {
    let claims = state.tokens.verify(token)?;
    // Role and active flag come from the store, not the token
    let user = services::users::authenticate(&state.store, claims.sub)?;
    if is_metered(parts.uri.path()) {
        services::subscriptions::meter_api_call(&state.store, user.id)?;
    }
    let permissions = PermissionSet::for_role(user.role);
    Ok(AuthUser { user, permissions })
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| Error::unauthorized("missing bearer token"))?;
        resolve(state, parts, token)
    }
}

/// Caller that may or may not be signed in
///
/// A present but invalid token is still rejected.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl MaybeAuthUser {
    /// Whether the caller holds `permission`; anonymous callers get the public set
    pub fn can(&self, permission: Permission) -> bool {
        match &self.0 {
            Some(user) => user.can(permission),
            None => PermissionSet::anonymous().has_permission(permission),
        }
    }

    /// Id of the signed-in caller
    pub fn id(&self) -> Option<RecordId> {
        self.0.as_ref().map(AuthUser::id)
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match bearer_token(parts) {
            Some(token) => resolve(state, parts, token).map(|u| MaybeAuthUser(Some(u))),
            None => Ok(MaybeAuthUser(None)),
        }
    }
}
