//! User resource handlers.
//!
//! User records are keyed by email (unique). The single-record routes share
//! one path template: the gateway reads the parameter as an email on GET
//! and as a record id on the admin PATCH.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde_json::{Map, Value, json};

use lifelink_core::models::user::{Role, UserStatus};
use lifelink_core::store::{Document, FindOptions, StoreError};

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::RegisterRequest;

const USERS: &str = "users";

/// `POST /users` — register a user. Idempotent on email: the second
/// registration of the same address gets a 409 and leaves the first record
/// untouched. New users always start as `role=donor, status=active`.
pub async fn register_handler(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    if body.email.is_empty() {
        return Err(ApiError::BadRequest("email is required".into()));
    }

    let store = state.store.acquire().await?;
    if store
        .find_one(USERS, &json!({"email": body.email}))
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("email already registered".into()));
    }

    let mut record = Map::new();
    record.insert("email".into(), json!(body.email));
    if let Some(name) = body.name {
        record.insert("name".into(), json!(name));
    }
    record.insert("role".into(), json!(Role::Donor));
    record.insert("status".into(), json!(UserStatus::Active));
    record.insert("created_at".into(), json!(Utc::now().to_rfc3339()));
    // Profile fields ride along, but never override the server-set ones.
    for (key, value) in body.profile {
        record.entry(key).or_insert(value);
    }

    let mut document = Value::Object(record);
    let id = store
        .insert_one(USERS, document.clone())
        .await
        .map_err(|e| match e {
            // The unique index closes the find-then-insert race.
            StoreError::Duplicate(_) => ApiError::Conflict("email already registered".into()),
            other => other.into(),
        })?;
    document["id"] = json!(id);

    Ok((StatusCode::CREATED, Json(document)))
}

/// `GET /users` — list all users. Admin only.
pub async fn list_users_handler(State(state): State<AppState>) -> ApiResult<Json<Vec<Document>>> {
    let store = state.store.acquire().await?;
    let users = store
        .find(USERS, &json!({}), FindOptions::default())
        .await?;
    Ok(Json(users))
}

/// `GET /users/{email}` — fetch one user by email.
pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<Json<Document>> {
    let store = state.store.acquire().await?;
    let user = store
        .find_one(USERS, &json!({"email": email}))
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
    Ok(Json(user))
}

/// `PATCH /users/{id}` — merge-patch arbitrary fields of a user record,
/// including `role` and `status`. Admin only. Role changes take effect on
/// the user's next credential exchange, not on already-issued tokens.
pub async fn update_user_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut patch): Json<Document>,
) -> ApiResult<Json<Document>> {
    let Some(fields) = patch.as_object_mut() else {
        return Err(ApiError::BadRequest("patch must be a JSON object".into()));
    };
    // Ids are immutable.
    fields.remove("id");

    let store = state.store.acquire().await?;
    let filter = json!({"id": id});
    let matched = store.update_one(USERS, &filter, &patch).await?;
    if matched == 0 {
        return Err(ApiError::NotFound("user not found".into()));
    }

    let updated = store
        .find_one(USERS, &filter)
        .await?
        .ok_or_else(|| ApiError::Internal("updated user vanished".into()))?;
    Ok(Json(updated))
}
