//! Donation request handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use serde_json::{Value, json};

use lifelink_core::models::user::{Role, UserStatus};
use lifelink_core::store::{Document, FindOptions, ResourceStore};

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::RequestContext;
use crate::models::StatusQuery;

const REQUESTS: &str = "donation_requests";
const USERS: &str = "users";

/// Look up the caller's stored status; blocked donors may not create
/// requests. A missing record counts as active — registration may lag the
/// first sign-in.
async fn caller_is_blocked(store: &dyn ResourceStore, email: &str) -> ApiResult<bool> {
    let user = store.find_one(USERS, &json!({"email": email})).await?;
    let status = user
        .as_ref()
        .and_then(|doc| doc.get("status"))
        .and_then(|value| serde_json::from_value::<UserStatus>(value.clone()).ok());
    Ok(status == Some(UserStatus::Blocked))
}

/// `POST /donation-requests` — create a request. Donor only. The status is
/// forced to `pending` no matter what the body says, and the request is
/// stamped with the requester's identity.
pub async fn create_request_handler(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Json(body): Json<Document>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let Value::Object(mut request) = body else {
        return Err(ApiError::BadRequest("body must be a JSON object".into()));
    };

    let store = state.store.acquire().await?;
    if caller_is_blocked(store.as_ref(), &context.email).await? {
        return Err(ApiError::Forbidden("blocked user".into()));
    }

    request.insert("status".into(), json!("pending"));
    request.insert("requester_email".into(), json!(context.email));
    request.insert("created_at".into(), json!(Utc::now().to_rfc3339()));

    let mut document = Value::Object(request);
    let id = store.insert_one(REQUESTS, document.clone()).await?;
    document["id"] = json!(id);

    Ok((StatusCode::CREATED, Json(document)))
}

/// `GET /donation-requests` — public listing, optional `?status=` filter.
pub async fn list_requests_handler(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<Vec<Document>>> {
    let filter = match query.status {
        Some(status) => json!({"status": status}),
        None => json!({}),
    };
    let store = state.store.acquire().await?;
    let requests = store.find(REQUESTS, &filter, FindOptions::default()).await?;
    Ok(Json(requests))
}

/// `GET /donation-requests/user/{email}` — a requester's own listing.
/// Admins may read anyone's; everyone else only their own.
pub async fn list_user_requests_handler(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Path(email): Path<String>,
) -> ApiResult<Json<Vec<Document>>> {
    if context.role != Role::Admin && context.email != email {
        return Err(ApiError::Forbidden("not the requester".into()));
    }
    let store = state.store.acquire().await?;
    let requests = store
        .find(
            REQUESTS,
            &json!({"requester_email": email}),
            FindOptions::default(),
        )
        .await?;
    Ok(Json(requests))
}

fn is_owner(document: &Document, context: &RequestContext) -> bool {
    document.get("requester_email").and_then(Value::as_str) == Some(context.email.as_str())
}

/// `PATCH /donation-requests/{id}` — owner or admin may change anything;
/// a volunteer may move the `status` field only.
pub async fn update_request_handler(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Path(id): Path<String>,
    Json(mut patch): Json<Document>,
) -> ApiResult<Json<Document>> {
    let Some(fields) = patch.as_object_mut() else {
        return Err(ApiError::BadRequest("patch must be a JSON object".into()));
    };
    fields.remove("id");
    fields.remove("requester_email");

    let store = state.store.acquire().await?;
    let filter = json!({"id": id});
    let existing = store
        .find_one(REQUESTS, &filter)
        .await?
        .ok_or_else(|| ApiError::NotFound("donation request not found".into()))?;

    let status_only = fields.keys().all(|key| key == "status");
    let allowed = match context.role {
        Role::Admin => true,
        Role::Volunteer => is_owner(&existing, &context) || status_only,
        Role::Donor => is_owner(&existing, &context),
    };
    if !allowed {
        return Err(ApiError::Forbidden("not the requester".into()));
    }

    store.update_one(REQUESTS, &filter, &patch).await?;
    let updated = store
        .find_one(REQUESTS, &filter)
        .await?
        .ok_or_else(|| ApiError::Internal("updated request vanished".into()))?;
    Ok(Json(updated))
}

/// `DELETE /donation-requests/{id}` — owner or admin.
pub async fn delete_request_handler(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let store = state.store.acquire().await?;
    let filter = json!({"id": id});
    let existing = store
        .find_one(REQUESTS, &filter)
        .await?
        .ok_or_else(|| ApiError::NotFound("donation request not found".into()))?;

    if context.role != Role::Admin && !is_owner(&existing, &context) {
        return Err(ApiError::Forbidden("not the requester".into()));
    }

    store.delete_one(REQUESTS, &filter).await?;
    Ok(StatusCode::NO_CONTENT)
}
