//! Funding record handlers.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use serde_json::{Value, json};

use lifelink_core::models::user::Role;
use lifelink_core::store::{Document, FindOptions};

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::RequestContext;
use crate::models::{CreateFundingRequest, FundingsPage, PageQuery};

const FUNDINGS: &str = "fundings";
const USERS: &str = "users";

const DEFAULT_PAGE_SIZE: u64 = 10;
const MAX_PAGE_SIZE: u64 = 100;

/// `POST /fundings` — record a funding. Stamped with the caller's identity;
/// the amount is in minor currency units and must be at least 1.
pub async fn create_funding_handler(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Json(body): Json<CreateFundingRequest>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    if body.amount < 1 {
        return Err(ApiError::BadRequest("amount must be at least 1".into()));
    }

    let store = state.store.acquire().await?;
    let name = store
        .find_one(USERS, &json!({"email": context.email}))
        .await?
        .and_then(|user| user.get("name").cloned());

    let mut funding = serde_json::Map::new();
    funding.insert("email".into(), json!(context.email));
    if let Some(name) = name {
        funding.insert("name".into(), name);
    }
    funding.insert("amount".into(), json!(body.amount));
    funding.insert("created_at".into(), json!(Utc::now().to_rfc3339()));
    for (key, value) in body.extra {
        funding.entry(key).or_insert(value);
    }

    let mut document = Value::Object(funding);
    let id = store.insert_one(FUNDINGS, document.clone()).await?;
    document["id"] = json!(id);

    Ok((StatusCode::CREATED, Json(document)))
}

/// `GET /fundings` — paginated listing. Admins see every record, everyone
/// else only their own.
pub async fn list_fundings_handler(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<FundingsPage>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    let filter = match context.role {
        Role::Admin => json!({}),
        _ => json!({"email": context.email}),
    };

    let store = state.store.acquire().await?;
    let total = store.count_documents(FUNDINGS, &filter).await?;
    let fundings = store
        .find(FUNDINGS, &filter, FindOptions::page(page, limit))
        .await?;

    Ok(Json(FundingsPage {
        fundings,
        total,
        page,
        total_pages: total.div_ceil(limit),
    }))
}
