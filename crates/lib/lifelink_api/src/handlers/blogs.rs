//! Blog handlers.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use serde_json::{Value, json};

use lifelink_core::store::{Document, FindOptions};

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::RequestContext;
use crate::models::StatusQuery;

const BLOGS: &str = "blogs";

/// `POST /blogs` — create a blog post. Admin only; status is forced to
/// `draft` so nothing publishes by accident.
pub async fn create_blog_handler(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Json(body): Json<Document>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let Value::Object(mut blog) = body else {
        return Err(ApiError::BadRequest("body must be a JSON object".into()));
    };

    blog.insert("status".into(), json!("draft"));
    blog.insert("author_email".into(), json!(context.email));
    blog.insert("created_at".into(), json!(Utc::now().to_rfc3339()));

    let store = state.store.acquire().await?;
    let mut document = Value::Object(blog);
    let id = store.insert_one(BLOGS, document.clone()).await?;
    document["id"] = json!(id);

    Ok((StatusCode::CREATED, Json(document)))
}

/// `GET /blogs` — public listing, optional `?status=` filter.
pub async fn list_blogs_handler(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<Vec<Document>>> {
    let filter = match query.status {
        Some(status) => json!({"status": status}),
        None => json!({}),
    };
    let store = state.store.acquire().await?;
    let blogs = store.find(BLOGS, &filter, FindOptions::default()).await?;
    Ok(Json(blogs))
}
