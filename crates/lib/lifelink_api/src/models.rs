//! API request/response models.
//!
//! Resource payloads themselves stay dynamic (`Document`) — the store is
//! schemaless and handlers only touch the fields they gate on — so typed
//! models exist only where the API contract fixes a shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use lifelink_core::store::Document;

/// Error body returned by every failing route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// `POST /session` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub token: String,
}

/// `POST /users` request. Unknown fields land in the user document as
/// profile fields; reserved fields (`role`, `status`, …) are server-set.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: Option<String>,
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

/// `POST /fundings` request. `amount` is in minor currency units.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFundingRequest {
    pub amount: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Optional `?status=` filter on public listings.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

/// `?page=&limit=` pagination query.
#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// `GET /fundings` response page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingsPage {
    pub fundings: Vec<Document>,
    pub total: u64,
    pub page: u64,
    pub total_pages: u64,
}
