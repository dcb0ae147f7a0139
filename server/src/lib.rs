//! HTTP API for the Keygate license server.
//!
//! Routes keep the paths and parameter names existing clients already use:
//! the check endpoint takes a JSON body, admin endpoints take query strings
//! with a `password` field.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use keygate_license::{
    AdminAuthorizer, CatalogAdmin, CheckRequest, CreateRequest, ErrorKind, IpRequest,
    IssuedLicense, KeyRequest, LicenseError, LicenseView, RecordStore, ValidationEngine,
};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Shared state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    engine: ValidationEngine,
    admin: CatalogAdmin,
}

impl AppState {
    /// Builds state over the catalog file at `data_file`.
    pub fn new(data_file: impl Into<PathBuf>, authorizer: Arc<dyn AdminAuthorizer>) -> Self {
        let store = Arc::new(RecordStore::open(data_file));
        Self {
            engine: ValidationEngine::new(store.clone()),
            admin: CatalogAdmin::new(store, authorizer),
        }
    }
}

/// Plain acknowledgement body.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// Error body returned for every failed request.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: ErrorKind,
}

/// Maps license errors onto HTTP responses.
#[derive(Debug)]
pub struct ApiError(LicenseError);

impl From<LicenseError> for ApiError {
    fn from(err: LicenseError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = match kind {
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::MissingParameter | ErrorKind::InvalidFormat => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::IpNotAllowed | ErrorKind::Expired | ErrorKind::CapacityExceeded => {
                StatusCode::FORBIDDEN
            }
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = if kind == ErrorKind::Internal {
            error!("request failed: {}", self.0);
            "Internal server error".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(ErrorResponse { error: message, kind })).into_response()
    }
}

/// Runs blocking catalog work off the async executor.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, LicenseError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| LicenseError::Storage(format!("catalog task failed: {e}")))?
        .map_err(ApiError::from)
}

#[derive(Deserialize, Debug, Default)]
struct CreateQuery {
    password: Option<String>,
    name: Option<String>,
    expire: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct IpQuery {
    password: Option<String>,
    lic: Option<String>,
    ip: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct KeyQuery {
    password: Option<String>,
    lic: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct AuthQuery {
    password: Option<String>,
}

async fn check_license_handler(
    State(state): State<AppState>,
    body: Result<Json<CheckRequest>, JsonRejection>,
) -> Result<Json<LicenseView>, ApiError> {
    let Json(req) = body.map_err(|_| LicenseError::MissingParameter)?;
    let view = blocking(move || state.engine.check(&req)).await?;
    Ok(Json(view))
}

async fn create_license_handler(
    State(state): State<AppState>,
    Query(q): Query<CreateQuery>,
) -> Result<(StatusCode, Json<IssuedLicense>), ApiError> {
    // Non-numeric day counts are treated as absent.
    let req = CreateRequest {
        name: q.name,
        expire: q.expire.and_then(|days| days.trim().parse().ok()),
    };
    let issued = blocking(move || state.admin.create(q.password.as_deref(), &req)).await?;
    Ok((StatusCode::CREATED, Json(issued)))
}

async fn add_ip_handler(
    State(state): State<AppState>,
    Query(q): Query<IpQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    let req = IpRequest { lic: q.lic, ip: q.ip };
    blocking(move || state.admin.add_ip(q.password.as_deref(), &req)).await?;
    Ok(MessageResponse::new("IP added successfully"))
}

async fn clear_ips_handler(
    State(state): State<AppState>,
    Query(q): Query<KeyQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    let req = KeyRequest { lic: q.lic };
    let outcome = blocking(move || state.admin.clear_ips(q.password.as_deref(), &req)).await?;
    Ok(MessageResponse::new(outcome.message()))
}

async fn delete_license_handler(
    State(state): State<AppState>,
    Query(q): Query<KeyQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    let req = KeyRequest { lic: q.lic };
    blocking(move || state.admin.delete(q.password.as_deref(), &req)).await?;
    Ok(MessageResponse::new("License deleted successfully"))
}

async fn list_all_handler(
    State(state): State<AppState>,
    Query(q): Query<AuthQuery>,
) -> Result<Json<std::collections::BTreeMap<String, LicenseView>>, ApiError> {
    let all = blocking(move || state.admin.list_all(q.password.as_deref())).await?;
    Ok(Json(all))
}

/// Build the HTTP API router with the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/check-license", post(check_license_handler))
        .route("/create-lic", get(create_license_handler))
        .route("/add-ip", get(add_ip_handler))
        .route("/clear-ips", get(clear_ips_handler))
        .route("/delete-lic", get(delete_license_handler))
        .route("/all", get(list_all_handler))
        .with_state(state)
}
