//! Local web server for the browser UI.
//!
//! # Responsibility
//! - Expose the record use cases as JSON endpoints under `/api`.
//! - Optionally serve the static browser UI at `/`.
//!
//! # Invariants
//! - Every response body is the `{ success, data?, message?, errors? }`
//!   envelope, including failures.
//! - One SQLite connection is shared behind a mutex; handlers never hold
//!   the lock across an `.await`.

use acdms_core::{
    export_file_name, export_records, import_rows, read_rows, AgniveerId, AgniveerRecord,
    AgniveerService, Authenticator, ChatAssistant, FilterError, ImportRow, RepoError,
    SearchFilter, ServiceError, SqliteAgniveerRepository, TransferError, TransferFormat,
    ValidationErrors,
};
use axum::body::Bytes;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{BytesRejection, JsonRejection, PathRejection};
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info, warn};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    conn: Arc<Mutex<Connection>>,
    authenticator: Arc<dyn Authenticator>,
    assistant: ChatAssistant,
}

impl AppState {
    pub fn new(conn: Connection, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            authenticator,
            assistant: ChatAssistant::new(),
        }
    }

    /// Runs `f` against a service bound to the shared connection.
    fn with_service<T>(
        &self,
        f: impl FnOnce(&AgniveerService<SqliteAgniveerRepository<'_>>) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".to_string()))?;
        let service = AgniveerService::new(SqliteAgniveerRepository::new(&conn));
        f(&service)
    }
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Serialize)]
struct Envelope {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<BTreeMap<String, String>>,
}

impl Envelope {
    fn ok() -> Self {
        Self {
            success: true,
            data: None,
            message: None,
            errors: None,
        }
    }

    fn data(data: impl Serialize) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => Self {
                data: Some(value),
                ..Self::ok()
            },
            Err(err) => Self::failure(format!("failed to encode response: {err}")),
        }
    }

    fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            errors: None,
        }
    }
}

/// Handler failure mapped to status code plus envelope.
#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationErrors),
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Validation(errors) => {
                let mut body = Envelope::failure("Please correct the errors in the form");
                body.errors = Some(errors.into_map());
                (StatusCode::UNPROCESSABLE_ENTITY, body)
            }
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, Envelope::failure(message)),
            Self::Unauthorized(message) => (StatusCode::UNAUTHORIZED, Envelope::failure(message)),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, Envelope::failure(message)),
            Self::Internal(message) => {
                error!("event=http_request module=server status=error error={message}");
                (StatusCode::INTERNAL_SERVER_ERROR, Envelope::failure(message))
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::Validation(errors) => Self::Validation(errors),
            ServiceError::NotFound(id) => Self::NotFound(format!("Agniveer not found: {id}")),
            ServiceError::Repo(RepoError::EmptyRecord) => {
                Self::BadRequest("No valid fields provided".to_string())
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<FilterError> for ApiError {
    fn from(value: FilterError) -> Self {
        Self::BadRequest(value.to_string())
    }
}

impl From<TransferError> for ApiError {
    fn from(value: TransferError) -> Self {
        match value {
            TransferError::NoRows
            | TransferError::InvalidRow { .. }
            | TransferError::UnsupportedFormat(_)
            | TransferError::Json(_)
            | TransferError::Csv(_)
            | TransferError::SheetRead(_) => Self::BadRequest(value.to_string()),
            TransferError::NoRecords => Self::NotFound(value.to_string()),
            TransferError::Service(err) => err.into(),
            TransferError::SheetWrite(_) | TransferError::Io(_) => {
                Self::Internal(value.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::BadRequest(value.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(value: PathRejection) -> Self {
        Self::BadRequest(value.body_text())
    }
}

impl From<BytesRejection> for ApiError {
    fn from(value: BytesRejection) -> Self {
        Self::BadRequest(value.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(value: MultipartRejection) -> Self {
        Self::BadRequest(value.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(value: MultipartError) -> Self {
        Self::BadRequest(value.body_text())
    }
}

type ApiResult = Result<Json<Envelope>, ApiError>;
type JsonBody<T> = Result<Json<T>, JsonRejection>;
type IdParam = Result<Path<AgniveerId>, PathRejection>;
type FormatParam = Result<Path<String>, PathRejection>;

#[derive(Debug, Deserialize)]
struct Credentials {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: String,
}

/// Form payload: whitelisted keys map onto the record, others are dropped.
///
/// Non-string scalars are stringified so numeric inputs are accepted.
fn record_from_payload(payload: BTreeMap<String, Value>) -> Result<AgniveerRecord, ApiError> {
    let mut cells = Vec::with_capacity(payload.len());
    for (key, value) in payload {
        let text = match value {
            Value::Null => continue,
            Value::String(text) => text,
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            Value::Array(_) | Value::Object(_) => {
                return Err(ApiError::BadRequest(format!(
                    "field `{key}` must be a scalar value"
                )))
            }
        };
        cells.push((key, text));
    }

    let (record, ignored) = AgniveerRecord::from_fields(cells);
    if !ignored.is_empty() {
        warn!(
            "event=http_unknown_fields module=server status=ok ignored={}",
            ignored.len()
        );
    }
    Ok(record)
}

/// Builds the full application router.
pub fn router(state: AppState, static_dir: Option<PathBuf>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/authenticate", post(authenticate_handler))
        .route("/agniveers", get(list_handler).post(create_handler))
        .route(
            "/agniveers/:id",
            get(get_handler).put(update_handler).delete(delete_handler),
        )
        .route("/agniveers/search", post(search_handler))
        .route("/agniveers/validate", post(validate_handler))
        .route("/import", post(upload_handler))
        .route("/import/:format", post(import_handler))
        .route("/export/:format", get(export_handler))
        .route("/chat", post(chat_handler));

    let router = Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api)
        .with_state(state);

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };
    router.layer(cors)
}

/// Binds `addr` and serves until the process is stopped.
pub async fn serve(addr: &str, app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("event=server_start module=server status=ok addr={addr}");
    println!("ACDMS server listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health_handler() -> Json<Envelope> {
    Json(Envelope::data(json!({
        "status": "ok",
        "version": acdms_core::core_version(),
    })))
}

async fn authenticate_handler(
    State(state): State<AppState>,
    credentials: JsonBody<Credentials>,
) -> ApiResult {
    let Json(credentials) = credentials?;
    let outcome = state
        .authenticator
        .authenticate(&credentials.username, &credentials.password);
    if outcome.is_granted() {
        info!("event=http_authenticate module=server status=ok");
        Ok(Json(Envelope::ok()))
    } else {
        warn!("event=http_authenticate module=server status=error error_code=invalid_credentials");
        Err(ApiError::Unauthorized(
            "Invalid credentials. Please try again.".to_string(),
        ))
    }
}

async fn list_handler(State(state): State<AppState>) -> ApiResult {
    let records = state.with_service(|service| Ok(service.list()?))?;
    Ok(Json(Envelope::data(records)))
}

async fn get_handler(State(state): State<AppState>, id: IdParam) -> ApiResult {
    let Path(id) = id?;
    let record = state.with_service(|service| {
        service
            .get(id)?
            .ok_or_else(|| ApiError::NotFound(format!("Agniveer not found: {id}")))
    })?;
    Ok(Json(Envelope::data(record)))
}

async fn create_handler(
    State(state): State<AppState>,
    payload: JsonBody<BTreeMap<String, Value>>,
) -> Result<(StatusCode, Json<Envelope>), ApiError> {
    let Json(payload) = payload?;
    let record = record_from_payload(payload)?;
    let id = state.with_service(|service| Ok(service.add(&record)?))?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::data(json!({ "id": id })).message("Agniveer data submitted successfully!")),
    ))
}

async fn update_handler(
    State(state): State<AppState>,
    id: IdParam,
    payload: JsonBody<BTreeMap<String, Value>>,
) -> ApiResult {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let patch = record_from_payload(payload)?;
    let updated = state.with_service(|service| Ok(service.edit(id, &patch)?))?;
    Ok(Json(
        Envelope::data(updated).message("Agniveer updated successfully"),
    ))
}

async fn delete_handler(State(state): State<AppState>, id: IdParam) -> ApiResult {
    let Path(id) = id?;
    state.with_service(|service| Ok(service.remove(id)?))?;
    Ok(Json(Envelope::ok().message("Agniveer deleted successfully")))
}

async fn search_handler(
    State(state): State<AppState>,
    payload: JsonBody<BTreeMap<String, String>>,
) -> ApiResult {
    let Json(payload) = payload?;
    let filter = SearchFilter::from_pairs(&payload)?;
    let records = state.with_service(|service| Ok(service.search(&filter)?))?;
    Ok(Json(Envelope::data(records)))
}

async fn validate_handler(
    State(state): State<AppState>,
    payload: JsonBody<BTreeMap<String, Value>>,
) -> ApiResult {
    let Json(payload) = payload?;
    let record = record_from_payload(payload)?;
    let errors = state.with_service(|service| Ok(service.validate(&record)))?;
    errors.into_result().map_err(ApiError::Validation)?;
    Ok(Json(Envelope::ok().message("Record is valid")))
}

/// Spreadsheet upload: multipart field `file`, format taken from its name.
async fn upload_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult {
    let mut multipart = multipart?;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let format = TransferFormat::parse(
            field
                .file_name()
                .and_then(|name| name.rsplit_once('.'))
                .map_or("", |(_, extension)| extension),
        )?;
        let bytes = field.bytes().await?;
        let rows = read_rows(format, &bytes)?;
        return import(&state, &rows);
    }
    Err(ApiError::BadRequest("No file uploaded".to_string()))
}

/// Raw upload: the request body is the file itself.
async fn import_handler(
    State(state): State<AppState>,
    format: FormatParam,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult {
    let Path(format) = format?;
    let body = body?;
    let rows = read_rows(TransferFormat::parse(&format)?, &body)?;
    import(&state, &rows)
}

fn import(state: &AppState, rows: &[ImportRow]) -> ApiResult {
    let report = state.with_service(|service| Ok(import_rows(service, rows)?))?;
    let summary = report.summary();
    Ok(Json(Envelope::data(report).message(summary)))
}

async fn export_handler(State(state): State<AppState>, format: FormatParam) -> Result<Response, ApiError> {
    let Path(format) = format?;
    let format = TransferFormat::parse(&format)?;
    let body = state.with_service(|service| {
        let records = service.list()?;
        let mut buffer = Vec::new();
        export_records(format, &mut buffer, &records)?;
        Ok(buffer)
    })?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_file_name(format, chrono::Local::now())
    );
    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

async fn chat_handler(
    State(state): State<AppState>,
    request: JsonBody<ChatRequest>,
) -> ApiResult {
    let Json(request) = request?;
    let reply = state.assistant.reply(&request.message);
    Ok(Json(Envelope::data(json!({ "reply": reply }))))
}

#[cfg(test)]
mod tests {
    use super::{router, AppState};
    use acdms_core::db::open_db_in_memory;
    use acdms_core::{read_rows, FixedCredentialAuthenticator, TransferFormat};
    use axum::body::{Body, Bytes};
    use axum::http::{header, HeaderMap, Method, Request, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let conn = open_db_in_memory().unwrap();
        let state = AppState::new(conn, Arc::new(FixedCredentialAuthenticator::default()));
        router(state, None)
    }

    fn valid_payload(number: &str, district: &str) -> Value {
        json!({
            "batch_no": "B-2023-07",
            "number": number,
            "rank": "Agniveer",
            "name": "Ram Kumar",
            "date_of_birth": "2002-05-10",
            "date_of_enrolment": "2022-12-01",
            "medical_category": "SHAPE-1",
            "village": "Mawlai",
            "district": district,
            "state": "Meghalaya",
            "pin_code": "793008",
            "nok_name": "Shyam Kumar",
            "nok_relationship": "Father"
        })
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = app();
        let (status, body) = call(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "ok");
    }

    #[tokio::test]
    async fn authenticate_checks_credentials() {
        let app = app();
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/authenticate",
            Some(json!({ "username": "admin", "password": "ARCShillong" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/authenticate",
            Some(json!({ "username": "admin", "password": "arcshillong" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Invalid credentials. Please try again.");
    }

    #[tokio::test]
    async fn create_get_update_delete_roundtrip() {
        let app = app();
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/agniveers",
            Some(valid_payload("AGV1001", "East Khasi Hills")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["data"]["id"].as_i64().unwrap();

        let (status, body) = call(&app, Method::GET, &format!("/api/agniveers/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Ram Kumar");

        let (status, body) = call(
            &app,
            Method::PUT,
            &format!("/api/agniveers/{id}"),
            Some(json!({ "village": "Laitumkhrah" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["village"], "Laitumkhrah");
        assert_eq!(body["data"]["district"], "East Khasi Hills");

        let (status, _) = call(&app, Method::DELETE, &format!("/api/agniveers/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(&app, Method::GET, &format!("/api/agniveers/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);

        let (status, _) = call(&app, Method::DELETE, &format!("/api/agniveers/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_record_returns_field_errors() {
        let app = app();
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/agniveers",
            Some(json!({ "name": "Ram Kumar", "pin_code": "11000", "aadhar_card_number": "12345" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"]["pin_code"], "PIN Code must be 6 digits");
        assert_eq!(
            body["errors"]["aadhar_card_number"],
            "Aadhar Card Number must be 12 digits"
        );
        assert_eq!(body["errors"]["district"], "District is required");
        assert!(body["errors"].get("name").is_none());

        let (_, body) = call(&app, Method::GET, "/api/agniveers", None).await;
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn validate_endpoint_does_not_write() {
        let app = app();
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/agniveers/validate",
            Some(valid_payload("AGV1001", "Shillong")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (_, body) = call(&app, Method::GET, "/api/agniveers", None).await;
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn search_filters_and_rejects_unknown_fields() {
        let app = app();
        for (number, district) in [("AGV1", "East Khasi Hills"), ("AGV2", "Shillong")] {
            let (status, _) = call(
                &app,
                Method::POST,
                "/api/agniveers",
                Some(valid_payload(number, district)),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/agniveers/search",
            Some(json!({ "district": "Shillong", "name": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let hits = body["data"].as_array().unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["id"], 2);

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/agniveers/search",
            Some(json!({ "district; DROP TABLE agniveers": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn import_then_export() {
        let app = app();
        let (status, _) = call(&app, Method::GET, "/api/export/json", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let rows = json!([
            valid_payload("AGV1", "Shillong"),
            { "name": "Only Name" }
        ]);
        let (status, body) = call(&app, Method::POST, "/api/import/json", Some(rows)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Imported 1 out of 2 records successfully.");
        assert_eq!(body["data"]["failures"][0]["row"], 2);

        let (status, body) = call(&app, Method::GET, "/api/export/json", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) = call(&app, Method::POST, "/api/import/json", Some(json!([]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "No data found in the file");
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, bytes)
    }

    #[tokio::test]
    async fn spreadsheet_upload_and_download() {
        let app = app();
        let csv = "number,name,pin_code\nAGV9,Only Name,793008\n";
        let boundary = "acdms-boundary";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"recruits.csv\"\r\nContent-Type: text/csv\r\n\r\n{csv}\r\n--{boundary}--\r\n"
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/import")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        let (status, _, bytes) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Imported 0 out of 1 records successfully.");

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/agniveers",
            Some(valid_payload("AGV1", "Shillong")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let request = Request::get("/api/export/xlsx").body(Body::empty()).unwrap();
        let (status, headers, bytes) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            headers[header::CONTENT_TYPE],
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.starts_with("attachment; filename=\"agniveers_"));
        assert!(disposition.ends_with(".xlsx\""));
        let rows = read_rows(TransferFormat::Xlsx, &bytes).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["district"], "Shillong");

        let (status, body) = call(&app, Method::GET, "/api/export/pdf", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Unsupported format `pdf`. Use xlsx, csv or json.");
    }

    #[tokio::test]
    async fn upload_without_file_field_is_rejected() {
        let app = app();
        let boundary = "acdms-boundary";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{boundary}--\r\n"
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/import")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        let (status, _, bytes) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "No file uploaded");
    }

    #[tokio::test]
    async fn extractor_failures_use_the_envelope() {
        let app = app();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/agniveers")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"name\":"))
            .unwrap();
        let (status, _, bytes) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert!(body["message"].is_string());

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/agniveers/search",
            Some(json!({ "pin_code": 793008 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, body) = call(&app, Method::GET, "/api/agniveers/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn chat_replies() {
        let app = app();
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/chat",
            Some(json!({ "message": "how do I export?" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["reply"].as_str().unwrap().to_lowercase().contains("export"));
    }
}
