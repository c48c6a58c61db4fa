//! VM REST API

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use dvm_primitives::{AccessPath, VmAddress, VmMsg};
use dvm_storage::{CommittedStore, KeyScheme, VmStore, WorkingSet};
use dvm_vm::{BlockHeader, Event, ExecContext, GasMeter, VmKeeper};
use serde::{Deserialize, Serialize};
use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::{SystemTime, UNIX_EPOCH},
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Gas limit of an execute request that doesn't set one
pub const DEFAULT_GAS_LIMIT: u64 = 1_000_000;

/// VM REST API service
#[derive(Clone)]
pub struct VmApi {
    state: Arc<dyn CommittedStore>,
    scheme: KeyScheme,
    keeper: Arc<VmKeeper>,
    /// Height of the last executed message
    height: Arc<AtomicU64>,
    /// One execution at a time
    exec_lock: Arc<Mutex<()>>,
    /// Raised while a message executes and left raised when a fault unwinds the handler
    halted: Arc<AtomicBool>,
}

impl VmApi {
    /// Create new API service
    pub fn new(state: Arc<dyn CommittedStore>, scheme: KeyScheme, keeper: Arc<VmKeeper>) -> Self {
        Self {
            state,
            scheme,
            keeper,
            height: Arc::new(AtomicU64::new(0)),
            exec_lock: Arc::new(Mutex::new(())),
            halted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a fatal VM fault stopped execution
    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    /// Create routes
    pub fn routes(self) -> Router {
        Router::new()
            .route("/", get(health_check))
            .route("/health", get(health_check))
            .route("/api/v1/vm/data/:address/:path", get(get_data))
            .route("/api/v1/vm/execute", post(execute_msg))
            .with_state(self)
    }
}

/// Execute message request
#[derive(Debug, Serialize, Deserialize)]
pub struct ExecuteMsgRequest {
    pub msg: VmMsg,
    #[serde(default)]
    pub gas_limit: Option<u64>,
}

/// Execute message response
#[derive(Debug, Serialize, Deserialize)]
pub struct ExecuteMsgResponse {
    pub height: u64,
    /// Keys written or deleted
    pub written: usize,
    pub events: Vec<Event>,
}

/// Stored value response
#[derive(Debug, Serialize, Deserialize)]
pub struct VmValueResponse {
    pub address: VmAddress,
    /// Hex encoded path
    pub path: String,
    /// Hex encoded value
    pub value: String,
}

/// API error type
#[derive(Debug)]
pub struct ApiError {
    message: String,
    status: StatusCode,
}

impl ApiError {
    fn new(message: impl Into<String>, status: StatusCode) -> Self {
        Self { message: message.into(), status }
    }

    fn internal_error(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::BAD_REQUEST)
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::NOT_FOUND)
    }

    fn unavailable(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::SERVICE_UNAVAILABLE)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": self.message,
        }));
        (self.status, body).into_response()
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "dvm-bridge".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn get_data(
    Path((address, path)): Path<(String, String)>,
    State(api): State<VmApi>,
) -> Result<Json<VmValueResponse>, ApiError> {
    let address = VmAddress::from_hex_lenient(&address).map_err(|e| {
        warn!(address = %address, error = %e, "VM data query rejected");
        ApiError::bad_request(format!("Invalid address: {e}"))
    })?;
    let raw_path = hex::decode(path.strip_prefix("0x").unwrap_or(&path))
        .map_err(|e| ApiError::bad_request(format!("Invalid path: {e}")))?;

    let access_path = AccessPath::new(address, raw_path);
    let value = api
        .state
        .read(&api.scheme.encode(&access_path))
        .map_err(|e| ApiError::internal_error(e.to_string()))?
        .ok_or_else(|| ApiError::not_found(format!("No value at {access_path}")))?;

    debug!(%access_path, len = value.len(), "VM data queried");

    Ok(Json(VmValueResponse {
        address,
        path: hex::encode(&access_path.path),
        value: hex::encode(value),
    }))
}

async fn execute_msg(
    State(api): State<VmApi>,
    Json(req): Json<ExecuteMsgRequest>,
) -> Result<Json<ExecuteMsgResponse>, ApiError> {
    let _guard = api.exec_lock.lock().await;

    if api.is_halted() {
        warn!(signer = %req.msg.signer(), "VM message refused, bridge halted");
        return Err(ApiError::unavailable("VM bridge halted after a fatal fault"));
    }

    let height = api.height.load(Ordering::SeqCst) + 1;
    let time = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| ApiError::internal_error(e.to_string()))?
        .as_secs();

    let working_set = Arc::new(WorkingSet::new(Arc::clone(&api.state)));
    let store = VmStore::new(working_set.clone(), api.scheme);
    let mut ctx = ExecContext::new(
        BlockHeader { height, time },
        GasMeter::new(req.gas_limit.unwrap_or(DEFAULT_GAS_LIMIT)),
        store,
    );

    api.halted.store(true, Ordering::SeqCst);
    let result = api.keeper.handle_msg(&mut ctx, &req.msg).await;
    api.halted.store(false, Ordering::SeqCst);

    if let Err(e) = result {
        working_set.discard();
        warn!(signer = %req.msg.signer(), error = %e, "VM message rejected");
        return Err(ApiError::bad_request(e.to_string()));
    }

    let written = working_set.commit().map_err(|e| ApiError::internal_error(e.to_string()))?;
    api.height.store(height, Ordering::SeqCst);

    info!(
        signer = %req.msg.signer(),
        height,
        written,
        events = ctx.events.len(),
        "VM message executed"
    );

    Ok(Json(ExecuteMsgResponse { height, written, events: ctx.events.drain() }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, Address, Bytes};
    use axum::{body::Body, http::Request};
    use dvm_primitives::{
        CompilationResult, ContractStatus, ExecuteRequest, ExecutionResponse, ExecutionResult,
        SourceFile, VmStatus, VmTypeTag, WriteOp, VM_CODE_EXECUTED,
    };
    use dvm_storage::{KvStore, MemoryStore};
    use dvm_vm::{DsServer, TypeDecoders, VmClient};
    use std::sync::atomic::AtomicUsize;
    use tower::ServiceExt;

    const SIGNER: Address = address!("5555555555555555555555555555555555555555");

    /// Writes the signer's `counter` resource, after failing its first `failures` calls
    #[derive(Default)]
    struct CounterVm {
        failures: AtomicUsize,
    }

    impl CounterVm {
        fn failing_once() -> Self {
            Self { failures: AtomicUsize::new(1) }
        }
    }

    #[async_trait::async_trait]
    impl VmClient for CounterVm {
        async fn execute(&self, request: ExecuteRequest) -> eyre::Result<ExecutionResponse> {
            let failing = self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(eyre::eyre!("connection reset"));
            }

            let contract = &request.contracts[0];
            let execution = ExecutionResult::new(ContractStatus::Keep)
                .with_status(VmStatus { major_status: VM_CODE_EXECUTED, ..Default::default() })
                .with_write_set(vec![WriteOp::Value {
                    path: AccessPath::new(contract.address, b"counter".to_vec()),
                    value: Bytes::from_static(b"\x01"),
                }]);
            Ok(ExecutionResponse { executions: vec![execution] })
        }

        async fn compile(&self, _source: SourceFile) -> eyre::Result<CompilationResult> {
            Ok(CompilationResult::default())
        }

        async fn get_signature(&self, _code: Bytes) -> eyre::Result<Vec<VmTypeTag>> {
            Ok(vec![])
        }
    }

    fn app(scheme: KeyScheme) -> (Router, Arc<MemoryStore>) {
        app_with(scheme, CounterVm::default())
    }

    fn app_with(scheme: KeyScheme, vm: CounterVm) -> (Router, Arc<MemoryStore>) {
        let state = Arc::new(MemoryStore::new());
        let keeper = Arc::new(VmKeeper::new(
            Arc::new(vm),
            DsServer::with_default_middlewares(),
            TypeDecoders::default(),
        ));
        (VmApi::new(state.clone(), scheme, keeper).routes(), state)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    async fn post(
        app: Router,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(app, request).await
    }

    fn counter_key(scheme: KeyScheme) -> Vec<u8> {
        scheme.encode(&AccessPath::new(VmAddress::from_account(SIGNER), b"counter".to_vec()))
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app(KeyScheme::Canonical);
        let (status, body) = get(app, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_get_data() {
        let (app, state) = app(KeyScheme::Canonical);
        let address = VmAddress::new([0x42; 24]);
        let path = AccessPath::new(address, vec![0x01, 0x02]);
        state.set(&KeyScheme::Canonical.encode(&path), b"\xca\xfe");

        let (status, body) = get(app, &format!("/api/v1/vm/data/{address}/0102")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["value"], "cafe");
        assert_eq!(body["path"], "0102");
    }

    #[tokio::test]
    async fn test_get_data_with_account_address() {
        let (app, state) = app(KeyScheme::Legacy);
        let account = address!("3333333333333333333333333333333333333333");
        let path = AccessPath::new(VmAddress::from_account(account), vec![0xff]);
        state.set(&KeyScheme::Legacy.encode(&path), b"\x01");

        let (status, body) = get(app, &format!("/api/v1/vm/data/{account}/ff")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["value"], "01");
    }

    #[tokio::test]
    async fn test_get_missing_data() {
        let (app, _) = app(KeyScheme::Canonical);
        let (status, _) = get(app, &format!("/api/v1/vm/data/{}/00", VmAddress::ZERO)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_address_rejected() {
        let (app, _) = app(KeyScheme::Canonical);
        let (status, body) = get(app, "/api/v1/vm/data/0x1234/00").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid address"));
    }

    #[tokio::test]
    async fn test_execute_commits_write_set() {
        let (app, state) = app(KeyScheme::Canonical);
        let body = serde_json::json!({
            "msg": {
                "type": "execute_script",
                "signer": SIGNER,
                "script": "0x0102",
                "args": [{ "type": "u64", "value": "9" }],
            },
        });

        let (status, response) = post(app.clone(), "/api/v1/vm/execute", body.clone()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(response["height"], 1);
        assert_eq!(response["written"], 1);
        assert_eq!(response["events"][0]["type"], "contract_status");
        assert_eq!(state.read(&counter_key(KeyScheme::Canonical)).unwrap(), Some(vec![0x01]));

        let (_, response) = post(app, "/api/v1/vm/execute", body).await;
        assert_eq!(response["height"], 2);
    }

    #[tokio::test]
    async fn test_execute_invalid_message_leaves_state() {
        let (app, state) = app(KeyScheme::Canonical);
        let body = serde_json::json!({
            "msg": {
                "type": "execute_script",
                "signer": SIGNER,
                "script": "0x0102",
                "args": [{ "type": "u8", "value": "256" }],
            },
        });

        let (status, response) = post(app, "/api/v1/vm/execute", body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(response["error"].as_str().unwrap().contains("argument 0"));
        assert!(state.is_empty());
    }

    #[tokio::test]
    async fn test_fault_halts_later_executions() {
        let (app, state) = app_with(KeyScheme::Canonical, CounterVm::failing_once());
        let body = serde_json::json!({
            "msg": { "type": "execute_script", "signer": SIGNER, "script": "0x01" },
        });

        let first = tokio::spawn(post(app.clone(), "/api/v1/vm/execute", body.clone())).await;
        assert!(first.unwrap_err().is_panic());

        let (status, response) = post(app.clone(), "/api/v1/vm/execute", body).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(response["error"].as_str().unwrap().contains("halted"));
        assert!(state.is_empty());

        let (status, _) = get(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
    }
}
