use axum::{
    extract::rejection::JsonRejection,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

use podium_types::tourney::TourneyView;
use podium_types::{JoinRequest, Tourney, TourneyError};

use crate::store::TourneyStore;
use crate::tourneys::{ServiceError, TourneyService};

#[derive(Clone)]
pub struct AppState<S> {
    pub service: TourneyService<S>,
    pub link_template: String,
}

pub fn router<S>(state: AppState<S>) -> Router
where
    S: TourneyStore + Clone + Send + Sync + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/healthz", get(healthz))
        .route(
            "/api/v1/tourneys",
            get(list_tourneys::<S>).post(create_tourney::<S>),
        )
        .route("/api/v1/tourneys/:id", get(get_tourney::<S>))
        .route("/api/v1/tourneys/:id/join", post(join_tourney::<S>))
        .route("/api/v1/tourneys/:id/trophies", post(set_trophies::<S>))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Request boundary errors, one variant per response shape.
pub enum ApiError {
    /// Missing or malformed parameter. 400 without a domain code.
    Argument(String),
    /// Domain rule violation. 400 with the error kind as `errorCode`.
    Domain(TourneyError),
    NotFound(String),
    Internal(String),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(domain) => ApiError::Domain(domain),
            ServiceError::NotFound(id) => ApiError::NotFound(format!("Tourney {id} does not exist")),
            ServiceError::UnknownMember { .. } => ApiError::NotFound(err.to_string()),
            ServiceError::Conflict(_) | ServiceError::Store(_) => {
                error!("request failed: {err}");
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Argument(message) => (
                StatusCode::BAD_REQUEST,
                json!({ "status": "failed", "error": message }),
            ),
            ApiError::Domain(err) => (
                StatusCode::BAD_REQUEST,
                json!({ "status": "failed", "errorCode": err.code(), "error": err.to_string() }),
            ),
            ApiError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                json!({ "status": "failed", "error": message }),
            ),
            ApiError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "status": "failed", "error": message }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

type Payload = Result<Json<Value>, JsonRejection>;

fn parse_body(payload: Payload) -> Result<Value, ApiError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(ApiError::Argument(format!(
            "The request body is not valid JSON: {rejection}"
        ))),
    }
}

fn get_str(body: &Value, name: &str) -> Result<String, ApiError> {
    match body.get(name) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) | None => Err(ApiError::Argument(format!(
            "The parameter {name} must be defined"
        ))),
        Some(other) => Err(ApiError::Argument(format!(
            "The parameter {name} must be a string, got {other}"
        ))),
    }
}

// Optionals may be omitted or null, but a present value still has to be a
// string.
fn get_opt_str(body: &Value, name: &str) -> Result<Option<String>, ApiError> {
    match body.get(name) {
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Null) | None => Ok(None),
        Some(other) => Err(ApiError::Argument(format!(
            "The parameter {name} must be a string, got {other}"
        ))),
    }
}

// Numbers may arrive as JSON numbers or as numeric strings (form-era
// clients send the latter).
fn get_f64(body: &Value, name: &str) -> Result<f64, ApiError> {
    match body.get(name) {
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| {
            ApiError::Argument(format!("The value of parameter {name} is not a number"))
        }),
        Some(Value::String(s)) => s.parse::<f64>().map_err(|_| {
            ApiError::Argument(format!(
                "The value of parameter {name} is not a number ({s})"
            ))
        }),
        Some(Value::Null) | None => Err(ApiError::Argument(format!(
            "The parameter {name} must be defined"
        ))),
        Some(other) => Err(ApiError::Argument(format!(
            "The value of parameter {name} is not a number ({other})"
        ))),
    }
}

fn get_i32(body: &Value, name: &str) -> Result<i32, ApiError> {
    match body.get(name) {
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .ok_or_else(|| {
                ApiError::Argument(format!("The value of parameter {name} is not an integer"))
            }),
        Some(Value::String(s)) => s.parse::<i32>().map_err(|_| {
            ApiError::Argument(format!(
                "The value of parameter {name} is not an integer ({s})"
            ))
        }),
        Some(Value::Null) | None => Err(ApiError::Argument(format!(
            "The parameter {name} must be defined"
        ))),
        Some(other) => Err(ApiError::Argument(format!(
            "The value of parameter {name} is not an integer ({other})"
        ))),
    }
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_tourneys<S: TourneyStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Value>, ApiError> {
    let (joinable, previous) = state.service.list_split().await?;
    let view = |tourneys: Vec<Tourney>| -> Vec<TourneyView> {
        tourneys
            .iter()
            .map(|t| TourneyView::build(t, &state.link_template))
            .collect()
    };
    Ok(Json(json!({
        "joinable": view(joinable),
        "previous": view(previous),
    })))
}

async fn create_tourney<S: TourneyStore>(
    State(state): State<AppState<S>>,
    payload: Payload,
) -> Result<Json<Value>, ApiError> {
    let body = parse_body(payload)?;
    state
        .service
        .create(
            get_str(&body, "name")?,
            get_opt_str(&body, "description")?,
            get_f64(&body, "prize")?,
            get_str(&body, "transaction_id")?,
            get_str(&body, "user_id")?,
        )
        .await?;
    Ok(Json(json!({ "status": "ok" })))
}

async fn get_tourney<S: TourneyStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<TourneyView>, ApiError> {
    let tourney = state.service.get(&id).await?;
    Ok(Json(TourneyView::build(&tourney, &state.link_template)))
}

async fn join_tourney<S: TourneyStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    payload: Payload,
) -> Result<Json<TourneyView>, ApiError> {
    let body = parse_body(payload)?;
    let request = JoinRequest {
        user_id: get_str(&body, "user_id")?,
        alias_id: get_str(&body, "alias_id")?,
        name: get_str(&body, "name")?,
        tag: get_str(&body, "tag")?,
        wallet_public_key: get_str(&body, "wallet_public_key")?,
    };
    let tourney = state.service.join(&id, request).await?;
    Ok(Json(TourneyView::build(&tourney, &state.link_template)))
}

async fn set_trophies<S: TourneyStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    payload: Payload,
) -> Result<Json<TourneyView>, ApiError> {
    let body = parse_body(payload)?;
    let user_id = get_str(&body, "user_id")?;
    let trophies = get_i32(&body, "trophies")?;
    let tourney = state.service.set_trophies(&id, &user_id, trophies).await?;
    Ok(Json(TourneyView::build(&tourney, &state.link_template)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use podium_types::TourneyStatus;
    use serde_json::Value;
    use std::net::SocketAddr;
    use tokio::time::{sleep, Duration};

    const TX: &str = "e3f4b6167243118d60284cd18c7d9e16be776a4cec0713516239d49c680928c7";
    const TX_2: &str = "aaaab6167243118d60284cd18c7d9e16be776a4cec0713516239d49c680928c7";
    const WALLET_A: &str = "GDNCBCQMB4DNVIVWSYILGWGYCIFZIGAEH6SLRAHYCAU4ZHOBVY4MQDRL";
    const WALLET_B: &str = "GBQ3DQOA7NF52FVV7ES3CR3ZMHUEY4LTHDAQKDTO6S546JCLFPEQGCPK";

    struct TestContext {
        base_url: String,
        client: reqwest::Client,
        store: MemoryStore,
        handle: tokio::task::JoinHandle<()>,
    }

    impl TestContext {
        async fn start() -> Self {
            let store = MemoryStore::new();
            let state = AppState {
                service: TourneyService::new(store.clone()),
                link_template: "http://127.0.0.1/api/v1/tourneys/{id}".to_string(),
            };
            let router = router(state);

            let addr = SocketAddr::from(([127, 0, 0, 1], 0));
            let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
            let actual_addr = listener.local_addr().unwrap();
            let base_url = format!("http://{actual_addr}");

            let handle = tokio::spawn(async move {
                axum::serve(listener, router.into_make_service())
                    .await
                    .unwrap();
            });

            sleep(Duration::from_millis(50)).await;
            Self {
                base_url,
                client: reqwest::Client::new(),
                store,
                handle,
            }
        }

        async fn post(&self, path: &str, body: Value) -> (reqwest::StatusCode, Value) {
            let response = self
                .client
                .post(format!("{}{path}", self.base_url))
                .json(&body)
                .send()
                .await
                .unwrap();
            let status = response.status();
            (status, response.json().await.unwrap())
        }

        async fn get(&self, path: &str) -> (reqwest::StatusCode, Value) {
            let response = self
                .client
                .get(format!("{}{path}", self.base_url))
                .send()
                .await
                .unwrap();
            let status = response.status();
            (status, response.json().await.unwrap())
        }

        async fn create_tourney(&self, tx: &str) -> String {
            let (status, body) = self
                .post(
                    "/api/v1/tourneys",
                    json!({
                        "name": "cup",
                        "description": "weekly cup",
                        "prize": 100.0,
                        "transaction_id": tx,
                        "user_id": "creator",
                    }),
                )
                .await;
            assert_eq!(status, reqwest::StatusCode::OK);
            assert_eq!(body["status"], "ok");

            let (_, listing) = self.get("/api/v1/tourneys").await;
            listing["joinable"]
                .as_array()
                .unwrap()
                .iter()
                .find(|t| t["transaction_id"] == tx)
                .unwrap()["_id"]
                .as_str()
                .unwrap()
                .to_string()
        }
    }

    impl Drop for TestContext {
        fn drop(&mut self) {
            self.handle.abort();
        }
    }

    #[tokio::test]
    async fn healthz_reports_ok() {
        let ctx = TestContext::start().await;
        let (status, body) = ctx.get("/api/healthz").await;
        assert_eq!(status, reqwest::StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn create_and_fetch_tourney() {
        let ctx = TestContext::start().await;
        let id = ctx.create_tourney(TX).await;

        let (status, body) = ctx.get(&format!("/api/v1/tourneys/{id}")).await;
        assert_eq!(status, reqwest::StatusCode::OK);
        assert_eq!(body["title"], "cup");
        assert_eq!(body["status"], "not_payed_yet");
        assert_eq!(body["members_count"], 0);
        assert_eq!(
            body["link"],
            format!("http://127.0.0.1/api/v1/tourneys/{id}")
        );
        assert_eq!(
            body["endAt"].as_u64().unwrap() - body["startAt"].as_u64().unwrap(),
            300_000
        );
    }

    #[tokio::test]
    async fn create_rejects_missing_parameter() {
        let ctx = TestContext::start().await;
        let (status, body) = ctx
            .post(
                "/api/v1/tourneys",
                json!({ "name": "cup", "prize": 100.0, "user_id": "creator" }),
            )
            .await;
        assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "failed");
        assert!(body.get("errorCode").is_none());
        assert_eq!(body["error"], "The parameter transaction_id must be defined");
    }

    #[tokio::test]
    async fn create_rejects_non_string_description() {
        let ctx = TestContext::start().await;
        let (status, body) = ctx
            .post(
                "/api/v1/tourneys",
                json!({
                    "name": "cup",
                    "description": 5,
                    "prize": 100.0,
                    "transaction_id": TX,
                    "user_id": "creator",
                }),
            )
            .await;
        assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "failed");
        assert!(body.get("errorCode").is_none());
        assert_eq!(
            body["error"],
            "The parameter description must be a string, got 5"
        );

        // Omitted and null are both fine.
        let (status, _) = ctx
            .post(
                "/api/v1/tourneys",
                json!({
                    "name": "cup",
                    "description": null,
                    "prize": 100.0,
                    "transaction_id": TX,
                    "user_id": "creator",
                }),
            )
            .await;
        assert_eq!(status, reqwest::StatusCode::OK);
    }

    #[tokio::test]
    async fn create_rejects_malformed_hash() {
        let ctx = TestContext::start().await;
        let (status, body) = ctx
            .post(
                "/api/v1/tourneys",
                json!({
                    "name": "cup",
                    "prize": 100.0,
                    "transaction_id": "nothex",
                    "user_id": "creator",
                }),
            )
            .await;
        assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
        assert_eq!(body["errorCode"], "TransactionHashError");
    }

    #[tokio::test]
    async fn create_rejects_duplicate_transaction() {
        let ctx = TestContext::start().await;
        ctx.create_tourney(TX).await;
        let (status, body) = ctx
            .post(
                "/api/v1/tourneys",
                json!({
                    "name": "other",
                    "prize": 1.0,
                    "transaction_id": TX,
                    "user_id": "creator",
                }),
            )
            .await;
        assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
        assert_eq!(body["errorCode"], "DuplicateTransactionError");
    }

    #[tokio::test]
    async fn unknown_tourney_is_404() {
        let ctx = TestContext::start().await;
        let (status, body) = ctx.get("/api/v1/tourneys/missing").await;
        assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "failed");
    }

    #[tokio::test]
    async fn join_adds_member_and_enforces_uniqueness() {
        let ctx = TestContext::start().await;
        let id = ctx.create_tourney(TX).await;

        let join = json!({
            "user_id": "alice",
            "alias_id": "alice-alias",
            "name": "Alice",
            "tag": "#A",
            "wallet_public_key": WALLET_A,
        });
        let (status, body) = ctx.post(&format!("/api/v1/tourneys/{id}/join"), join.clone()).await;
        assert_eq!(status, reqwest::StatusCode::OK);
        assert_eq!(body["members_count"], 1);
        assert_eq!(body["members"][0]["cpUserId"], "alice");
        assert_eq!(body["members"][0]["startTrophies"], 0);

        // Same user again.
        let (status, body) = ctx.post(&format!("/api/v1/tourneys/{id}/join"), join).await;
        assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
        assert_eq!(body["errorCode"], "UserAlreadyJoinedError");

        // Different user, same wallet.
        let (status, body) = ctx
            .post(
                &format!("/api/v1/tourneys/{id}/join"),
                json!({
                    "user_id": "bob",
                    "alias_id": "bob-alias",
                    "name": "Bob",
                    "tag": "#B",
                    "wallet_public_key": WALLET_A,
                }),
            )
            .await;
        assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
        assert_eq!(body["errorCode"], "UserAlreadyJoinedError");
    }

    #[tokio::test]
    async fn join_rejects_invalid_wallet() {
        let ctx = TestContext::start().await;
        let id = ctx.create_tourney(TX).await;
        let (status, body) = ctx
            .post(
                &format!("/api/v1/tourneys/{id}/join"),
                json!({
                    "user_id": "alice",
                    "alias_id": "alias",
                    "name": "Alice",
                    "tag": "#A",
                    "wallet_public_key": "not-a-wallet",
                }),
            )
            .await;
        assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
        assert_eq!(body["errorCode"], "WalletAddressError");
    }

    #[tokio::test]
    async fn join_rejects_ended_tourney() {
        let ctx = TestContext::start().await;
        let id = ctx.create_tourney(TX).await;

        let mut tourney = ctx.store.get(&id).await.unwrap().unwrap();
        tourney.status = TourneyStatus::NotPayedError;
        assert!(ctx
            .store
            .save_if_status(&mut tourney, TourneyStatus::NotPayedYet)
            .await
            .unwrap());

        let (status, body) = ctx
            .post(
                &format!("/api/v1/tourneys/{id}/join"),
                json!({
                    "user_id": "alice",
                    "alias_id": "alias",
                    "name": "Alice",
                    "tag": "#A",
                    "wallet_public_key": WALLET_A,
                }),
            )
            .await;
        assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
        assert_eq!(body["errorCode"], "TourneyNotJoinableError");
    }

    #[tokio::test]
    async fn trophies_override_reorders_members() {
        let ctx = TestContext::start().await;
        let id = ctx.create_tourney(TX).await;

        for (user, wallet) in [("alice", WALLET_A), ("bob", WALLET_B)] {
            let (status, _) = ctx
                .post(
                    &format!("/api/v1/tourneys/{id}/join"),
                    json!({
                        "user_id": user,
                        "alias_id": format!("{user}-alias"),
                        "name": user,
                        "tag": "#T",
                        "wallet_public_key": wallet,
                    }),
                )
                .await;
            assert_eq!(status, reqwest::StatusCode::OK);
        }

        let (status, _) = ctx
            .post(
                &format!("/api/v1/tourneys/{id}/trophies"),
                json!({ "user_id": "alice", "trophies": 95 }),
            )
            .await;
        assert_eq!(status, reqwest::StatusCode::OK);
        let (status, body) = ctx
            .post(
                &format!("/api/v1/tourneys/{id}/trophies"),
                json!({ "user_id": "bob", "trophies": 80 }),
            )
            .await;
        assert_eq!(status, reqwest::StatusCode::OK);
        assert_eq!(body["members"][0]["cpUserId"], "alice");
        assert_eq!(body["members"][0]["currentTrophies"], 95);
        assert_eq!(body["members"][1]["cpUserId"], "bob");

        let (status, body) = ctx
            .post(
                &format!("/api/v1/tourneys/{id}/trophies"),
                json!({ "user_id": "nobody", "trophies": 1 }),
            )
            .await;
        assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "failed");
    }

    #[tokio::test]
    async fn listing_splits_joinable_and_previous() {
        let ctx = TestContext::start().await;
        let open_id = ctx.create_tourney(TX).await;
        let done_id = ctx.create_tourney(TX_2).await;

        let mut tourney = ctx.store.get(&done_id).await.unwrap().unwrap();
        tourney.status = TourneyStatus::PaymentError;
        assert!(ctx
            .store
            .save_if_status(&mut tourney, TourneyStatus::NotPayedYet)
            .await
            .unwrap());

        let (status, body) = ctx.get("/api/v1/tourneys").await;
        assert_eq!(status, reqwest::StatusCode::OK);
        let joinable = body["joinable"].as_array().unwrap();
        let previous = body["previous"].as_array().unwrap();
        assert_eq!(joinable.len(), 1);
        assert_eq!(joinable[0]["_id"], Value::String(open_id));
        assert_eq!(previous.len(), 1);
        assert_eq!(previous[0]["_id"], Value::String(done_id));
        assert_eq!(previous[0]["status"], "payment_error");
    }
}
