use std::sync::Arc;

use axum::extract::Path;
use axum::middleware;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::db::AccountTable;
use crate::setup::{ProverConfig, TransferSetup};
use crate::witness::build_transfer_witness;

use super::dto::{AccountResponse, ProofResponse, RootResponse, TransferRequest};
use super::error::ApiError;

const LOG_TARGET: &str = "server::routes";

/// Shared, cloneable handle threaded through every handler: the account
/// table plus an `Arc`-wrapped Groth16 setup, both safely shareable across
/// the request pool (§5, "Shared resources").
#[derive(Clone)]
pub struct ServerContext {
    pub accounts: AccountTable,
    pub setup: Arc<TransferSetup>,
}

pub struct TransferServer {
    router: Router,
}

impl TransferServer {
    pub fn new(accounts: AccountTable, setup: TransferSetup) -> Self {
        let context = Arc::new(ServerContext {
            accounts,
            setup: Arc::new(setup),
        });

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        let router = Router::new()
            .route("/accounts/:index", get(get_account))
            .route("/root", get(get_root))
            .route("/transfers", post(create_transfer))
            .layer(Extension(context))
            .layer(middleware::from_fn(super::logging::log_requests))
            .layer(cors);

        TransferServer { router }
    }

    /// Builds a server from `ProverConfig::from_env()` and a fresh genesis
    /// account table of `account_count` entries.
    pub fn bootstrap(account_count: usize) -> Result<Self, crate::error::TransferError> {
        let prover_config = ProverConfig::from_env();
        let mut rng = rand::rngs::OsRng;
        let setup = TransferSetup::obtain(&prover_config, &mut rng)?;
        let accounts = AccountTable::genesis(account_count, &mut rng);
        Ok(Self::new(accounts, setup))
    }

    pub fn into_router(self) -> Router {
        self.router
    }
}

async fn get_account(
    Extension(ctx): Extension<Arc<ServerContext>>,
    Path(index): Path<usize>,
) -> Result<Json<AccountResponse>, ApiError> {
    let user = ctx.accounts.user(index)?;
    let (n, g) = user.pub_key.to_field::<ark_bn254::Fr>();
    Ok(Json(AccountResponse {
        index,
        n: format!("0x{}", hex::encode(crate::field_hash::field_to_bytes32(n))),
        g: format!("0x{}", hex::encode(crate::field_hash::field_to_bytes32(g))),
        enc_balance: format!(
            "0x{}",
            hex::encode(crate::field_hash::field_to_bytes32(user.enc_balance.to_field::<ark_bn254::Fr>()))
        ),
    }))
}

async fn get_root(Extension(ctx): Extension<Arc<ServerContext>>) -> Json<RootResponse> {
    let root = ctx.accounts.root();
    Json(RootResponse {
        root: format!("0x{}", hex::encode(crate::field_hash::field_to_bytes32(root))),
    })
}

/// Builds the witness and proves the transfer relation, blocking the
/// calling worker thread's CPU budget inside `spawn_blocking` so the async
/// runtime's other tasks aren't stalled (§5).
async fn create_transfer(
    Extension(ctx): Extension<Arc<ServerContext>>,
    Json(payload): Json<TransferRequest>,
) -> Result<Json<ProofResponse>, ApiError> {
    let amount = payload
        .amount
        .parse::<num_bigint::BigUint>()
        .map_err(|_| ApiError::bad_request("amount must be a non-negative decimal integer"))?;

    let ctx_for_blocking = Arc::clone(&ctx);
    let result = tokio::task::spawn_blocking(move || {
        let mut rng = rand::rngs::OsRng;
        let (circuit, public_inputs) = build_transfer_witness(
            &ctx_for_blocking.accounts,
            payload.from_index,
            payload.to_index,
            amount,
            &mut rng,
        )?;
        let proof = ctx_for_blocking.setup.prove(circuit, &mut rng)?;
        Ok::<_, crate::error::TransferError>((proof, public_inputs))
    })
    .await
    .map_err(|err| ApiError::internal(format!("proving task panicked: {err}")))??;

    let (proof, public_inputs) = result;
    tracing::info!(target: LOG_TARGET, from = payload.from_index, to = payload.to_index, "transfer proof served");
    Ok(Json(ProofResponse::new(&proof, &public_inputs)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_std::test_rng;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_server() -> TransferServer {
        let mut rng = test_rng();
        let setup = TransferSetup::generate(&mut rng).unwrap();
        let accounts = AccountTable::genesis(4, &mut rng);
        TransferServer::new(accounts, setup)
    }

    #[tokio::test]
    async fn rejects_same_account_transfer_as_bad_request() {
        let router = test_server().into_router();
        let body = serde_json::to_vec(&serde_json::json!({
            "from_index": 1,
            "to_index": 1,
            "amount": "10",
        }))
        .unwrap();

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/transfers")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_out_of_range_index_as_bad_request() {
        let router = test_server().into_router();
        let body = serde_json::to_vec(&serde_json::json!({
            "from_index": 0,
            "to_index": 99,
            "amount": "10",
        }))
        .unwrap();

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/transfers")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn serves_a_satisfied_transfer_proof() {
        let router = test_server().into_router();
        let body = serde_json::to_vec(&serde_json::json!({
            "from_index": 0,
            "to_index": 1,
            "amount": "1",
        }))
        .unwrap();

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/transfers")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
