//! REST surface: the sprint board under `/api/sprint`, lifecycle analytics
//! under `/api`.
//!
//! Services are synchronous; every handler hops onto the blocking pool via
//! [`AppState::blocking`] before touching the database. Insight handlers use
//! [`AppState::blocking_unlocked`] so the chat call runs without the lock.

pub mod error;
pub mod lifecycle;
pub mod sprint;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Request};
use parking_lot::{Mutex, RwLock};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub use error::{ApiError, ApiResult};

use crate::agents::Agents;
use crate::config::Config;
use crate::error::{Result, SbError};
use crate::lifecycle::{ModelSet, SharedModels};
use crate::storage::Database;

/// Everything a handler needs, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub agents: Agents,
    pub models: SharedModels,
    pub config: Arc<Config>,
}

impl AppState {
    #[must_use]
    pub fn new(db: Database, agents: Agents, config: Config) -> Self {
        let models = ModelSet::new(&config.analytics);
        Self {
            db: Arc::new(Mutex::new(db)),
            agents,
            models: Arc::new(RwLock::new(models)),
            config: Arc::new(config),
        }
    }

    /// Train the lifecycle models from the stored customers.
    pub fn train_models(&self) -> Result<crate::lifecycle::TrainingReport> {
        let db = self.db.lock();
        crate::lifecycle::train_models(&db, &self.models, &self.config.analytics)
    }

    /// Run `f` on the blocking pool with the database locked.
    pub async fn blocking<T, F>(&self, f: F) -> ApiResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Self, &Database) -> Result<T> + Send + 'static,
    {
        let state = self.clone();
        tokio::task::spawn_blocking(move || {
            let db = state.db.lock();
            f(&state, &db)
        })
        .await
        .map_err(|err| SbError::Internal(format!("blocking task failed: {err}")))?
        .map_err(ApiError::from)
    }

    /// Run `f` on the blocking pool without taking the database lock; `f`
    /// locks through [`DbAccess`](crate::storage::DbAccess) as it needs to.
    pub async fn blocking_unlocked<T, F>(&self, f: F) -> ApiResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Self) -> Result<T> + Send + 'static,
    {
        let state = self.clone();
        tokio::task::spawn_blocking(move || f(&state))
            .await
            .map_err(|err| SbError::Internal(format!("blocking task failed: {err}")))?
            .map_err(ApiError::from)
    }
}

/// Stamps each request with a v4 UUID `x-request-id` unless the caller sent one.
#[derive(Debug, Clone, Copy, Default)]
struct RequestUuid;

impl MakeRequestId for RequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

pub fn router(state: AppState) -> Router {
    let cors_permissive = state.config.server.cors_permissive;
    let app = Router::new()
        .nest("/api/sprint", sprint::routes())
        .nest("/api", lifecycle::routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(RequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        );

    if cors_permissive {
        app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        app
    }
}

/// Bind and serve until ctrl-c.
pub async fn serve(state: AppState, bind: &str) -> Result<()> {
    let addr: SocketAddr = bind
        .parse()
        .map_err(|err| SbError::Config(format!("invalid bind address {bind}: {err}")))?;
    let listener = TcpListener::bind(addr).await?;
    if !addr.ip().is_loopback() && state.config.server.cors_permissive {
        tracing::warn!(%addr, "serving with permissive CORS on a non-loopback address");
    }
    tracing::info!(%addr, "sprintboard API listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
    }
    tracing::info!("shutdown signal received");
}
