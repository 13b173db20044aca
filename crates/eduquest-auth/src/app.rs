use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::auth::{
    spawn_session_sweeper, AccessGuard, AuthService, CredentialStore, GoogleProvider,
    IdentityProvider, SeaCredentialStore, SeaSessionStore, SessionStore, TokenService,
};
use crate::config::Config;
use crate::controllers::{self, AppState};
use crate::migrations::Migrator;
use crate::openapi::ApiDoc;

const API_DOCS_PATH: &str = "/api-docs";
const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

/// The assembled service: configuration, storage and auth components.
pub struct App {
    pub config: Arc<Config>,
    pub db: DatabaseConnection,
    pub credentials: Arc<dyn CredentialStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub tokens: Arc<TokenService>,
    provider: Option<Arc<dyn IdentityProvider>>,
}

impl App {
    /// Build the app from a given config. Connects and applies pending migrations.
    pub async fn with_config(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        let token_validity = config.token_validity()?;
        let db = crate::db::connect(&config).await?;

        tracing::info!("Running pending database migrations...");
        Migrator::up(&db, None).await?;
        tracing::info!("Migrations complete.");

        let provider: Option<Arc<dyn IdentityProvider>> = match &config.google {
            Some(google) => {
                tracing::info!("Google login enabled");
                Some(Arc::new(GoogleProvider::new(google.clone())))
            }
            None => {
                tracing::info!("Google login disabled (GOOGLE_CLIENT_ID/SECRET/CALLBACK_URL not set)");
                None
            }
        };

        Ok(App {
            credentials: Arc::new(SeaCredentialStore::new(db.clone())),
            sessions: Arc::new(SeaSessionStore::new(db.clone())),
            tokens: Arc::new(TokenService::new(&config.jwt_secret, token_validity)),
            config: Arc::new(config),
            db,
            provider,
        })
    }

    /// Replace the identity provider (e.g. with a stub in tests).
    pub fn with_identity_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Compose the auth components into handler state.
    pub fn state(&self) -> AppState {
        let mut auth = AuthService::new(
            self.credentials.clone(),
            self.sessions.clone(),
            self.tokens.clone(),
            self.config.clone(),
        );
        if let Some(provider) = &self.provider {
            auth = auth.with_provider(provider.clone());
        }

        AppState {
            auth,
            guard: AccessGuard::new(
                self.tokens.clone(),
                self.sessions.clone(),
                self.credentials.clone(),
            ),
        }
    }

    /// Build the Axum router: API routes, docs, CORS and request tracing.
    pub fn router(&self) -> Router {
        let openapi_spec = ApiDoc::openapi();
        let openapi_json = openapi_spec.clone();

        let mut router = controllers::build_routes(self.state())
            .merge(Scalar::with_url(API_DOCS_PATH, openapi_spec))
            .route(
                OPENAPI_JSON_PATH,
                get(move || {
                    let spec = openapi_json.clone();
                    async move { axum::Json(spec) }
                }),
            );

        match self.config.frontend_url.parse::<HeaderValue>() {
            Ok(origin) => {
                router = router.layer(
                    CorsLayer::new()
                        .allow_origin(origin)
                        .allow_credentials(true)
                        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "FRONTEND_URL is not a valid origin, CORS disabled");
            }
        }

        let x_request_id = axum::http::HeaderName::from_static("x-request-id");
        router
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
                    .on_request(DefaultOnRequest::new().level(tracing::Level::DEBUG))
                    .on_response(
                        DefaultOnResponse::new()
                            .level(tracing::Level::INFO)
                            .latency_unit(LatencyUnit::Millis),
                    ),
            )
            .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
    }

    /// Serve until Ctrl-C, sweeping expired sessions in the background.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = self.config.server_addr();
        let router = self.router();

        let sweeper = spawn_session_sweeper(
            self.sessions.clone(),
            Duration::from_secs(self.config.session_sweep_interval_secs),
        );

        let listener = TcpListener::bind(&addr).await?;
        tracing::info!("EduQuest auth running on http://{}", addr);
        tracing::info!("API docs at http://{}{}", addr, API_DOCS_PATH);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        sweeper.abort();
        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
