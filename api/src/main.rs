use std::sync::Arc;

use actix_web::{web, HttpServer};
use dotenvy::dotenv;
use log::{error, info, warn};

use tw_api::{create_app, AppState, EdgeAuth, Upstream};
use tw_core::repositories::{CredentialVerifier, InMemoryTokenRepository, TokenRepository};
use tw_core::services::{
    AccessTokenVerifier, TokenCleanupConfig, TokenCleanupService, TokenService, TokenServiceConfig,
};
use tw_infra::{DatabasePool, InMemoryCredentialVerifier, MySqlCredentialVerifier, MySqlTokenRepository};
use tw_shared::AppConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting tokenwarden");

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    for warning in config.warnings() {
        warn!("{}", warning);
    }

    match config.database.url {
        Some(_) => {
            let db = match DatabasePool::new(&config.database).await {
                Ok(db) => db,
                Err(e) => {
                    error!("Failed to connect to database: {}", e);
                    std::process::exit(1);
                }
            };
            if let Err(e) = db.ping().await {
                error!("Database is not answering: {}", e);
                std::process::exit(1);
            }
            if config.database.run_migrations {
                if let Err(e) = db.run_migrations().await {
                    error!("Failed to run migrations: {}", e);
                    std::process::exit(1);
                }
            }

            let repository = MySqlTokenRepository::new(db.pool().clone());
            let credentials: Arc<dyn CredentialVerifier> =
                Arc::new(MySqlCredentialVerifier::new(db.pool().clone()));
            let result = run_server(config, repository, credentials).await;
            db.close().await;
            result
        }
        None => {
            info!("DATABASE_URL not set, keeping refresh tokens in memory");
            let credentials = match InMemoryCredentialVerifier::new(&config.dev_credentials) {
                Ok(verifier) => verifier,
                Err(e) => {
                    error!("Failed to load development credentials: {}", e);
                    std::process::exit(1);
                }
            };
            run_server(config, InMemoryTokenRepository::new(), Arc::new(credentials)).await
        }
    }
}

/// Wire the services around `repository` and serve until shutdown
async fn run_server<R>(
    config: AppConfig,
    repository: R,
    credentials: Arc<dyn CredentialVerifier>,
) -> std::io::Result<()>
where
    R: TokenRepository + 'static,
{
    let service_config = TokenServiceConfig::from(&config.jwt);
    let token_service = match TokenService::new(repository, service_config) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            error!("Failed to create token service: {}", e);
            std::process::exit(1);
        }
    };

    let upstream = match Upstream::from_config(&config.gateway) {
        Ok(upstream) => upstream,
        Err(e) => {
            error!("Invalid upstream: {}", e);
            std::process::exit(1);
        }
    };
    match upstream {
        Some(ref upstream) => info!("Forwarding unmatched requests to {}", upstream.base_url()),
        None => info!("No upstream configured, unmatched requests get 404"),
    }

    // The filter only needs the key, never the store
    let verifier: Arc<dyn AccessTokenVerifier> = Arc::new(token_service.local_verifier());
    let edge_auth = match EdgeAuth::new(verifier, &config.gateway) {
        Ok(edge_auth) => edge_auth,
        Err(e) => {
            error!("Invalid gateway configuration: {}", e);
            std::process::exit(1);
        }
    };

    let cleanup = Arc::new(TokenCleanupService::new(
        Arc::clone(&token_service),
        TokenCleanupConfig::from(&config.cleanup),
    ));
    let cleanup_handle = cleanup.start_background_task();

    let app_state = web::Data::new(AppState::new(token_service, credentials, upstream));

    let bind_address = config.server.bind_address();
    info!("Server will bind to: {}", bind_address);
    info!("Public paths: {:?}", config.gateway.public_paths);

    let mut server = HttpServer::new(move || create_app(app_state.clone(), edge_auth.clone()));
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    let result = server.bind(&bind_address)?.run().await;

    if let Some(handle) = cleanup_handle {
        handle.abort();
    }
    info!("Server stopped");
    result
}
