//! Application factory
//!
//! Builds the actix-web application: the edge filter wraps everything, so
//! local routes and forwarded requests are gated the same way.

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    middleware::Logger,
    web, App, Error, HttpResponse,
};

use crate::handlers::json_error_handler;
use crate::middleware::EdgeAuth;
use crate::routes::{self, proxy, AppState};

use tw_core::repositories::TokenRepository;

/// Create and configure the application with all dependencies
pub fn create_app<R>(
    app_state: web::Data<AppState<R>>,
    edge_auth: EdgeAuth,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
>
where
    R: TokenRepository + 'static,
{
    App::new()
        .app_data(app_state)
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        // Logger is outermost so rejected requests are logged too
        .wrap(edge_auth)
        .wrap(Logger::default())
        .route("/health", web::get().to(health_check))
        .service(web::scope("/api/v1").configure(routes::configure::<R>))
        .default_service(web::to(proxy::forward::<R>))
}

/// Health check endpoint handler
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "tokenwarden",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
