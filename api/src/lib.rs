//! HTTP surface of tokenwarden: the edge authentication filter, the token
//! routes and forwarding to the upstream service.

pub mod app;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use app::create_app;
pub use middleware::{AuthContext, EdgeAuth};
pub use routes::{AppState, Upstream};
