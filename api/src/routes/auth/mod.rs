//! Authentication route handlers
//!
//! - Login with username and password
//! - Token refresh
//! - Logout of a single session

pub mod login;
pub mod logout;
pub mod refresh;

pub use login::login;
pub use logout::logout;
pub use refresh::refresh_token;
