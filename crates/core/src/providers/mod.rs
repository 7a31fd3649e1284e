pub mod auth;
pub mod http;
pub mod response;
pub mod traits;
