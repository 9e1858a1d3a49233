pub mod auth;
pub mod headers;
pub mod session;
