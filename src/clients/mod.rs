pub mod adminusers;
pub mod base;
pub mod connector;
pub mod stripe;
