pub mod credential;
pub mod gateway_account;
pub mod go_live_stage;
pub mod service;
pub mod stripe_setup;
pub mod user;
