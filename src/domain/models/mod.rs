pub mod auth;
pub mod service;
pub mod service_request;
pub mod user;
