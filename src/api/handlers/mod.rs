pub mod auth;
pub mod dashboard;
pub mod health;
pub mod service;
pub mod service_request;
pub mod user;
