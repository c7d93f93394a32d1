pub mod auth_service;
pub mod pricing;
pub mod validation;
pub mod wizard;
