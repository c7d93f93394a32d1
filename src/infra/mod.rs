pub mod factory;
pub mod http;
pub mod repositories;
