pub mod api;
pub mod config;
pub mod insight;
pub mod observability;
