pub mod aggregate;
pub mod cache;
pub mod db;
pub mod domain;
pub mod validate;
