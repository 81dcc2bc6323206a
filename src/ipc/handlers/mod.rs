pub mod auth;
pub mod catalog;
pub mod core;
pub mod marks;
pub mod records;
