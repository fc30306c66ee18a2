pub mod app;
pub mod core;
pub mod data;
pub mod filter;
pub mod record;
pub mod utils;
