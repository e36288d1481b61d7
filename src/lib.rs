pub mod api;
pub mod calc;
pub mod config;
pub mod export;
pub mod filter;
pub mod ipc;
pub mod model;
pub mod store;
