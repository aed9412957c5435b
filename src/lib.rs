pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod market;
pub mod notify;
pub mod tax;
