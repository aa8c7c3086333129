pub mod board;
pub mod config;
pub mod errors;
pub mod logging;
pub mod repo;
pub mod server;
pub mod service;
pub mod tracker;
pub mod view;
