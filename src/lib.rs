pub mod activity;
pub mod alert;
pub mod chart;
pub mod cli;
pub mod client;
pub mod config;
pub mod panel;
pub mod server;
pub mod settings;
pub mod stream;
pub mod view;
