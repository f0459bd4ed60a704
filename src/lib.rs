pub mod client;
pub mod config;
pub mod humanize;
pub mod models;
pub mod observability;
pub mod render;
pub mod tracker;
pub mod validation;
