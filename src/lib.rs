pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod form;
pub mod loader;
pub mod manager;
pub mod model;
pub mod output;
pub mod session;
pub mod utils;

#[cfg(test)]
mod tests;
