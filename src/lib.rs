pub mod app;
pub mod cli;
pub mod config;
pub mod mapping;
pub mod normalize;
pub mod output;
pub mod render;
pub mod request;
pub mod runner;
pub mod transport;
pub mod utils;

#[cfg(test)]
mod tests;
