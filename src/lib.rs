pub mod bot;
pub mod config;
pub mod error;
pub mod platform;
pub mod queue;
pub mod server;
pub mod shutdown;
pub mod webhook;
pub mod workflow;
pub mod workspace;

#[cfg(test)]
pub(crate) mod testing;
