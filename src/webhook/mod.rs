pub mod classify;
pub mod events;
pub mod handler;
pub mod signature;
