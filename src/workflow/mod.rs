pub mod detect;
pub mod notify;
pub mod revendor;
pub mod types;
