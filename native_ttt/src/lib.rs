pub mod cli;
pub mod config;
pub mod error;
pub mod game;
pub mod server;
pub mod transport;

pub use error::{DeliveryError, JoinError};
