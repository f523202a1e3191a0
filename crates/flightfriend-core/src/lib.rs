pub mod cities;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod flight;
pub mod message;

// Re-export common error type
pub use error::FlightFriendError;
