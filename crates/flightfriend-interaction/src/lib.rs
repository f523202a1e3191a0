//! External service agents for Flight Friend.
//!
//! Everything that talks to the outside world lives here: the Gemini
//! generative-text caller, the Aviationstack flight-data client, the mock
//! flight generator, and the provider fallback chain that ties them
//! together. No component in this crate ever surfaces a hard failure to the
//! conversational engine; the worst case is locally generated data.

pub mod aviationstack;
pub mod gemini;
pub mod mock;
pub mod provider;

pub use aviationstack::AviationstackProvider;
pub use gemini::GeminiClient;
pub use mock::MockFlightProvider;
pub use provider::{FlightProvider, ProviderChain};
