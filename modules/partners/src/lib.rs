// === PUBLIC CONTRACT ===
pub mod contract;

pub use contract::{client, error, model};

// === MODULE WIRING ===
pub mod config;
pub mod module;
pub use config::PartnersConfig;
pub use module::PartnersModule;

// === INTERNAL MODULES ===
// Exposed for tests and for the CLI front-end; other consumers should stick
// to the `contract` module.
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod gateways;
#[doc(hidden)]
pub mod infra;
