pub mod editor;
pub mod filter;
pub mod ports;
pub mod schema;
pub mod service;
pub mod validation;
