pub mod dto;
mod rest_gateway;

pub use rest_gateway::RestPartnersGateway;
