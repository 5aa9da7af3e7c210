//! HubSpot CRM API access and contact projection.

pub mod client;
pub mod items;

pub use client::HubSpotClient;
pub use items::{IntegrationItem, project};
