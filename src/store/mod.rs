//! Data access for campaign rendering.
//!
//! This module provides:
//! - The records the renderer reads (`Message`, `Recipient`, `Template`, images)
//! - The `CampaignStore` trait with memory and PostgreSQL backends
//! - A factory selecting the backend from configuration

mod backend;
mod factory;
mod memory;
mod postgres;
mod types;

pub use backend::{CampaignStore, StoreError};
pub use factory::create_campaign_store;
pub use memory::MemoryCampaignStore;
pub use postgres::{connect as connect_postgres, PostgresCampaignStore};
pub use types::{Message, Recipient, SendMethod, Template, TemplateImage, TemplateImageRef};
