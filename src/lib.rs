//! phpIPAM network provisioning
//!
//! Allocates hierarchical subnets for AWS landing zone and spoke VPCs from a
//! phpIPAM server, reserves the addresses AWS keeps for itself, and renders
//! deployment templates from the result. Location records can be exported to
//! and replayed from CSV through the same API.
//!
//! ## Flow
//!
//! ```text
//!  config.json ──► ApiClient ──► TopologyBuilder ──► TemplateRenderer ──► stdout
//!                      │              │
//!                      │              └─ provisioner: request subnet + reserve addresses
//!                      └─ locations: CSV export / import / update
//! ```

pub mod client;
pub mod commands;
pub mod config;
pub mod locations;
pub mod models;
pub mod output;
pub mod provisioner;
pub mod region;
pub mod template;
pub mod topology;

#[cfg(test)]
mod testing;

pub use client::ApiClient;
pub use config::Config;
pub use models::{AddressRecord, Position, SubnetRecord, SubnetRequest};
pub use output::{Envelope, OutputFormat};
pub use region::{RegionSettings, RegionTable};
pub use template::TemplateRenderer;
pub use topology::{ProvisionedTopology, SubnetRole, Topology, TopologyBuilder};

use thiserror::Error;

/// Envelope code for a missing or unreadable config file.
pub const CODE_CONFIG: u16 = 501;
/// Envelope code for failed allocations.
pub const CODE_FAILURE: u16 = 500;

/// IPAM automation errors
#[derive(Error, Debug)]
pub enum IpamError {
    #[error("Can't find config file.")]
    ConfigNotFound,

    #[error("Invalid config file {path}: {reason}")]
    InvalidConfig { path: String, reason: String },

    #[error("Region not defined or recognised.")]
    UnknownRegion(String),

    #[error("phpIPAM returned code {code}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Remote { code: u16, message: Option<String> },

    #[error("Malformed phpIPAM response: {0}")]
    MalformedResponse(String),

    #[error("No {0} subnet in provisioned topology")]
    MissingSubnet(SubnetRole),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    Template(#[from] handlebars::RenderError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IpamError {
    /// Code reported in the output envelope.
    pub fn code(&self) -> u16 {
        match self {
            Self::ConfigNotFound | Self::InvalidConfig { .. } => CODE_CONFIG,
            Self::UnknownRegion(_) => 400,
            Self::Http(_) | Self::MalformedResponse(_) | Self::Json(_) => 502,
            _ => CODE_FAILURE,
        }
    }

    /// Fatal errors terminate with a non-zero exit status. The rest are
    /// reported in the envelope and the process exits cleanly.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::UnknownRegion(_) | Self::Remote { .. } | Self::MissingSubnet(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, IpamError>;
