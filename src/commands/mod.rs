//! Subcommand handlers
//!
//! Each handler runs one workflow and returns the envelope to print.
//! Errors that escape a handler are turned into an envelope by the binary.

pub mod landing_zone;
pub mod locations;
pub mod regions;
pub mod spoke;

use crate::client::ApiClient;
use crate::config::Config;
use crate::output::Envelope;
use crate::region::{RegionSettings, RegionTable};
use crate::{IpamError, Result, CODE_FAILURE};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::warn;

pub const GENERAL_FAILURE: &str = "General failure trying to create networks.";

/// Client and region table shared by every handler
pub struct Session {
    pub client: ApiClient,
    pub regions: RegionTable,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        Self {
            client: ApiClient::new(config),
            regions: config.region_table(),
        }
    }

    pub fn region(&self, name: &str) -> Result<&RegionSettings> {
        self.regions.lookup(name)
    }
}

/// Read a template up front so a bad path fails before any allocation.
pub(crate) fn read_template(path: Option<&Path>) -> Result<Option<String>> {
    path.map(fs::read_to_string).transpose().map_err(IpamError::from)
}

/// Remote rejections become the general failure envelope; anything fatal
/// keeps its own code and exit status.
pub(crate) fn provisioning_failure(err: &IpamError) -> Envelope {
    warn!("Provisioning aborted: {}", err);
    if err.is_fatal() {
        Envelope::from_error(err)
    } else {
        Envelope::failure(CODE_FAILURE, GENERAL_FAILURE)
    }
}

/// A step after allocation failed. The subnets stay in phpIPAM, so the
/// envelope lists them for cleanup.
pub(crate) fn post_allocation_failure<T: Serialize>(err: &IpamError, allocated: &T) -> Envelope {
    warn!("Subnets allocated but not rendered: {}", err);
    Envelope::from_error(err).with_allocated(allocated)
}
