//! Output document
//!
//! Every command prints exactly one envelope on stdout.

use crate::IpamError;
use clap::ValueEnum;
use serde::{Serialize, Serializer};
use serde_json::json;
use std::time::Instant;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Single-line JSON
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn encode<T: Serialize>(&self, data: &T) -> String {
        match self {
            OutputFormat::Json => serde_json::to_string(data).unwrap_or_default(),
            OutputFormat::Yaml => serde_yaml::to_string(data).unwrap_or_default(),
        }
    }

    pub fn print<T: Serialize>(&self, data: &T) {
        println!("{}", self.encode(data));
    }
}

/// `{code, success, data, yaml?, buildspec?, time?}`
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub code: u16,
    #[serde(serialize_with = "as_flag")]
    pub success: bool,
    pub data: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaml: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buildspec: Option<String>,
    /// Elapsed seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    /// Exit non-zero after printing
    #[serde(skip)]
    pub fatal: bool,
}

// Callers compare `success` against the string "true".
fn as_flag<S: Serializer>(success: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *success { "true" } else { "false" })
}

impl Envelope {
    pub fn ok<T: Serialize>(data: &T) -> Self {
        Self {
            code: 200,
            success: true,
            data: serde_json::to_value(data).unwrap_or_default(),
            yaml: None,
            buildspec: None,
            time: None,
            fatal: false,
        }
    }

    pub fn failure(code: u16, description: impl Into<String>) -> Self {
        Self {
            code,
            success: false,
            data: json!({ "description": description.into() }),
            yaml: None,
            buildspec: None,
            time: None,
            fatal: false,
        }
    }

    pub fn from_error(err: &IpamError) -> Self {
        let mut envelope = Self::failure(err.code(), err.to_string());
        envelope.fatal = err.is_fatal();
        envelope
    }

    /// Attach records already created in phpIPAM to a failure's `data`.
    pub fn with_allocated<T: Serialize>(mut self, allocated: &T) -> Self {
        if let Some(data) = self.data.as_object_mut() {
            data.insert(
                "allocated".into(),
                serde_json::to_value(allocated).unwrap_or_default(),
            );
        }
        self
    }

    pub fn with_yaml(mut self, yaml: String) -> Self {
        self.yaml = Some(yaml);
        self
    }

    pub fn with_buildspec(mut self, buildspec: String) -> Self {
        self.buildspec = Some(buildspec);
        self
    }

    pub fn timed(mut self, started: Instant) -> Self {
        self.time = Some(started.elapsed().as_secs_f64());
        self
    }
}
