//! phpIPAM API models

use crate::{IpamError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Response envelope returned by every phpIPAM endpoint
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    pub code: u16,
    #[serde(default)]
    pub success: serde_json::Value,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<u64>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl ApiResponse {
    /// phpIPAM reports `success` as a bool or a string depending on version.
    pub fn succeeded(&self) -> bool {
        match &self.success {
            serde_json::Value::Bool(b) => *b,
            serde_json::Value::String(s) => s == "true" || s == "1",
            serde_json::Value::Number(n) => n.as_u64() == Some(1),
            _ => (200..300).contains(&self.code),
        }
    }

    /// Fail with [`IpamError::Remote`] unless the code is `expected`.
    pub fn expect_code(self, expected: u16) -> Result<Self> {
        if self.code == expected {
            Ok(self)
        } else {
            Err(IpamError::Remote {
                code: self.code,
                message: self.message,
            })
        }
    }

    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T> {
        if self.data.is_null() {
            return Err(IpamError::MalformedResponse(format!(
                "no data in response (code {})",
                self.code
            )));
        }
        serde_json::from_value(self.data.clone())
            .map_err(|e| IpamError::MalformedResponse(e.to_string()))
    }
}

// IDs come back as numbers from some controllers and strings from others.
fn lenient_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<u64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Num(u64),
        Str(String),
    }

    match Option::<RawId>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawId::Num(n)) => Ok(Some(n)),
        Some(RawId::Str(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Where in the parent's free space a new subnet is carved from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    First,
    Last,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::First => "first",
            Position::Last => "last",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One subnet allocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetRequest {
    pub parent_id: u64,
    /// 1..=31
    pub prefix_length: u8,
    pub description: String,
    pub nameserver_id: u64,
    pub allow_requests: bool,
    pub position: Position,
}

impl SubnetRequest {
    pub fn new(parent_id: u64, prefix_length: u8, description: impl Into<String>) -> Self {
        Self {
            parent_id,
            prefix_length,
            description: description.into(),
            nameserver_id: 0,
            allow_requests: true,
            position: Position::First,
        }
    }

    pub fn nameserver(mut self, nameserver_id: u64) -> Self {
        self.nameserver_id = nameserver_id;
        self
    }

    pub fn allow_requests(mut self, allow: bool) -> Self {
        self.allow_requests = allow;
        self
    }

    pub fn position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// `subnets/{parent}/{first|last}_subnet/{prefix}/`
    pub fn path(&self) -> String {
        format!(
            "subnets/{}/{}_subnet/{}/",
            self.parent_id, self.position, self.prefix_length
        )
    }

    pub fn body(&self) -> serde_json::Value {
        serde_json::json!({
            "description": self.description,
            "pingSubnet": "0",
            "allowRequests": flag(self.allow_requests),
            "nameserverId": self.nameserver_id.to_string(),
        })
    }
}

/// An allocated subnet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetRecord {
    pub id: u64,
    /// CIDR notation, e.g. `10.0.0.0/24`
    pub subnet: String,
    pub description: String,
}

/// Reserve the next free address of a subnet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressReservation {
    pub subnet_id: u64,
    pub description: String,
    pub is_gateway: bool,
}

impl AddressReservation {
    pub const PATH: &'static str = "addresses/first_free/";

    pub fn gateway(subnet_id: u64) -> Self {
        Self {
            subnet_id,
            description: "Default gateway".into(),
            is_gateway: true,
        }
    }

    pub fn placeholder(subnet_id: u64, description: &str) -> Self {
        Self {
            subnet_id,
            description: description.to_string(),
            is_gateway: false,
        }
    }

    pub fn body(&self) -> serde_json::Value {
        serde_json::json!({
            "subnetId": self.subnet_id.to_string(),
            "description": self.description,
            "is_gateway": flag(self.is_gateway),
        })
    }
}

/// A reserved address
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressRecord {
    pub id: Option<u64>,
    pub address: String,
    pub description: String,
}

/// `tools/nameservers/{id}/` payload
#[derive(Debug, Clone, Deserialize)]
pub struct NameserverSet {
    /// Semicolon-separated list
    pub namesrv1: String,
}

impl NameserverSet {
    pub fn servers(&self) -> Vec<String> {
        self.namesrv1
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}

/// `subnets/{id}/` payload, reduced to what templates need
#[derive(Debug, Clone, Deserialize)]
pub struct SubnetDetails {
    pub subnet: String,
    #[serde(deserialize_with = "lenient_mask")]
    pub mask: String,
}

impl SubnetDetails {
    pub fn cidr(&self) -> String {
        format!("{}/{}", self.subnet, self.mask)
    }
}

fn lenient_mask<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("unexpected mask {other}"))),
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}
