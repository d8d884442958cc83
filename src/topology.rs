//! Topology builder
//!
//! Each deployment kind is a fixed table of [`SubnetStep`]s: one VPC-level
//! block carved from the regional supernet, then child subnets carved from
//! that VPC, each followed by its address reservations. The builder walks the
//! table strictly in order and stops at the first failed call.
//!
//! Results are keyed by [`SubnetRole`] so template contexts never depend on
//! the position of a record in the call sequence.

use crate::client::ApiClient;
use crate::models::{AddressRecord, AddressReservation, Position, SubnetRecord, SubnetRequest};
use crate::provisioner::{request_subnet, reserve_first_address};
use crate::region::RegionSettings;
use crate::{IpamError, Result};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

/// Default VPC prefix for a standard spoke
pub const SPOKE_PREFIX: u8 = 22;

/// What a subnet is for within its VPC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubnetRole {
    Vpc,
    PrivateA,
    PrivateB,
    PublicA,
    PublicB,
    TransitA,
    TransitB,
    Cvpn,
}

impl SubnetRole {
    /// Suffix used in phpIPAM descriptions
    pub fn label(&self) -> &'static str {
        match self {
            SubnetRole::Vpc => "VpcCidr",
            SubnetRole::PrivateA => "Private subnet AZ A",
            SubnetRole::PrivateB => "Private subnet AZ B",
            SubnetRole::PublicA => "Public subnet AZ A",
            SubnetRole::PublicB => "Public subnet AZ B",
            SubnetRole::TransitA => "Transit subnet AZ A",
            SubnetRole::TransitB => "Transit subnet AZ B",
            SubnetRole::Cvpn => "CVPN subnet",
        }
    }
}

impl fmt::Display for SubnetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Addresses reserved right after a subnet is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservations {
    None,
    /// Gateway only
    GatewayOnly,
    /// Gateway, AWS DNS resolver, one more AWS-reserved address
    Dns,
    /// Gateway and two AWS-reserved addresses
    Standard,
}

impl Reservations {
    pub fn plan(&self, subnet_id: u64) -> Vec<AddressReservation> {
        let gateway = AddressReservation::gateway(subnet_id);
        let reserved = || AddressReservation::placeholder(subnet_id, "Reserved by AWS");
        match self {
            Reservations::None => Vec::new(),
            Reservations::GatewayOnly => vec![gateway],
            Reservations::Dns => vec![
                gateway,
                AddressReservation::placeholder(subnet_id, "AWS DNS"),
                reserved(),
            ],
            Reservations::Standard => vec![gateway, reserved(), reserved()],
        }
    }
}

/// Which block a step is carved from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parent {
    Supernet,
    Vpc,
}

/// One allocation in a topology table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubnetStep {
    pub role: SubnetRole,
    pub parent: Parent,
    pub prefix_length: u8,
    pub position: Position,
    /// Attach the region's nameserver set
    pub nameserver: bool,
    pub allow_requests: bool,
    pub reservations: Reservations,
}

impl SubnetStep {
    pub const fn new(role: SubnetRole, prefix_length: u8) -> Self {
        Self {
            role,
            parent: Parent::Vpc,
            prefix_length,
            position: Position::First,
            nameserver: true,
            allow_requests: true,
            reservations: Reservations::Standard,
        }
    }

    pub const fn vpc(prefix_length: u8) -> Self {
        Self {
            parent: Parent::Supernet,
            reservations: Reservations::None,
            ..Self::new(SubnetRole::Vpc, prefix_length)
        }
    }

    /// /28 packed at the top of the VPC, no nameserver, closed to requests
    pub const fn transit(role: SubnetRole) -> Self {
        Self {
            nameserver: false,
            ..Self::new(role, 28).last().closed()
        }
    }

    pub const fn last(self) -> Self {
        Self {
            position: Position::Last,
            ..self
        }
    }

    pub const fn closed(self) -> Self {
        Self {
            allow_requests: false,
            ..self
        }
    }

    pub const fn reserve(self, reservations: Reservations) -> Self {
        Self {
            reservations,
            ..self
        }
    }
}

/// Deployment kind; decides both the call sequence and the render context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topology {
    /// Landing zone shared services VPC
    SharedServices { cvpn: bool },
    /// Landing zone vEdge VPC
    VEdge,
    /// Workload spoke named after its account
    Spoke { account: String, prefix_length: u8 },
}

impl Topology {
    pub fn spoke(account: impl Into<String>) -> Self {
        Topology::Spoke {
            account: account.into(),
            prefix_length: SPOKE_PREFIX,
        }
    }

    /// Prefix for every phpIPAM description in this topology
    pub fn label(&self) -> &str {
        match self {
            Topology::SharedServices { .. } => "Shared Services",
            Topology::VEdge => "vEdge",
            Topology::Spoke { account, .. } => account,
        }
    }

    pub fn steps(&self) -> Vec<SubnetStep> {
        use SubnetRole::*;

        match self {
            Topology::SharedServices { cvpn } => {
                let mut steps = vec![
                    SubnetStep::vpc(19),
                    SubnetStep::new(PrivateA, 22).reserve(Reservations::Dns),
                    SubnetStep::new(PrivateB, 22),
                    SubnetStep::transit(TransitB),
                    SubnetStep::transit(TransitA),
                    SubnetStep::new(PublicB, 23).last(),
                    SubnetStep::new(PublicA, 23).last(),
                ];
                if *cvpn {
                    steps.push(
                        SubnetStep::new(Cvpn, 22)
                            .last()
                            .closed()
                            .reserve(Reservations::GatewayOnly),
                    );
                }
                steps
            }
            Topology::VEdge => vec![
                SubnetStep::vpc(25).last(),
                SubnetStep::new(PrivateA, 28).reserve(Reservations::Dns),
                SubnetStep::new(PrivateB, 28),
                SubnetStep::new(PublicA, 28),
                SubnetStep::new(PublicB, 28),
                SubnetStep::transit(TransitB),
                SubnetStep::transit(TransitA),
            ],
            Topology::Spoke { prefix_length, .. } => vec![
                SubnetStep::vpc(*prefix_length),
                SubnetStep::new(PrivateA, 24).reserve(Reservations::Dns),
                SubnetStep::new(PrivateB, 24),
                SubnetStep::transit(TransitB),
                SubnetStep::transit(TransitA),
            ],
        }
    }

    pub fn description(&self, role: SubnetRole) -> String {
        format!("{} {}", self.label(), role.label())
    }
}

/// A subnet and the addresses reserved in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedSubnet {
    pub role: SubnetRole,
    pub record: SubnetRecord,
    pub addresses: Vec<AddressRecord>,
}

/// Outcome of a complete build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedTopology {
    pub topology: Topology,
    subnets: Vec<ProvisionedSubnet>,
}

impl ProvisionedTopology {
    pub fn new(topology: Topology, subnets: Vec<ProvisionedSubnet>) -> Self {
        Self { topology, subnets }
    }

    /// Records in construction order
    pub fn records(&self) -> Vec<SubnetRecord> {
        self.subnets.iter().map(|s| s.record.clone()).collect()
    }

    pub fn subnets(&self) -> &[ProvisionedSubnet] {
        &self.subnets
    }

    pub fn get(&self, role: SubnetRole) -> Option<&SubnetRecord> {
        self.subnets
            .iter()
            .find(|s| s.role == role)
            .map(|s| &s.record)
    }

    pub fn subnet(&self, role: SubnetRole) -> Result<&SubnetRecord> {
        self.get(role).ok_or(IpamError::MissingSubnet(role))
    }
}

/// Runs topology tables against one region
pub struct TopologyBuilder<'a> {
    client: &'a ApiClient,
    region: &'a RegionSettings,
}

impl<'a> TopologyBuilder<'a> {
    pub fn new(client: &'a ApiClient, region: &'a RegionSettings) -> Self {
        Self { client, region }
    }

    /// Execute every step of `topology`, aborting at the first failure.
    pub async fn build(&self, topology: Topology) -> Result<ProvisionedTopology> {
        let mut subnets: Vec<ProvisionedSubnet> = Vec::new();
        let mut vpc_id = None;

        for step in topology.steps() {
            let parent_id = match step.parent {
                Parent::Supernet => self.region.supernet_id,
                Parent::Vpc => vpc_id.ok_or(IpamError::MissingSubnet(SubnetRole::Vpc))?,
            };
            let nameserver_id = if step.nameserver {
                self.region.dns_server_id
            } else {
                0
            };
            let request = SubnetRequest::new(parent_id, step.prefix_length, topology.description(step.role))
                .nameserver(nameserver_id)
                .allow_requests(step.allow_requests)
                .position(step.position);

            let record = request_subnet(self.client, &request).await.map_err(|e| {
                warn!("{} failed: {}", request.description, e);
                e
            })?;
            if step.role == SubnetRole::Vpc {
                vpc_id = Some(record.id);
            }

            let mut addresses = Vec::new();
            for reservation in step.reservations.plan(record.id) {
                addresses.push(reserve_first_address(self.client, &reservation).await?);
            }
            debug!(role = %step.role, reserved = addresses.len(), "step complete");

            subnets.push(ProvisionedSubnet {
                role: step.role,
                record,
                addresses,
            });
        }

        info!("{} provisioned with {} subnets", topology.label(), subnets.len());
        Ok(ProvisionedTopology::new(topology, subnets))
    }
}
