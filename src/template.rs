//! Deployment template rendering
//!
//! Templates are handlebars documents (CloudFormation YAML, buildspecs). The
//! render context is assembled from a [`ProvisionedTopology`] by subnet role,
//! plus the region's nameservers and transit gateway metadata.

use crate::region::RegionSettings;
use crate::topology::{ProvisionedTopology, SubnetRole, Topology};
use crate::Result;
use handlebars::Handlebars;
use serde::Serialize;

/// Handlebars renderer with HTML escaping disabled
pub struct TemplateRenderer {
    handlebars: Handlebars<'static>,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut hb = Handlebars::new();
        hb.register_escape_fn(handlebars::no_escape);
        Self { handlebars: hb }
    }

    /// Render `template` against `context`. No I/O, no state between calls.
    pub fn render<T: Serialize>(&self, template: &str, context: &T) -> Result<String> {
        Ok(self.handlebars.render_template(template, context)?)
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Context for spoke buildspecs
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpokeContext {
    pub nameservers: Vec<String>,
    pub account: String,
    pub region: String,
    pub vpc_cidr: String,
    pub private_a_ip: String,
    pub private_a_description: String,
    pub private_b_ip: String,
    pub private_b_description: String,
    pub transit_a_ip: String,
    pub transit_a_description: String,
    pub transit_b_ip: String,
    pub transit_b_description: String,
    pub transit_gateway_id: String,
    pub transit_gateway_inspection_attachment: String,
    pub transit_gateway_main_route_table: String,
    pub transit_gateway_inspection_route_table: String,
    pub dhcp_options_id: String,
}

impl SpokeContext {
    pub fn new(
        region: &str,
        settings: &RegionSettings,
        nameservers: Vec<String>,
        spoke: &ProvisionedTopology,
    ) -> Result<Self> {
        let private_a = spoke.subnet(SubnetRole::PrivateA)?;
        let private_b = spoke.subnet(SubnetRole::PrivateB)?;
        let transit_a = spoke.subnet(SubnetRole::TransitA)?;
        let transit_b = spoke.subnet(SubnetRole::TransitB)?;

        Ok(Self {
            nameservers,
            account: spoke.topology.label().to_string(),
            region: region.to_string(),
            vpc_cidr: spoke.subnet(SubnetRole::Vpc)?.subnet.clone(),
            private_a_ip: private_a.subnet.clone(),
            private_a_description: private_a.description.clone(),
            private_b_ip: private_b.subnet.clone(),
            private_b_description: private_b.description.clone(),
            transit_a_ip: transit_a.subnet.clone(),
            transit_a_description: transit_a.description.clone(),
            transit_b_ip: transit_b.subnet.clone(),
            transit_b_description: transit_b.description.clone(),
            transit_gateway_id: settings.transit_gateway_id.clone(),
            transit_gateway_inspection_attachment: settings.inspection_attachment_id.clone(),
            transit_gateway_main_route_table: settings.main_route_table_id.clone(),
            transit_gateway_inspection_route_table: settings.inspection_route_table_id.clone(),
            dhcp_options_id: settings.dhcp_options_id.clone(),
        })
    }
}

/// Context for the landing zone CloudFormation template.
/// Suffix 1 is AZ A, suffix 2 is AZ B.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LandingZoneContext {
    pub nameservers: Vec<String>,
    pub region: String,
    pub regional_cidr: String,

    pub ss_vpc_cidr: String,
    pub ss_private_subnet1: String,
    pub ss_private_subnet1_description: String,
    pub ss_private_subnet2: String,
    pub ss_private_subnet2_description: String,
    pub ss_transit_subnet1: String,
    pub ss_transit_subnet1_description: String,
    pub ss_transit_subnet2: String,
    pub ss_transit_subnet2_description: String,
    pub ss_public_subnet1: String,
    pub ss_public_subnet1_description: String,
    pub ss_public_subnet2: String,
    pub ss_public_subnet2_description: String,
    pub cvpn: bool,
    pub ss_cvpn_subnet: String,
    pub ss_cvpn_subnet_description: String,

    pub ve_vpc_cidr: String,
    pub ve_private_subnet1: String,
    pub ve_private_subnet1_description: String,
    pub ve_private_subnet2: String,
    pub ve_private_subnet2_description: String,
    pub ve_public_subnet1: String,
    pub ve_public_subnet1_description: String,
    pub ve_public_subnet2: String,
    pub ve_public_subnet2_description: String,
    pub ve_transit_subnet1: String,
    pub ve_transit_subnet1_description: String,
    pub ve_transit_subnet2: String,
    pub ve_transit_subnet2_description: String,

    #[serde(rename = "TgId")]
    pub tg_id: String,
    #[serde(rename = "TgMainRouteTable")]
    pub tg_main_route_table: String,
}

/// `(cidr, description)` of a role
fn pair(topology: &ProvisionedTopology, role: SubnetRole) -> Result<(String, String)> {
    let record = topology.subnet(role)?;
    Ok((record.subnet.clone(), record.description.clone()))
}

impl LandingZoneContext {
    pub fn new(
        region: &str,
        settings: &RegionSettings,
        nameservers: Vec<String>,
        regional_cidr: String,
        shared: &ProvisionedTopology,
        vedge: &ProvisionedTopology,
    ) -> Result<Self> {
        let cvpn = matches!(shared.topology, Topology::SharedServices { cvpn: true });
        let (ss_cvpn_subnet, ss_cvpn_subnet_description) = if cvpn {
            pair(shared, SubnetRole::Cvpn)?
        } else {
            Default::default()
        };

        let (ss_private_subnet1, ss_private_subnet1_description) = pair(shared, SubnetRole::PrivateA)?;
        let (ss_private_subnet2, ss_private_subnet2_description) = pair(shared, SubnetRole::PrivateB)?;
        let (ss_transit_subnet1, ss_transit_subnet1_description) = pair(shared, SubnetRole::TransitA)?;
        let (ss_transit_subnet2, ss_transit_subnet2_description) = pair(shared, SubnetRole::TransitB)?;
        let (ss_public_subnet1, ss_public_subnet1_description) = pair(shared, SubnetRole::PublicA)?;
        let (ss_public_subnet2, ss_public_subnet2_description) = pair(shared, SubnetRole::PublicB)?;

        let (ve_private_subnet1, ve_private_subnet1_description) = pair(vedge, SubnetRole::PrivateA)?;
        let (ve_private_subnet2, ve_private_subnet2_description) = pair(vedge, SubnetRole::PrivateB)?;
        let (ve_public_subnet1, ve_public_subnet1_description) = pair(vedge, SubnetRole::PublicA)?;
        let (ve_public_subnet2, ve_public_subnet2_description) = pair(vedge, SubnetRole::PublicB)?;
        let (ve_transit_subnet1, ve_transit_subnet1_description) = pair(vedge, SubnetRole::TransitA)?;
        let (ve_transit_subnet2, ve_transit_subnet2_description) = pair(vedge, SubnetRole::TransitB)?;

        Ok(Self {
            nameservers,
            region: region.to_string(),
            regional_cidr,
            ss_vpc_cidr: shared.subnet(SubnetRole::Vpc)?.subnet.clone(),
            ss_private_subnet1,
            ss_private_subnet1_description,
            ss_private_subnet2,
            ss_private_subnet2_description,
            ss_transit_subnet1,
            ss_transit_subnet1_description,
            ss_transit_subnet2,
            ss_transit_subnet2_description,
            ss_public_subnet1,
            ss_public_subnet1_description,
            ss_public_subnet2,
            ss_public_subnet2_description,
            cvpn,
            ss_cvpn_subnet,
            ss_cvpn_subnet_description,
            ve_vpc_cidr: vedge.subnet(SubnetRole::Vpc)?.subnet.clone(),
            ve_private_subnet1,
            ve_private_subnet1_description,
            ve_private_subnet2,
            ve_private_subnet2_description,
            ve_public_subnet1,
            ve_public_subnet1_description,
            ve_public_subnet2,
            ve_public_subnet2_description,
            ve_transit_subnet1,
            ve_transit_subnet1_description,
            ve_transit_subnet2,
            ve_transit_subnet2_description,
            tg_id: settings.transit_gateway_id.clone(),
            tg_main_route_table: settings.main_route_table_id.clone(),
        })
    }
}
