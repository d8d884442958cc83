//! Landing zone: shared services and vEdge VPCs in one region

use super::{post_allocation_failure, provisioning_failure, read_template, Session};
use crate::output::Envelope;
use crate::provisioner::{nameservers, subnet_cidr};
use crate::region::RegionSettings;
use crate::template::{LandingZoneContext, TemplateRenderer};
use crate::topology::{ProvisionedTopology, Topology, TopologyBuilder};
use crate::Result;
use std::path::Path;
use tracing::info;

pub async fn run(
    session: &Session,
    region: &str,
    template: Option<&Path>,
    cvpn: bool,
) -> Result<Envelope> {
    let settings = session.region(region)?;
    let template = read_template(template)?;
    let builder = TopologyBuilder::new(&session.client, settings);

    let shared = match builder.build(Topology::SharedServices { cvpn }).await {
        Ok(t) => t,
        Err(e) => return Ok(provisioning_failure(&e)),
    };
    let vedge = match builder.build(Topology::VEdge).await {
        Ok(t) => t,
        Err(e) => return Ok(provisioning_failure(&e).with_allocated(&[shared.records()])),
    };
    info!(region, cvpn, "Landing zone allocated");

    let records = (shared.records(), vedge.records());
    let Some(template) = template else {
        return Ok(Envelope::ok(&records));
    };

    match render(session, region, settings, &template, &shared, &vedge).await {
        Ok(yaml) => Ok(Envelope::ok(&records).with_yaml(yaml)),
        Err(e) => Ok(post_allocation_failure(&e, &records)),
    }
}

async fn render(
    session: &Session,
    region: &str,
    settings: &RegionSettings,
    template: &str,
    shared: &ProvisionedTopology,
    vedge: &ProvisionedTopology,
) -> Result<String> {
    let ns = nameservers(&session.client, settings.dns_server_id).await?;
    let regional_cidr = subnet_cidr(&session.client, settings.supernet_id).await?;
    let context = LandingZoneContext::new(region, settings, ns, regional_cidr, shared, vedge)?;
    TemplateRenderer::new().render(template, &context)
}
