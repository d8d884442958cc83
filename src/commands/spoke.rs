//! Spoke VPC for one workload account

use super::{post_allocation_failure, provisioning_failure, read_template, Session};
use crate::output::Envelope;
use crate::provisioner::nameservers;
use crate::region::RegionSettings;
use crate::template::{SpokeContext, TemplateRenderer};
use crate::topology::{ProvisionedTopology, Topology, TopologyBuilder};
use crate::Result;
use std::path::Path;

pub async fn run(
    session: &Session,
    region: &str,
    account: &str,
    template: Option<&Path>,
    prefix_length: u8,
) -> Result<Envelope> {
    let settings = session.region(region)?;
    let template = read_template(template)?;

    let topology = Topology::Spoke {
        account: account.to_string(),
        prefix_length,
    };
    let spoke = match TopologyBuilder::new(&session.client, settings).build(topology).await {
        Ok(t) => t,
        Err(e) => return Ok(provisioning_failure(&e)),
    };

    let records = spoke.records();
    let Some(template) = template else {
        return Ok(Envelope::ok(&records));
    };

    match render(session, region, settings, &template, &spoke).await {
        Ok(buildspec) => Ok(Envelope::ok(&records).with_buildspec(buildspec)),
        Err(e) => Ok(post_allocation_failure(&e, &records)),
    }
}

async fn render(
    session: &Session,
    region: &str,
    settings: &RegionSettings,
    template: &str,
    spoke: &ProvisionedTopology,
) -> Result<String> {
    let ns = nameservers(&session.client, settings.dns_server_id).await?;
    let context = SpokeContext::new(region, settings, ns, spoke)?;
    TemplateRenderer::new().render(template, &context)
}
