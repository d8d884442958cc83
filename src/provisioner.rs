//! Subnet provisioning calls
//!
//! phpIPAM does all address arithmetic: it finds free space in the parent,
//! carves the block and picks the next unused address. These calls only
//! record the IDs it hands back.

use crate::client::ApiClient;
use crate::models::{
    AddressRecord, AddressReservation, NameserverSet, SubnetDetails, SubnetRecord, SubnetRequest,
};
use crate::{IpamError, Result};
use tracing::info;

const OK: u16 = 200;
const CREATED: u16 = 201;

/// Allocate a subnet from `req.parent_id`.
pub async fn request_subnet(client: &ApiClient, req: &SubnetRequest) -> Result<SubnetRecord> {
    let resp = client
        .post_json(&req.path(), req.body())
        .await?
        .expect_code(CREATED)?;

    let id = resp
        .id
        .ok_or_else(|| IpamError::MalformedResponse("created subnet without id".into()))?;
    let subnet: String = resp.data_as()?;

    info!(id, %subnet, "Created subnet {}", req.description);
    Ok(SubnetRecord {
        id,
        subnet,
        description: req.description.clone(),
    })
}

/// Reserve the first free address of a subnet.
pub async fn reserve_first_address(
    client: &ApiClient,
    reservation: &AddressReservation,
) -> Result<AddressRecord> {
    let resp = client
        .post_json(AddressReservation::PATH, reservation.body())
        .await?
        .expect_code(CREATED)?;

    let address: String = resp.data_as()?;
    info!(subnet_id = reservation.subnet_id, %address, "Marked as {}", reservation.description);

    Ok(AddressRecord {
        id: resp.id,
        address,
        description: reservation.description.clone(),
    })
}

/// Nameserver addresses of a phpIPAM nameserver set.
pub async fn nameservers(client: &ApiClient, nameserver_id: u64) -> Result<Vec<String>> {
    let resp = client
        .get(&format!("tools/nameservers/{nameserver_id}/"))
        .await?
        .expect_code(OK)?;
    let set: NameserverSet = resp.data_as()?;
    Ok(set.servers())
}

/// CIDR of an existing subnet.
pub async fn subnet_cidr(client: &ApiClient, subnet_id: u64) -> Result<String> {
    let resp = client
        .get(&format!("subnets/{subnet_id}/"))
        .await?
        .expect_code(OK)?;
    let details: SubnetDetails = resp.data_as()?;
    Ok(details.cidr())
}
