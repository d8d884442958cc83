//! Location records as CSV
//!
//! Export writes the server's location list as a UTF-8 CSV with byte-order
//! mark. Import and update replay CSV rows against `tools/locations/`, one
//! request per row, in file order. A rejected row does not stop the batch.

use crate::client::ApiClient;
use crate::{IpamError, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

pub const LOCATIONS_PATH: &str = "tools/locations/";
const BOM: &str = "\u{feff}";

/// Header-ordered `(field, value)` pairs of one CSV row
pub type LocationRow = Vec<(String, String)>;

#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub file: String,
    pub records: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowOutcome {
    pub name: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RowOutcome {
    fn skipped(name: String, message: &str) -> Self {
        Self {
            name,
            success: false,
            message: Some(message.to_string()),
        }
    }
}

/// Fetch every location record, keys in server order.
pub async fn fetch(client: &ApiClient) -> Result<Vec<Map<String, Value>>> {
    let resp = client.get(LOCATIONS_PATH).await?;
    // phpIPAM answers 404 when there are no locations
    if resp.code == 404 {
        return Ok(Vec::new());
    }
    let resp = resp.expect_code(200)?;
    if resp.data.is_null() {
        return Ok(Vec::new());
    }
    resp.data_as()
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Write `records` as CSV. The header comes from the first record; later
/// records are laid out by that header.
pub fn write_csv<W: Write>(mut writer: W, records: &[Map<String, Value>]) -> Result<usize> {
    writer.write_all(BOM.as_bytes())?;
    let Some(first) = records.first() else {
        return Ok(0);
    };

    let header: Vec<&String> = first.keys().collect();
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&header)?;

    for (i, record) in records.iter().enumerate() {
        let extra: Vec<&String> = record.keys().filter(|k| !first.contains_key(*k)).collect();
        if !extra.is_empty() {
            warn!(row = i, ?extra, "Location has fields missing from the header");
        }
        let row: Vec<String> = header
            .iter()
            .map(|key| record.get(*key).map(cell).unwrap_or_default())
            .collect();
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(records.len())
}

pub async fn export(client: &ApiClient, path: &Path) -> Result<ExportSummary> {
    let records = fetch(client).await?;
    let file = fs::File::create(path)?;
    let count = write_csv(file, &records)?;
    info!("Exported {} locations to {}", count, path.display());

    Ok(ExportSummary {
        file: path.display().to_string(),
        records: count,
    })
}

/// Parse CSV text with a header row. A leading BOM is ignored and every row
/// carries every header field.
pub fn read_csv(content: &str) -> Result<Vec<LocationRow>> {
    let content = content.strip_prefix(BOM).unwrap_or(content);
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = rdr.headers()?.clone();
    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        if record.len() > headers.len() {
            warn!(row = i, fields = record.len(), "Ignoring fields beyond the header");
        }
        // Short rows send the missing fields empty.
        rows.push(
            headers
                .iter()
                .enumerate()
                .map(|(col, k)| (k.to_string(), record.get(col).unwrap_or_default().to_string()))
                .collect(),
        );
    }
    Ok(rows)
}

pub fn read_csv_file(path: &Path) -> Result<Vec<LocationRow>> {
    read_csv(&fs::read_to_string(path)?)
}

/// `key=value&...` with values percent-encoded and literal `null` sent empty.
pub fn form_body(row: &LocationRow) -> String {
    row.iter()
        .map(|(key, value)| {
            let value = if value == "null" {
                String::new()
            } else {
                urlencoding::encode(value).into_owned()
            };
            format!("{}={}", urlencoding::encode(key), value)
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn field<'a>(row: &'a LocationRow, name: &str) -> Option<&'a str> {
    row.iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

async fn replay(client: &ApiClient, row: &LocationRow, patch: bool) -> Result<RowOutcome> {
    let name = field(row, "name").unwrap_or_default().to_string();
    let body = form_body(row);

    let result = if patch {
        client.patch_form(LOCATIONS_PATH, body).await
    } else {
        client.post_form(LOCATIONS_PATH, body).await
    };

    match result {
        Ok(resp) => {
            let success = resp.succeeded();
            if !success {
                warn!("Location {} rejected: {:?}", name, resp.message);
            }
            Ok(RowOutcome {
                name,
                success,
                message: resp.message,
            })
        }
        Err(e @ IpamError::Http(_)) => Err(e),
        Err(e) => {
            warn!("Location {} failed: {}", name, e);
            Ok(RowOutcome::skipped(name, &e.to_string()))
        }
    }
}

/// POST each row as a new location.
pub async fn import(client: &ApiClient, rows: &[LocationRow]) -> Result<Vec<RowOutcome>> {
    let mut outcomes = Vec::with_capacity(rows.len());
    for row in rows {
        outcomes.push(replay(client, row, false).await?);
    }
    Ok(outcomes)
}

/// PATCH each row onto the location with the same `id`.
pub async fn update(client: &ApiClient, rows: &[LocationRow]) -> Result<Vec<RowOutcome>> {
    let mut outcomes = Vec::with_capacity(rows.len());
    for row in rows {
        let name = field(row, "name").unwrap_or_default().to_string();
        match field(row, "id") {
            Some(id) if !id.trim().is_empty() && id != "null" => {
                outcomes.push(replay(client, row, true).await?);
            }
            _ => outcomes.push(RowOutcome::skipped(name, "Row has no id")),
        }
    }
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::with_base_url(&format!("{}/api/netops", server.uri()), "t")
    }

    fn row(pairs: &[(&str, &str)]) -> LocationRow {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    async fn bodies(server: &MockServer, verb: &str) -> Vec<String> {
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r: &&Request| r.method.as_str() == verb)
            .map(|r| String::from_utf8(r.body.clone()).unwrap())
            .collect()
    }

    #[test]
    fn test_form_body_encoding() {
        let body = form_body(&row(&[
            ("name", "HQ London"),
            ("address", "1 Main St, London"),
            ("lat", "null"),
            ("long", ""),
        ]));
        assert_eq!(body, "name=HQ%20London&address=1%20Main%20St%2C%20London&lat=&long=");
    }

    #[test]
    fn test_write_csv_uses_first_header() {
        let records: Vec<Map<String, Value>> = vec![
            json!({"id": 1, "name": "HQ", "lat": null}).as_object().unwrap().clone(),
            json!({"id": "2", "name": "DC, West", "extra": "x"}).as_object().unwrap().clone(),
        ];
        let mut out = Vec::new();
        let count = write_csv(&mut out, &records).unwrap();

        assert_eq!(count, 2);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "\u{feff}id,name,lat\n1,HQ,\n2,\"DC, West\",\n");
    }

    #[test]
    fn test_read_csv_strips_bom() {
        let rows = read_csv("\u{feff}id,name\n7,Paris\n8,Oslo\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], row(&[("id", "7"), ("name", "Paris")]));
    }

    #[test]
    fn test_short_row_keeps_every_field() {
        let rows = read_csv("id,name,address,lat\n7,Paris\n").unwrap();
        assert_eq!(
            rows[0],
            row(&[("id", "7"), ("name", "Paris"), ("address", ""), ("lat", "")])
        );
        assert_eq!(form_body(&rows[0]), "id=7&name=Paris&address=&lat=");
    }

    #[tokio::test]
    async fn test_export_import_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/netops/tools/locations/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 200,
                "success": true,
                "data": [
                    {"id": "1", "name": "HQ London", "description": "null", "lat": null},
                    {"id": "2", "name": "Frankfurt DC", "description": "Cage 4", "lat": "50.11"}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/netops/tools/locations/"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "code": 201, "success": true, "message": "Location created"
            })))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("locations.csv");

        let summary = export(&client, &file).await.unwrap();
        assert_eq!(summary.records, 2);

        let rows = read_csv_file(&file).unwrap();
        let outcomes = import(&client, &rows).await.unwrap();
        assert!(outcomes.iter().all(|o| o.success));
        assert_eq!(outcomes[0].name, "HQ London");

        assert_eq!(
            bodies(&server, "POST").await,
            vec![
                "id=1&name=HQ%20London&description=&lat=".to_string(),
                "id=2&name=Frankfurt%20DC&description=Cage%204&lat=50.11".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_import_continues_after_rejected_row() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "code": 409, "success": false, "message": "Location already exists"
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "code": 201, "success": true
            })))
            .mount(&server)
            .await;

        let rows = vec![row(&[("name", "HQ")]), row(&[("name", "DC")])];
        let outcomes = import(&client_for(&server), &rows).await.unwrap();

        assert_eq!(
            outcomes,
            vec![
                RowOutcome {
                    name: "HQ".into(),
                    success: false,
                    message: Some("Location already exists".into()),
                },
                RowOutcome {
                    name: "DC".into(),
                    success: true,
                    message: None,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_update_patches_rows_with_id() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/netops/tools/locations/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 200, "success": true, "message": "Location updated"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let rows = vec![
            row(&[("id", "4"), ("name", "Oslo"), ("address", "null")]),
            row(&[("id", ""), ("name", "Nowhere")]),
        ];
        let outcomes = update(&client_for(&server), &rows).await.unwrap();

        assert!(outcomes[0].success);
        assert!(!outcomes[1].success);
        assert_eq!(outcomes[1].message.as_deref(), Some("Row has no id"));
        assert_eq!(bodies(&server, "PATCH").await, vec!["id=4&name=Oslo&address=".to_string()]);
    }

    #[tokio::test]
    async fn test_export_empty_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 404, "success": false, "message": "No locations found"
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("empty.csv");
        let summary = export(&client_for(&server), &file).await.unwrap();

        assert_eq!(summary.records, 0);
        assert_eq!(fs::read_to_string(&file).unwrap(), BOM);
    }
}
