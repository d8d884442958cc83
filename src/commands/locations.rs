//! Location CSV export, import and update

use super::Session;
use crate::locations::{self, RowOutcome};
use crate::output::Envelope;
use crate::Result;
use std::path::Path;

pub const DEFAULT_EXPORT_FILE: &str = "data_file.csv";

pub async fn export(session: &Session, output: &Path) -> Result<Envelope> {
    let summary = locations::export(&session.client, output).await?;
    Ok(Envelope::ok(&summary))
}

pub async fn import(session: &Session, input: &Path) -> Result<Envelope> {
    let rows = locations::read_csv_file(input)?;
    let outcomes = locations::import(&session.client, &rows).await?;
    Ok(batch(&outcomes))
}

pub async fn update(session: &Session, input: &Path) -> Result<Envelope> {
    let rows = locations::read_csv_file(input)?;
    let outcomes = locations::update(&session.client, &rows).await?;
    Ok(batch(&outcomes))
}

/// Per-row outcomes; `success` only when every row went through.
fn batch(outcomes: &[RowOutcome]) -> Envelope {
    let mut envelope = Envelope::ok(&outcomes);
    envelope.success = outcomes.iter().all(|o| o.success);
    envelope
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockIpam;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    #[tokio::test]
    async fn test_import_reports_each_row() {
        let ipam = MockIpam::start().await;
        Mock::given(method("POST"))
            .and(path("/api/netops/tools/locations/"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "code": 201, "success": true, "message": "Location created"
            })))
            .expect(2)
            .mount(&ipam.server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("in.csv");
        std::fs::write(&file, "\u{feff}name,address\nHQ,1 Main St\nDC,null\n").unwrap();

        let envelope = import(&Session::new(&ipam.config()), &file).await.unwrap();

        assert!(envelope.success);
        assert_eq!(envelope.data[1]["name"], "DC");
        assert_eq!(envelope.data[1]["message"], "Location created");
    }

    #[tokio::test]
    async fn test_update_skips_rows_without_id() {
        let ipam = MockIpam::start().await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 200, "success": true
            })))
            .mount(&ipam.server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("in.csv");
        std::fs::write(&file, "id,name\n5,HQ\n,DC\n").unwrap();

        let envelope = update(&Session::new(&ipam.config()), &file).await.unwrap();

        assert_eq!(envelope.code, 200);
        assert!(!envelope.success);
        assert_eq!(envelope.data[0]["success"], true);
        assert_eq!(envelope.data[1]["success"], false);
    }

    #[tokio::test]
    async fn test_export_reports_file_and_count() {
        let ipam = MockIpam::start().await;
        Mock::given(method("GET"))
            .and(path("/api/netops/tools/locations/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 200, "success": true, "data": [{"id": "1", "name": "HQ"}]
            })))
            .mount(&ipam.server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(DEFAULT_EXPORT_FILE);
        let envelope = export(&Session::new(&ipam.config()), &file).await.unwrap();

        assert_eq!(envelope.data["records"], 1);
        assert_eq!(envelope.data["file"], file.display().to_string());
    }

    #[tokio::test]
    async fn test_missing_input_file_is_fatal() {
        let ipam = MockIpam::start().await;
        let err = import(&Session::new(&ipam.config()), Path::new("/nonexistent.csv"))
            .await
            .unwrap_err();
        assert!(err.is_fatal());
    }
}
