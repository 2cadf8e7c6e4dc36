use anyhow::anyhow;
use async_trait::async_trait;
use health_response::{Medicine, NOT_AVAILABLE};
use reqwest::Client;
use serde_json::Value;
use tracing::info;

use super::MedicineSource;

/// Drug label lookup against the openFDA API.
pub struct OpenFdaClient {
    client: Client,
    base_url: String,
}

impl OpenFdaClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl MedicineSource for OpenFdaClient {
    async fn fetch_all_medicines(&self, limit: usize) -> anyhow::Result<Vec<Medicine>> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("limit", limit)])
            .send()
            .await
            .map_err(|e| anyhow!("openFDA request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(anyhow!("openFDA returned {}", response.status()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse openFDA response: {}", e))?;

        let medicines = parse_label_results(&body)?;
        info!(count = medicines.len(), "fetched medicines from openFDA");
        Ok(medicines)
    }
}

/// Map openFDA label records to medicines; each field takes the first entry
/// of its list.
pub fn parse_label_results(body: &Value) -> anyhow::Result<Vec<Medicine>> {
    let results = body["results"]
        .as_array()
        .ok_or_else(|| anyhow!("No results in openFDA response"))?;

    Ok(results
        .iter()
        .map(|label| Medicine {
            brand_name: first_text(&label["openfda"]["brand_name"]),
            generic_name: first_text(&label["openfda"]["generic_name"]),
            manufacturer: first_text(&label["openfda"]["manufacturer_name"]),
            purpose: first_text(&label["purpose"]),
            warnings: first_text(&label["warnings"]),
        })
        .collect())
}

fn first_text(field: &Value) -> String {
    field
        .get(0)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_label_results() {
        let body = json!({
            "results": [
                {
                    "openfda": {
                        "brand_name": ["Advil"],
                        "generic_name": ["IBUPROFEN"],
                        "manufacturer_name": ["Pfizer"]
                    },
                    "purpose": ["Pain reliever/fever reducer"],
                    "warnings": ["Allergy alert"]
                },
                { "purpose": [""] }
            ]
        });

        let medicines = parse_label_results(&body).unwrap();

        assert_eq!(medicines.len(), 2);
        assert_eq!(medicines[0].brand_name, "Advil");
        assert_eq!(medicines[0].warnings, "Allergy alert");
        assert_eq!(medicines[1], Medicine::default());
    }

    #[test]
    fn test_error_body_is_rejected() {
        let body = json!({ "error": { "code": "NOT_FOUND" } });
        assert!(parse_label_results(&body).is_err());
    }
}
