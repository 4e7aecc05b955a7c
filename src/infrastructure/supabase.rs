use anyhow::{Context, Result};
use serde_json::{Map, Value};

use crate::config::SupabaseConfig;

/// Thin PostgREST client: fetches the product table as the loosely-typed
/// rows the synchronizer consumes. Field validation happens downstream at
/// the ingestion boundary, not here.
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl SupabaseClient {
    pub fn new(config: &SupabaseConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            table: config.table.clone(),
        }
    }

    pub async fn fetch_products(&self) -> Result<Vec<Map<String, Value>>> {
        let url = format!("{}/rest/v1/{}", self.base_url, self.table);
        log::info!("Fetching products from {}...", url);

        let rows: Vec<Map<String, Value>> = self
            .http
            .get(&url)
            .query(&[("select", "*")])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?
            .error_for_status()
            .context("Supabase returned an error status")?
            .json()
            .await
            .context("Supabase response was not a JSON array of objects")?;

        log::info!("Fetched {} product row(s) from Supabase.", rows.len());
        Ok(rows)
    }
}
