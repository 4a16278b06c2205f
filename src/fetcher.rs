//! HTTP fetcher for remote address lists.
//!
//! Two sources are supported:
//! - the AbuseIPDB blacklist (plain text, one entry per line, keyed request)
//! - the Microsoft 365 worldwide endpoints document (JSON)
//!
//! Responses are filtered through [`is_usable`] before being handed on, so
//! callers only ever see public, well-formed tokens.

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{AdbConfig, HttpConfig, O365Config, SecureString};
use crate::listfile::parse_lines;
use crate::utils::format_count;
use crate::validation::is_usable;

/// Usable tokens from a plain-text list download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub ips: Vec<String>,
    /// Lines dropped by validation
    pub rejected: usize,
}

/// Address ranges of one Microsoft 365 service area
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceArea {
    pub name: String,
    pub ips: Vec<String>,
}

/// HTTP client for fetching lists
pub struct Fetcher {
    client: Client,
    max_body_bytes: usize,
}

impl Fetcher {
    /// Create a new fetcher with the configured timeout
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(format!("iplists/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// Download the AbuseIPDB blacklist
    pub async fn fetch_adb_blacklist(
        &self,
        config: &AdbConfig,
        key: &SecureString,
    ) -> Result<FetchResult> {
        info!("Fetching AbuseIPDB blacklist...");

        let request = self
            .client
            .get(&config.url)
            .header("Key", key.as_str())
            .header("Accept", "text/plain");
        let content = self
            .fetch_text(request, &config.url)
            .await
            .context("Failed to fetch AbuseIPDB blacklist")?;

        let result = parse_plain_list(&content);
        if result.ips.is_empty() {
            anyhow::bail!("No valid IPs found in the AbuseIPDB response");
        }

        info!(
            "Fetched AbuseIPDB blacklist - {} IPs ({} rejected)",
            format_count(result.ips.len()),
            result.rejected
        );
        Ok(result)
    }

    /// Download Microsoft 365 endpoint ranges grouped by service area
    pub async fn fetch_o365(&self, config: &O365Config) -> Result<Vec<ServiceArea>> {
        info!("Fetching Microsoft 365 endpoints...");

        let request = self.client.get(&config.url);
        let content = self
            .fetch_text(request, &config.url)
            .await
            .context("Failed to fetch Microsoft 365 endpoints")?;

        let areas = parse_o365_endpoints(&content)?;
        debug!("Parsed {} Microsoft 365 service areas", areas.len());
        Ok(areas)
    }

    /// Send a request and return the body, enforcing status and size limits
    async fn fetch_text(&self, request: RequestBuilder, url: &str) -> Result<String> {
        let response = request.send().await?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to fetch URL: {}, status code: {}", url, response.status());
        }

        if let Some(content_length) = response.content_length() {
            if content_length as usize > self.max_body_bytes {
                anyhow::bail!(
                    "Response too large: {} bytes (max: {} bytes)",
                    content_length,
                    self.max_body_bytes
                );
            }
        }

        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if body.len() > self.max_body_bytes {
            anyhow::bail!(
                "Downloaded content too large: {} bytes (max: {} bytes)",
                body.len(),
                self.max_body_bytes
            );
        }

        Ok(body)
    }
}

/// Parse a plain-text list, keeping usable tokens in order
pub fn parse_plain_list(content: &str) -> FetchResult {
    let (ips, rejected): (Vec<String>, Vec<String>) =
        parse_lines(content).into_iter().partition(|line| is_usable(line));
    FetchResult {
        ips,
        rejected: rejected.len(),
    }
}

/// Parse the Microsoft 365 endpoints document.
///
/// Areas appear in first-seen order; each area's IPs are deduplicated and
/// filtered to usable tokens.
pub fn parse_o365_endpoints(content: &str) -> Result<Vec<ServiceArea>> {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Endpoint {
        service_area_display_name: String,
        #[serde(default)]
        ips: Vec<String>,
    }

    let endpoints: Vec<Endpoint> =
        serde_json::from_str(content).context("Failed to parse Microsoft 365 endpoints")?;

    let mut areas: Vec<ServiceArea> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut seen: HashSet<(usize, String)> = HashSet::new();

    for endpoint in endpoints {
        if endpoint.ips.is_empty() {
            continue;
        }

        let position = *positions
            .entry(endpoint.service_area_display_name.clone())
            .or_insert_with(|| {
                areas.push(ServiceArea {
                    name: endpoint.service_area_display_name.clone(),
                    ips: Vec::new(),
                });
                areas.len() - 1
            });

        for ip in endpoint.ips {
            if is_usable(&ip) && seen.insert((position, ip.clone())) {
                areas[position].ips.push(ip);
            }
        }
    }

    Ok(areas)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_list_filters() {
        let content = "# header\n8.8.8.8\n10.0.0.1\n\n1.1.1.0/24\nnot-an-ip\n127.0.0.1\n";
        let result = parse_plain_list(content);
        assert_eq!(result.ips, vec!["8.8.8.8", "1.1.1.0/24"]);
        assert_eq!(result.rejected, 3);
    }

    #[test]
    fn test_parse_plain_list_whitespace() {
        let content = "  8.8.8.8  \r\n\t9.9.9.9\t\n";
        let result = parse_plain_list(content);
        assert_eq!(result.ips, vec!["8.8.8.8", "9.9.9.9"]);
        assert_eq!(result.rejected, 0);
    }

    #[test]
    fn test_parse_plain_list_empty() {
        let result = parse_plain_list("");
        assert!(result.ips.is_empty());
        assert_eq!(result.rejected, 0);
    }

    #[test]
    fn test_parse_o365_groups_and_dedups() {
        let json = r#"[
            {"id": 1, "serviceAreaDisplayName": "Exchange Online", "ips": ["13.107.6.152/31", "10.0.0.0/8"]},
            {"id": 2, "serviceAreaDisplayName": "Microsoft Teams", "ips": ["52.112.0.0/14", "2603:1063::/38"]},
            {"id": 3, "serviceAreaDisplayName": "Microsoft Teams", "urls": ["*.teams.microsoft.com"]},
            {"id": 4, "serviceAreaDisplayName": "Microsoft Teams", "ips": ["52.112.0.0/14", "52.122.0.0/15"]}
        ]"#;

        let areas = parse_o365_endpoints(json).unwrap();
        assert_eq!(areas.len(), 2);
        assert_eq!(areas[0].name, "Exchange Online");
        assert_eq!(areas[0].ips, vec!["13.107.6.152/31"]);
        assert_eq!(areas[1].name, "Microsoft Teams");
        assert_eq!(
            areas[1].ips,
            vec!["52.112.0.0/14", "2603:1063::/38", "52.122.0.0/15"]
        );
    }

    #[test]
    fn test_parse_o365_invalid_json() {
        assert!(parse_o365_endpoints("{not json").is_err());
    }

    #[test]
    fn test_fetcher_builds_with_defaults() {
        assert!(Fetcher::new(&HttpConfig::default()).is_ok());
    }
}
