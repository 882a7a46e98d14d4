//! Render-service inspector
//!
//! Production `PageInspector` adapter. Rendering runs on a JavaScript-capable
//! render service (Firecrawl-compatible API): one POST per inspection returns
//! the post-redirect HTML, a full-page screenshot and the final URL. Selector
//! and redirect evaluation then happen locally.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use vigil_core::{PageSignal, SharedTelemetry, WatchConfig};

use crate::{
    create_render_client, probe, ArtifactStore, InspectError, PageInspector, SessionGauge,
};

/// Default render service endpoint
const RENDER_API_URL: &str = "https://api.firecrawl.dev/v1/scrape";

/// Render service configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Scrape endpoint of the render service
    pub endpoint: String,
    /// Bearer token, when the service requires one
    pub api_key: Option<String>,
    /// Request timeout in seconds; must exceed the redirect wait
    pub timeout_secs: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            endpoint: RENDER_API_URL.to_string(),
            api_key: None,
            timeout_secs: 45,
        }
    }
}

// Request/Response types for the render API

#[derive(Serialize)]
struct RenderRequest<'a> {
    url: &'a str,
    formats: Vec<&'static str>,
    #[serde(rename = "waitFor")]
    wait_for: u64,
    #[serde(rename = "screenshotQuality")]
    screenshot_quality: u8,
}

#[derive(Deserialize)]
struct RenderResponse {
    success: bool,
    error: Option<String>,
    data: Option<RenderData>,
}

#[derive(Deserialize)]
struct RenderData {
    html: Option<String>,
    /// Base64 screenshot, optionally with a data-URI prefix
    screenshot: Option<String>,
    metadata: Option<RenderMetadata>,
}

#[derive(Deserialize)]
struct RenderMetadata {
    #[serde(rename = "sourceURL")]
    source_url: Option<String>,
}

/// `PageInspector` backed by a remote render service
pub struct RenderInspector {
    config: RenderConfig,
    watch: WatchConfig,
    redirect_pattern: Option<Regex>,
    artifacts: ArtifactStore,
    telemetry: SharedTelemetry,
    sessions: SessionGauge,
}

impl RenderInspector {
    pub fn new(
        config: RenderConfig,
        watch: WatchConfig,
        artifacts: ArtifactStore,
        telemetry: SharedTelemetry,
    ) -> Result<Self, InspectError> {
        let redirect_pattern = watch
            .redirect_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| InspectError::Pattern(e.to_string()))?;

        Ok(Self {
            config,
            watch,
            redirect_pattern,
            artifacts,
            telemetry,
            sessions: SessionGauge::new(),
        })
    }

    /// Number of inspections currently in flight
    pub fn live_sessions(&self) -> usize {
        self.sessions.live()
    }

    /// Persist the artifacts of a successful inspection.
    ///
    /// Never fails the inspection: the page checks already succeeded, so
    /// write errors go to telemetry and the signal is returned without the
    /// affected artifact.
    fn store_artifacts(&self, html: &str, screenshot: Option<&str>) -> Option<String> {
        let digest = match self.artifacts.save_snapshot(html) {
            Ok(digest) => Some(digest),
            Err(e) => {
                warn!("Failed to store HTML snapshot: {}", e);
                self.telemetry
                    .capture_error("artifacts", &format!("snapshot write failed: {}", e));
                None
            }
        };

        match screenshot {
            Some(encoded) => {
                let encoded = encoded
                    .rsplit_once("base64,")
                    .map(|(_, tail)| tail)
                    .unwrap_or(encoded);
                match BASE64.decode(encoded.trim().as_bytes()) {
                    Ok(bytes) => {
                        if let Err(e) = self.artifacts.save_screenshot(&bytes) {
                            warn!("Failed to store screenshot: {}", e);
                            self.telemetry
                                .capture_error("artifacts", &format!("screenshot write failed: {}", e));
                        }
                    }
                    Err(e) => {
                        warn!("Screenshot payload is not valid base64: {}", e);
                        self.telemetry
                            .capture_error("artifacts", &format!("screenshot decode failed: {}", e));
                    }
                }
            }
            None => debug!("Render response carried no screenshot"),
        }

        digest
    }
}

#[async_trait]
impl PageInspector for RenderInspector {
    async fn inspect(&self, url: &str) -> Result<PageSignal, InspectError> {
        let inspection_id = Uuid::new_v4();
        // Held for the whole inspection; released on every exit path
        let _session = self.sessions.acquire();

        debug!("Inspecting {} ({})", url, inspection_id);

        let client = create_render_client(self.config.timeout_secs)?;
        let request = RenderRequest {
            url,
            formats: vec!["html", "screenshot"],
            wait_for: self.watch.redirect_wait_ms,
            screenshot_quality: self.watch.screenshot_quality,
        };

        let mut builder = client.post(&self.config.endpoint).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| InspectError::Navigation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(InspectError::Navigation(format!(
                "render service returned {}",
                status
            )));
        }

        let body: RenderResponse = response
            .json()
            .await
            .map_err(|e| InspectError::Render(e.to_string()))?;

        if !body.success {
            return Err(InspectError::Render(
                body.error.unwrap_or_else(|| "unspecified failure".to_string()),
            ));
        }

        let data = body
            .data
            .ok_or_else(|| InspectError::Render("response carried no data".to_string()))?;
        let html = data
            .html
            .ok_or_else(|| InspectError::Render("response carried no html".to_string()))?;

        let probes = probe::evaluate_selectors(&html, &self.watch.selectors);

        let final_url = data
            .metadata
            .as_ref()
            .and_then(|m| m.source_url.as_deref())
            .unwrap_or(url);
        let redirected = probe::redirect_matches(url, final_url, self.redirect_pattern.as_ref());
        let redirected_url = redirected.then(|| final_url.to_string());

        debug!(
            "Inspection {} done: {} probes, redirected: {}",
            inspection_id,
            probes.len(),
            redirected
        );

        let snapshot_digest = self.store_artifacts(&html, data.screenshot.as_deref());

        Ok(PageSignal {
            inspection_id,
            probes,
            redirected,
            redirected_url,
            observed_at: Utc::now(),
            snapshot_digest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::log_telemetry;

    #[test]
    fn test_request_wire_format() {
        let request = RenderRequest {
            url: "https://shop.example/queue",
            formats: vec!["html", "screenshot"],
            wait_for: 7_000,
            screenshot_quality: 60,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["url"], "https://shop.example/queue");
        assert_eq!(json["waitFor"], 7_000);
        assert_eq!(json["screenshotQuality"], 60);
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{
            "success": true,
            "data": {
                "html": "<html><body><a class=\"cta\">Go</a></body></html>",
                "screenshot": "AAEC",
                "metadata": { "sourceURL": "https://shop.example/store" }
            }
        }"#;

        let parsed: RenderResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.success);

        let data = parsed.data.unwrap();
        assert!(data.html.unwrap().contains("cta"));
        assert_eq!(
            data.metadata.unwrap().source_url.as_deref(),
            Some("https://shop.example/store")
        );
    }

    #[test]
    fn test_failure_response_parsing() {
        let raw = r#"{ "success": false, "error": "page crashed" }"#;
        let parsed: RenderResponse = serde_json::from_str(raw).unwrap();
        assert!(!parsed.success);
        assert_eq!(parsed.error.as_deref(), Some("page crashed"));
    }

    #[test]
    fn test_invalid_redirect_pattern_is_rejected() {
        let watch = WatchConfig {
            redirect_pattern: Some("(unclosed".to_string()),
            ..Default::default()
        };
        let result = RenderInspector::new(
            RenderConfig::default(),
            watch,
            ArtifactStore::new("files"),
            log_telemetry(),
        );
        assert!(matches!(result, Err(InspectError::Pattern(_))));
    }
}
