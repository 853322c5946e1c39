//! UPS Turkey tracking page scraper.
//!
//! The page exposes no API. Delivery is signalled only by a confirmation
//! sentence in the body, and the estimate sits in a labelled span pair.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::Client;
use tracing::debug;

use crate::config::{UpsConfig, TRACKING_NUMBER_PLACEHOLDER};
use crate::shipment::{Carrier, StatusSnapshot};

use super::{CarrierClient, CarrierError};

/// Sentence the page shows once a parcel has been handed over.
pub const UPS_DELIVERED_PHRASE: &str = "Paketiniz teslim edilmiştir";

static ESTIMATE_LANDMARK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?s)<span[^>]*id="ctl00_MainContent_Label2"[^>]*>Öngörülen Teslimat Zamanı</span><br\s*/?>\s*<span[^>]*id="ctl00_MainContent_teslimat_zamani"[^>]*>(.*?)</span>"#,
    )
    .expect("estimate landmark pattern is valid")
});

static MARKUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<.*?>").expect("markup pattern is valid"));

/// UPS carrier client.
pub struct UpsCarrier {
    client: Client,
    config: UpsConfig,
}

impl UpsCarrier {
    /// Create a new UpsCarrier with the given configuration.
    pub fn new(config: UpsConfig) -> Result<Self, CarrierError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| CarrierError::Request(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Build the tracking page URL for a shipment.
    fn build_url(&self, tracking_number: &str) -> String {
        self.config.url_template.replace(
            TRACKING_NUMBER_PLACEHOLDER,
            &urlencoding::encode(tracking_number),
        )
    }

    /// Read a status snapshot out of a tracking page body.
    pub fn parse_page(body: &str) -> StatusSnapshot {
        StatusSnapshot {
            delivered: contains_ignore_case(body, UPS_DELIVERED_PHRASE),
            estimated_delivery: extract_estimated_delivery(body),
        }
    }
}

#[async_trait]
impl CarrierClient for UpsCarrier {
    fn carrier(&self) -> Carrier {
        Carrier::Ups
    }

    async fn fetch(&self, tracking_number: &str) -> Result<StatusSnapshot, CarrierError> {
        let url = self.build_url(tracking_number);
        debug!(tracking_number = tracking_number, "Fetching UPS tracking page");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(CarrierError::HttpStatus {
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        let snapshot = Self::parse_page(&body);

        debug!(
            tracking_number = tracking_number,
            delivered = snapshot.delivered,
            estimate = snapshot.estimated_delivery.as_deref().unwrap_or("-"),
            "UPS tracking page parsed"
        );

        Ok(snapshot)
    }
}

/// Extract the estimated delivery text from the labelled span pair.
///
/// Returns `None` when the landmark is missing or its value is blank.
pub fn extract_estimated_delivery(body: &str) -> Option<String> {
    let captured = ESTIMATE_LANDMARK.captures(body)?.get(1)?.as_str();
    let text = strip_tags(captured);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Remove markup and collapse whitespace.
pub fn strip_tags(html: &str) -> String {
    MARKUP
        .replace_all(html, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELIVERED_PAGE: &str = r#"
<html><body>
<div class="result">
  <span id="ctl00_MainContent_Label2" class="lbl">Öngörülen Teslimat Zamanı</span><br />
  <span id="ctl00_MainContent_teslimat_zamani" class="val"><b>14.05.2025</b> Çarşamba</span>
</div>
<p>PAKETINIZ TESLIM EDILMIŞTIR.</p>
<p>Paketiniz teslim edilmiştir.</p>
</body></html>
"#;

    const IN_TRANSIT_PAGE: &str = r#"
<html><body>
<span id="ctl00_MainContent_Label2">Öngörülen Teslimat Zamanı</span><br>
<span id="ctl00_MainContent_teslimat_zamani">
    16.05.2025
</span>
<p>Paketiniz yolda.</p>
</body></html>
"#;

    fn carrier() -> UpsCarrier {
        UpsCarrier::new(UpsConfig::default()).unwrap()
    }

    #[test]
    fn test_build_url() {
        let url = carrier().build_url("1Z0625ABCDEF123456");
        assert_eq!(
            url,
            "https://www.ups.com.tr/WaybillSorgu.aspx?Waybill=1Z0625ABCDEF123456"
        );
    }

    #[test]
    fn test_build_url_encodes_tracking_number() {
        let url = carrier().build_url("1Z 06&25");
        assert!(url.ends_with("Waybill=1Z%2006%2625"));
    }

    #[test]
    fn test_parse_delivered_page() {
        let snapshot = UpsCarrier::parse_page(DELIVERED_PAGE);
        assert!(snapshot.delivered);
        assert_eq!(
            snapshot.estimated_delivery.as_deref(),
            Some("14.05.2025 Çarşamba")
        );
    }

    #[test]
    fn test_parse_in_transit_page() {
        let snapshot = UpsCarrier::parse_page(IN_TRANSIT_PAGE);
        assert!(!snapshot.delivered);
        assert_eq!(snapshot.estimated_delivery.as_deref(), Some("16.05.2025"));
    }

    #[test]
    fn test_delivered_phrase_case_insensitive() {
        let snapshot = UpsCarrier::parse_page("<p>paketiniz TESLIM edilmiştir</p>");
        assert!(snapshot.delivered);
    }

    #[test]
    fn test_missing_landmark_leaves_estimate_unknown() {
        let snapshot = UpsCarrier::parse_page("<html><body>Paketiniz teslim edilmiştir</body></html>");
        assert!(snapshot.delivered);
        assert!(snapshot.estimated_delivery.is_none());
    }

    #[test]
    fn test_blank_estimate_is_none() {
        let body = r#"<span id="ctl00_MainContent_Label2">Öngörülen Teslimat Zamanı</span><br/><span id="ctl00_MainContent_teslimat_zamani"> <i></i> </span>"#;
        assert!(extract_estimated_delivery(body).is_none());
    }

    #[test]
    fn test_parse_fixture_pages() {
        use crate::testing::fixtures::ups_page;

        let snapshot = UpsCarrier::parse_page(&ups_page(Some("<b>20.03.2026</b>"), false));
        assert!(!snapshot.delivered);
        assert_eq!(snapshot.estimated_delivery.as_deref(), Some("20.03.2026"));

        let snapshot = UpsCarrier::parse_page(&ups_page(None, true));
        assert!(snapshot.delivered);
        assert!(snapshot.estimated_delivery.is_none());
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<b>14.05</b>\n  <i>Çarşamba</i>"), "14.05 Çarşamba");
        assert_eq!(strip_tags("plain"), "plain");
    }
}
