use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

/// Placeholder substituted with the tracking number in carrier URL templates.
pub const TRACKING_NUMBER_PLACEHOLDER: &str = "{tracking_number}";

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub carriers: CarriersConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub portal: Option<PortalConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding the browser UI (index.html and friends).
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

/// Record store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("shipments.json")
}

/// Per-carrier scraping configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CarriersConfig {
    #[serde(default)]
    pub ups: UpsConfig,
}

/// UPS tracking page configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpsConfig {
    /// Tracking page URL, `{tracking_number}` is replaced per request.
    #[serde(default = "default_ups_url_template")]
    pub url_template: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for UpsConfig {
    fn default() -> Self {
        Self {
            url_template: default_ups_url_template(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_ups_url_template() -> String {
    "https://www.ups.com.tr/WaybillSorgu.aspx?Waybill={tracking_number}".to_string()
}

fn default_timeout() -> u32 {
    30
}

/// Background status synchronization configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Run the periodic sync loop.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Delay between the end of one sync and the start of the next.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Pause held after every carrier request before the next may start.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
    /// Give directly added shipments an initial status check.
    #[serde(default = "default_true")]
    pub check_on_add: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_interval_secs(),
            pacing_ms: default_pacing_ms(),
            check_on_add: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_interval_secs() -> u64 {
    600 // 10 minutes
}

fn default_pacing_ms() -> u64 {
    1000
}

/// Helpdesk portal configuration used by ticket discovery
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PortalConfig {
    /// Portal entry URL (login page redirects here after authentication).
    pub url: String,
    /// Only rows whose team label equals this are considered.
    #[serde(default = "default_team_filter")]
    pub team_filter: String,
    /// Subjects must start with this marker to be opened.
    #[serde(default = "default_subject_marker")]
    pub subject_marker: String,
    /// Fixed wait after each login step and navigation.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Upper bound on waiting for a ticket detail header to render.
    #[serde(default = "default_header_timeout_ms")]
    pub header_timeout_ms: u64,
    /// Number of confirmation screens after the password step.
    #[serde(default = "default_confirmation_steps")]
    pub confirmation_steps: u32,
    #[serde(default = "default_true")]
    pub headless: bool,
    #[serde(default)]
    pub chrome_executable: Option<PathBuf>,
    /// Default credentials used when an import request carries none.
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub selectors: PortalSelectors,
}

/// CSS selectors the browser session relies on
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PortalSelectors {
    pub email_input: String,
    pub email_submit: String,
    pub password_input: String,
    pub password_submit: String,
    pub confirm_button: String,
    pub inbox_row: String,
    pub row_team: String,
    pub row_subject: String,
    pub row_ticket_id: String,
    pub row_requester: String,
    pub ticket_header: String,
    pub ticket_content: String,
}

impl Default for PortalSelectors {
    fn default() -> Self {
        Self {
            email_input: "input[type=email]".to_string(),
            email_submit: "input[type=submit]".to_string(),
            password_input: "input[type=password]".to_string(),
            password_submit: "input[type=submit]".to_string(),
            confirm_button: "input[type=submit]".to_string(),
            inbox_row: "table.ticket-list tbody tr".to_string(),
            row_team: "td.team".to_string(),
            row_subject: "td.subject".to_string(),
            row_ticket_id: "td.ticket-id".to_string(),
            row_requester: "td.requester".to_string(),
            ticket_header: ".ticket-header".to_string(),
            ticket_content: "body".to_string(),
        }
    }
}

fn default_team_filter() -> String {
    "ServiceDesk".to_string()
}

fn default_subject_marker() -> String {
    "#".to_string()
}

fn default_settle_delay_ms() -> u64 {
    3000
}

fn default_header_timeout_ms() -> u64 {
    10_000
}

fn default_confirmation_steps() -> u32 {
    1
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub carriers: CarriersConfig,
    pub sync: SyncConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portal: Option<SanitizedPortalConfig>,
}

/// Sanitized portal config (password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedPortalConfig {
    pub url: String,
    pub team_filter: String,
    pub subject_marker: String,
    pub headless: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub password_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            store: config.store.clone(),
            carriers: config.carriers.clone(),
            sync: config.sync.clone(),
            portal: config.portal.as_ref().map(|p| SanitizedPortalConfig {
                url: p.url.clone(),
                team_filter: p.team_filter.clone(),
                subject_marker: p.subject_marker.clone(),
                headless: p.headless,
                email: p.email.clone(),
                password_configured: p.password.as_deref().is_some_and(|pw| !pw.is_empty()),
            }),
        }
    }
}
