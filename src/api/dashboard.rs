//! Purpose: Fetch the bootstrap payload behind a Tableau Public dashboard.
//! Exports: `DashboardClient`.
//! Role: Session glue in front of the decoder core; returns raw text or a decoded `Workbook`.
//! Invariants: One cookie-carrying agent spans the view request and the bootstrap request.
//! Invariants: The whole body is read before framing; nothing is streamed.
use url::Url;

use super::http;
use crate::config::Config;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::workbook::Workbook;

const SESSION_HEADER: &str = "x-session-id";

// Embed parameters the dashboard page sends when loading the view.
const VIEW_QUERY: [(&str, &str); 4] = [
    (":embed", "y"),
    (":showVizHome", "no"),
    (":host_url", "https://public.tableau.com/"),
    (":embed_code_version", "3"),
];

// Bootstrap form fields captured from a browser session; `sheet_id` is added per request.
const BOOTSTRAP_FORM: [(&str, &str); 20] = [
    ("worksheetPortSize", r#"{"w":737,"h":500}"#),
    ("dashboardPortSize", r#"{"w":737,"h":500}"#),
    ("clientDimension", r#"{"w":737,"h":550}"#),
    ("renderMapsClientSide", "true"),
    ("isBrowserRendering", "true"),
    ("browserRenderingThreshold", "100"),
    ("formatDataValueLocally", "false"),
    ("navType", "Nav"),
    ("navSrc", "Boot"),
    ("devicePixelRatio", "2"),
    ("clientRenderPixelLimit", "25000000"),
    ("allowAutogenWorksheetPhoneLayouts", "false"),
    (
        "showParams",
        r#"{"checkpoint":false,"refresh":false,"refreshUnmodified":false,"unknownParams":":embed_code_version=3&publish=yes"}"#,
    ),
    (
        "stickySessionKey",
        r#"{"dataserverPermissions":"44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a","featureFlags":"{\"MetricsAuthoringBeta\":false}","isAuthoring":false,"isOfflineMode":false,"lastUpdatedAt":1613242758888,"workbookId":7221037}"#,
    ),
    ("filterTileSize", "200"),
    ("locale", "en_US"),
    ("language", "en"),
    ("verboseMode", "false"),
    (":session_feature_flags", "{}"),
    ("keychain_version", "1"),
];

#[derive(Clone)]
pub struct DashboardClient {
    host: Url,
    agent: ureq::Agent,
    max_body_bytes: u64,
}

impl DashboardClient {
    pub fn new(host: Url, timeout_secs: u64, max_body_bytes: u64) -> Self {
        Self {
            host,
            agent: http::build_agent(timeout_secs),
            max_body_bytes,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            config.dashboard_url()?,
            config.timeout_secs,
            config.max_body_bytes,
        ))
    }

    /// Open a session for `view/subview` and return the raw bootstrap stream.
    pub fn fetch_raw(&self, view: &str, subview: &str) -> Result<String> {
        let session = self.open_session(view, subview)?;
        let url = http::build_url(
            &self.host,
            &["vizql", "w", view, "v", subview, "bootstrapSession", "sessions", &session],
        )?;
        let mut form: Vec<(&str, &str)> = BOOTSTRAP_FORM.to_vec();
        form.push(("sheet_id", subview));

        tracing::info!(view, subview, "fetching dashboard bootstrap payload");
        let response = http::send(url.as_str(), self.agent.post(url.as_str()).send_form(&form))?;
        let body = http::read_body(url.as_str(), response, self.max_body_bytes)?;
        tracing::debug!(chars = body.chars().count(), "bootstrap payload received");
        Ok(body)
    }

    pub fn fetch_workbook(&self, view: &str, subview: &str) -> Result<Workbook> {
        let raw = self.fetch_raw(view, subview)?;
        Workbook::parse(&raw)
    }

    fn open_session(&self, view: &str, subview: &str) -> Result<String> {
        let url = http::build_url(&self.host, &["interactive", "views", view, subview])?;
        let mut request = self.agent.get(url.as_str());
        for (name, value) in VIEW_QUERY {
            request = request.query(name, value);
        }
        let response = http::send(url.as_str(), request.call())?;
        let session = response
            .header(SESSION_HEADER)
            .map(str::trim)
            .filter(|session| !session.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::new(ErrorKind::Http)
                    .with_message(format!("dashboard response has no {SESSION_HEADER} header"))
                    .with_path(url.as_str())
                    .with_hint("Check the view and subview names in the dashboard embed code.")
            })?;
        tracing::debug!(session = %session, "dashboard session opened");
        Ok(session)
    }
}
