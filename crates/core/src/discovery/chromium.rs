//! Helpdesk portal driven through a Chromium browser session.
//!
//! The portal renders client-side and offers no observable "ready" signal,
//! so every step is followed by a fixed settle delay and element lookups
//! are retried until a bounded timeout.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::PortalConfig;

use super::types::{CandidateTicket, PortalCredentials, PortalError, PortalLauncher, TicketPortal};

/// Interval between element lookups while waiting for one to render.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Launches a fresh Chromium session per import.
pub struct ChromiumLauncher {
    config: PortalConfig,
}

impl ChromiumLauncher {
    pub fn new(config: PortalConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PortalLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn TicketPortal>, PortalError> {
        let portal = ChromiumPortal::launch(self.config.clone()).await?;
        Ok(Box::new(portal))
    }
}

/// An open browser session on the helpdesk portal.
pub struct ChromiumPortal {
    config: PortalConfig,
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    /// A ticket detail view is open.
    on_detail: bool,
    closed: bool,
}

impl ChromiumPortal {
    /// Start the browser with a blank page.
    pub async fn launch(config: PortalConfig) -> Result<Self, PortalError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(Duration::from_millis(config.header_timeout_ms.max(30_000)));
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &config.chrome_executable {
            builder = builder.chrome_executable(executable);
        }
        let browser_config = builder.build().map_err(PortalError::Launch)?;

        let (mut browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| PortalError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler stopped: {}", e);
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                handler.abort();
                return Err(PortalError::Launch(e.to_string()));
            }
        };

        debug!("Browser session started");
        Ok(Self {
            config,
            browser,
            page,
            handler,
            on_detail: false,
            closed: false,
        })
    }

    async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(self.config.settle_delay_ms)).await;
    }

    fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.config.header_timeout_ms)
    }

    /// Poll for `selector` until it renders or `timeout` elapses.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<Element, PortalError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Ok(element) = self.page.find_element(selector).await {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                return Err(PortalError::Timeout(selector.to_string()));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), PortalError> {
        let input = self.wait_for(selector, self.element_timeout()).await?;
        input.click().await.map_err(cdp(selector))?;
        input.type_str(value).await.map_err(cdp(selector))?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), PortalError> {
        let button = self.wait_for(selector, self.element_timeout()).await?;
        button.click().await.map_err(cdp(selector))?;
        Ok(())
    }

    /// Find the inbox row for `ticket`, preferring its original position.
    async fn locate_row(&self, ticket: &CandidateTicket) -> Result<Element, PortalError> {
        let selectors = &self.config.selectors;
        let rows = self
            .page
            .find_elements(&selectors.inbox_row)
            .await
            .map_err(cdp(&selectors.inbox_row))?;

        let mut rows: Vec<Option<Element>> = rows.into_iter().map(Some).collect();

        if let Some(slot) = rows.get_mut(ticket.index) {
            if let Some(row) = slot.take() {
                if cell_text(&row, &selectors.row_ticket_id).await.as_deref()
                    == Some(ticket.ticket_id.as_str())
                {
                    return Ok(row);
                }
            }
        }

        // The inbox may have shifted since it was listed.
        for row in rows.into_iter().flatten() {
            if cell_text(&row, &selectors.row_ticket_id).await.as_deref()
                == Some(ticket.ticket_id.as_str())
            {
                return Ok(row);
            }
        }

        Err(PortalError::ElementNotFound(format!(
            "inbox row for ticket {}",
            ticket.ticket_id
        )))
    }
}

#[async_trait]
impl TicketPortal for ChromiumPortal {
    async fn authenticate(&mut self, credentials: &PortalCredentials) -> Result<(), PortalError> {
        let selectors = self.config.selectors.clone();
        let step = |name: &'static str| {
            move |e: PortalError| PortalError::Authentication(format!("{} step: {}", name, e))
        };

        self.page
            .goto(self.config.url.as_str())
            .await
            .map_err(|e| PortalError::Authentication(format!("portal unreachable: {}", e)))?;
        self.settle().await;

        self.fill(&selectors.email_input, &credentials.email)
            .await
            .map_err(step("email"))?;
        self.click(&selectors.email_submit)
            .await
            .map_err(step("email"))?;
        self.settle().await;

        self.fill(&selectors.password_input, &credentials.password)
            .await
            .map_err(step("password"))?;
        self.click(&selectors.password_submit)
            .await
            .map_err(step("password"))?;
        self.settle().await;

        for _ in 0..self.config.confirmation_steps {
            self.click(&selectors.confirm_button)
                .await
                .map_err(step("confirmation"))?;
            self.settle().await;
        }

        self.wait_for(&selectors.inbox_row, self.element_timeout())
            .await
            .map_err(|_| {
                PortalError::Authentication("inbox did not load after login".to_string())
            })?;

        info!("Logged into helpdesk portal");
        Ok(())
    }

    async fn list_candidate_tickets(&mut self) -> Result<Vec<CandidateTicket>, PortalError> {
        let selectors = &self.config.selectors;
        let rows = self
            .page
            .find_elements(&selectors.inbox_row)
            .await
            .map_err(cdp(&selectors.inbox_row))?;

        let mut tickets = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            tickets.push(CandidateTicket {
                index,
                ticket_id: cell_text(row, &selectors.row_ticket_id)
                    .await
                    .unwrap_or_default(),
                requester: cell_text(row, &selectors.row_requester)
                    .await
                    .unwrap_or_default(),
                subject: cell_text(row, &selectors.row_subject)
                    .await
                    .unwrap_or_default(),
                team: cell_text(row, &selectors.row_team).await.unwrap_or_default(),
            });
        }

        debug!("Read {} inbox rows", tickets.len());
        Ok(tickets)
    }

    async fn read_ticket_content(
        &mut self,
        ticket: &CandidateTicket,
    ) -> Result<String, PortalError> {
        let selectors = self.config.selectors.clone();
        let row = self.locate_row(ticket).await?;
        let subject = row
            .find_element(&selectors.row_subject)
            .await
            .map_err(|_| PortalError::ElementNotFound(selectors.row_subject.clone()))?;
        subject.click().await.map_err(cdp(&selectors.row_subject))?;
        self.on_detail = true;

        self.wait_for(&selectors.ticket_header, self.element_timeout())
            .await?;

        let content = self
            .page
            .find_element(&selectors.ticket_content)
            .await
            .map_err(|_| PortalError::ElementNotFound(selectors.ticket_content.clone()))?
            .inner_text()
            .await
            .map_err(cdp(&selectors.ticket_content))?
            .unwrap_or_default();

        debug!(ticket_id = %ticket.ticket_id, chars = content.len(), "Read ticket content");
        Ok(content)
    }

    async fn go_back(&mut self) -> Result<(), PortalError> {
        if !self.on_detail {
            return Ok(());
        }

        self.page
            .evaluate("window.history.back()")
            .await
            .map_err(cdp("history.back"))?;
        self.on_detail = false;
        self.settle().await;

        self.wait_for(&self.config.selectors.inbox_row, self.element_timeout())
            .await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), PortalError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let result = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| PortalError::Session(e.to_string()));
        let _ = self.browser.wait().await;
        self.handler.abort();
        debug!("Browser session closed");
        result
    }
}

/// Trimmed inner text of the first `selector` match below `row`.
async fn cell_text(row: &Element, selector: &str) -> Option<String> {
    let cell = row.find_element(selector).await.ok()?;
    let text = cell.inner_text().await.ok()??;
    Some(text.trim().to_string())
}

fn cdp(context: &str) -> impl Fn(CdpError) -> PortalError + '_ {
    move |e| PortalError::Session(format!("{}: {}", context, e))
}
