//! Mock helpdesk portal for testing.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::discovery::{
    CandidateTicket, PortalCredentials, PortalError, PortalLauncher, TicketPortal,
};

#[derive(Default)]
struct PortalState {
    /// Inbox rows with their rendered content; `None` never finishes rendering.
    tickets: Vec<(CandidateTicket, Option<String>)>,
    launch_error: Option<String>,
    auth_error: Option<String>,
    list_error: Option<String>,
    read_delay: Duration,
    launch_count: usize,
    close_count: usize,
    back_count: usize,
    logins: Vec<String>,
    opened: Vec<String>,
}

/// Mock implementation of the PortalLauncher trait.
///
/// Every launched [`MockTicketPortal`] shares the launcher's scripted inbox
/// and call counters.
///
/// # Example
///
/// ```rust,ignore
/// use parcelwatch_core::testing::MockPortalLauncher;
///
/// let portal = Arc::new(MockPortalLauncher::new());
/// portal
///     .add_ticket("T-1", "S042 Kadikoy", "#Return", "ServiceDesk", "Waybill 1Z0625ABCDEF123456")
///     .await;
///
/// // ... run an import ...
///
/// assert_eq!(portal.opened_tickets().await, vec!["T-1"]);
/// assert_eq!(portal.close_count().await, 1);
/// ```
#[derive(Default)]
pub struct MockPortalLauncher {
    state: Arc<RwLock<PortalState>>,
}

impl MockPortalLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an inbox row whose detail view renders `content`.
    pub async fn add_ticket(
        &self,
        ticket_id: &str,
        requester: &str,
        subject: &str,
        team: &str,
        content: &str,
    ) {
        self.push_ticket(ticket_id, requester, subject, team, Some(content.to_string()))
            .await;
    }

    /// Append an inbox row whose detail view never renders.
    pub async fn add_failing_ticket(
        &self,
        ticket_id: &str,
        requester: &str,
        subject: &str,
        team: &str,
    ) {
        self.push_ticket(ticket_id, requester, subject, team, None)
            .await;
    }

    async fn push_ticket(
        &self,
        ticket_id: &str,
        requester: &str,
        subject: &str,
        team: &str,
        content: Option<String>,
    ) {
        let mut state = self.state.write().await;
        let index = state.tickets.len();
        state.tickets.push((
            CandidateTicket {
                index,
                ticket_id: ticket_id.to_string(),
                requester: requester.to_string(),
                subject: subject.to_string(),
                team: team.to_string(),
            },
            content,
        ));
    }

    /// Delay every ticket read by `delay`.
    pub async fn set_read_delay(&self, delay: Duration) {
        self.state.write().await.read_delay = delay;
    }

    /// Make browser startup fail.
    pub async fn fail_launch(&self, reason: &str) {
        self.state.write().await.launch_error = Some(reason.to_string());
    }

    /// Make login fail.
    pub async fn fail_authentication(&self, reason: &str) {
        self.state.write().await.auth_error = Some(reason.to_string());
    }

    /// Make reading the inbox fail.
    pub async fn fail_listing(&self, reason: &str) {
        self.state.write().await.list_error = Some(reason.to_string());
    }

    pub async fn launch_count(&self) -> usize {
        self.state.read().await.launch_count
    }

    pub async fn close_count(&self) -> usize {
        self.state.read().await.close_count
    }

    /// Number of detail-to-inbox navigations.
    pub async fn back_count(&self) -> usize {
        self.state.read().await.back_count
    }

    /// Emails used for login attempts.
    pub async fn logins(&self) -> Vec<String> {
        self.state.read().await.logins.clone()
    }

    /// Ids of tickets whose detail view was opened, in order.
    pub async fn opened_tickets(&self) -> Vec<String> {
        self.state.read().await.opened.clone()
    }
}

#[async_trait]
impl PortalLauncher for MockPortalLauncher {
    async fn launch(&self) -> Result<Box<dyn TicketPortal>, PortalError> {
        let mut state = self.state.write().await;
        state.launch_count += 1;
        if let Some(reason) = &state.launch_error {
            return Err(PortalError::Launch(reason.clone()));
        }
        Ok(Box::new(MockTicketPortal {
            state: Arc::clone(&self.state),
            authenticated: false,
            on_detail: false,
        }))
    }
}

/// A session opened by [`MockPortalLauncher`].
pub struct MockTicketPortal {
    state: Arc<RwLock<PortalState>>,
    authenticated: bool,
    on_detail: bool,
}

#[async_trait]
impl TicketPortal for MockTicketPortal {
    async fn authenticate(&mut self, credentials: &PortalCredentials) -> Result<(), PortalError> {
        let mut state = self.state.write().await;
        state.logins.push(credentials.email.clone());
        if let Some(reason) = &state.auth_error {
            return Err(PortalError::Authentication(reason.clone()));
        }
        self.authenticated = true;
        Ok(())
    }

    async fn list_candidate_tickets(&mut self) -> Result<Vec<CandidateTicket>, PortalError> {
        if !self.authenticated {
            return Err(PortalError::Session("not logged in".to_string()));
        }
        let state = self.state.read().await;
        if let Some(reason) = &state.list_error {
            return Err(PortalError::Session(reason.clone()));
        }
        Ok(state.tickets.iter().map(|(t, _)| t.clone()).collect())
    }

    async fn read_ticket_content(
        &mut self,
        ticket: &CandidateTicket,
    ) -> Result<String, PortalError> {
        if self.on_detail {
            return Err(PortalError::Session(
                "ticket opened while another is still open".to_string(),
            ));
        }

        let delay = self.state.read().await.read_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().await;
        let content = state
            .tickets
            .get(ticket.index)
            .filter(|(t, _)| t.ticket_id == ticket.ticket_id)
            .map(|(_, content)| content.clone())
            .ok_or_else(|| {
                PortalError::ElementNotFound(format!("inbox row for ticket {}", ticket.ticket_id))
            })?;

        state.opened.push(ticket.ticket_id.clone());
        self.on_detail = true;
        content.ok_or_else(|| PortalError::Timeout("ticket header".to_string()))
    }

    async fn go_back(&mut self) -> Result<(), PortalError> {
        if self.on_detail {
            self.on_detail = false;
            self.state.write().await.back_count += 1;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), PortalError> {
        self.state.write().await.close_count += 1;
        Ok(())
    }
}
