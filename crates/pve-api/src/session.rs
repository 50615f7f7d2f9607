// Session ticket state
//
// A ticket is either absent or present-and-fresh. Freshness is measured on
// the monotonic clock from the moment of acquisition; use never extends it.
// Once the lifetime elapses the ticket is dropped on the next check.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderValue, InvalidHeaderValue};
use tokio::time::Instant;
use tracing::debug;

/// How long a `PVEAuthCookie` ticket stays valid after issue.
pub const TICKET_LIFETIME: Duration = Duration::from_secs(2 * 60 * 60);

/// Ticket + CSRF token issued by `/access/ticket`.
///
/// Both values are pre-built as sensitive header values so they never show
/// up in `Debug` output or request logs.
#[derive(Debug)]
pub(crate) struct SessionTicket {
    cookie: HeaderValue,
    csrf_token: HeaderValue,
    username: Option<String>,
    acquired_at: Instant,
    issued_at: DateTime<Utc>,
}

impl SessionTicket {
    pub(crate) fn new(
        ticket: &str,
        csrf_token: &str,
        username: Option<String>,
    ) -> Result<Self, InvalidHeaderValue> {
        let mut cookie = HeaderValue::from_str(&format!("PVEAuthCookie={ticket}"))?;
        cookie.set_sensitive(true);
        let mut csrf_token = HeaderValue::from_str(csrf_token)?;
        csrf_token.set_sensitive(true);

        Ok(Self {
            cookie,
            csrf_token,
            username,
            acquired_at: Instant::now(),
            issued_at: Utc::now(),
        })
    }

    pub(crate) fn age(&self) -> Duration {
        self.acquired_at.elapsed()
    }

    pub(crate) fn is_fresh(&self) -> bool {
        self.age() < TICKET_LIFETIME
    }
}

/// Auth material attached to one outgoing request.
#[derive(Debug, Clone)]
pub(crate) struct AuthHeaders {
    pub cookie: HeaderValue,
    pub csrf_token: HeaderValue,
}

/// Read-only view of the current session for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// User id as reported by the server (e.g. `root@pam`).
    pub username: Option<String>,
    /// Wall-clock time the ticket was acquired.
    pub issued_at: DateTime<Utc>,
    /// Time left before the ticket must be renewed.
    pub remaining: Duration,
}

/// Mutable session state owned by the client.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    ticket: Option<SessionTicket>,
}

impl SessionState {
    pub(crate) fn store(&mut self, ticket: SessionTicket) {
        debug!(username = ?ticket.username, "storing session ticket");
        self.ticket = Some(ticket);
    }

    pub(crate) fn clear(&mut self) {
        self.ticket = None;
    }

    /// Whether a fresh ticket is held. Drops an expired ticket as a side effect.
    pub(crate) fn validate(&mut self) -> bool {
        match &self.ticket {
            None => false,
            Some(ticket) if ticket.is_fresh() => true,
            Some(ticket) => {
                debug!(age_secs = ticket.age().as_secs(), "session ticket expired");
                self.ticket = None;
                false
            }
        }
    }

    /// Validate, then hand out the cookie and CSRF header for one request.
    pub(crate) fn auth_headers(&mut self) -> Option<AuthHeaders> {
        if !self.validate() {
            return None;
        }
        self.ticket.as_ref().map(|t| AuthHeaders {
            cookie: t.cookie.clone(),
            csrf_token: t.csrf_token.clone(),
        })
    }

    pub(crate) fn info(&mut self) -> Option<SessionInfo> {
        if !self.validate() {
            return None;
        }
        self.ticket.as_ref().map(|t| SessionInfo {
            username: t.username.clone(),
            issued_at: t.issued_at,
            remaining: TICKET_LIFETIME.saturating_sub(t.age()),
        })
    }
}
