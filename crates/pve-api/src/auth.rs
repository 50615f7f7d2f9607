// Ticket authentication
//
// `POST /access/ticket` with a form body of username/password/realm. The
// response carries the `PVEAuthCookie` ticket and the CSRF token; both are
// stored in the client's session state. There is no server-side logout --
// tickets simply expire after two hours.

use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::client::PveClient;
use crate::error::Error;
use crate::request::error_body;
use crate::session::{SessionInfo, SessionTicket};
use crate::transport::classify;

#[derive(Deserialize)]
struct TicketResponse {
    data: Option<TicketData>,
}

#[derive(Deserialize)]
struct TicketData {
    ticket: Option<String>,
    #[serde(rename = "CSRFPreventionToken")]
    csrf_prevention_token: Option<String>,
    username: Option<String>,
}

impl PveClient {
    /// Authenticate with username/password/realm and store the ticket.
    ///
    /// On success the node inventory is reloaded; a failed reload is logged
    /// and left for the next call to retry. Any failure discards a
    /// previously held ticket.
    ///
    /// Errors distinguish a rejected login ([`Error::Authentication`]) from a
    /// transport failure ([`Error::Transport`]) and a distrusted certificate
    /// ([`Error::UntrustedCertificate`]).
    pub async fn login(&self) -> Result<(), Error> {
        let ticket = match self.request_ticket().await {
            Ok(ticket) => ticket,
            Err(e) => {
                self.session.write().await.clear();
                return Err(e);
            }
        };

        self.session.write().await.store(ticket);
        debug!("login successful");

        if let Err(e) = self.reload_node_list().await {
            warn!(error = %e, "node inventory reload after login failed");
        }
        Ok(())
    }

    async fn request_ticket(&self) -> Result<SessionTicket, Error> {
        let config = self.config();
        let url = self.api_url("/access/ticket")?;

        debug!(
            username = config.username(),
            realm = config.realm(),
            "logging in at {}",
            url
        );

        let form = [
            ("username", config.username()),
            ("password", config.password().expose_secret()),
            ("realm", config.realm()),
        ];

        let resp = self
            .http()
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(|e| classify(e, config.host()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = error_body(resp).await;
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {body}"),
            });
        }

        let body = resp.text().await.map_err(|e| classify(e, config.host()))?;
        parse_ticket(&body)
    }

    /// Drop the local ticket. The node inventory is kept.
    pub async fn logout(&self) {
        debug!("discarding session ticket");
        self.session.write().await.clear();
    }

    /// Whether a fresh ticket is held. An expired ticket is discarded.
    pub async fn ticket_valid(&self) -> bool {
        self.session.write().await.validate()
    }

    /// Username, issue time, and remaining lifetime of the current ticket.
    pub async fn session_info(&self) -> Option<SessionInfo> {
        self.session.write().await.info()
    }
}

fn parse_ticket(body: &str) -> Result<SessionTicket, Error> {
    let parsed: TicketResponse = serde_json::from_str(body).map_err(|e| Error::Authentication {
        message: format!("unreadable ticket response: {e}"),
    })?;

    let data = parsed.data.ok_or_else(|| Error::Authentication {
        message: "server returned no ticket data".into(),
    })?;

    let (Some(ticket), Some(csrf)) = (data.ticket, data.csrf_prevention_token) else {
        return Err(Error::Authentication {
            message: "ticket response is missing the ticket or CSRF token".into(),
        });
    };

    if ticket.is_empty() || csrf.is_empty() {
        return Err(Error::Authentication {
            message: "server returned an empty ticket".into(),
        });
    }

    SessionTicket::new(&ticket, &csrf, data.username).map_err(|_| Error::Authentication {
        message: "ticket contains characters not allowed in HTTP headers".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_ticket() {
        assert!(parse_ticket(r#"{"data":{"ticket":"T","CSRFPreventionToken":"C"}}"#).is_ok());
    }

    #[test]
    fn null_data_is_auth_failure() {
        let result = parse_ticket(r#"{"data":null}"#);
        assert!(matches!(result, Err(Error::Authentication { .. })));
    }

    #[test]
    fn missing_csrf_is_auth_failure() {
        let result = parse_ticket(r#"{"data":{"ticket":"T"}}"#);
        assert!(matches!(
            result,
            Err(Error::Authentication { ref message }) if message.contains("CSRF")
        ));
    }

    #[test]
    fn non_json_is_auth_failure() {
        assert!(matches!(
            parse_ticket("<html>502 Bad Gateway</html>"),
            Err(Error::Authentication { .. })
        ));
    }
}
