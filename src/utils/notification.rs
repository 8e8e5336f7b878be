//! Post-commit notifications.
//!
//! Messages are posted to `NOTIFY_URL` on a detached task once the
//! transaction that produced them has committed. Delivery failures are
//! logged and never reach the caller.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Notice {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

#[derive(Clone)]
pub struct Notifier {
    client: reqwest::Client,
    endpoint: Option<String>,
}

impl Notifier {
    pub fn new(endpoint: Option<String>) -> Self {
        if endpoint.is_none() {
            tracing::warn!("NOTIFY_URL not set; notifications will only be logged");
        }
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    /// Fire and forget. Must only be called after commit.
    pub fn dispatch(&self, notices: Vec<Notice>) {
        if notices.is_empty() {
            return;
        }
        let Some(endpoint) = self.endpoint.clone() else {
            for notice in &notices {
                tracing::info!(to = %notice.to, subject = %notice.subject, "Notification skipped");
            }
            return;
        };

        let client = self.client.clone();
        actix_web::rt::spawn(async move {
            for notice in notices {
                if let Err(e) = send(&client, &endpoint, &notice).await {
                    tracing::warn!(
                        error = %e,
                        to = %notice.to,
                        subject = %notice.subject,
                        "Notification failed"
                    );
                }
            }
        });
    }
}

async fn send(
    client: &reqwest::Client,
    endpoint: &str,
    notice: &Notice,
) -> Result<(), reqwest::Error> {
    client
        .post(endpoint)
        .json(notice)
        .send()
        .await?
        .error_for_status()?;
    tracing::debug!(to = %notice.to, subject = %notice.subject, "Notification sent");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_serializes_flat() {
        let notice = Notice::new("a@example.com", "Leave approved", "Your leave was approved");
        let json = serde_json::to_value(&notice).unwrap();
        assert_eq!(json["to"], "a@example.com");
        assert_eq!(json["subject"], "Leave approved");
    }

    #[actix_web::test]
    async fn dispatch_without_endpoint_is_a_noop() {
        let notifier = Notifier::new(None);
        notifier.dispatch(vec![Notice::new("a@example.com", "s", "b")]);
        notifier.dispatch(Vec::new());
    }
}
