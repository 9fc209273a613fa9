//! Domain events returned by transactional operations
//!
//! Transactions never talk to external systems; they hand the caller an
//! event to dispatch after commit.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A freshly registered user needs their verification email sent.
    VerificationEmailRequested {
        email_id: i64,
        username: String,
        email: String,
        secret_code: String,
    },
}

impl DomainEvent {
    /// Queue task name for the background worker.
    pub fn task_name(&self) -> &'static str {
        match self {
            DomainEvent::VerificationEmailRequested { .. } => "task:send_verify_email",
        }
    }

    /// JSON payload for the queue transport.
    pub fn payload(&self) -> serde_json::Value {
        match self {
            DomainEvent::VerificationEmailRequested {
                email_id,
                username,
                email,
                secret_code,
            } => serde_json::json!({
                "email_id": email_id,
                "username": username,
                "email": email,
                "secret_code": secret_code,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_email_payload() {
        let event = DomainEvent::VerificationEmailRequested {
            email_id: 42,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            secret_code: "s3cr3t".to_string(),
        };

        assert_eq!(event.task_name(), "task:send_verify_email");

        let payload = event.payload();
        assert_eq!(payload["email_id"], 42);
        assert_eq!(payload["username"], "alice");
        assert_eq!(payload["secret_code"], "s3cr3t");
    }
}
