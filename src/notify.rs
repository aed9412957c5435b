//! Waitlist and email collaborators plus the signup flow that drives them.
//!
//! Delivery is best-effort. A waitlist failure is logged and the confirmation email is still
//! attempted; neither outcome feeds back into any engine calculation.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::EmailConfig;
use crate::core::format::{format_currency, format_monthly};
use crate::core::{RentRange, UpfrontCash, calculate_rent_range, calculate_upfront_cash};
use crate::tax::TaxBreakdown;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Invalid email address: {0:?}")]
    InvalidEmail(String),

    #[error("Waitlist store failed: {0}")]
    Waitlist(String),

    #[error("Email delivery failed: {0}")]
    Email(String),
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignupType {
    #[default]
    Waitlist,
    RentPlan,
    LeapPlan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistEntry {
    pub email: String,
    pub signup_type: SignupType,
    pub page: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub attachments: Vec<Attachment>,
}

#[async_trait]
pub trait WaitlistStore: Send + Sync {
    async fn record(&self, entry: &WaitlistEntry) -> Result<(), NotifyError>;
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError>;
}

/// Process-local waitlist. Entries are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryWaitlist {
    entries: Mutex<Vec<WaitlistEntry>>,
}

impl InMemoryWaitlist {
    pub async fn entries(&self) -> Vec<WaitlistEntry> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl WaitlistStore for InMemoryWaitlist {
    async fn record(&self, entry: &WaitlistEntry) -> Result<(), NotifyError> {
        let mut entries = self.entries.lock().await;
        if entries
            .iter()
            .any(|e| e.email == entry.email && e.signup_type == entry.signup_type)
        {
            return Ok(());
        }
        entries.push(entry.clone());
        Ok(())
    }
}

/// Logs each message and keeps it in an outbox instead of handing it to a mail provider.
#[derive(Debug, Default)]
pub struct OutboxEmailSender {
    sent: Mutex<Vec<EmailMessage>>,
}

impl OutboxEmailSender {
    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl EmailSender for OutboxEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            attachments = message.attachments.len(),
            "email queued"
        );
        self.sent.lock().await.push(message.clone());
        Ok(())
    }
}

/// Flattened rent plan a renderer or email template can consume without recomputing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSnapshot {
    pub take_home_monthly: f64,
    pub take_home_formatted: String,
    pub rent_range: RentRange,
    pub upfront_cash: UpfrontCash,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax: Option<TaxBreakdown>,
}

impl PlanSnapshot {
    pub fn from_take_home(take_home_monthly: f64, debt_monthly: Option<f64>) -> Self {
        let take_home = if take_home_monthly.is_finite() {
            take_home_monthly.max(0.0)
        } else {
            0.0
        };
        let rent_range = calculate_rent_range(Some(take_home), debt_monthly);
        let upfront_cash = calculate_upfront_cash(Some(take_home), &rent_range);
        Self {
            take_home_monthly: take_home.round(),
            take_home_formatted: format_monthly(take_home),
            rent_range,
            upfront_cash,
            tax: None,
        }
    }

    pub fn from_tax(tax: TaxBreakdown, debt_monthly: Option<f64>) -> Self {
        let mut snapshot = Self::from_take_home(tax.net_income_monthly(), debt_monthly);
        snapshot.tax = Some(tax);
        snapshot
    }

    fn html(&self) -> String {
        let mut rows = vec![
            ("Take-home pay", self.take_home_formatted.clone()),
            ("Safe rent range", self.rent_range.formatted.clone()),
            ("Cash to move in", self.upfront_cash.formatted.clone()),
        ];
        if let Some(tax) = &self.tax {
            rows.push(("Estimated annual taxes", format_currency(tax.total_tax_annual)));
        }
        let body: String = rows
            .iter()
            .map(|(label, value)| format!("<tr><td>{label}</td><td>{value}</td></tr>"))
            .collect();
        format!("<table>{body}</table>")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignupRequest {
    pub email: String,
    pub signup_type: SignupType,
    pub page: String,
    pub plan: Option<PlanSnapshot>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct SignupOutcome {
    pub recorded: bool,
    pub emailed: bool,
}

fn normalize_email(raw: &str) -> Result<String, NotifyError> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(email)
    } else {
        Err(NotifyError::InvalidEmail(raw.to_string()))
    }
}

pub struct SignupService {
    waitlist: Arc<dyn WaitlistStore>,
    email: Arc<dyn EmailSender>,
    config: EmailConfig,
}

impl SignupService {
    pub fn new(
        waitlist: Arc<dyn WaitlistStore>,
        email: Arc<dyn EmailSender>,
        config: EmailConfig,
    ) -> Self {
        Self {
            waitlist,
            email,
            config,
        }
    }

    pub fn compose(
        &self,
        to: &str,
        signup_type: SignupType,
        plan: Option<&PlanSnapshot>,
    ) -> EmailMessage {
        let subject = match signup_type {
            SignupType::Waitlist => "You're on the list",
            SignupType::RentPlan => "Your rent plan",
            SignupType::LeapPlan => "Your next money moves",
        };
        let mut html_body = "<p>Thanks for signing up.</p>".to_string();
        let mut attachments = Vec::new();
        if let Some(plan) = plan {
            html_body.push_str(&plan.html());
            if let Ok(content) = serde_json::to_vec_pretty(plan) {
                attachments.push(Attachment {
                    filename: "plan.json".to_string(),
                    content_type: "application/json".to_string(),
                    content,
                });
            }
        }
        EmailMessage {
            from: self.config.from.clone(),
            to: to.to_string(),
            subject: subject.to_string(),
            html_body,
            attachments,
        }
    }

    /// Only an invalid address is an error. Collaborator failures show up in the outcome.
    pub async fn signup(&self, request: SignupRequest) -> Result<SignupOutcome, NotifyError> {
        let email = normalize_email(&request.email)?;
        let entry = WaitlistEntry {
            email: email.clone(),
            signup_type: request.signup_type,
            page: request.page,
        };

        let recorded = match self.waitlist.record(&entry).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, page = %entry.page, "waitlist write failed");
                false
            }
        };

        let message = self.compose(&email, request.signup_type, request.plan.as_ref());
        let emailed = match self.email.send(&message).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "confirmation email failed");
                false
            }
        };

        Ok(SignupOutcome { recorded, emailed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tax::estimate_fallback;

    struct FailingWaitlist;

    #[async_trait]
    impl WaitlistStore for FailingWaitlist {
        async fn record(&self, _entry: &WaitlistEntry) -> Result<(), NotifyError> {
            Err(NotifyError::Waitlist("store offline".to_string()))
        }
    }

    struct FailingEmail;

    #[async_trait]
    impl EmailSender for FailingEmail {
        async fn send(&self, _message: &EmailMessage) -> Result<(), NotifyError> {
            Err(NotifyError::Email("provider rejected".to_string()))
        }
    }

    fn email_config() -> EmailConfig {
        EmailConfig {
            from: "plans@example.com".to_string(),
        }
    }

    fn request(email: &str, plan: Option<PlanSnapshot>) -> SignupRequest {
        SignupRequest {
            email: email.to_string(),
            signup_type: SignupType::RentPlan,
            page: "/rent".to_string(),
            plan,
        }
    }

    #[tokio::test]
    async fn signup_records_and_emails_plan() {
        let waitlist = Arc::new(InMemoryWaitlist::default());
        let outbox = Arc::new(OutboxEmailSender::default());
        let service = SignupService::new(waitlist.clone(), outbox.clone(), email_config());

        let plan = PlanSnapshot::from_take_home(5_000.0, None);
        let outcome = service
            .signup(request(" Someone@Example.com ", Some(plan)))
            .await
            .expect("valid email");
        assert_eq!(
            outcome,
            SignupOutcome {
                recorded: true,
                emailed: true
            }
        );

        let entries = waitlist.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].email, "someone@example.com");

        let sent = outbox.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Your rent plan");
        assert!(sent[0].html_body.contains("$1,400 - $1,750"));
        assert!(sent[0].html_body.contains("$4,200 - $4,900"));
        assert_eq!(sent[0].attachments[0].filename, "plan.json");
    }

    #[tokio::test]
    async fn waitlist_failure_does_not_block_email() {
        let outbox = Arc::new(OutboxEmailSender::default());
        let service = SignupService::new(Arc::new(FailingWaitlist), outbox.clone(), email_config());
        let outcome = service
            .signup(request("a@b.co", None))
            .await
            .expect("valid email");
        assert!(!outcome.recorded);
        assert!(outcome.emailed);
        assert_eq!(outbox.sent().await.len(), 1);
    }

    #[tokio::test]
    async fn email_failure_is_reported_not_raised() {
        let waitlist = Arc::new(InMemoryWaitlist::default());
        let service = SignupService::new(waitlist.clone(), Arc::new(FailingEmail), email_config());
        let outcome = service
            .signup(request("a@b.co", None))
            .await
            .expect("valid email");
        assert!(outcome.recorded);
        assert!(!outcome.emailed);
    }

    #[tokio::test]
    async fn invalid_email_is_rejected_before_any_write() {
        let waitlist = Arc::new(InMemoryWaitlist::default());
        let outbox = Arc::new(OutboxEmailSender::default());
        let service = SignupService::new(waitlist.clone(), outbox.clone(), email_config());
        for bad in ["", "no-at-sign", "@example.com", "a@nodot", "a b@example.com"] {
            let err = service.signup(request(bad, None)).await.expect_err("invalid");
            assert!(matches!(err, NotifyError::InvalidEmail(_)));
        }
        assert!(waitlist.entries().await.is_empty());
        assert!(outbox.sent().await.is_empty());
    }

    #[tokio::test]
    async fn duplicate_signup_is_stored_once() {
        let waitlist = InMemoryWaitlist::default();
        let entry = WaitlistEntry {
            email: "a@b.co".to_string(),
            signup_type: SignupType::Waitlist,
            page: "/".to_string(),
        };
        waitlist.record(&entry).await.expect("record");
        waitlist.record(&entry).await.expect("record");
        assert_eq!(waitlist.entries().await.len(), 1);
    }

    #[test]
    fn snapshot_from_tax_uses_monthly_net() {
        let tax = estimate_fallback(90_000.0, "TX");
        let snapshot = PlanSnapshot::from_tax(tax.clone(), Some(300.0));
        assert_eq!(snapshot.take_home_monthly, (tax.net_income_annual / 12.0).round());
        assert!(snapshot.rent_range.high > 0.0);
        assert!(snapshot.html().contains("Estimated annual taxes"));
    }

    #[test]
    fn snapshot_for_zero_income_is_empty() {
        let snapshot = PlanSnapshot::from_take_home(f64::NAN, None);
        assert_eq!(snapshot.take_home_monthly, 0.0);
        assert!(snapshot.rent_range.is_empty());
        assert_eq!(snapshot.upfront_cash.total_high, 0.0);
    }
}
