//! Change notifications: an SNS message for subscribers and an S3 audit object
//! per operation.

use std::fmt;

use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AppError;

/// Operation recorded in notifications and audit object keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationKind {
    Get,
    Insert,
    Remove,
    Update,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Get => "GET",
            OperationKind::Insert => "INSERT",
            OperationKind::Remove => "REMOVE",
            OperationKind::Update => "UPDATE",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of an audit object.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry<'a> {
    pub kind: OperationKind,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<u64>,
    pub recorded_at: DateTime<Utc>,
}

/// `<KIND>-<uuid>.json`
pub fn audit_object_key(kind: OperationKind, id: Uuid) -> String {
    format!("{kind}-{id}.json")
}

/// Line shown to the user after a notification went out.
pub fn confirmation_line(endpoints: &[String]) -> String {
    if endpoints.is_empty() {
        "Confirmation sent to no subscribers.".to_owned()
    } else {
        format!("Confirmation sent to {}", endpoints.join(" "))
    }
}

/// Publishes to one SNS topic.
pub struct TopicPublisher {
    client: aws_sdk_sns::Client,
    topic_arn: String,
}

impl TopicPublisher {
    pub fn new(client: aws_sdk_sns::Client, topic_arn: impl Into<String>) -> Self {
        Self {
            client,
            topic_arn: topic_arn.into(),
        }
    }

    /// Publish `message` and return the endpoints subscribed to the topic.
    pub async fn publish(&self, kind: OperationKind, message: &str) -> Result<Vec<String>, AppError> {
        let published = self
            .client
            .publish()
            .topic_arn(&self.topic_arn)
            .subject(format!("Students table {kind}"))
            .message(message)
            .send()
            .await
            .map_err(|e| AppError::Notification(e.to_string()))?;
        info!(
            topic_arn = %self.topic_arn,
            message_id = ?published.message_id,
            %kind,
            "published change notification"
        );

        let mut endpoints = Vec::new();
        let mut next_token = None;
        loop {
            let page = self
                .client
                .list_subscriptions_by_topic()
                .topic_arn(&self.topic_arn)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| AppError::Notification(e.to_string()))?;
            endpoints.extend(
                page.subscriptions
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|s| s.endpoint),
            );
            match page.next_token {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }
        Ok(endpoints)
    }
}

/// Writes audit objects to one S3 bucket.
pub struct AuditLog {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl AuditLog {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Store the entry and return the object key it was written under.
    pub async fn record(&self, entry: &AuditEntry<'_>) -> Result<String, AppError> {
        let key = audit_object_key(entry.kind, Uuid::new_v4());
        let body = serde_json::to_vec(entry).map_err(|e| AppError::Audit(e.to_string()))?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type("application/json")
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| AppError::Audit(e.to_string()))?;
        Ok(key)
    }
}

/// Fans a change out to the configured topic and audit bucket. Either side may
/// be absent, in which case it is skipped.
#[derive(Default)]
pub struct ChangeNotifier {
    publisher: Option<TopicPublisher>,
    audit: Option<AuditLog>,
}

impl ChangeNotifier {
    pub fn new(publisher: Option<TopicPublisher>, audit: Option<AuditLog>) -> Self {
        Self { publisher, audit }
    }

    /// Notifier that neither publishes nor audits.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Publish and audit one operation. Returns the confirmation line when a
    /// topic is configured.
    pub async fn notify(
        &self,
        kind: OperationKind,
        student_id: Option<u64>,
        message: &str,
    ) -> Result<Option<String>, AppError> {
        let confirmation = match &self.publisher {
            Some(publisher) => {
                let endpoints = publisher.publish(kind, message).await?;
                Some(confirmation_line(&endpoints))
            }
            None => {
                debug!(%kind, "no SNS topic configured; skipping notification");
                None
            }
        };

        match &self.audit {
            Some(audit) => {
                let entry = AuditEntry {
                    kind,
                    message,
                    student_id,
                    recorded_at: Utc::now(),
                };
                let key = audit.record(&entry).await?;
                info!(bucket = %audit.bucket, %key, "recorded audit entry");
            }
            None => debug!(%kind, "no audit bucket configured; skipping audit entry"),
        }

        Ok(confirmation)
    }
}
