//! Application-scoped context shared across invocations.

use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client;
use lambda_http::Error as LambdaError;
use tracing::info;

use crate::{
    bootstrap::{ensure_audit_bucket, ensure_student_table},
    config::Settings,
    error::lambda_error,
    notify::{AuditLog, ChangeNotifier, TopicPublisher},
    runtime_env::DeploymentEnv,
    store::StudentStore,
};

/// Holds the SDK clients and settings, built once per cold start.
pub struct AppContext {
    client: Client,
    notifier: ChangeNotifier,
    settings: Settings,
}

impl AppContext {
    /// Construct a context from already-configured parts.
    pub fn new(client: Client, notifier: ChangeNotifier, settings: Settings) -> Self {
        Self {
            client,
            notifier,
            settings,
        }
    }

    /// Load AWS configuration and settings from the environment, bootstrapping
    /// the table and bucket when enabled.
    pub async fn from_env(environment: &DeploymentEnv) -> Result<Self, LambdaError> {
        let settings = Settings::from_env(environment);
        info!(
            environment = environment.name(),
            resolution = %environment.source(),
            table_name = settings.table_name(),
            topic_arn = ?settings.topic_arn(),
            audit_bucket = ?settings.audit_bucket(),
            "initialising Lambda runtime"
        );

        let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let client = Client::new(&config);
        let s3 = aws_sdk_s3::Client::new(&config);

        if settings.bootstrap() {
            ensure_student_table(&client, settings.table_name())
                .await
                .map_err(lambda_error)?;
            if let Some(bucket) = settings.audit_bucket() {
                ensure_audit_bucket(&s3, bucket).await.map_err(lambda_error)?;
            }
        } else {
            info!(
                environment = environment.name(),
                "skipping AWS resource bootstrap"
            );
        }

        let publisher = settings
            .topic_arn()
            .map(|arn| TopicPublisher::new(aws_sdk_sns::Client::new(&config), arn));
        let audit = settings
            .audit_bucket()
            .map(|bucket| AuditLog::new(s3.clone(), bucket));

        Ok(Self::new(
            client,
            ChangeNotifier::new(publisher, audit),
            settings,
        ))
    }

    /// Typed view of the students table.
    pub fn students(&self) -> StudentStore<'_> {
        StudentStore::new(&self.client, self.settings.table_name())
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
