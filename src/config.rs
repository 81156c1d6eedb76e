//! Settings read from the Lambda environment at cold start.

use std::env;

use crate::runtime_env::DeploymentEnv;

const DEFAULT_ADMIN_USERNAME: &str = "there";
const DEFAULT_ALLOWED_ORIGIN: &str = "*";
const DEFAULT_WAKE_WORD: &str = "nova";

/// Handler configuration shared by the bot and API entrypoints.
#[derive(Debug, Clone)]
pub struct Settings {
    table_name: String,
    topic_arn: Option<String>,
    audit_bucket: Option<String>,
    admin_username: String,
    allowed_origin: String,
    wake_word: String,
    bootstrap: bool,
}

impl Settings {
    /// Settings for `table_name` with every optional feature off.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            topic_arn: None,
            audit_bucket: None,
            admin_username: DEFAULT_ADMIN_USERNAME.to_owned(),
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_owned(),
            wake_word: DEFAULT_WAKE_WORD.to_owned(),
            bootstrap: false,
        }
    }

    /// Read `DYNAMO_DB_TABLE_NAME`, `SNS_TOPIC_ARN`, `S3_BUCKET_NAME`,
    /// `ADMIN_USERNAME`, `APP_URL`, `BOT_WAKE_WORD` and
    /// `BOOTSTRAP_AWS_RESOURCES`.
    pub fn from_env(environment: &DeploymentEnv) -> Self {
        let table_name = non_empty_var("DYNAMO_DB_TABLE_NAME").unwrap_or_else(|| environment.table_name());
        let bootstrap = non_empty_var("BOOTSTRAP_AWS_RESOURCES")
            .map(|value| parse_flag(&value))
            .unwrap_or_else(|| environment.is_local());

        let mut settings = Self::new(table_name).with_bootstrap(bootstrap);
        if let Some(arn) = non_empty_var("SNS_TOPIC_ARN") {
            settings = settings.with_topic_arn(arn);
        }
        if let Some(bucket) = non_empty_var("S3_BUCKET_NAME") {
            settings = settings.with_audit_bucket(bucket);
        }
        if let Some(admin) = non_empty_var("ADMIN_USERNAME") {
            settings = settings.with_admin_username(admin);
        }
        if let Some(origin) = non_empty_var("APP_URL") {
            settings = settings.with_allowed_origin(origin);
        }
        if let Some(wake_word) = non_empty_var("BOT_WAKE_WORD") {
            settings = settings.with_wake_word(wake_word);
        }
        settings
    }

    pub fn with_topic_arn(mut self, topic_arn: impl Into<String>) -> Self {
        self.topic_arn = Some(topic_arn.into());
        self
    }

    pub fn with_audit_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.audit_bucket = Some(bucket.into());
        self
    }

    pub fn with_admin_username(mut self, admin: impl Into<String>) -> Self {
        self.admin_username = admin.into();
        self
    }

    pub fn with_allowed_origin(mut self, origin: impl Into<String>) -> Self {
        self.allowed_origin = origin.into();
        self
    }

    pub fn with_wake_word(mut self, wake_word: impl Into<String>) -> Self {
        self.wake_word = wake_word.into();
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn topic_arn(&self) -> Option<&str> {
        self.topic_arn.as_deref()
    }

    pub fn audit_bucket(&self) -> Option<&str> {
        self.audit_bucket.as_deref()
    }

    pub fn admin_username(&self) -> &str {
        &self.admin_username
    }

    /// Value for `Access-Control-Allow-Origin`.
    pub fn allowed_origin(&self) -> &str {
        &self.allowed_origin
    }

    pub fn wake_word(&self) -> &str {
        &self.wake_word
    }

    /// Whether the table and bucket should be created at cold start.
    pub fn bootstrap(&self) -> bool {
        self.bootstrap
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime_env::tests::clear_env_vars;
    use serial_test::serial;

    const SETTINGS_VARS: [&str; 7] = [
        "DYNAMO_DB_TABLE_NAME",
        "SNS_TOPIC_ARN",
        "S3_BUCKET_NAME",
        "ADMIN_USERNAME",
        "APP_URL",
        "BOT_WAKE_WORD",
        "BOOTSTRAP_AWS_RESOURCES",
    ];

    fn clear_settings_vars() {
        clear_env_vars();
        for key in SETTINGS_VARS {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn defaults_follow_environment() {
        clear_settings_vars();
        env::set_var("ENVIRONMENT_NAME", "Local");
        let settings = Settings::from_env(&DeploymentEnv::detect());
        assert_eq!(settings.table_name(), "Students_Local");
        assert_eq!(settings.admin_username(), "there");
        assert_eq!(settings.allowed_origin(), "*");
        assert_eq!(settings.wake_word(), "nova");
        assert!(settings.topic_arn().is_none());
        assert!(settings.audit_bucket().is_none());
        assert!(settings.bootstrap());
        clear_settings_vars();
    }

    #[test]
    #[serial]
    fn explicit_variables_override_defaults() {
        clear_settings_vars();
        env::set_var("ENVIRONMENT_NAME", "Prod");
        env::set_var("DYNAMO_DB_TABLE_NAME", "Students");
        env::set_var("SNS_TOPIC_ARN", "arn:aws:sns:us-east-1:123456789012:StudentsTableChanges");
        env::set_var("S3_BUCKET_NAME", "students-table-actions");
        env::set_var("ADMIN_USERNAME", "Ivan");
        env::set_var("APP_URL", "https://main.example.amplifyapp.com");
        env::set_var("BOT_WAKE_WORD", "Alexa");
        env::set_var("BOOTSTRAP_AWS_RESOURCES", "off");
        let settings = Settings::from_env(&DeploymentEnv::detect());
        assert_eq!(settings.table_name(), "Students");
        assert_eq!(
            settings.topic_arn(),
            Some("arn:aws:sns:us-east-1:123456789012:StudentsTableChanges")
        );
        assert_eq!(settings.audit_bucket(), Some("students-table-actions"));
        assert_eq!(settings.admin_username(), "Ivan");
        assert_eq!(settings.allowed_origin(), "https://main.example.amplifyapp.com");
        assert_eq!(settings.wake_word(), "Alexa");
        assert!(!settings.bootstrap());
        clear_settings_vars();
    }

    #[test]
    #[serial]
    fn blank_values_count_as_unset() {
        clear_settings_vars();
        env::set_var("ENVIRONMENT_NAME", "Prod");
        env::set_var("SNS_TOPIC_ARN", "  ");
        let settings = Settings::from_env(&DeploymentEnv::detect());
        assert!(settings.topic_arn().is_none());
        assert!(!settings.bootstrap());
        clear_settings_vars();
    }
}
