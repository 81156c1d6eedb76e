use std::{env, sync::Arc, time::Duration};

use anyhow::Result;
use aws_credential_types::Credentials;
use aws_sdk_dynamodb::{
    config::Region,
    types::{AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType},
    Client, Config,
};
use database_bot_manager::{
    config::Settings, lex::LexEvent, notify::ChangeNotifier, AppContext,
};
use lambda_http::Body;
use serde_json::{json, Map, Value};
use uuid::Uuid;

#[allow(dead_code)]
pub const ADMIN: &str = "Ivan";
#[allow(dead_code)]
pub const APP_URL: &str = "https://main.example.amplifyapp.com";

#[allow(dead_code)]
pub fn body_as_string(body: &Body) -> String {
    match body {
        Body::Text(s) => s.clone(),
        Body::Binary(b) => String::from_utf8_lossy(b).to_string(),
        Body::Empty => String::new(),
    }
}

#[allow(dead_code)]
/// Lex V2 code-hook event for `intent` with the given filled slots.
pub fn lex_event(intent: &str, slots: &[(&str, &str)], transcript: &str) -> LexEvent {
    let slots: Map<String, Value> = slots
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                json!({
                    "shape": "Scalar",
                    "value": {
                        "originalValue": value,
                        "interpretedValue": value,
                        "resolvedValues": [value]
                    }
                }),
            )
        })
        .collect();
    serde_json::from_value(json!({
        "sessionId": format!("session-{}", Uuid::new_v4().simple()),
        "inputTranscript": transcript,
        "invocationSource": "FulfillmentCodeHook",
        "sessionState": {
            "intent": {
                "name": intent,
                "slots": slots,
                "state": "ReadyForFulfillment",
                "confirmationState": "None"
            },
            "sessionAttributes": { "tableName": "Students" }
        }
    }))
    .expect("valid Lex event")
}

#[allow(dead_code)]
pub struct TestSetup {
    pub ctx: Arc<AppContext>,
    pub client: Client,
    pub table: String,
    _guard: TableGuard,
}

struct TableGuard {
    client: Client,
    table: String,
}

impl TableGuard {
    async fn new(client: Client, table: String) -> Result<Self> {
        client
            .create_table()
            .table_name(&table)
            .attribute_definitions(
                AttributeDefinition::builder()
                    .attribute_name("studentID")
                    .attribute_type(ScalarAttributeType::N)
                    .build()?,
            )
            .key_schema(
                KeySchemaElement::builder()
                    .attribute_name("studentID")
                    .key_type(KeyType::Hash)
                    .build()?,
            )
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await?;

        tokio::time::sleep(Duration::from_millis(300)).await;

        Ok(Self { client, table })
    }
}

impl Drop for TableGuard {
    fn drop(&mut self) {
        let client = self.client.clone();
        let table = self.table.clone();
        tokio::spawn(async move {
            let _ = client.delete_table().table_name(&table).send().await;
        });
    }
}

/// Connect to DynamoDB Local and create a fresh students table. Returns `None`
/// (and the calling test passes vacuously) when DynamoDB is not reachable.
pub async fn setup_environment() -> Option<TestSetup> {
    let endpoint =
        env::var("DYNAMODB_ENDPOINT").unwrap_or_else(|_| "http://127.0.0.1:8000".to_string());
    let region = Region::new(env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()));
    let config = Config::builder()
        .endpoint_url(endpoint)
        .region(region)
        .credentials_provider(Credentials::for_tests())
        .behavior_version_latest()
        .build();
    let client = Client::from_conf(config);

    if client.list_tables().send().await.is_err() {
        eprintln!("skipping integration test: DynamoDB not reachable");
        return None;
    }

    let table = format!("Students_IntegrationTest_{}", Uuid::new_v4().simple());
    let guard = TableGuard::new(client.clone(), table.clone()).await.ok()?;

    let settings = Settings::new(table.clone())
        .with_admin_username(ADMIN)
        .with_allowed_origin(APP_URL);
    let ctx = Arc::new(AppContext::new(
        client.clone(),
        ChangeNotifier::disabled(),
        settings,
    ));

    Some(TestSetup {
        ctx,
        client,
        table,
        _guard: guard,
    })
}
