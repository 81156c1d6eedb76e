//! Unit-test support: SDK clients that answer from canned responses and
//! record what was sent.

use std::sync::Arc;

use aws_credential_types::Credentials;
use aws_smithy_http_client::test_util::{ReplayEvent, StaticReplayClient};
use aws_smithy_types::body::SdkBody;
use lambda_http::http;
use serde_json::{json, Map, Value};

use crate::{config::Settings, context::AppContext, lex::LexEvent, notify::ChangeNotifier};

pub(crate) const ADMIN: &str = "Ivan";
const REGION: &str = "us-east-1";
const DYNAMO_JSON: &str = "application/x-amz-json-1.0";

/// Canned response. The recorded request is inspected separately through
/// `actual_requests`, so the expected side is a placeholder.
pub(crate) fn reply(status: u16, content_type: &str, body: impl Into<String>) -> ReplayEvent {
    ReplayEvent::new(
        http::Request::builder()
            .uri("https://replay.invalid/")
            .body(SdkBody::empty())
            .unwrap(),
        http::Response::builder()
            .status(status)
            .header("content-type", content_type)
            .body(SdkBody::from(body.into()))
            .unwrap(),
    )
}

pub(crate) fn dynamo_ok(body: Value) -> ReplayEvent {
    reply(200, DYNAMO_JSON, body.to_string())
}

pub(crate) fn dynamo_error(code: &str, message: &str) -> ReplayEvent {
    reply(
        400,
        DYNAMO_JSON,
        json!({
            "__type": format!("com.amazonaws.dynamodb.v20120810#{code}"),
            "message": message
        })
        .to_string(),
    )
}

pub(crate) fn dynamo_client(http_client: &StaticReplayClient) -> aws_sdk_dynamodb::Client {
    let config = aws_sdk_dynamodb::Config::builder()
        .credentials_provider(Credentials::for_tests())
        .region(aws_sdk_dynamodb::config::Region::new(REGION))
        .http_client(http_client.clone())
        .behavior_version_latest()
        .build();
    aws_sdk_dynamodb::Client::from_conf(config)
}

pub(crate) fn sns_client(http_client: &StaticReplayClient) -> aws_sdk_sns::Client {
    let config = aws_sdk_sns::Config::builder()
        .credentials_provider(Credentials::for_tests())
        .region(aws_sdk_sns::config::Region::new(REGION))
        .http_client(http_client.clone())
        .behavior_version_latest()
        .build();
    aws_sdk_sns::Client::from_conf(config)
}

pub(crate) fn s3_client(http_client: &StaticReplayClient) -> aws_sdk_s3::Client {
    let config = aws_sdk_s3::Config::builder()
        .credentials_provider(Credentials::for_tests())
        .region(aws_sdk_s3::config::Region::new(REGION))
        .http_client(http_client.clone())
        .request_checksum_calculation(aws_sdk_s3::config::RequestChecksumCalculation::WhenRequired)
        .behavior_version_latest()
        .build();
    aws_sdk_s3::Client::from_conf(config)
}

pub(crate) fn test_settings() -> Settings {
    Settings::new("Students_Test").with_admin_username(ADMIN)
}

/// Context whose table answers with `events` in order. Notifications are off.
pub(crate) fn replay_context(
    settings: Settings,
    events: Vec<ReplayEvent>,
) -> (Arc<AppContext>, StaticReplayClient) {
    let http_client = StaticReplayClient::new(events);
    let ctx = AppContext::new(
        dynamo_client(&http_client),
        ChangeNotifier::disabled(),
        settings,
    );
    (Arc::new(ctx), http_client)
}

/// Decoded JSON body of a recorded DynamoDB request.
pub(crate) fn sent_json(body: &SdkBody) -> Value {
    serde_json::from_slice(body.bytes().unwrap_or_default()).unwrap()
}

/// Value of `key` in a recorded form-encoded (SNS query protocol) body.
pub(crate) fn form_value(body: &SdkBody, key: &str) -> Option<String> {
    let body = std::str::from_utf8(body.bytes()?).ok()?;
    body.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then(|| percent_decode(v))
    })
}

fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap();
                out.push(u8::from_str_radix(hex, 16).unwrap());
                i += 3;
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(out).unwrap()
}

/// Fulfillment event for `intent` with the given filled slots.
pub(crate) fn lex_event(intent: &str, slots: &[(&str, &str)], transcript: &str) -> LexEvent {
    let slots: Map<String, Value> = slots
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                json!({ "shape": "Scalar", "value": { "originalValue": value, "interpretedValue": value } }),
            )
        })
        .collect();
    serde_json::from_value(json!({
        "sessionId": "unit-session",
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
    .unwrap()
}
