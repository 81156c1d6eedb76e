use aws_sdk_dynamodb::{
    types::{
        AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType,
        TableStatus,
    },
    Client,
};
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

use crate::{error::AppError, student::KEY_ATTRIBUTE};

const ACTIVE_POLLS: u32 = 20;

/// Create the students table (numeric `studentID` hash key) unless it exists,
/// then wait for it to become active.
pub async fn ensure_student_table(client: &Client, table: &str) -> Result<(), AppError> {
    if table_exists(client, table).await? {
        info!(%table, "students table already exists");
        return Ok(());
    }

    client
        .create_table()
        .table_name(table)
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name(KEY_ATTRIBUTE)
                .attribute_type(ScalarAttributeType::N)
                .build()
                .map_err(|e| AppError::Dynamo(e.to_string()))?,
        )
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name(KEY_ATTRIBUTE)
                .key_type(KeyType::Hash)
                .build()
                .map_err(|e| AppError::Dynamo(e.to_string()))?,
        )
        .billing_mode(BillingMode::PayPerRequest)
        .send()
        .await
        .map_err(|e| AppError::Dynamo(e.to_string()))?;
    info!(%table, "created students table");

    wait_for_active(client, table).await
}

/// Create the audit bucket unless it is already reachable.
pub async fn ensure_audit_bucket(client: &aws_sdk_s3::Client, bucket: &str) -> Result<(), AppError> {
    if client.head_bucket().bucket(bucket).send().await.is_ok() {
        info!(%bucket, "audit bucket already exists");
        return Ok(());
    }

    let mut request = client.create_bucket().bucket(bucket);
    // us-east-1 rejects an explicit location constraint.
    if let Some(region) = client.config().region().map(|r| r.as_ref().to_owned()) {
        if region != "us-east-1" {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region.as_str()))
                    .build(),
            );
        }
    }
    request
        .send()
        .await
        .map_err(|e| AppError::Audit(e.to_string()))?;
    info!(%bucket, "created audit bucket");
    Ok(())
}

async fn table_exists(client: &Client, table: &str) -> Result<bool, AppError> {
    let mut last_evaluated = None;
    loop {
        let mut req = client.list_tables();
        if let Some(ref start) = last_evaluated {
            req = req.exclusive_start_table_name(start);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| AppError::Dynamo(e.to_string()))?;
        if resp.table_names().iter().any(|name| name == table) {
            return Ok(true);
        }
        if let Some(next) = resp.last_evaluated_table_name {
            last_evaluated = Some(next);
        } else {
            break;
        }
    }
    Ok(false)
}

/// Poll until the table reports `ACTIVE`, giving up quietly after ~4s.
async fn wait_for_active(client: &Client, table: &str) -> Result<(), AppError> {
    for _ in 0..ACTIVE_POLLS {
        let resp = client
            .describe_table()
            .table_name(table)
            .send()
            .await
            .map_err(|e| AppError::Dynamo(e.to_string()))?;
        if resp
            .table
            .and_then(|t| t.table_status)
            .is_some_and(|status| status == TableStatus::Active)
        {
            return Ok(());
        }
        sleep(Duration::from_millis(200)).await;
    }
    warn!(%table, polls = ACTIVE_POLLS, "table not active yet; continuing");
    Ok(())
}
