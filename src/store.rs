//! Typed access to the students table.

use aws_sdk_dynamodb::{types::AttributeValue, Client};
use tracing::debug;

use crate::{
    error::AppError,
    student::{student_key, StudentAttribute, StudentItem, StudentRecord, KEY_ATTRIBUTE},
};

/// Borrowed view over one DynamoDB table of students. Writes take a validated
/// [`StudentRecord`]; reads return items as stored.
pub struct StudentStore<'a> {
    client: &'a Client,
    table: &'a str,
}

impl<'a> StudentStore<'a> {
    pub fn new(client: &'a Client, table: &'a str) -> Self {
        Self { client, table }
    }

    /// Fetch a single student by partition key.
    pub async fn get(&self, student_id: u64) -> Result<Option<StudentItem>, AppError> {
        let output = self
            .client
            .get_item()
            .table_name(self.table)
            .set_key(Some(student_key(student_id)))
            .send()
            .await
            .map_err(|e| AppError::Dynamo(e.to_string()))?;

        Ok(output.item.map(StudentItem::new))
    }

    /// Create the item, or replace every attribute of an existing one.
    pub async fn put(&self, record: &StudentRecord) -> Result<(), AppError> {
        self.client
            .put_item()
            .table_name(self.table)
            .set_item(Some(record.clone().into_item()))
            .send()
            .await
            .map_err(|e| AppError::Dynamo(e.to_string()))?;
        Ok(())
    }

    /// Delete a student. Returns `false` when no item had that key.
    pub async fn remove(&self, student_id: u64) -> Result<bool, AppError> {
        let existing = self
            .client
            .get_item()
            .table_name(self.table)
            .set_key(Some(student_key(student_id)))
            .projection_expression("#key")
            .expression_attribute_names("#key", KEY_ATTRIBUTE)
            .send()
            .await
            .map_err(|e| AppError::Dynamo(e.to_string()))?;
        if existing.item.is_none() {
            debug!(student_id, table = self.table, "nothing to remove");
            return Ok(false);
        }

        self.client
            .delete_item()
            .table_name(self.table)
            .set_key(Some(student_key(student_id)))
            .send()
            .await
            .map_err(|e| AppError::Dynamo(e.to_string()))?;
        Ok(true)
    }

    /// Replace one attribute of an existing student. Returns `false` when the
    /// student does not exist; the item is never created by an update.
    pub async fn update_attribute(
        &self,
        student_id: u64,
        attribute: StudentAttribute,
        value: &str,
    ) -> Result<bool, AppError> {
        let result = self
            .client
            .update_item()
            .table_name(self.table)
            .set_key(Some(student_key(student_id)))
            .update_expression("SET #attr = :value")
            .condition_expression("attribute_exists(#key)")
            .expression_attribute_names("#attr", attribute.name())
            .expression_attribute_names("#key", KEY_ATTRIBUTE)
            .expression_attribute_values(":value", AttributeValue::S(value.to_owned()))
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_conditional_check_failed_exception()) =>
            {
                Ok(false)
            }
            Err(err) => Err(AppError::Dynamo(err.to_string())),
        }
    }

    /// Read every student, following scan pagination. Sorted by ID.
    pub async fn scan(&self) -> Result<Vec<StudentItem>, AppError> {
        let mut items = Vec::new();
        let mut start_key = None;
        loop {
            let output = self
                .client
                .scan()
                .table_name(self.table)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| AppError::Dynamo(e.to_string()))?;

            items.extend(output.items.unwrap_or_default().into_iter().map(StudentItem::new));

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }
        items.sort_by_key(StudentItem::student_id);
        Ok(items)
    }
}
