use std::{collections::HashMap, fmt, str::FromStr};

use aws_sdk_dynamodb::types::AttributeValue;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AppError;

/// Partition key of the students table.
pub const KEY_ATTRIBUTE: &str = "studentID";

/// Classification level of a student at the university.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Classification {
    Freshman,
    Sophomore,
    Junior,
    Senior,
}

impl Classification {
    pub const ALL: [Classification; 4] = [
        Classification::Freshman,
        Classification::Sophomore,
        Classification::Junior,
        Classification::Senior,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Freshman => "Freshman",
            Classification::Sophomore => "Sophomore",
            Classification::Junior => "Junior",
            Classification::Senior => "Senior",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::ALL.iter().map(Classification::as_str).collect();
                AppError::InvalidRecord(format!(
                    "\"{trimmed}\" is not a valid classification. Use one of {}.",
                    allowed.join(", ")
                ))
            })
    }
}

impl TryFrom<String> for Classification {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Non-key attributes that can be replaced one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudentAttribute {
    FirstName,
    LastName,
    DateOfBirth,
    Classification,
    Email,
}

impl StudentAttribute {
    pub const ALL: [StudentAttribute; 5] = [
        StudentAttribute::FirstName,
        StudentAttribute::LastName,
        StudentAttribute::DateOfBirth,
        StudentAttribute::Classification,
        StudentAttribute::Email,
    ];

    /// Attribute name as stored in DynamoDB.
    pub fn name(&self) -> &'static str {
        match self {
            StudentAttribute::FirstName => "firstName",
            StudentAttribute::LastName => "lastName",
            StudentAttribute::DateOfBirth => "dateOfBirth",
            StudentAttribute::Classification => "classification",
            StudentAttribute::Email => "email",
        }
    }

    /// Validate a new value for this attribute and return the form to store.
    pub fn normalize_value(&self, raw: &str) -> Result<String, AppError> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(AppError::InvalidRecord(format!(
                "A new value for {} is required.",
                self.name()
            )));
        }
        match self {
            StudentAttribute::Classification => {
                Ok(value.parse::<Classification>()?.as_str().to_owned())
            }
            _ => Ok(value.to_owned()),
        }
    }
}

impl FromStr for StudentAttribute {
    type Err = AppError;

    /// Accepts `firstName`, `FirstName`, `first name`, `first_name`, ...
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let folded: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match folded.as_str() {
            "firstname" => Ok(StudentAttribute::FirstName),
            "lastname" => Ok(StudentAttribute::LastName),
            "dateofbirth" | "dob" => Ok(StudentAttribute::DateOfBirth),
            "classification" => Ok(StudentAttribute::Classification),
            "email" => Ok(StudentAttribute::Email),
            _ => Err(AppError::InvalidRecord(format!(
                "\"{}\" is not an attribute that can be updated.",
                raw.trim()
            ))),
        }
    }
}

/// Parse a student ID as entered by a user or sent in a request.
pub fn parse_student_id(raw: &str) -> Result<u64, AppError> {
    let trimmed = raw.trim();
    trimmed
        .parse::<u64>()
        .map_err(|_| AppError::InvalidRecord(format!("\"{trimmed}\" is not a valid student ID.")))
}

/// Key map addressing a single student.
pub fn student_key(student_id: u64) -> HashMap<String, AttributeValue> {
    HashMap::from([(
        KEY_ATTRIBUTE.to_owned(),
        AttributeValue::N(student_id.to_string()),
    )])
}

/// Representation of a student record persisted in DynamoDB.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    #[serde(rename = "studentID")]
    pub student_id: u64,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub classification: Classification,
    pub email: String,
}

impl StudentRecord {
    /// Build a record from raw text fields, as collected by the bot slots.
    pub fn from_fields(
        student_id: &str,
        first_name: &str,
        last_name: &str,
        date_of_birth: &str,
        classification: &str,
        email: &str,
    ) -> Result<Self, AppError> {
        Self {
            student_id: parse_student_id(student_id)?,
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            date_of_birth: date_of_birth.to_owned(),
            classification: classification.parse()?,
            email: email.to_owned(),
        }
        .normalized()
    }

    /// Trim every text field and require it to be non-empty. Applied to bot
    /// slots and HTTP bodies alike.
    pub fn normalized(self) -> Result<Self, AppError> {
        let clean = |attribute: StudentAttribute, raw: String| -> Result<String, AppError> {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Err(AppError::InvalidRecord(format!(
                    "A value for {} is required.",
                    attribute.name()
                )));
            }
            Ok(trimmed.to_owned())
        };
        Ok(Self {
            student_id: self.student_id,
            first_name: clean(StudentAttribute::FirstName, self.first_name)?,
            last_name: clean(StudentAttribute::LastName, self.last_name)?,
            date_of_birth: clean(StudentAttribute::DateOfBirth, self.date_of_birth)?,
            classification: self.classification,
            email: clean(StudentAttribute::Email, self.email)?,
        })
    }

    /// Convert the record into a DynamoDB attribute map.
    pub fn into_item(self) -> HashMap<String, AttributeValue> {
        let mut map = student_key(self.student_id);
        map.insert("firstName".into(), AttributeValue::S(self.first_name));
        map.insert("lastName".into(), AttributeValue::S(self.last_name));
        map.insert("dateOfBirth".into(), AttributeValue::S(self.date_of_birth));
        map.insert(
            "classification".into(),
            AttributeValue::S(self.classification.as_str().to_owned()),
        );
        map.insert("email".into(), AttributeValue::S(self.email));
        map
    }
}

/// A student item exactly as stored. Rows written by other tools may carry
/// classifications outside [`Classification`], miss attributes or add new
/// ones; reads show whatever is there.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentItem(HashMap<String, AttributeValue>);

impl StudentItem {
    pub fn new(item: HashMap<String, AttributeValue>) -> Self {
        Self(item)
    }

    pub fn student_id(&self) -> Option<u64> {
        self.0
            .get(KEY_ATTRIBUTE)
            .and_then(|v| v.as_n().ok())
            .and_then(|n| n.parse().ok())
    }

    /// Key first, then the known attributes in schema order, then anything
    /// else by name.
    fn ordered(&self) -> Vec<(&str, &AttributeValue)> {
        let known: Vec<&str> = std::iter::once(KEY_ATTRIBUTE)
            .chain(StudentAttribute::ALL.iter().map(StudentAttribute::name))
            .collect();
        let mut extra: Vec<(&str, &AttributeValue)> = self
            .0
            .iter()
            .filter(|(name, _)| !known.contains(&name.as_str()))
            .map(|(name, value)| (name.as_str(), value))
            .collect();
        extra.sort_by_key(|(name, _)| *name);

        known
            .into_iter()
            .filter_map(|name| self.0.get(name).map(|value| (name, value)))
            .chain(extra)
            .collect()
    }

    /// One `name: value` line per stored attribute.
    pub fn attribute_lines(&self) -> Vec<String> {
        self.ordered()
            .into_iter()
            .map(|(name, value)| format!("{name}: {}", display_value(value)))
            .collect()
    }

    /// JSON object keyed by attribute name.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.ordered()
                .into_iter()
                .map(|(name, value)| (name.to_owned(), json_value(value)))
                .collect::<Map<String, Value>>(),
        )
    }
}

fn display_value(value: &AttributeValue) -> String {
    match value {
        AttributeValue::S(s) | AttributeValue::N(s) => s.clone(),
        AttributeValue::Bool(b) => b.to_string(),
        AttributeValue::Null(_) => "null".to_owned(),
        AttributeValue::Ss(items) | AttributeValue::Ns(items) => items.join(", "),
        other => json_value(other).to_string(),
    }
}

fn json_value(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => number_value(n),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Ss(items) => items.iter().cloned().map(Value::String).collect(),
        AttributeValue::Ns(items) => items.iter().map(String::as_str).map(number_value).collect(),
        AttributeValue::L(items) => items.iter().map(json_value).collect(),
        AttributeValue::M(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), json_value(v)))
                .collect(),
        ),
        _ => Value::Null,
    }
}

fn number_value(raw: &str) -> Value {
    raw.parse::<i64>()
        .map(Value::from)
        .or_else(|_| raw.parse::<f64>().map(Value::from))
        .unwrap_or_else(|_| Value::String(raw.to_owned()))
}
