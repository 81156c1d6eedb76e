//! Lex V2 intent router for the students table.

use std::sync::Arc;

use lambda_http::Error as LambdaError;
use tracing::{info, warn};

use crate::{
    context::AppContext,
    error::{lambda_error, AppError},
    lex::{LexEvent, LexResponse},
    notify::OperationKind,
    student::{parse_student_id, StudentAttribute, StudentRecord, KEY_ATTRIBUTE},
};

/// Buttons offered on the greeting card.
pub const ACTION_BUTTONS: [&str; 4] = ["Get", "Insert", "Remove", "Update"];

const GREETINGS: [&str; 6] = [
    "hi",
    "hello",
    "hey",
    "good morning",
    "good afternoon",
    "good evening",
];
const TABLE_QUESTION: &str = "What action do you want to perform on the \"Students\" table?";
const ANOTHER_ACTION_PROMPT: &str =
    "Do you want to perform another operation on the \"Students\" table?";
const INVALID_UPDATE: &str =
    "An invalid student ID or attribute name was entered. Please try again.";

/// Intents the bot is configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotIntent {
    Greeting,
    GetStudent,
    InsertStudent,
    RemoveStudent,
    UpdateStudent,
    EndOfConversation,
}

impl BotIntent {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Greeting" => Some(BotIntent::Greeting),
            "GetStudent" => Some(BotIntent::GetStudent),
            "InsertStudent" => Some(BotIntent::InsertStudent),
            "RemoveStudent" => Some(BotIntent::RemoveStudent),
            "UpdateStudent" => Some(BotIntent::UpdateStudent),
            "EndOfConversation" | "AnotherActionRejected" => Some(BotIntent::EndOfConversation),
            _ => None,
        }
    }
}

/// Route one Lex V2 event to its table operation and build the reply.
pub async fn handle_bot_event(
    ctx: Arc<AppContext>,
    event: LexEvent,
) -> Result<LexResponse, LambdaError> {
    let intent_name = event.intent_name().unwrap_or_default().to_owned();
    let intent = event.session_state.intent.as_ref();
    info!(
        intent = %intent_name,
        intent_state = ?intent.and_then(|i| i.state.as_deref()),
        confirmation_state = ?intent.and_then(|i| i.confirmation_state.as_deref()),
        session_id = ?event.session_id,
        invocation_source = ?event.invocation_source,
        "routing Lex intent"
    );

    let settings = ctx.settings();
    let response = LexResponse::elicit_intent(event.session_attributes().cloned());
    match BotIntent::from_name(&intent_name) {
        Some(BotIntent::Greeting) => Ok(response
            .plain_text(greeting_message(
                &event.input_transcript,
                settings.wake_word(),
                settings.admin_username(),
            ))
            .response_card(" ", &ACTION_BUTTONS)),
        Some(BotIntent::GetStudent) => get_student(ctx.as_ref(), &event, response).await,
        Some(BotIntent::InsertStudent) => insert_student(ctx.as_ref(), &event, response).await,
        Some(BotIntent::RemoveStudent) => remove_student(ctx.as_ref(), &event, response).await,
        Some(BotIntent::UpdateStudent) => update_student(ctx.as_ref(), &event, response).await,
        Some(BotIntent::EndOfConversation) => Ok(response.plain_text(format!(
            "Okay, see you next time, {}!",
            settings.admin_username()
        ))),
        None => {
            warn!(intent = %intent_name, "unsupported intent");
            let subject = if intent_name.is_empty() {
                "that"
            } else {
                intent_name.as_str()
            };
            Ok(response
                .plain_text(format!("Sorry, I can't help with {subject} yet."))
                .response_card(" ", &ACTION_BUTTONS))
        }
    }
}

/// Greeting reply. Echoes a recognised greeting (with the wake word removed)
/// back to the admin before asking for an action.
pub fn greeting_message(transcript: &str, wake_word: &str, admin: &str) -> String {
    let spoken = strip_wake_word(transcript, wake_word);
    if GREETINGS.contains(&spoken.to_ascii_lowercase().as_str()) {
        format!("{}, {admin}. {TABLE_QUESTION}", capitalize(&spoken))
    } else {
        TABLE_QUESTION.to_owned()
    }
}

/// `"Hi, Nova, how are you"` -> `"Hi"`. A transcript that is only the wake
/// word is returned unchanged.
fn strip_wake_word(transcript: &str, wake_word: &str) -> String {
    let trimmed = transcript.trim();
    if wake_word.is_empty() || trimmed.eq_ignore_ascii_case(wake_word) {
        return trimmed.to_owned();
    }
    let lowered = trimmed.to_ascii_lowercase();
    let before = match lowered.find(&wake_word.to_ascii_lowercase()) {
        Some(idx) => &trimmed[..idx],
        None => trimmed,
    };
    before
        .trim_end_matches(|c: char| c == ',' || c.is_whitespace())
        .to_owned()
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn required_slot<'e>(event: &'e LexEvent, slot: &str) -> Result<&'e str, AppError> {
    event
        .slot_value(slot)
        .ok_or_else(|| AppError::InvalidRecord(format!("Please provide a value for {slot}.")))
}

fn student_id_slot(event: &LexEvent) -> Result<u64, AppError> {
    parse_student_id(required_slot(event, "StudentID")?)
}

/// Reply for input rejected before the table was touched.
fn invalid_input(response: LexResponse, err: AppError) -> LexResponse {
    info!(reason = %err, "rejecting bot input");
    response.plain_text(err.to_string()).plain_text(ANOTHER_ACTION_PROMPT)
}

/// Run the notifier and finish the reply with its confirmation and the
/// follow-up prompt.
async fn report(
    ctx: &AppContext,
    response: LexResponse,
    mut messages: Vec<String>,
    kind: OperationKind,
    student_id: u64,
    main_message: &str,
) -> Result<LexResponse, LambdaError> {
    if let Some(confirmation) = ctx
        .notifier()
        .notify(kind, Some(student_id), main_message)
        .await
        .map_err(lambda_error)?
    {
        messages.push(confirmation);
    }
    messages.push(ANOTHER_ACTION_PROMPT.to_owned());
    Ok(response.plain_texts(messages))
}

async fn get_student(
    ctx: &AppContext,
    event: &LexEvent,
    response: LexResponse,
) -> Result<LexResponse, LambdaError> {
    let student_id = match student_id_slot(event) {
        Ok(id) => id,
        Err(err) => return Ok(invalid_input(response, err)),
    };

    match ctx.students().get(student_id).await.map_err(lambda_error)? {
        Some(item) => {
            let main = format!("Student with ID {student_id} was successfully retrieved.");
            let mut messages = vec!["Amazon DynamoDB table attributes:".to_owned()];
            messages.extend(item.attribute_lines());
            messages.push(main.clone());
            report(ctx, response, messages, OperationKind::Get, student_id, &main).await
        }
        None => {
            let main = format!("No item found with the key {KEY_ATTRIBUTE}!");
            report(
                ctx,
                response,
                vec![main.clone()],
                OperationKind::Get,
                student_id,
                &main,
            )
            .await
        }
    }
}

async fn insert_student(
    ctx: &AppContext,
    event: &LexEvent,
    response: LexResponse,
) -> Result<LexResponse, LambdaError> {
    let record = match record_from_slots(event) {
        Ok(record) => record,
        Err(err) => return Ok(invalid_input(response, err)),
    };

    ctx.students().put(&record).await.map_err(lambda_error)?;
    let main = format!(
        "Student with ID: {} has been successfully added.",
        record.student_id
    );
    report(
        ctx,
        response,
        vec![main.clone()],
        OperationKind::Insert,
        record.student_id,
        &main,
    )
    .await
}

fn record_from_slots(event: &LexEvent) -> Result<StudentRecord, AppError> {
    StudentRecord::from_fields(
        required_slot(event, "StudentID")?,
        required_slot(event, "FirstName")?,
        required_slot(event, "LastName")?,
        required_slot(event, "DateOfBirth")?,
        required_slot(event, "Classification")?,
        required_slot(event, "Email")?,
    )
}

async fn remove_student(
    ctx: &AppContext,
    event: &LexEvent,
    response: LexResponse,
) -> Result<LexResponse, LambdaError> {
    let student_id = match student_id_slot(event) {
        Ok(id) => id,
        Err(err) => return Ok(invalid_input(response, err)),
    };

    let main = if ctx.students().remove(student_id).await.map_err(lambda_error)? {
        format!("Student with ID: {student_id} has been successfully removed.")
    } else {
        format!("Student with ID: {student_id} has not been found.")
    };
    report(
        ctx,
        response,
        vec![main.clone()],
        OperationKind::Remove,
        student_id,
        &main,
    )
    .await
}

async fn update_student(
    ctx: &AppContext,
    event: &LexEvent,
    response: LexResponse,
) -> Result<LexResponse, LambdaError> {
    let parsed = student_id_slot(event).and_then(|id| {
        let attribute: StudentAttribute = required_slot(event, "AttributeName")?.parse()?;
        Ok((id, attribute))
    });
    let (student_id, attribute) = match parsed {
        Ok(parsed) => parsed,
        Err(err) => {
            info!(reason = %err, "rejecting update");
            return Ok(response
                .plain_text(INVALID_UPDATE)
                .plain_text(ANOTHER_ACTION_PROMPT));
        }
    };
    let value = match required_slot(event, "NewAttributeValue")
        .and_then(|raw| attribute.normalize_value(raw))
    {
        Ok(value) => value,
        Err(err) => return Ok(invalid_input(response, err)),
    };

    let updated = ctx
        .students()
        .update_attribute(student_id, attribute, &value)
        .await
        .map_err(lambda_error)?;
    let main = if updated {
        format!(
            "The {} attribute's value of the student with id {student_id} has been successfully updated.",
            attribute.name()
        )
    } else {
        INVALID_UPDATE.to_owned()
    };
    report(
        ctx,
        response,
        vec![main.clone()],
        OperationKind::Update,
        student_id,
        &main,
    )
    .await
}
