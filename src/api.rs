use std::sync::Arc;

use lambda_http::{
    http::{Method, StatusCode},
    Body, Error as LambdaError, Request, RequestExt, RequestPayloadExt, Response,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use crate::{
    context::AppContext,
    error::{lambda_error, AppError},
    notify::OperationKind,
    student::{parse_student_id, StudentAttribute, StudentItem, StudentRecord, KEY_ATTRIBUTE},
};

const ALLOWED_METHODS: &str = "OPTIONS, GET, POST, PATCH, DELETE";

/// Top-level request dispatcher used by the Lambda runtime.
pub async fn handle_request(
    ctx: Arc<AppContext>,
    event: Request,
) -> Result<Response<Body>, LambdaError> {
    let origin = ctx.settings().allowed_origin().to_owned();
    let path = route_path(&event);
    info!(method = %event.method(), %path, "routing API request");

    match (event.method().clone(), path.as_str()) {
        (Method::OPTIONS, _) => Ok(preflight_response(&origin)),
        (Method::GET, "/students") => match student_id_param(&event) {
            Some(raw) => get_student(ctx.as_ref(), &origin, &raw).await,
            None => list_students(ctx.as_ref(), &origin).await,
        },
        (Method::POST, "/students") => create_student(ctx.as_ref(), &origin, event).await,
        (Method::PATCH, "/students") => update_student(ctx.as_ref(), &origin, event).await,
        (Method::DELETE, "/students") => delete_student(ctx.as_ref(), &origin, &event).await,
        (Method::GET | Method::POST, "/GetAllTableItems" | "/get-all-table-items") => {
            list_students(ctx.as_ref(), &origin).await
        }
        _ => Ok(json_response(
            &origin,
            StatusCode::NOT_FOUND,
            json!({ "message": "Unsupported route" }),
        )),
    }
}

/// Request path without the API Gateway stage prefix. REST proxy events put
/// the stage in front of the URI path (`/Test/students`); the raw path does not
/// have it. Requests built without an API Gateway context fall back to the URI.
fn route_path(event: &Request) -> String {
    let raw = event.raw_http_path();
    let path = if raw.is_empty() { event.uri().path() } else { raw };
    path.trim_end_matches('/').to_owned()
}

fn student_id_param(event: &Request) -> Option<String> {
    event
        .query_string_parameters_ref()
        .and_then(|qs| qs.first(KEY_ATTRIBUTE))
        .map(str::to_owned)
}

fn bad_request(origin: &str, err: AppError) -> Response<Body> {
    json_response(
        origin,
        StatusCode::BAD_REQUEST,
        json!({ "message": err.to_string() }),
    )
}

async fn get_student(
    ctx: &AppContext,
    origin: &str,
    raw_id: &str,
) -> Result<Response<Body>, LambdaError> {
    let student_id = match parse_student_id(raw_id) {
        Ok(id) => id,
        Err(err) => return Ok(bad_request(origin, err)),
    };

    match ctx.students().get(student_id).await.map_err(lambda_error)? {
        Some(item) => Ok(json_response(origin, StatusCode::OK, item.to_json())),
        None => Ok(json_response(
            origin,
            StatusCode::NOT_FOUND,
            json!({ "message": format!("Student with ID: {student_id} has not been found.") }),
        )),
    }
}

async fn list_students(ctx: &AppContext, origin: &str) -> Result<Response<Body>, LambdaError> {
    let students: Vec<_> = ctx
        .students()
        .scan()
        .await
        .map_err(lambda_error)?
        .iter()
        .map(StudentItem::to_json)
        .collect();
    Ok(json_response(
        origin,
        StatusCode::OK,
        json!({ "count": students.len(), "students": students }),
    ))
}

async fn create_student(
    ctx: &AppContext,
    origin: &str,
    event: Request,
) -> Result<Response<Body>, LambdaError> {
    let record = match event.payload::<StudentRecord>().unwrap_or_else(|e| {
        warn!("failed to parse student payload: {e:?}");
        None
    }) {
        Some(record) => record,
        None => {
            return Ok(json_response(
                origin,
                StatusCode::BAD_REQUEST,
                json!({ "message": "invalid JSON payload" }),
            ))
        }
    };
    let record = match record.normalized() {
        Ok(record) => record,
        Err(err) => return Ok(bad_request(origin, err)),
    };

    ctx.students().put(&record).await.map_err(lambda_error)?;
    let message = format!(
        "Student with ID: {} has been successfully added.",
        record.student_id
    );
    let confirmation = ctx
        .notifier()
        .notify(OperationKind::Insert, Some(record.student_id), &message)
        .await
        .map_err(lambda_error)?;

    Ok(json_response(
        origin,
        StatusCode::CREATED,
        json!({ "message": message, "confirmation": confirmation, "student": record }),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePayload {
    #[serde(rename = "studentID")]
    student_id: u64,
    attribute_name: String,
    new_attribute_value: String,
}

async fn update_student(
    ctx: &AppContext,
    origin: &str,
    event: Request,
) -> Result<Response<Body>, LambdaError> {
    let payload = match event.payload::<UpdatePayload>().unwrap_or_else(|e| {
        warn!("failed to parse update payload: {e:?}");
        None
    }) {
        Some(p) => p,
        None => {
            return Ok(json_response(
                origin,
                StatusCode::BAD_REQUEST,
                json!({ "message": "invalid JSON payload" }),
            ))
        }
    };

    let (attribute, value) = match payload
        .attribute_name
        .parse::<StudentAttribute>()
        .and_then(|attr| Ok((attr, attr.normalize_value(&payload.new_attribute_value)?)))
    {
        Ok(parsed) => parsed,
        Err(err) => return Ok(bad_request(origin, err)),
    };

    let student_id = payload.student_id;
    if !ctx
        .students()
        .update_attribute(student_id, attribute, &value)
        .await
        .map_err(lambda_error)?
    {
        return Ok(json_response(
            origin,
            StatusCode::NOT_FOUND,
            json!({ "message": format!("Student with ID: {student_id} has not been found.") }),
        ));
    }

    let message = format!(
        "The {} attribute's value of the student with id {student_id} has been successfully updated.",
        attribute.name()
    );
    let confirmation = ctx
        .notifier()
        .notify(OperationKind::Update, Some(student_id), &message)
        .await
        .map_err(lambda_error)?;

    Ok(json_response(
        origin,
        StatusCode::OK,
        json!({ "message": message, "confirmation": confirmation }),
    ))
}

async fn delete_student(
    ctx: &AppContext,
    origin: &str,
    event: &Request,
) -> Result<Response<Body>, LambdaError> {
    let student_id = match student_id_param(event)
        .ok_or_else(|| AppError::InvalidRecord(format!("{KEY_ATTRIBUTE} query parameter is required")))
        .and_then(|raw| parse_student_id(&raw))
    {
        Ok(id) => id,
        Err(err) => return Ok(bad_request(origin, err)),
    };

    if !ctx.students().remove(student_id).await.map_err(lambda_error)? {
        return Ok(json_response(
            origin,
            StatusCode::NOT_FOUND,
            json!({ "message": format!("Student with ID: {student_id} has not been found.") }),
        ));
    }

    let message = format!("Student with ID: {student_id} has been successfully removed.");
    let confirmation = ctx
        .notifier()
        .notify(OperationKind::Remove, Some(student_id), &message)
        .await
        .map_err(lambda_error)?;

    Ok(json_response(
        origin,
        StatusCode::OK,
        json!({ "message": message, "confirmation": confirmation }),
    ))
}

fn cors_headers(
    builder: lambda_http::http::response::Builder,
    origin: &str,
) -> lambda_http::http::response::Builder {
    builder
        .header("Access-Control-Allow-Origin", origin)
        .header("Access-Control-Allow-Headers", "Content-Type")
        .header("Access-Control-Allow-Methods", ALLOWED_METHODS)
        .header("Access-Control-Allow-Credentials", "true")
}

fn preflight_response(origin: &str) -> Response<Body> {
    cors_headers(Response::builder(), origin)
        .status(StatusCode::OK)
        .header("content-type", "text/plain")
        .body(Body::Text("CORS preflight request".into()))
        .expect("failed to build response")
}

fn json_response<T: Serialize>(origin: &str, status: StatusCode, value: T) -> Response<Body> {
    let body = serde_json::to_string(&value).unwrap_or_else(|_| "{}".into());

    if status.is_server_error() {
        error!(
            http_status = status.as_u16(),
            body = %body,
            "returning server error response"
        );
    } else if status.is_client_error() {
        warn!(
            http_status = status.as_u16(),
            body = %body,
            "returning client error response"
        );
    }

    cors_headers(Response::builder(), origin)
        .status(status)
        .header("content-type", "application/json")
        .body(Body::Text(body))
        .expect("failed to build response")
}
