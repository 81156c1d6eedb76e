use lambda_http::Error as LambdaError;
use thiserror::Error;
use tracing::error;

/// Internal application errors surfaced while handling an invocation.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("dynamodb error: {0}")]
    Dynamo(String),
    #[error("sns error: {0}")]
    Notification(String),
    #[error("s3 error: {0}")]
    Audit(String),
    /// User supplied data that cannot become a student record. The message is
    /// shown to the user as-is.
    #[error("{0}")]
    InvalidRecord(String),
}

impl AppError {
    /// Short classification string used for logging.
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Dynamo(_) => "dynamodb",
            AppError::Notification(_) => "sns",
            AppError::Audit(_) => "s3",
            AppError::InvalidRecord(_) => "validation",
        }
    }
}

/// Convert an internal application error into the Lambda runtime error type.
pub fn lambda_error(err: AppError) -> LambdaError {
    let category = err.category();
    let message = err.to_string();
    error!(category = %category, error = ?err, message = %message, "unhandled application error forwarded to Lambda runtime");
    LambdaError::from(message)
}
