pub mod runtime_env;

pub mod api;
pub mod bootstrap;
pub mod bot;
pub mod config;
mod context;
mod error;
pub mod lex;
pub mod notify;
pub mod store;
pub mod student;
#[cfg(test)]
mod testing;

pub use api::handle_request;
pub use bot::handle_bot_event;
pub use context::AppContext;
pub use error::AppError;

/// JSON logs without target or timestamp; CloudWatch adds the ingestion time.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .without_time()
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .init();
}
