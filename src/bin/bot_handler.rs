//! Lex V2 fulfillment entrypoint.
//!
//! The binary initialises logging, resolves the deployment environment, builds
//! the shared `AppContext` once, and then serves Lex code-hook events. Each
//! invocation runs inside a span carrying the Lambda request id.

use std::sync::Arc;

use database_bot_manager::{
    handle_bot_event, init_tracing, lex::LexEvent, runtime_env::DeploymentEnv, AppContext,
};
use lambda_http::lambda_runtime::{self, service_fn, Error as LambdaError, LambdaEvent};
use tracing::{info_span, Instrument};

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    init_tracing();

    let environment = DeploymentEnv::detect();
    let ctx = Arc::new(AppContext::from_env(&environment).await?);

    lambda_runtime::run(service_fn(move |event: LambdaEvent<LexEvent>| {
        let ctx = ctx.clone();
        async move {
            let (payload, context) = event.into_parts();
            let span = info_span!("lex_invocation", request_id = %context.request_id);
            handle_bot_event(ctx, payload).instrument(span).await
        }
    }))
    .await
}
