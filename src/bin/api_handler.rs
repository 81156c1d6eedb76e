//! API Gateway entrypoint.
//!
//! Serves the web front end: student lookups, inserts, single-attribute
//! updates, removals and the full-table listing, each answered with CORS
//! headers for the configured app URL.

use std::sync::Arc;

use database_bot_manager::{handle_request, init_tracing, runtime_env::DeploymentEnv, AppContext};
use lambda_http::{run, service_fn, Error as LambdaError};

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    init_tracing();

    let environment = DeploymentEnv::detect();
    let ctx = Arc::new(AppContext::from_env(&environment).await?);

    run(service_fn(move |event| {
        let ctx = ctx.clone();
        async move { handle_request(ctx, event).await }
    }))
    .await
}
