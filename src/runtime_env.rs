//! Deployment stage detection.
//!
//! The stage name picks the default students table (`Students_<stage>`) and
//! whether AWS resources are bootstrapped at cold start.

use std::{env, fmt};

const STAGE_VAR: &str = "ENVIRONMENT_NAME";
const LOCAL_STAGE: &str = "Local";
const REMOTE_STAGE: &str = "Prod";

/// Set by `sam local`, `cargo lambda watch` and LocalStack.
const LOCAL_HINTS: [&str; 3] = ["AWS_SAM_LOCAL", "CARGO_LAMBDA_HTTP_PORT", "LOCALSTACK_HOSTNAME"];
/// Set by the Lambda service itself. `AWS_REGION` is left out since
/// developers commonly export it.
const AWS_HINTS: [&str; 3] = [
    "AWS_EXECUTION_ENV",
    "AWS_LAMBDA_FUNCTION_NAME",
    "LAMBDA_TASK_ROOT",
];

/// How the stage name was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    ExplicitVar,
    LocalTooling,
    AwsRuntime,
    DefaultLocal,
}

impl fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ResolutionSource::ExplicitVar => "explicit ENVIRONMENT_NAME",
            ResolutionSource::LocalTooling => "local tooling hint",
            ResolutionSource::AwsRuntime => "Lambda runtime hint",
            ResolutionSource::DefaultLocal => "no hints, assuming Local",
        };
        f.write_str(label)
    }
}

/// Stage the handlers run in (`Prod`, `Staging`, `Local`, ...).
#[derive(Debug, Clone)]
pub struct DeploymentEnv {
    name: String,
    source: ResolutionSource,
}

impl DeploymentEnv {
    /// Resolve the stage from the process environment.
    pub fn detect() -> Self {
        Self::detect_with(|key| env::var(key).ok())
    }

    /// Resolve the stage using `lookup` for variable access. An explicit,
    /// non-blank `ENVIRONMENT_NAME` wins; local tooling beats Lambda hints.
    pub fn detect_with(lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(name) = lookup(STAGE_VAR)
            .map(|raw| raw.trim().to_owned())
            .filter(|name| !name.is_empty())
        {
            return Self {
                name,
                source: ResolutionSource::ExplicitVar,
            };
        }

        let any_set = |keys: &[&str]| keys.iter().any(|key| lookup(key).is_some());
        let (name, source) = if any_set(&LOCAL_HINTS) {
            (LOCAL_STAGE, ResolutionSource::LocalTooling)
        } else if any_set(&AWS_HINTS) {
            (REMOTE_STAGE, ResolutionSource::AwsRuntime)
        } else {
            (LOCAL_STAGE, ResolutionSource::DefaultLocal)
        };
        Self {
            name: name.to_owned(),
            source,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_local(&self) -> bool {
        self.name.eq_ignore_ascii_case(LOCAL_STAGE)
    }

    /// Students table used when `DYNAMO_DB_TABLE_NAME` is not set.
    pub fn table_name(&self) -> String {
        format!("Students_{}", self.name)
    }

    pub fn source(&self) -> ResolutionSource {
        self.source
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use super::*;

    /// Remove every variable stage detection looks at.
    pub(crate) fn clear_env_vars() {
        for key in std::iter::once(STAGE_VAR)
            .chain(LOCAL_HINTS)
            .chain(AWS_HINTS)
        {
            std::env::remove_var(key);
        }
    }

    fn detect(vars: &[(&str, &str)]) -> DeploymentEnv {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DeploymentEnv::detect_with(|key| vars.get(key).cloned())
    }

    #[test]
    fn explicit_override_wins() {
        let env = detect(&[("ENVIRONMENT_NAME", " Staging "), ("AWS_SAM_LOCAL", "1")]);
        assert_eq!(env.name(), "Staging");
        assert_eq!(env.table_name(), "Students_Staging");
        assert_eq!(env.source(), ResolutionSource::ExplicitVar);
        assert!(!env.is_local());
    }

    #[test]
    fn local_tooling_beats_lambda_hints() {
        let env = detect(&[
            ("CARGO_LAMBDA_HTTP_PORT", "9000"),
            ("AWS_LAMBDA_FUNCTION_NAME", "bot-handler"),
        ]);
        assert_eq!(env.table_name(), "Students_Local");
        assert_eq!(env.source(), ResolutionSource::LocalTooling);
        assert!(env.is_local());
    }

    #[test]
    fn lambda_runtime_means_prod() {
        let env = detect(&[("AWS_EXECUTION_ENV", "AWS_Lambda_rust")]);
        assert_eq!(env.name(), "Prod");
        assert_eq!(env.source(), ResolutionSource::AwsRuntime);
    }

    #[test]
    fn blank_override_falls_back_to_local() {
        let env = detect(&[("ENVIRONMENT_NAME", "   "), ("AWS_REGION", "eu-west-1")]);
        assert_eq!(env.name(), "Local");
        assert_eq!(env.source(), ResolutionSource::DefaultLocal);
    }
}
