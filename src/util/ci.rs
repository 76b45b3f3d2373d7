//! CI environment detection from environment variables.

use std::collections::HashMap;

/// Facts about the CI job a run executes in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiInfo {
    /// `github_actions`, `gitlab_ci` or `generic`.
    pub provider: &'static str,
    pub workflow: Option<String>,
    pub run_id: Option<String>,
    pub runner_os: Option<String>,
}

/// Detects the CI system from its well-known variables.
pub fn detect_ci(env: &HashMap<String, String>) -> Option<CiInfo> {
    let get = |key: &str| env.get(key).filter(|v| !v.is_empty()).cloned();

    if env.get("GITHUB_ACTIONS").is_some_and(|v| v == "true") {
        return Some(CiInfo {
            provider: "github_actions",
            workflow: get("GITHUB_WORKFLOW"),
            run_id: get("GITHUB_RUN_ID"),
            runner_os: get("RUNNER_OS"),
        });
    }
    if env.get("GITLAB_CI").is_some_and(|v| v == "true") {
        return Some(CiInfo {
            provider: "gitlab_ci",
            workflow: get("CI_PROJECT_PATH"),
            run_id: get("CI_PIPELINE_ID"),
            runner_os: None,
        });
    }
    if env
        .get("CI")
        .is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1")
    {
        return Some(CiInfo {
            provider: "generic",
            workflow: None,
            run_id: None,
            runner_os: None,
        });
    }
    None
}
