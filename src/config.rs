use std::path::Path;

use serde::Deserialize;

use crate::conclusion::SuccessSet;
use crate::error::{AppError, Result};
use crate::inputs::{parse_name_list, parse_success_conclusions};
use crate::platform::types::RepoRef;
use crate::poll::PollConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub github: GitHubConfig,
    pub target: TargetConfig,
    #[serde(default)]
    pub poll: PollSettings,
    #[serde(default = "default_success_conclusions")]
    pub success_conclusions: String,
    #[serde(default)]
    pub cancel_on_failure: bool,
}

#[derive(Deserialize, Clone, Default)]
pub struct GitHubConfig {
    #[serde(default)]
    pub token: String,
    /// Base URL for GitHub Enterprise Server, e.g. `https://ghe.example.com/api/v3`.
    pub api_url: Option<String>,
}

// Manual Debug impl to avoid leaking the token
impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TargetConfig {
    pub owner: String,
    pub repo: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub check_name: Option<String>,
    pub workflow_name: Option<String>,
    /// Workflow run to cancel when `cancel_on_failure` is set.
    pub run_id: Option<u64>,
    /// `owner/repo` that `run_id` belongs to. This is the repository running
    /// the tool, which may differ from the one being polled.
    pub run_repository: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollSettings {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
    #[serde(default = "default_warmup_seconds")]
    pub warmup_seconds: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            interval_seconds: default_interval_seconds(),
            warmup_seconds: default_warmup_seconds(),
        }
    }
}

fn default_success_conclusions() -> String {
    "success".to_string()
}

fn default_timeout_seconds() -> u64 {
    600
}

fn default_interval_seconds() -> u64 {
    10
}

fn default_warmup_seconds() -> u64 {
    60
}

/// Values given on the command line. They take precedence over every other source.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub token: Option<String>,
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub git_ref: Option<String>,
    pub check_name: Option<String>,
    pub workflow_name: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub interval_seconds: Option<u64>,
    pub warmup_seconds: Option<u64>,
    pub success_conclusions: Option<String>,
    pub cancel_on_failure: Option<bool>,
    pub run_id: Option<u64>,
    pub run_repository: Option<String>,
}

/// What to poll for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetKind {
    Checks(Vec<String>),
    Workflows(Vec<String>),
}

/// The workflow run this invocation executes in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentRun {
    pub owner: String,
    pub repo: String,
    pub run_id: u64,
}

/// Validated settings for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub target: RepoRef,
    pub kind: TargetKind,
    pub poll: PollConfig,
    pub success: SuccessSet,
    pub cancel_on_failure: bool,
    /// Run to cancel on failure, when both its id and repository are known.
    pub current_run: Option<CurrentRun>,
}

impl AppConfig {
    pub fn load(config_path: Option<&str>, overrides: &Overrides) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Lowest priority: what a GitHub Actions runner exposes
        for (key, value) in actions_defaults() {
            builder = builder.set_default(key, value)?;
        }

        // Load from file if specified
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            builder = builder.add_source(config::File::with_name("runwatch").required(false));
        }

        // Environment variable overrides with RUNWATCH_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("RUNWATCH")
                .separator("__")
                .try_parsing(true),
        );

        builder = builder
            .set_override_option("github.token", overrides.token.clone())?
            .set_override_option("target.owner", overrides.owner.clone())?
            .set_override_option("target.repo", overrides.repo.clone())?
            .set_override_option("target.ref", overrides.git_ref.clone())?
            .set_override_option("target.check_name", overrides.check_name.clone())?
            .set_override_option("target.workflow_name", overrides.workflow_name.clone())?
            .set_override_option("target.run_id", overrides.run_id)?
            .set_override_option("target.run_repository", overrides.run_repository.clone())?
            .set_override_option("poll.timeout_seconds", overrides.timeout_seconds)?
            .set_override_option("poll.interval_seconds", overrides.interval_seconds)?
            .set_override_option("poll.warmup_seconds", overrides.warmup_seconds)?
            .set_override_option("success_conclusions", overrides.success_conclusions.clone())?
            .set_override_option("cancel_on_failure", overrides.cancel_on_failure)?;

        let config = builder.build()?;

        config
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))
    }

    /// Validate the configuration before any request is made.
    pub fn settings(&self) -> Result<Settings> {
        let kind = self.target_kind()?;
        let success = parse_success_conclusions(&self.success_conclusions)?;

        let poll = &self.poll;
        if poll.interval_seconds == 0 {
            return Err(AppError::Config(
                "poll.interval_seconds must be greater than zero".to_string(),
            ));
        }
        if poll.warmup_seconds > poll.timeout_seconds {
            return Err(AppError::Config(format!(
                "poll.warmup_seconds ({}) cannot exceed poll.timeout_seconds ({})",
                poll.warmup_seconds, poll.timeout_seconds
            )));
        }

        for (field, value) in [
            ("target.owner", &self.target.owner),
            ("target.repo", &self.target.repo),
            ("target.ref", &self.target.git_ref),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Config(format!("{field} must not be empty")));
            }
        }

        let current_run = self.current_run()?;

        Ok(Settings {
            target: RepoRef {
                owner: self.target.owner.trim().to_string(),
                repo: self.target.repo.trim().to_string(),
                git_ref: self.target.git_ref.trim().to_string(),
            },
            kind,
            poll: PollConfig::from_secs(poll.timeout_seconds, poll.warmup_seconds, poll.interval_seconds),
            success,
            cancel_on_failure: self.cancel_on_failure,
            current_run,
        })
    }

    fn current_run(&self) -> Result<Option<CurrentRun>> {
        let Some(run_id) = self.target.run_id else {
            return Ok(None);
        };
        let Some(full_name) = self
            .target
            .run_repository
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
        else {
            return Ok(None);
        };

        match full_name.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok(Some(CurrentRun {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                    run_id,
                }))
            }
            _ => Err(AppError::Config(format!(
                "target.run_repository must be 'owner/repo', got '{full_name}'"
            ))),
        }
    }

    fn target_kind(&self) -> Result<TargetKind> {
        let provided = |value: &Option<String>| {
            value
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .map(str::to_string)
        };

        match (
            provided(&self.target.check_name),
            provided(&self.target.workflow_name),
        ) {
            (None, None) => Err(AppError::Config(
                "Either 'checkName' xor 'workflowName' must be provided".to_string(),
            )),
            (Some(_), Some(_)) => Err(AppError::Config(
                "'checkName' and 'workflowName' cannot both be provided".to_string(),
            )),
            (Some(check_name), None) => Ok(TargetKind::Checks(parse_name_list(
                &check_name,
                "checkName",
            )?)),
            (None, Some(workflow_name)) => Ok(TargetKind::Workflows(parse_name_list(
                &workflow_name,
                "workflowName",
            )?)),
        }
    }
}

/// Defaults taken from the GitHub Actions runner environment.
fn actions_defaults() -> Vec<(&'static str, String)> {
    let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
    let mut defaults = Vec::new();

    if let Some((owner, repo)) = var("GITHUB_REPOSITORY")
        .as_deref()
        .and_then(|full| full.split_once('/'))
    {
        defaults.push(("target.owner", owner.to_string()));
        defaults.push(("target.repo", repo.to_string()));
        defaults.push(("target.run_repository", format!("{owner}/{repo}")));
    }
    let head_sha = var("GITHUB_EVENT_PATH").and_then(|path| pull_request_head_sha(Path::new(&path)));
    if let Some(sha) = head_sha.or_else(|| var("GITHUB_SHA")) {
        defaults.push(("target.ref", sha));
    }
    if let Some(run_id) = var("GITHUB_RUN_ID") {
        defaults.push(("target.run_id", run_id));
    }
    if let Some(token) = var("GITHUB_TOKEN") {
        defaults.push(("github.token", token));
    }

    defaults
}

/// The parts of a GitHub Actions event payload used for defaults.
#[derive(Debug, Deserialize)]
struct EventPayload {
    pull_request: Option<PullRequestEvent>,
}

#[derive(Debug, Deserialize)]
struct PullRequestEvent {
    head: PullRequestHead,
}

#[derive(Debug, Deserialize)]
struct PullRequestHead {
    sha: String,
}

/// Head commit of the pull request that triggered the workflow.
///
/// On pull request events `GITHUB_SHA` is the merge commit, which has no
/// check runs of its own.
fn pull_request_head_sha(event_path: &Path) -> Option<String> {
    let contents = match std::fs::read_to_string(event_path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::debug!(path = %event_path.display(), error = %e, "Cannot read event payload");
            return None;
        }
    };

    match serde_json::from_str::<EventPayload>(&contents) {
        Ok(event) => event
            .pull_request
            .map(|pr| pr.head.sha)
            .filter(|sha| !sha.is_empty()),
        Err(e) => {
            tracing::warn!(path = %event_path.display(), error = %e, "Cannot parse event payload");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use super::*;
    use crate::conclusion::Conclusion;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn load(contents: &str, overrides: &Overrides) -> Result<AppConfig> {
        let file = write_config(contents);
        AppConfig::load(file.path().to_str(), overrides)
    }

    const BASE: &str = r#"
        success_conclusions = "success|skipped"

        [github]
        token = "ghp_test"

        [target]
        owner = "testOrg"
        repo = "testRepo"
        ref = "abcd"
        check_name = "build"

        [poll]
        timeout_seconds = 30
        interval_seconds = 5
        warmup_seconds = 10
    "#;

    #[test]
    fn test_load_from_file() {
        let config = load(BASE, &Overrides::default()).unwrap();
        let settings = config.settings().unwrap();

        assert_eq!(settings.target.to_string(), "testOrg/testRepo@abcd");
        assert_eq!(settings.kind, TargetKind::Checks(vec!["build".to_string()]));
        assert_eq!(settings.poll.timeout, Duration::from_secs(30));
        assert_eq!(settings.poll.interval, Duration::from_secs(5));
        assert_eq!(settings.poll.warmup, Duration::from_secs(10));
        assert!(settings.success.contains(&Conclusion::Skipped));
        assert!(!settings.cancel_on_failure);
    }

    #[test]
    fn test_overrides_take_precedence() {
        let overrides = Overrides {
            git_ref: Some("main".to_string()),
            timeout_seconds: Some(120),
            cancel_on_failure: Some(true),
            run_id: Some(42),
            run_repository: Some("testOrg/testRepo".to_string()),
            ..Overrides::default()
        };
        let settings = load(BASE, &overrides).unwrap().settings().unwrap();

        assert_eq!(settings.target.git_ref, "main");
        assert_eq!(settings.poll.timeout, Duration::from_secs(120));
        assert!(settings.cancel_on_failure);
        assert_eq!(settings.current_run.map(|run| run.run_id), Some(42));
    }

    #[test]
    fn test_current_run_keeps_its_own_repository() {
        let overrides = Overrides {
            owner: Some("other".to_string()),
            repo: Some("lib".to_string()),
            run_id: Some(7),
            run_repository: Some("me/app".to_string()),
            ..Overrides::default()
        };
        let settings = load(BASE, &overrides).unwrap().settings().unwrap();

        assert_eq!(settings.target.to_string(), "other/lib@abcd");
        assert_eq!(
            settings.current_run,
            Some(CurrentRun {
                owner: "me".to_string(),
                repo: "app".to_string(),
                run_id: 7,
            })
        );
    }

    #[test]
    fn test_current_run_needs_its_repository() {
        let overrides = Overrides {
            run_id: Some(7),
            run_repository: Some(" ".to_string()),
            ..Overrides::default()
        };
        let settings = load(BASE, &overrides).unwrap().settings().unwrap();
        assert_eq!(settings.current_run, None);
    }

    #[test]
    fn test_malformed_run_repository_rejected() {
        let overrides = Overrides {
            run_id: Some(7),
            run_repository: Some("just-a-name".to_string()),
            ..Overrides::default()
        };
        let err = load(BASE, &overrides).unwrap().settings().unwrap_err();
        assert!(err.to_string().contains("run_repository"));
    }

    fn write_event(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_pull_request_head_sha_is_read_from_event() {
        let event = write_event(
            r#"{"action": "synchronize", "pull_request": {"number": 3, "head": {"ref": "topic", "sha": "f00dbabe"}}}"#,
        );
        assert_eq!(pull_request_head_sha(event.path()), Some("f00dbabe".to_string()));
    }

    #[test]
    fn test_push_event_has_no_head_sha() {
        let event = write_event(r#"{"ref": "refs/heads/main", "after": "abcd"}"#);
        assert_eq!(pull_request_head_sha(event.path()), None);
    }

    #[test]
    fn test_unreadable_event_has_no_head_sha() {
        let event = write_event("not json");
        assert_eq!(pull_request_head_sha(event.path()), None);
        assert_eq!(pull_request_head_sha(Path::new("/nonexistent/event.json")), None);
    }

    #[test]
    fn test_poll_defaults() {
        let contents = r#"
            [target]
            owner = "o"
            repo = "r"
            ref = "sha"
            workflow_name = "[build, deploy]"
        "#;
        let settings = load(contents, &Overrides::default()).unwrap().settings().unwrap();

        assert_eq!(settings.poll, PollConfig::from_secs(600, 60, 10));
        assert_eq!(
            settings.kind,
            TargetKind::Workflows(vec!["build".to_string(), "deploy".to_string()])
        );
        assert!(settings.success.contains(&Conclusion::Success));
    }

    #[test]
    fn test_token_is_redacted() {
        let config = load(BASE, &Overrides::default()).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("ghp_test"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_check_and_workflow_are_exclusive() {
        let overrides = Overrides {
            workflow_name: Some("deploy".to_string()),
            ..Overrides::default()
        };
        let err = load(BASE, &overrides).unwrap().settings().unwrap_err();
        assert!(err.to_string().contains("cannot both be provided"));
    }

    #[test]
    fn test_target_is_required() {
        let overrides = Overrides {
            check_name: Some("  ".to_string()),
            ..Overrides::default()
        };
        let err = load(BASE, &overrides).unwrap().settings().unwrap_err();
        assert!(err.to_string().contains("xor"));
    }

    #[test]
    fn test_invalid_success_conclusions_rejected() {
        let overrides = Overrides {
            success_conclusions: Some("success|green".to_string()),
            ..Overrides::default()
        };
        let err = load(BASE, &overrides).unwrap().settings().unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_warmup_cannot_exceed_timeout() {
        let overrides = Overrides {
            warmup_seconds: Some(31),
            ..Overrides::default()
        };
        assert!(load(BASE, &overrides).unwrap().settings().is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let overrides = Overrides {
            interval_seconds: Some(0),
            ..Overrides::default()
        };
        assert!(load(BASE, &overrides).unwrap().settings().is_err());
    }
}
