//! Decide whether an inbound event is forwarded, where to, and with which fields.
use std::str::FromStr;

use thiserror::Error;

use crate::event::{Provider, RepositoryEvent, ACTION_CLOSED, ACTION_OPENED, ACTION_PUBLISHED};
use crate::normalized::NormalizedEvent;

/// Event listener URLs, as one of the two supported layouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destinations {
    /// One listener per lifecycle step. Any subset may be configured.
    Lifecycle {
        pr_opened: Option<String>,
        pr_merged: Option<String>,
        prereleased: Option<String>,
        released: Option<String>,
    },
    /// One listener per deployment environment: merges go to dev, prereleases to uat and
    /// releases to prod. Opened pull requests are never forwarded.
    Environments {
        dev: String,
        uat: String,
        prod: String,
    },
}

/// Everything the classifier needs, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingConfig {
    pub provider: Provider,
    pub destinations: Destinations,
    pub webhook_secret: Option<String>,
    pub infra_mapping: Option<InfraRepoMapping>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("invalid webhook secret")]
    InvalidSecret,
    #[error("infra repo not found for prefix '{prefix}' (repository {repo_name})")]
    InfraRepoNotFound { prefix: String, repo_name: String },
}

/// Outcome of classifying an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Forward {
        event: NormalizedEvent,
        destination: String,
    },
    /// No rule matched: nothing to send, and nothing went wrong.
    Noop,
}

/// Which mapping a matched rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    PullRequestOpened,
    PullRequestMerged,
    Prerelease,
    Release,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::PullRequestOpened => "pr_opened",
            Rule::PullRequestMerged => "pr_merged",
            Rule::Prerelease => "prerelease",
            Rule::Release => "release",
        }
    }

    fn map<E: RepositoryEvent>(&self, event: &E, infra_repo: Option<String>) -> NormalizedEvent {
        let repository = event.repository();

        match self {
            Rule::PullRequestOpened | Rule::PullRequestMerged => {
                let pull_request = event.pull_request();
                let repo_hash = if *self == Rule::PullRequestOpened {
                    pull_request.head_sha
                } else {
                    pull_request.merge_commit_sha
                };

                NormalizedEvent {
                    repo_url: repository.clone_url.to_owned(),
                    repo_name: repository.name.to_owned(),
                    repo_hash: repo_hash.to_owned(),
                    actor_name: pull_request.author.login.to_owned(),
                    actor_email: pull_request.author.email.map(str::to_owned),
                    message: pull_request.title.to_owned(),
                    tag_version: None,
                    infra_repo,
                }
            }
            Rule::Prerelease | Rule::Release => {
                let release = event.release();

                NormalizedEvent {
                    repo_url: repository.clone_url.to_owned(),
                    repo_name: repository.name.to_owned(),
                    repo_hash: release.target_commitish.to_owned(),
                    actor_name: release.author.login.to_owned(),
                    actor_email: release.author.email.map(str::to_owned),
                    message: format!("{} {}", release.name, release.body),
                    tag_version: Some(release.tag_name.to_owned()),
                    infra_repo,
                }
            }
        }
    }
}

impl Destinations {
    /// Pick the rule matching `event` and the listener it goes to, if any.
    pub fn select<E: RepositoryEvent>(&self, event: &E) -> Option<(Rule, &str)> {
        let rule = match event.action() {
            ACTION_OPENED => Rule::PullRequestOpened,
            ACTION_CLOSED if event.is_merged() => Rule::PullRequestMerged,
            ACTION_PUBLISHED if event.is_prerelease() => Rule::Prerelease,
            ACTION_PUBLISHED => Rule::Release,
            _ => return None,
        };

        let destination = match (self, rule) {
            (Destinations::Lifecycle { pr_opened, .. }, Rule::PullRequestOpened) => {
                pr_opened.as_deref()
            }
            (Destinations::Lifecycle { pr_merged, .. }, Rule::PullRequestMerged) => {
                pr_merged.as_deref()
            }
            (Destinations::Lifecycle { prereleased, .. }, Rule::Prerelease) => {
                prereleased.as_deref()
            }
            (Destinations::Lifecycle { released, .. }, Rule::Release) => released.as_deref(),
            (Destinations::Environments { .. }, Rule::PullRequestOpened) => None,
            (Destinations::Environments { dev, .. }, Rule::PullRequestMerged) => Some(dev.as_str()),
            (Destinations::Environments { uat, .. }, Rule::Prerelease) => Some(uat.as_str()),
            (Destinations::Environments { prod, .. }, Rule::Release) => Some(prod.as_str()),
        };

        destination
            .filter(|url| !url.is_empty())
            .map(|url| (rule, url))
    }
}

/// Classify an event against the routing configuration.
///
/// The secret is checked before anything else, so a rejected event is never mapped. Only
/// providers that carry a secret in the payload are checked.
pub fn classify<E: RepositoryEvent>(
    event: &E,
    config: &RoutingConfig,
) -> Result<Route, ClassifyError> {
    if let (Some(expected), Some(carried)) = (config.webhook_secret.as_deref(), event.secret()) {
        let expected = expected.trim_end_matches(&['\r', '\n'][..]);
        if !expected.is_empty() && expected.as_bytes() != carried.as_bytes() {
            return Err(ClassifyError::InvalidSecret);
        }
    }

    let Some((rule, destination)) = config.destinations.select(event) else {
        tracing::info!(
            "NOP (opened, merged, release or prerelease action not detected): action '{}'",
            event.action()
        );
        return Ok(Route::Noop);
    };

    let infra_repo = match &config.infra_mapping {
        Some(mapping) => {
            let repo_name = event.repository().name;
            let prefix = repo_prefix(repo_name);
            match mapping.lookup(prefix) {
                Some(infra_repo) => Some(infra_repo.to_owned()),
                None => {
                    return Err(ClassifyError::InfraRepoNotFound {
                        prefix: prefix.to_owned(),
                        repo_name: repo_name.to_owned(),
                    })
                }
            }
        }
        None => None,
    };

    let normalized = rule.map(event, infra_repo);
    tracing::debug!("mapped {} event: {:?}", rule.as_str(), normalized);

    Ok(Route::Forward {
        event: normalized,
        destination: destination.to_owned(),
    })
}

/// The first `-` delimited token of a repository name.
pub fn repo_prefix(repo_name: &str) -> &str {
    repo_name.split('-').next().unwrap_or(repo_name)
}

/// Lookup table from repository name prefixes to infra repositories, configured as
/// newline separated `key=value` lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfraRepoMapping {
    entries: Vec<(String, String)>,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid repo mapping on line {line}: '{content}' is not a key=value pair")]
pub struct ParseMappingError {
    line: usize,
    content: String,
}

impl FromStr for InfraRepoMapping {
    type Err = ParseMappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut entries = Vec::new();

        for (index, line) in s.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match line.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    entries.push((key.trim().to_owned(), value.trim().to_owned()))
                }
                _ => {
                    return Err(ParseMappingError {
                        line: index + 1,
                        content: line.to_owned(),
                    })
                }
            }
        }

        Ok(InfraRepoMapping { entries })
    }
}

impl InfraRepoMapping {
    /// The value of the first entry whose key contains `prefix`.
    pub fn lookup(&self, prefix: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.contains(prefix))
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
