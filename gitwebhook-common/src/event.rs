use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::gitea::GiteaEvent;
use crate::github::GithubEvent;

pub const ACTION_OPENED: &str = "opened";
pub const ACTION_CLOSED: &str = "closed";
pub const ACTION_PUBLISHED: &str = "published";

/// Git hosting providers we accept webhooks from.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Provider {
    Github,
    Gitea,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("{0} is not a supported webhook provider")]
pub struct ParseProviderError(String);

impl FromStr for Provider {
    type Err = ParseProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_ref() {
            "github" => Ok(Provider::Github),
            "gitea" => Ok(Provider::Gitea),
            invalid => Err(ParseProviderError(invalid.to_owned())),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Provider::Github => write!(f, "github"),
            Provider::Gitea => write!(f, "gitea"),
        }
    }
}

/// The user who authored a pull request or a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor<'a> {
    pub login: &'a str,
    pub email: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepositoryRef<'a> {
    pub clone_url: &'a str,
    pub name: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullRequestRef<'a> {
    pub merged: bool,
    pub head_sha: &'a str,
    pub merge_commit_sha: &'a str,
    pub title: &'a str,
    pub author: Actor<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseRef<'a> {
    pub prerelease: bool,
    pub target_commitish: &'a str,
    pub tag_name: &'a str,
    pub name: &'a str,
    pub body: &'a str,
    pub author: Actor<'a>,
}

/// Provider-agnostic view over a decoded webhook payload.
///
/// Each provider's payload struct supplies the field extraction; the routing rules only
/// ever look at events through this trait. Sections absent from the payload come back
/// with empty strings and `false` flags.
pub trait RepositoryEvent {
    fn action(&self) -> &str;
    fn repository(&self) -> RepositoryRef<'_>;
    fn pull_request(&self) -> PullRequestRef<'_>;
    fn release(&self) -> ReleaseRef<'_>;

    /// The shared secret carried in the payload. `None` for providers that do not send one,
    /// in which case no secret validation happens.
    fn secret(&self) -> Option<&str> {
        None
    }

    fn is_merged(&self) -> bool {
        self.pull_request().merged
    }

    fn is_prerelease(&self) -> bool {
        self.release().prerelease
    }
}

/// A decoded webhook payload from any supported provider.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Github(GithubEvent),
    Gitea(GiteaEvent),
}

impl InboundEvent {
    pub fn provider(&self) -> Provider {
        match self {
            InboundEvent::Github(_) => Provider::Github,
            InboundEvent::Gitea(_) => Provider::Gitea,
        }
    }
}

impl RepositoryEvent for InboundEvent {
    fn action(&self) -> &str {
        match self {
            InboundEvent::Github(event) => event.action(),
            InboundEvent::Gitea(event) => event.action(),
        }
    }

    fn repository(&self) -> RepositoryRef<'_> {
        match self {
            InboundEvent::Github(event) => event.repository(),
            InboundEvent::Gitea(event) => event.repository(),
        }
    }

    fn pull_request(&self) -> PullRequestRef<'_> {
        match self {
            InboundEvent::Github(event) => event.pull_request(),
            InboundEvent::Gitea(event) => event.pull_request(),
        }
    }

    fn release(&self) -> ReleaseRef<'_> {
        match self {
            InboundEvent::Github(event) => event.release(),
            InboundEvent::Gitea(event) => event.release(),
        }
    }

    fn secret(&self) -> Option<&str> {
        match self {
            InboundEvent::Github(event) => event.secret(),
            InboundEvent::Gitea(event) => event.secret(),
        }
    }
}

/// Providers send explicit `null` for plenty of fields (an unmerged PR's merge commit, a
/// release without notes...). Treat those the same as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Empty strings count as "no email".
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
