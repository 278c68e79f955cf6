//! Gitea webhook payloads.
//!
//! Gitea mirrors GitHub's repository and release schema, so those parts are shared. Its pull
//! requests additionally report a `state`, and every delivery carries the webhook secret in
//! the body instead of signing it.
use serde::{Deserialize, Serialize};

use crate::event::{null_as_default, PullRequestRef, ReleaseRef, RepositoryEvent, RepositoryRef};
use crate::github::{CommitRef, Release, Repository, User};

#[derive(Deserialize, Serialize, Debug, Default, PartialEq, Clone)]
#[serde(default)]
pub struct GiteaEvent {
    #[serde(deserialize_with = "null_as_default")]
    pub secret: String,
    #[serde(deserialize_with = "null_as_default")]
    pub action: String,
    #[serde(deserialize_with = "null_as_default")]
    pub repository: Repository,
    #[serde(deserialize_with = "null_as_default")]
    pub pull_request: GiteaPullRequest,
    #[serde(deserialize_with = "null_as_default")]
    pub release: Release,
}

#[derive(Deserialize, Serialize, Debug, Default, PartialEq, Clone)]
#[serde(default)]
pub struct GiteaPullRequest {
    #[serde(deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(deserialize_with = "null_as_default")]
    pub merged: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub merge_commit_sha: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub head: CommitRef,
    #[serde(deserialize_with = "null_as_default")]
    pub user: User,
}

impl RepositoryEvent for GiteaEvent {
    fn action(&self) -> &str {
        &self.action
    }

    fn repository(&self) -> RepositoryRef<'_> {
        self.repository.view()
    }

    fn pull_request(&self) -> PullRequestRef<'_> {
        PullRequestRef {
            merged: self.pull_request.merged,
            head_sha: &self.pull_request.head.sha,
            merge_commit_sha: &self.pull_request.merge_commit_sha,
            title: &self.pull_request.title,
            author: self.pull_request.user.actor(),
        }
    }

    fn release(&self) -> ReleaseRef<'_> {
        self.release.view()
    }

    fn secret(&self) -> Option<&str> {
        Some(&self.secret)
    }
}
