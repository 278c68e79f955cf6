//! GitHub webhook payloads.
//!
//! Only the fields the routing rules read are modelled. `pull_request` and `release`
//! webhooks share one struct: whichever section the delivery does not carry stays at its
//! default.
use serde::{Deserialize, Serialize};

use crate::event::{
    non_empty, null_as_default, Actor, PullRequestRef, ReleaseRef, RepositoryEvent, RepositoryRef,
};

#[derive(Deserialize, Serialize, Debug, Default, PartialEq, Clone)]
#[serde(default)]
pub struct GithubEvent {
    #[serde(deserialize_with = "null_as_default")]
    pub action: String,
    #[serde(deserialize_with = "null_as_default")]
    pub repository: Repository,
    #[serde(deserialize_with = "null_as_default")]
    pub pull_request: PullRequest,
    #[serde(deserialize_with = "null_as_default")]
    pub release: Release,
}

#[derive(Deserialize, Serialize, Debug, Default, PartialEq, Clone)]
#[serde(default)]
pub struct Repository {
    #[serde(deserialize_with = "null_as_default")]
    pub clone_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Deserialize, Serialize, Debug, Default, PartialEq, Clone)]
#[serde(default)]
pub struct User {
    #[serde(deserialize_with = "null_as_default")]
    pub login: String,
    pub email: Option<String>,
}

impl User {
    pub(crate) fn actor(&self) -> Actor<'_> {
        Actor {
            login: &self.login,
            email: non_empty(&self.email),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Default, PartialEq, Clone)]
#[serde(default)]
pub struct CommitRef {
    #[serde(deserialize_with = "null_as_default")]
    pub sha: String,
}

#[derive(Deserialize, Serialize, Debug, Default, PartialEq, Clone)]
#[serde(default)]
pub struct PullRequest {
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

#[derive(Deserialize, Serialize, Debug, Default, PartialEq, Clone)]
#[serde(default)]
pub struct Release {
    #[serde(deserialize_with = "null_as_default")]
    pub prerelease: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub target_commitish: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tag_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub body: String,
    #[serde(deserialize_with = "null_as_default")]
    pub author: User,
}

impl Release {
    pub(crate) fn view(&self) -> ReleaseRef<'_> {
        ReleaseRef {
            prerelease: self.prerelease,
            target_commitish: &self.target_commitish,
            tag_name: &self.tag_name,
            name: &self.name,
            body: &self.body,
            author: self.author.actor(),
        }
    }
}

impl Repository {
    pub(crate) fn view(&self) -> RepositoryRef<'_> {
        RepositoryRef {
            clone_url: &self.clone_url,
            name: &self.name,
        }
    }
}

impl RepositoryEvent for GithubEvent {
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_merged_pull_request() {
        let payload = json!({
            "action": "closed",
            "number": 42,
            "pull_request": {
                "url": "https://api.github.com/repos/acme/payments-api/pulls/42",
                "title": "Add refund endpoint",
                "merged": true,
                "merge_commit_sha": "9f3c2a1",
                "head": {"ref": "feature/refunds", "sha": "a1b2c3d"},
                "user": {"login": "octocat", "id": 1}
            },
            "repository": {
                "name": "payments-api",
                "full_name": "acme/payments-api",
                "clone_url": "https://github.com/acme/payments-api.git"
            },
            "sender": {"login": "octocat"}
        });

        let event: GithubEvent = serde_json::from_value(payload).unwrap();

        assert_eq!(event.action(), "closed");
        assert!(event.is_merged());
        assert_eq!(
            event.repository(),
            RepositoryRef {
                clone_url: "https://github.com/acme/payments-api.git",
                name: "payments-api",
            }
        );

        let pull_request = event.pull_request();
        assert_eq!(pull_request.head_sha, "a1b2c3d");
        assert_eq!(pull_request.merge_commit_sha, "9f3c2a1");
        assert_eq!(pull_request.title, "Add refund endpoint");
        assert_eq!(
            pull_request.author,
            Actor {
                login: "octocat",
                email: None
            }
        );
        assert_eq!(event.secret(), None);
    }

    #[test]
    fn test_deserialize_tolerates_nulls() {
        let payload = json!({
            "action": "opened",
            "pull_request": {
                "title": "WIP",
                "merged": false,
                "merge_commit_sha": null,
                "head": {"sha": "a1b2c3d"},
                "user": {"login": "octocat", "email": null}
            },
            "release": null,
            "repository": {"name": "payments-api", "clone_url": null}
        });

        let event: GithubEvent = serde_json::from_value(payload).unwrap();

        assert_eq!(event.pull_request().merge_commit_sha, "");
        assert_eq!(event.pull_request().author.email, None);
        assert_eq!(event.repository().clone_url, "");
        assert_eq!(event.release, Release::default());
    }

    #[test]
    fn test_deserialize_release() {
        let payload = json!({
            "action": "published",
            "release": {
                "tag_name": "v1.4.0-rc.1",
                "target_commitish": "main",
                "name": "v1.4.0 RC1",
                "body": null,
                "prerelease": true,
                "author": {"login": "releasebot", "email": "releases@acme.io"}
            },
            "repository": {"name": "payments-api", "clone_url": "https://github.com/acme/payments-api.git"}
        });

        let event: GithubEvent = serde_json::from_value(payload).unwrap();

        assert!(event.is_prerelease());
        assert!(!event.is_merged());
        let release = event.release();
        assert_eq!(release.tag_name, "v1.4.0-rc.1");
        assert_eq!(release.target_commitish, "main");
        assert_eq!(release.body, "");
        assert_eq!(release.author.email, Some("releases@acme.io"));
    }

    #[test]
    fn test_empty_object_defaults_everything() {
        let event: GithubEvent = serde_json::from_str("{}").unwrap();

        assert_eq!(event, GithubEvent::default());
        assert_eq!(event.action(), "");
        assert!(!event.is_merged());
        assert!(!event.is_prerelease());
    }
}
