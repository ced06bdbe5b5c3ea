//! Artifact publishing via git.
//!
//! This module stages the rendered artifact, commits it, and pushes the
//! branch to the configured remote using the git2 library. A zero-diff
//! stage is success-with-no-op, not a failure: the change detector
//! already gates invocation, so an identical tree just means the
//! artifact was rebuilt byte-for-byte.

use crate::config::PublishConfig;
use anyhow::{Context, Result};
use git2::{Cred, CredentialType, PushOptions, RemoteCallbacks, Repository};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Explicit result of a publish attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Artifact committed and pushed to the remote.
    Pushed,
    /// The staged tree was identical to HEAD; nothing to commit.
    NothingToCommit,
    /// Publishing was disabled for this run.
    Skipped,
}

impl fmt::Display for PublishOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishOutcome::Pushed => write!(f, "pushed"),
            PublishOutcome::NothingToCommit => write!(f, "nothing to commit"),
            PublishOutcome::Skipped => write!(f, "skipped"),
        }
    }
}

/// Stage, commit, and push the artifact.
pub fn publish_artifact(config: &PublishConfig, artifact: &Path) -> Result<PublishOutcome> {
    if !config.enabled {
        debug!("Publishing disabled; skipping");
        return Ok(PublishOutcome::Skipped);
    }

    let repo = Repository::open(&config.repo_dir)
        .with_context(|| format!("Failed to open repository at {}", config.repo_dir))?;

    match stage_and_commit(&repo, artifact, &config.commit_message)? {
        Some(commit_id) => {
            info!("Committed artifact as {}", commit_id);
            push(&repo, &config.remote, &config.branch)?;
            Ok(PublishOutcome::Pushed)
        }
        None => Ok(PublishOutcome::NothingToCommit),
    }
}

/// Stage the artifact and commit when the tree changed.
///
/// Returns the new commit id, or `None` when the staged tree matches
/// HEAD exactly.
fn stage_and_commit(
    repo: &Repository,
    artifact: &Path,
    message: &str,
) -> Result<Option<git2::Oid>> {
    let workdir = repo
        .workdir()
        .context("Repository has no working directory (bare repo?)")?;

    // The index wants paths relative to the repository root.
    let rel_path = artifact.strip_prefix(workdir).unwrap_or(artifact);

    let mut index = repo.index().context("Failed to open repository index")?;
    index
        .add_path(rel_path)
        .with_context(|| format!("Failed to stage {}", rel_path.display()))?;
    index.write().context("Failed to write repository index")?;

    let tree_id = index.write_tree().context("Failed to write index tree")?;

    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit().context("Failed to resolve HEAD")?),
        // Unborn branch: first commit in the repository.
        Err(_) => None,
    };

    if let Some(ref parent) = parent {
        if parent.tree_id() == tree_id {
            debug!("Staged tree matches HEAD; nothing to commit");
            return Ok(None);
        }
    }

    let tree = repo.find_tree(tree_id).context("Failed to find index tree")?;
    let signature = repo
        .signature()
        .context("Failed to resolve commit signature (set user.name/user.email)")?;

    let parents: Vec<&git2::Commit> = parent.iter().collect();
    let commit_id = repo
        .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
        .context("Failed to create commit")?;

    Ok(Some(commit_id))
}

/// Push the branch to the remote using ambient credentials
/// (credential helper for HTTPS, agent for SSH).
fn push(repo: &Repository, remote_name: &str, branch: &str) -> Result<()> {
    let mut remote = repo
        .find_remote(remote_name)
        .with_context(|| format!("Remote `{}` not found", remote_name))?;

    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(|url, username_from_url, allowed| {
        if allowed.contains(CredentialType::SSH_KEY) {
            return Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"));
        }
        if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
            let config = git2::Config::open_default()?;
            return Cred::credential_helper(&config, url, username_from_url);
        }
        Cred::default()
    });

    let mut push_opts = PushOptions::new();
    push_opts.remote_callbacks(callbacks);

    let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
    info!("Pushing {} to {}", branch, remote_name);

    remote
        .push(&[refspec.as_str()], Some(&mut push_opts))
        .with_context(|| format!("Failed to push {} to {}", branch, remote_name))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Initialize a repository with a configured signature.
    fn init_repo() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        {
            let mut config = repo.config().unwrap();
            config.set_str("user.name", "tester").unwrap();
            config.set_str("user.email", "tester@example.com").unwrap();
        }
        (dir, repo)
    }

    fn write_artifact(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_first_commit_on_unborn_branch() {
        let (dir, repo) = init_repo();
        let artifact = write_artifact(&dir, "index.html", "<html></html>");

        let commit = stage_and_commit(&repo, &artifact, "Add map").unwrap();
        assert!(commit.is_some());

        let head = repo.head().unwrap().peel_to_commit().unwrap();
        assert_eq!(head.id(), commit.unwrap());
        assert_eq!(head.message(), Some("Add map"));
    }

    #[test]
    fn test_unchanged_artifact_is_nothing_to_commit() {
        let (dir, repo) = init_repo();
        let artifact = write_artifact(&dir, "index.html", "<html></html>");

        assert!(stage_and_commit(&repo, &artifact, "Add map")
            .unwrap()
            .is_some());

        // Same content staged again: identical tree, no commit.
        assert!(stage_and_commit(&repo, &artifact, "Add map")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_changed_artifact_commits_again() {
        let (dir, repo) = init_repo();
        let artifact = write_artifact(&dir, "index.html", "v1");
        stage_and_commit(&repo, &artifact, "v1").unwrap();

        write_artifact(&dir, "index.html", "v2");
        let second = stage_and_commit(&repo, &artifact, "v2").unwrap();
        assert!(second.is_some());

        let head = repo.head().unwrap().peel_to_commit().unwrap();
        assert_eq!(head.parent_count(), 1);
    }

    #[test]
    fn test_disabled_publish_is_skipped() {
        let config = PublishConfig {
            enabled: false,
            ..PublishConfig::default()
        };
        let outcome = publish_artifact(&config, Path::new("index.html")).unwrap();
        assert_eq!(outcome, PublishOutcome::Skipped);
    }

    #[test]
    fn test_missing_repo_is_error() {
        let dir = TempDir::new().unwrap();
        let config = PublishConfig {
            repo_dir: dir.path().join("nope").display().to_string(),
            ..PublishConfig::default()
        };
        assert!(publish_artifact(&config, Path::new("index.html")).is_err());
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(PublishOutcome::Pushed.to_string(), "pushed");
        assert_eq!(PublishOutcome::NothingToCommit.to_string(), "nothing to commit");
        assert_eq!(PublishOutcome::Skipped.to_string(), "skipped");
    }
}
