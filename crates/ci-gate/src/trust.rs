//! Trust classification for PR authors
//!
//! A PR author may trigger CI without human intervention when they have
//! push access to the repository (checked live, never cached) or appear
//! in the static allow-list. A failed permission lookup must neither
//! grant trust nor crash the event pipeline, so it degrades to the
//! allow-list check alone.

use ci_gate_config::Config;
use gh_client::GitHubClient;
use log::warn;

/// Whether the user may trigger CI without the approval label
pub async fn is_trusted(
    github: &dyn GitHubClient,
    config: &Config,
    owner: &str,
    repo: &str,
    username: &str,
) -> bool {
    match github.user_permission(owner, repo, username).await {
        Ok(permission) if permission.can_push() => return true,
        Ok(_) => {}
        Err(err) => {
            warn!(
                "collaborator lookup for {} on {}/{} failed ({}); falling back to allow-list",
                username, owner, repo, err
            );
        }
    }

    config.trusted_users.contains(username)
}
