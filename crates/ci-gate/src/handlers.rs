//! Webhook event router
//!
//! One delivery, one task, one `dispatch` call. Every handler re-derives
//! PR state from the live API, so redelivered webhooks replay without
//! side-effect storms. Handler errors are caught by the spawning code and
//! isolated to their delivery.

use crate::automerge;
use crate::context::{split_full_name, AppContext};
use crate::events::{PullRequestEvent, ReviewEvent, StatusEvent, WebhookEvent};
use crate::labels::{self, APPROVAL_LABEL, AUTOMERGE_LABEL};
use crate::public_log;
use crate::trigger;
use crate::trust;
use anyhow::bail;
use gh_client::StatusState;
use log::{debug, info};

const NEW_COMMITS_COMMENT: &str = "New commits were pushed while auto-merge was pending, so the \
automerge label has been removed. Re-apply it to merge the new head.";

/// Route a classified webhook delivery to its handler
pub async fn dispatch(ctx: &AppContext, event: WebhookEvent) -> anyhow::Result<()> {
    match event {
        WebhookEvent::Ping => {
            info!("webhook ping received");
            Ok(())
        }
        WebhookEvent::PullRequest(ev) => handle_pull_request(ctx, ev).await,
        WebhookEvent::Status(ev) => handle_status(ctx, ev).await,
        WebhookEvent::Review(ev) => handle_review(ctx, ev).await,
        WebhookEvent::Unrecognized(kind) => {
            debug!("ignoring unrecognized event kind {:?}", kind);
            Ok(())
        }
    }
}

async fn handle_pull_request(ctx: &AppContext, event: PullRequestEvent) -> anyhow::Result<()> {
    let full_name = &event.repository.full_name;
    let Some((owner, repo)) = split_full_name(full_name) else {
        bail!("malformed repository full name {full_name:?}");
    };
    let pr = &event.pull_request;

    match event.action.as_str() {
        "opened" | "reopened" | "synchronize" => {
            if event.action == "synchronize"
                && labels::remove_label(&*ctx.github, owner, repo, pr.number, AUTOMERGE_LABEL)
                    .await?
            {
                // A pending auto-merge must not silently adopt commits
                // nobody looked at
                ctx.github
                    .create_comment(owner, repo, pr.number, NEW_COMMITS_COMMENT)
                    .await?;
            }

            // Any prior approval applied to an older head
            labels::remove_label(&*ctx.github, owner, repo, pr.number, APPROVAL_LABEL).await?;

            if trust::is_trusted(&*ctx.github, &ctx.config, owner, repo, &pr.user.login).await {
                trigger::trigger(ctx, owner, repo, pr.number, &pr.head.sha).await?;
            } else {
                info!(
                    "{} is not trusted on {}; gating {}#{} on the {} label",
                    pr.user.login, full_name, full_name, pr.number, APPROVAL_LABEL
                );
                labels::set_gate_status(
                    &*ctx.github,
                    owner,
                    repo,
                    &pr.head.sha,
                    StatusState::Pending,
                    &format!(
                        "a repository member must apply the {APPROVAL_LABEL} label for CI to run"
                    ),
                    None,
                )
                .await?;
            }
            Ok(())
        }
        "labeled" => {
            if !pr.merged
                && labels::has_label(&*ctx.github, owner, repo, pr.number, APPROVAL_LABEL).await?
            {
                trigger::trigger(ctx, owner, repo, pr.number, &pr.head.sha).await?;
            }
            // Label changes can make a PR auto-merge eligible
            automerge::reconcile(&*ctx.github, owner, repo, pr.number).await?;
            Ok(())
        }
        other => {
            debug!("ignoring pull_request action {:?} on {}", other, full_name);
            Ok(())
        }
    }
}

async fn handle_status(ctx: &AppContext, event: StatusEvent) -> anyhow::Result<()> {
    public_log::rewrite_if_applicable(ctx, &event).await?;
    ctx.sweeper
        .request_sweep(&event.repository.full_name)
        .await;
    Ok(())
}

async fn handle_review(ctx: &AppContext, event: ReviewEvent) -> anyhow::Result<()> {
    let full_name = &event.repository.full_name;
    let Some((owner, repo)) = split_full_name(full_name) else {
        bail!("malformed repository full name {full_name:?}");
    };
    automerge::reconcile(&*ctx.github, owner, repo, event.pull_request.number).await
}
