//! HTTP surface
//!
//! Four routes: the webhook receiver, the two public Buildkite proxies,
//! and a liveness probe, plus static assets. The webhook receiver answers
//! as soon as the delivery is verified and classified; the actual handling
//! runs in a detached task so GitHub never times out on slow API fan-out.

use crate::context::AppContext;
use crate::events::{self, WebhookEvent};
use crate::handlers;
use crate::public_log::{self, BuildRef};
use crate::views;
use axum::body::Bytes;
use axum::extract::{RawQuery, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use buildkite_client::Build;
use log::{debug, error, info, warn};
use serde_json::json;
use std::path::PathBuf;
use tower_http::services::ServeDir;

const SIGNATURE_HEADER: &str = "x-hub-signature-256";
const EVENT_KIND_HEADER: &str = "x-github-event";

/// Build the application router
pub fn router(ctx: AppContext) -> Router {
    let assets = assets_dir(&ctx);
    Router::new()
        .route("/github", post(receive_webhook))
        .route("/buildkite_public_log", get(public_log_page))
        .route("/buildkite_public_artifact", get(public_artifact_redirect))
        .route("/health", get(health))
        .nest_service("/static", ServeDir::new(assets))
        .with_state(ctx)
}

/// Static asset directory: `ASSETS_DIR` when configured, otherwise the
/// crate's bundled assets (independent of the working directory)
fn assets_dir(ctx: &AppContext) -> PathBuf {
    match &ctx.config.assets_dir {
        Some(dir) => PathBuf::from(dir),
        None => PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets"),
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({"ok": true}))
}

async fn receive_webhook(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(signature) = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
    else {
        warn!("webhook delivery without a signature header");
        return (StatusCode::FORBIDDEN, "missing signature").into_response();
    };

    if let Err(err) = ctx.validator.verify(&body, signature) {
        warn!("webhook signature rejected: {}", err);
        return (StatusCode::FORBIDDEN, "signature verification failed").into_response();
    }

    let kind = headers
        .get(EVENT_KIND_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let event = match events::parse(kind, &body) {
        Ok(event) => event,
        Err(err) => {
            warn!("malformed {} payload: {}", kind, err);
            return (StatusCode::BAD_REQUEST, "malformed payload").into_response();
        }
    };

    debug!("accepted {} delivery", kind);

    // Answer GitHub now; fan-out to the APIs happens off the request path
    let kind = kind.to_string();
    tokio::spawn(async move {
        if let Err(err) = handlers::dispatch(&ctx, event).await {
            error!("handling {} delivery failed: {:#}", kind, err);
        }
    });

    (StatusCode::OK, "ok").into_response()
}

async fn public_log_page(State(ctx): State<AppContext>, RawQuery(query): RawQuery) -> Response {
    let Some(query) = query else {
        return (StatusCode::BAD_REQUEST, "missing build URL").into_response();
    };

    let Some(locator) = public_log::parse_build_log_url(&query, &ctx.config.buildkite_org) else {
        debug!("rejecting non-Buildkite log query {:?}", query);
        return (StatusCode::BAD_REQUEST, "not a recognized build URL").into_response();
    };

    if !ctx.config.public_log_pipelines.contains(&locator.pipeline) {
        info!("pipeline {:?} is not public; refusing log page", locator.pipeline);
        return (StatusCode::BAD_REQUEST, "pipeline logs are not public").into_response();
    }

    let build = match find_build(&ctx, &locator.pipeline, &locator.build).await {
        Ok(build) => build,
        Err(err) => {
            error!("listing builds of {:?} failed: {}", locator.pipeline, err);
            return (StatusCode::BAD_GATEWAY, "build lookup failed").into_response();
        }
    };

    let Some(build) = build else {
        let retry = format!("/buildkite_public_log?{query}");
        return Html(views::not_found_page(&retry)).into_response();
    };

    let mut job_logs = Vec::new();
    for job in &build.jobs {
        if job.kind != "script" || !views::job_is_public(job, ctx.config.expose_all_logs) {
            continue;
        }
        match ctx
            .buildkite
            .job_log(&locator.pipeline, build.number, &job.id)
            .await
        {
            Ok(raw) => job_logs.push((job.id.clone(), bk_log_render::ansi_to_html(&raw))),
            Err(err) => {
                // A log that cannot be fetched renders as private rather
                // than failing the whole page
                warn!("fetching log of job {} failed: {}", job.id, err);
            }
        }
    }

    Html(views::build_page(&build, &job_logs)).into_response()
}

async fn find_build(
    ctx: &AppContext,
    pipeline: &str,
    build_ref: &BuildRef,
) -> Result<Option<Build>, buildkite_client::BuildkiteError> {
    match build_ref {
        BuildRef::Number(number) => {
            let builds = ctx.buildkite.list_builds(pipeline, None).await?;
            Ok(builds.into_iter().find(|b| b.number == *number))
        }
        BuildRef::Latest { branch } => {
            let builds = ctx.buildkite.list_builds(pipeline, Some(branch)).await?;
            Ok(builds.into_iter().next())
        }
    }
}

async fn public_artifact_redirect(
    State(ctx): State<AppContext>,
    RawQuery(query): RawQuery,
) -> Response {
    let Some(query) = query else {
        return (StatusCode::BAD_REQUEST, "missing artifact URL").into_response();
    };

    let Some(locator) = public_log::parse_artifact_url(&query, &ctx.config.buildkite_org) else {
        debug!("rejecting non-Buildkite artifact query {:?}", query);
        return (StatusCode::BAD_REQUEST, "not a recognized artifact URL").into_response();
    };

    if !ctx.config.public_log_pipelines.contains(&locator.pipeline) {
        return (StatusCode::BAD_REQUEST, "pipeline artifacts are not public").into_response();
    }

    match ctx
        .buildkite
        .artifact_download_url(
            &locator.pipeline,
            locator.build_number,
            &locator.job_id,
            &locator.artifact_id,
        )
        .await
    {
        // The signed URL is short-lived, so a plain 302 keeps clients
        // re-resolving through us instead of caching it
        Ok(url) => (StatusCode::FOUND, [(LOCATION, url)]).into_response(),
        Err(err) => {
            error!("resolving artifact {} failed: {}", locator.artifact_id, err);
            (StatusCode::BAD_GATEWAY, "artifact resolution failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sign, test_config, MockBuildkite, MockGitHub, TEST_WEBHOOK_SECRET};
    use axum::body::Body;
    use axum::http::Request;
    use buildkite_client::{BuildState, Job, JobState};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn public_app() -> (Router, Arc<MockBuildkite>) {
        let github = Arc::new(MockGitHub::new());
        let buildkite = Arc::new(MockBuildkite::new());
        let mut config = test_config();
        config.public_log_pipelines.insert("repo".to_string());
        let ctx = AppContext::new(config, github, buildkite.clone());
        (router(ctx), buildkite)
    }

    fn app() -> Router {
        let github = Arc::new(MockGitHub::new());
        let buildkite = Arc::new(MockBuildkite::new());
        router(AppContext::new(test_config(), github, buildkite))
    }

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn webhook_request(kind: &str, body: &str, signature: &str) -> Request<Body> {
        Request::post("/github")
            .header(SIGNATURE_HEADER, signature)
            .header(EVENT_KIND_HEADER, kind)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("true"));
    }

    #[tokio::test]
    async fn test_static_assets_resolve_without_cwd_help() {
        // Default config has no ASSETS_DIR; the bundled stylesheet must
        // still be found wherever the process was started from
        let response = app()
            .oneshot(
                Request::get("/static/style.css")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_signed_ping_is_accepted() {
        let body = "{}";
        let signature = sign(TEST_WEBHOOK_SECRET, body.as_bytes());
        let response = app()
            .oneshot(webhook_request("ping", body, &signature))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_bad_signature_is_rejected_unprocessed() {
        let body = "{}";
        let signature = sign("wrong-secret", body.as_bytes());
        let response = app()
            .oneshot(webhook_request("ping", body, &signature))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_missing_signature_is_rejected() {
        let response = app()
            .oneshot(
                Request::post("/github")
                    .header(EVENT_KIND_HEADER, "ping")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_a_bad_request() {
        let body = "not json";
        let signature = sign(TEST_WEBHOOK_SECRET, body.as_bytes());
        let response = app()
            .oneshot(webhook_request("pull_request", body, &signature))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_log_page_refuses_non_public_pipeline() {
        let (app, _) = public_app();
        let response = app
            .oneshot(
                Request::get(
                    "/buildkite_public_log?https://buildkite.com/example-org/secret/builds/1",
                )
                .body(Body::empty())
                .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_log_page_refuses_unparseable_query() {
        let (app, _) = public_app();
        let response = app
            .oneshot(
                Request::get("/buildkite_public_log?https://example.com/whatever")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_log_page_renders_public_job() {
        let (app, buildkite) = public_app();
        buildkite.add_build(
            "repo",
            Build {
                number: 3,
                state: BuildState::Passed,
                branch: "pull/7/head".to_string(),
                commit: "headsha7".to_string(),
                message: Some("Pull Request #7 - headsha7".to_string()),
                web_url: "https://buildkite.com/example-org/repo/builds/3".to_string(),
                scheduled_at: None,
                started_at: None,
                finished_at: None,
                jobs: vec![Job {
                    id: "j-1".to_string(),
                    kind: "script".to_string(),
                    name: Some("tests [public]".to_string()),
                    state: Some(JobState::Passed),
                    command: Some("cargo test".to_string()),
                    web_url: None,
                    scheduled_at: None,
                    started_at: None,
                    finished_at: None,
                }],
            },
        );
        buildkite.set_job_log("j-1", "all tests passed\n");

        let response = app
            .oneshot(
                Request::get(
                    "/buildkite_public_log?https://buildkite.com/example-org/repo/builds/3",
                )
                .body(Body::empty())
                .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("all tests passed"));
        assert!(html.contains("Build #3"));
    }

    #[tokio::test]
    async fn test_log_page_unknown_build_offers_retry() {
        let (app, _) = public_app();
        let response = app
            .oneshot(
                Request::get(
                    "/buildkite_public_log?https://buildkite.com/example-org/repo/builds/99",
                )
                .body(Body::empty())
                .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Check again"));
    }

    #[tokio::test]
    async fn test_artifact_redirect() {
        let (app, buildkite) = public_app();
        buildkite.set_artifact_url("a-9", "https://signed.example.net/artifact");

        let response = app
            .oneshot(
                Request::get(
                    "/buildkite_public_artifact?https://api.buildkite.com/v2/organizations/example-org/pipelines/repo/builds/3/jobs/j-1/artifacts/a-9/download",
                )
                .body(Body::empty())
                .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "https://signed.example.net/artifact"
        );
    }

    #[tokio::test]
    async fn test_artifact_refuses_non_public_pipeline() {
        let (app, _) = public_app();
        let response = app
            .oneshot(
                Request::get(
                    "/buildkite_public_artifact?https://api.buildkite.com/v2/organizations/example-org/pipelines/secret/builds/3/jobs/j-1/artifacts/a-9/download",
                )
                .body(Body::empty())
                .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
