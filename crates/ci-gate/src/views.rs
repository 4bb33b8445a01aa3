//! HTML pages for the public-log proxy
//!
//! Server-rendered, no templating engine: the pages are a header plus a
//! section per job, and string assembly keeps the dependency surface
//! flat. All dynamic text goes through `html_escape`.

use bk_log_render::{html_escape, timespan};
use buildkite_client::{Build, Job};
use std::fmt::Write;

/// Job-name marker making a job's log publicly viewable
pub const PUBLIC_JOB_MARKER: &str = "[public]";

/// Whether a job's log may be shown on the public page
pub fn job_is_public(job: &Job, expose_all: bool) -> bool {
    expose_all
        || job
            .name
            .as_deref()
            .is_some_and(|name| name.contains(PUBLIC_JOB_MARKER))
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n\
         <link rel=\"stylesheet\" href=\"/static/style.css\">\n</head>\n<body>\n{}\n</body>\n</html>\n",
        html_escape(title),
        body
    )
}

/// Render the build page
///
/// `job_logs` holds the pre-rendered HTML log per job id; jobs without an
/// entry show a "not public" note instead of their log.
pub fn build_page(build: &Build, job_logs: &[(String, String)]) -> String {
    let title = format!("Build #{}", build.number);
    let mut body = String::new();

    let message = build.message.as_deref().unwrap_or("(no message)");
    let _ = write!(
        body,
        "<h1>Build #{} &mdash; {}</h1>\n\
         <p class=\"build-meta\">{} on <code>{}</code> &middot; \
         <a href=\"{}\">view on Buildkite</a></p>\n",
        build.number,
        html_escape(message),
        html_escape(build.state.label()),
        html_escape(&build.branch),
        html_escape(&build.web_url),
    );

    for job in &build.jobs {
        if job.kind != "script" {
            continue;
        }
        let name = job.name.as_deref().unwrap_or("(unnamed job)");
        let state = job.state.map(|s| s.label()).unwrap_or("unknown");

        let _ = write!(
            body,
            "<section class=\"job\">\n<h2>{} &mdash; {}</h2>\n",
            html_escape(name),
            html_escape(state),
        );

        if let Some(waited) = timespan(job.scheduled_at, job.started_at.or(job.finished_at)) {
            let _ = write!(body, "<p class=\"timing\">waited {}", html_escape(&waited));
            if let Some(ran) = timespan(job.started_at, job.finished_at) {
                let _ = write!(body, ", ran {}", html_escape(&ran));
            }
            body.push_str("</p>\n");
        }

        if let Some(command) = &job.command {
            let _ = write!(
                body,
                "<pre class=\"command\">{}</pre>\n",
                html_escape(command)
            );
        }

        match job_logs.iter().find(|(id, _)| *id == job.id) {
            Some((_, log_html)) => {
                let _ = write!(body, "<pre class=\"log\">{}</pre>\n", log_html);
            }
            None => {
                body.push_str("<p class=\"private\">This job's log is not public.</p>\n");
            }
        }

        body.push_str("</section>\n");
    }

    page(&title, &body)
}

/// Render the "build not found yet" page with a manual retry link
///
/// A status webhook can outrun the build's appearance in the list
/// endpoint, so this is presented as "try again", not as an error.
pub fn not_found_page(retry_url: &str) -> String {
    let body = format!(
        "<h1>Build not found</h1>\n\
         <p><img class=\"spinner\" src=\"/static/spinner.svg\" alt=\"\"> \
         The build was not found among recent builds. It may not have been \
         scheduled yet.</p>\n\
         <p><a href=\"{}\">Check again</a></p>",
        html_escape(retry_url)
    );
    page("Build not found", &body)
}
