//! Plain-text and JSON rendering of a [`CommandOutcome`].

use std::fmt::Write as _;

use shared::view::{
    ActionView, DashboardStats, DetailView, FeedbackRow, ImageStagingView, IssueRow, PageContent,
    ResolvedRow,
};
use shared::{description_preview, IssueOrdering, DESCRIPTION_PREVIEW_LENGTH};

use crate::commands::{ActionResult, ActionSummary, CommandOutcome};

pub fn render_json(outcome: &CommandOutcome) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(outcome)?)
}

/// Renders the outcome for a terminal. The banner and any alert are left to
/// the caller, which writes them to stderr.
#[must_use]
pub fn render_text(outcome: &CommandOutcome) -> String {
    if let Some(action) = &outcome.action {
        return render_action(action);
    }
    match &outcome.view.detail {
        Some(detail) => render_detail(detail),
        None => render_page(&outcome.view.content),
    }
}

fn render_action(action: &ActionSummary) -> String {
    let label = action.transition.label();
    match &action.result {
        ActionResult::Applied => format!("Issue #{}: {label} done.", action.issue_id),
        ActionResult::Rejected { reason } => {
            format!("Issue #{}: {label} not submitted: {reason}", action.issue_id)
        }
        ActionResult::Failed => format!("Issue #{}: {label} failed.", action.issue_id),
    }
}

#[must_use]
pub fn render_page(content: &PageContent) -> String {
    match content {
        PageContent::Dashboard { stats } => render_stats(stats),
        PageContent::Issues { ordering, rows } => render_issues(*ordering, rows),
        PageContent::Resolved { rows } => render_resolved(rows),
        PageContent::Feedback { rows } => render_feedback(rows),
    }
}

fn render_stats(stats: &DashboardStats) -> String {
    format!(
        "Total issues:     {}\nPending:          {}\nIn progress:      {}\nResolved:         {}\nProgress:         {}%",
        stats.total, stats.pending, stats.in_progress, stats.resolved, stats.progress_percent
    )
}

fn render_issues(ordering: IssueOrdering, rows: &[IssueRow]) -> String {
    let heading = match ordering {
        IssueOrdering::Priority => "Issues (highest priority first)",
        IssueOrdering::Arrival => "Issues (as received)",
    };
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.id.to_string(),
                row.priority.clone(),
                row.category.clone(),
                preview(&row.description),
                row.upvotes.to_string(),
                row.status.clone(),
            ]
        })
        .collect();
    format!(
        "{heading}\n{}",
        render_table(
            &["ID", "PRIORITY", "CATEGORY", "DESCRIPTION", "UPVOTES", "STATUS"],
            &rows
        )
    )
}

fn render_resolved(rows: &[ResolvedRow]) -> String {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.id.to_string(),
                row.category.clone(),
                preview(&row.description),
                row.assigned_to.clone(),
            ]
        })
        .collect();
    render_table(&["ID", "CATEGORY", "DESCRIPTION", "ASSIGNED TO"], &rows)
}

fn render_feedback(rows: &[FeedbackRow]) -> String {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.id.to_string(),
                preview(&row.description),
                row.assigned_to.clone(),
                row.work.label().to_string(),
                row.speed.label().to_string(),
            ]
        })
        .collect();
    render_table(
        &["ID", "DESCRIPTION", "ASSIGNED TO", "WORK QUALITY", "SPEED"],
        &rows,
    )
}

#[must_use]
pub fn render_detail(detail: &DetailView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Issue #{}: {}", detail.id, detail.category);
    let _ = writeln!(out, "Status:       {}", detail.status);
    let _ = writeln!(out, "Priority:     {}", detail.priority);
    let _ = writeln!(out, "Upvotes:      {}", detail.upvotes);
    let _ = writeln!(out, "Address:      {}", detail.address);
    if let Some(reported_at) = &detail.reported_at {
        let _ = writeln!(out, "Reported:     {reported_at}");
    }
    let _ = writeln!(out, "Assigned to:  {}", detail.assigned_to);
    let _ = writeln!(out, "Contact:      {}", detail.assignee_contact);
    let _ = writeln!(out, "Before photo: {}", detail.before_image_url);
    if let Some(after) = &detail.after_image_url {
        let _ = writeln!(out, "After photo:  {after}");
    }
    let _ = writeln!(out, "\n{}", detail.description);

    match (&detail.action_label, &detail.action) {
        (Some(label), ActionView::Resolve { image, .. }) => {
            let _ = writeln!(out, "\nAction: {label} ({})", staging_label(image));
        }
        (Some(label), _) => {
            let _ = writeln!(out, "\nAction: {label}");
        }
        (None, _) => {
            let _ = writeln!(out, "\nNo action available.");
        }
    }
    if let Some(notice) = &detail.notice {
        let _ = writeln!(out, "{notice}");
    }
    if let Some(message) = &detail.validation_message {
        let _ = writeln!(out, "{message}");
    }
    out.trim_end().to_string()
}

fn staging_label(image: &ImageStagingView) -> String {
    match image {
        ImageStagingView::Empty => "no photo chosen".into(),
        ImageStagingView::Encoding { file_name } => format!("preparing {file_name}"),
        ImageStagingView::Ready {
            file_name,
            width,
            height,
            ..
        } => format!("{file_name} {width}x{height} ready"),
        ImageStagingView::Failed { file_name, message } => format!("{file_name}: {message}"),
    }
}

fn preview(text: &str) -> String {
    description_preview(text, DESCRIPTION_PREVIEW_LENGTH)
}

fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return String::from("(no rows)");
    }

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            rows.iter()
                .filter_map(|row| row.get(index))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
                .max(header.len())
        })
        .collect();

    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let header_line = line(headers.to_vec());
    let divider = "-".repeat(header_line.chars().count());
    let mut out = vec![header_line, divider];
    out.extend(
        rows.iter()
            .map(|row| line(row.iter().map(String::as_str).collect())),
    );
    out.join("\n")
}
