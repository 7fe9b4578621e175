//! Turns one CLI invocation into a sequence of core events.

use anyhow::Context;
use serde::Serialize;
use shared::{Event, IssueId, IssueOrdering, Page, Transition, ViewModel};
use tracing::info;

use crate::cli::Command;
use crate::shell::Shell;
use crate::transport::Transport;

/// How a submitted transition ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ActionResult {
    Applied,
    /// Refused before any request was sent.
    Rejected { reason: String },
    /// Blocked or failed; details are in the view's error.
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActionSummary {
    pub issue_id: IssueId,
    pub transition: Transition,
    #[serde(flatten)]
    pub result: ActionResult,
}

#[derive(Clone, Debug, Serialize)]
pub struct CommandOutcome {
    pub view: ViewModel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionSummary>,
}

impl CommandOutcome {
    /// True when the run should end with a non-zero exit code.
    #[must_use]
    pub fn is_alert(&self) -> bool {
        self.view.error.is_some()
            || self
                .action
                .as_ref()
                .is_some_and(|action| action.result != ActionResult::Applied)
    }
}

/// Loads the snapshot, then applies `command` against it.
pub async fn run<T: Transport>(
    shell: &mut Shell<T>,
    command: &Command,
    api_base_url: &str,
    ordering: IssueOrdering,
) -> anyhow::Result<CommandOutcome> {
    shell.dispatch(Event::IssueOrderingSelected(ordering)).await;
    shell
        .dispatch(Event::Started {
            api_base_url: api_base_url.to_string(),
        })
        .await;

    let transition = match command {
        Command::Dashboard => {
            shell.dispatch(Event::PageSelected(Page::Dashboard)).await;
            None
        }
        Command::Issues { .. } => {
            shell.dispatch(Event::PageSelected(Page::Issues)).await;
            None
        }
        Command::Resolved => {
            shell.dispatch(Event::PageSelected(Page::Resolved)).await;
            None
        }
        Command::Feedback => {
            shell.dispatch(Event::PageSelected(Page::Feedback)).await;
            None
        }
        Command::Show { id } => {
            shell.dispatch(Event::IssueSelected(IssueId(*id))).await;
            None
        }
        Command::Assign { id, name, contact } => {
            shell.dispatch(Event::IssueSelected(IssueId(*id))).await;
            shell.dispatch(Event::EmployeeNameChanged(name.clone())).await;
            shell
                .dispatch(Event::EmployeeContactChanged(contact.clone()))
                .await;
            Some(Transition::Assign)
        }
        Command::Resolve { id, image } => {
            let bytes = tokio::fs::read(image)
                .await
                .with_context(|| format!("failed to read image {}", image.display()))?;
            let file_name = image.file_name().map_or_else(
                || image.display().to_string(),
                |name| name.to_string_lossy().into_owned(),
            );

            shell.dispatch(Event::IssueSelected(IssueId(*id))).await;
            shell
                .dispatch(Event::ResolutionImageChosen { file_name, bytes })
                .await;
            Some(Transition::Resolve)
        }
        Command::Reopen { id } => {
            shell.dispatch(Event::IssueSelected(IssueId(*id))).await;
            Some(Transition::Reopen)
        }
    };

    let Some(transition) = transition else {
        return Ok(CommandOutcome {
            view: shell.view(),
            action: None,
        });
    };

    let issue_id = command
        .issue_id()
        .context("transition command without an issue id")?;
    let submitted = match transition {
        Transition::Assign => Event::AssignSubmitted,
        Transition::Resolve => Event::ResolveSubmitted,
        Transition::Reopen => Event::ReopenSubmitted,
    };

    let panel_was_open = shell.is_panel_open_for(issue_id);
    shell.dispatch(submitted).await;

    let view = shell.view();
    let result = if view.error.is_some() || !panel_was_open {
        ActionResult::Failed
    } else if let Some(detail) = &view.detail {
        match &detail.validation_message {
            Some(reason) => ActionResult::Rejected {
                reason: reason.clone(),
            },
            None => ActionResult::Failed,
        }
    } else {
        ActionResult::Applied
    };
    info!(%issue_id, %transition, ?result, "command finished");

    Ok(CommandOutcome {
        view,
        action: Some(ActionSummary {
            issue_id,
            transition,
            result,
        }),
    })
}
