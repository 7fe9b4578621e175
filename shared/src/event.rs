use crux_http::Response;
use serde::{Deserialize, Serialize};

use crate::capabilities::ImageResult;
use crate::model::{Issue, IssueId, IssueOrdering, Page, Transition};

/// Outcome of `GET /api/complaints/admin-view`, body already decoded.
pub type IssuesResult = crux_http::Result<Response<Vec<Issue>>>;

/// Outcome of a transition `PUT`. The body is not read.
pub type TransitionResult = crux_http::Result<Response<Vec<u8>>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Shell is up; points the core at the backend and loads the first snapshot.
    Started {
        api_base_url: String,
    },
    RefreshRequested,

    PageSelected(Page),
    IssueOrderingSelected(IssueOrdering),

    IssueSelected(IssueId),
    PanelClosed,
    EmployeeNameChanged(String),
    EmployeeContactChanged(String),
    ResolutionImageChosen {
        file_name: String,
        bytes: Vec<u8>,
    },
    AssignSubmitted,
    ResolveSubmitted,
    ReopenSubmitted,

    ErrorDismissed,

    // Capability results
    IssuesFetched {
        seq: u64,
        result: IssuesResult,
    },
    ResolutionImageStaged {
        issue_id: IssueId,
        staging_id: u64,
        result: ImageResult,
    },
    TransitionCompleted {
        issue_id: IssueId,
        transition: Transition,
        result: TransitionResult,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::RefreshRequested => "refresh_requested",
            Self::PageSelected(_) => "page_selected",
            Self::IssueOrderingSelected(_) => "issue_ordering_selected",
            Self::IssueSelected(_) => "issue_selected",
            Self::PanelClosed => "panel_closed",
            Self::EmployeeNameChanged(_) => "employee_name_changed",
            Self::EmployeeContactChanged(_) => "employee_contact_changed",
            Self::ResolutionImageChosen { .. } => "resolution_image_chosen",
            Self::AssignSubmitted => "assign_submitted",
            Self::ResolveSubmitted => "resolve_submitted",
            Self::ReopenSubmitted => "reopen_submitted",
            Self::ErrorDismissed => "error_dismissed",
            Self::IssuesFetched { .. } => "issues_fetched",
            Self::ResolutionImageStaged { .. } => "resolution_image_staged",
            Self::TransitionCompleted { .. } => "transition_completed",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        !matches!(
            self,
            Self::IssuesFetched { .. }
                | Self::ResolutionImageStaged { .. }
                | Self::TransitionCompleted { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_results_are_not_user_initiated() {
        let fetched = Event::IssuesFetched {
            seq: 1,
            result: Err(crux_http::Error::Timeout),
        };
        assert!(!fetched.is_user_initiated());
        assert!(Event::AssignSubmitted.is_user_initiated());
    }

    #[test]
    fn test_user_events_cross_the_bridge() {
        let event = Event::ResolutionImageChosen {
            file_name: "after.png".into(),
            bytes: vec![0x89, 0x50],
        };

        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();

        assert!(matches!(
            back,
            Event::ResolutionImageChosen { ref file_name, ref bytes }
                if file_name == "after.png" && bytes == &[0x89, 0x50]
        ));
    }

    #[test]
    fn test_event_names_are_snake_case() {
        let events = [
            Event::RefreshRequested,
            Event::PageSelected(Page::Feedback),
            Event::IssueSelected(IssueId(1)),
            Event::ResolveSubmitted,
        ];
        for event in events {
            let name = event.name();
            assert!(name.chars().all(|c| c.is_ascii_lowercase() || c == '_'));
        }
    }
}
