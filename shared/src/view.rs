//! Pure projections of the issue snapshot and the view model built from them.

use serde::{Deserialize, Serialize};

use crate::model::{
    ActionForm, DataSource, DetailPanel, ImageStaging, Issue, IssueId, IssueOrdering, Page,
    Transition,
};
use crate::{UserFacingError, ACTIONS_DISABLED_MESSAGE, FALLBACK_BANNER_MESSAGE};

pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub progress_percent: u8,
}

#[must_use]
pub fn dashboard_stats(issues: &[Issue]) -> DashboardStats {
    let mut stats = DashboardStats {
        total: issues.len(),
        ..DashboardStats::default()
    };

    for issue in issues {
        match issue.status {
            crate::IssueStatus::Active => stats.pending += 1,
            crate::IssueStatus::InProgress => stats.in_progress += 1,
            crate::IssueStatus::Resolved => stats.resolved += 1,
            crate::IssueStatus::Unrecognized(_) => {}
        }
    }

    stats.progress_percent = resolution_progress(stats.resolved, stats.total);
    stats
}

/// `round(resolved / total * 100)` with halves rounded up; 0 for an empty set.
#[must_use]
pub fn resolution_progress(resolved: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let resolved = resolved.min(total) as u128;
    let total = total as u128;
    let percent = (resolved * 200 + total) / (total * 2);
    u8::try_from(percent.min(100)).unwrap_or(100)
}

#[must_use]
pub fn active_issues(issues: &[Issue], ordering: IssueOrdering) -> Vec<&Issue> {
    let mut active: Vec<&Issue> = issues.iter().filter(|i| !i.status.is_resolved()).collect();
    if ordering == IssueOrdering::Priority {
        // stable, so equal scores keep arrival order
        active.sort_by(|a, b| b.admin_priority_score.total_cmp(&a.admin_priority_score));
    }
    active
}

#[must_use]
pub fn resolved_issues(issues: &[Issue]) -> Vec<&Issue> {
    issues.iter().filter(|i| i.status.is_resolved()).collect()
}

#[must_use]
pub fn feedback_issues(issues: &[Issue]) -> Vec<&Issue> {
    issues.iter().filter(|i| i.has_feedback()).collect()
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Good,
    Poor,
    NotRated,
}

impl Rating {
    #[must_use]
    pub const fn from_answer(answer: Option<bool>) -> Self {
        match answer {
            Some(true) => Self::Good,
            Some(false) => Self::Poor,
            None => Self::NotRated,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Poor => "Poor",
            Self::NotRated => "Not rated",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IssueRow {
    pub id: IssueId,
    pub priority: String,
    pub category: String,
    pub description: String,
    pub upvotes: u32,
    pub status: String,
}

impl From<&Issue> for IssueRow {
    fn from(issue: &Issue) -> Self {
        Self {
            id: issue.id,
            priority: format!("{:.0}", issue.admin_priority_score.round()),
            category: issue.category.clone(),
            description: issue.description.clone(),
            upvotes: issue.upvotes,
            status: issue.status.display_name().to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedRow {
    pub id: IssueId,
    pub category: String,
    pub description: String,
    pub assigned_to: String,
}

impl From<&Issue> for ResolvedRow {
    fn from(issue: &Issue) -> Self {
        Self {
            id: issue.id,
            category: issue.category.clone(),
            description: issue.description.clone(),
            assigned_to: issue.assignee().unwrap_or(NOT_AVAILABLE).to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedbackRow {
    pub id: IssueId,
    pub description: String,
    pub assigned_to: String,
    pub work: Rating,
    pub speed: Rating,
}

impl From<&Issue> for FeedbackRow {
    fn from(issue: &Issue) -> Self {
        Self {
            id: issue.id,
            description: issue.description.clone(),
            assigned_to: issue.assignee().unwrap_or(NOT_AVAILABLE).to_string(),
            work: Rating::from_answer(issue.satisfied_with_work),
            speed: Rating::from_answer(issue.satisfied_with_speed),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageContent {
    Dashboard {
        stats: DashboardStats,
    },
    Issues {
        ordering: IssueOrdering,
        rows: Vec<IssueRow>,
    },
    Resolved {
        rows: Vec<ResolvedRow>,
    },
    Feedback {
        rows: Vec<FeedbackRow>,
    },
}

impl PageContent {
    #[must_use]
    pub fn project(page: Page, issues: &[Issue], ordering: IssueOrdering) -> Self {
        match page {
            Page::Dashboard => Self::Dashboard {
                stats: dashboard_stats(issues),
            },
            Page::Issues => Self::Issues {
                ordering,
                rows: active_issues(issues, ordering)
                    .into_iter()
                    .map(IssueRow::from)
                    .collect(),
            },
            Page::Resolved => Self::Resolved {
                rows: resolved_issues(issues)
                    .into_iter()
                    .map(ResolvedRow::from)
                    .collect(),
            },
            Page::Feedback => Self::Feedback {
                rows: feedback_issues(issues)
                    .into_iter()
                    .map(FeedbackRow::from)
                    .collect(),
            },
        }
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        match self {
            Self::Dashboard { stats } => stats.total,
            Self::Issues { rows, .. } => rows.len(),
            Self::Resolved { rows } => rows.len(),
            Self::Feedback { rows } => rows.len(),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DataSourceView {
    Loading,
    Live,
    Fallback,
}

impl From<&DataSource> for DataSourceView {
    fn from(source: &DataSource) -> Self {
        match source {
            DataSource::Pending => Self::Loading,
            DataSource::Live => Self::Live,
            DataSource::Fallback { .. } => Self::Fallback,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ImageStagingView {
    Empty,
    Encoding {
        file_name: String,
    },
    Ready {
        file_name: String,
        mime_type: String,
        width: u32,
        height: u32,
        encoded_bytes: usize,
    },
    Failed {
        file_name: String,
        message: String,
    },
}

impl From<&ImageStaging> for ImageStagingView {
    fn from(staging: &ImageStaging) -> Self {
        match staging {
            ImageStaging::Empty => Self::Empty,
            ImageStaging::Encoding { file_name, .. } => Self::Encoding {
                file_name: file_name.clone(),
            },
            ImageStaging::Ready(staged) => Self::Ready {
                file_name: staged.file_name.clone(),
                mime_type: staged.mime_type.clone(),
                width: staged.width,
                height: staged.height,
                encoded_bytes: staged.encoded_len(),
            },
            ImageStaging::Failed { file_name, error } => Self::Failed {
                file_name: file_name.clone(),
                message: crate::AppError::from(error.clone()).user_facing_message(),
            },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionView {
    Assign {
        employee_name: String,
        employee_contact: String,
        can_submit: bool,
    },
    Resolve {
        image: ImageStagingView,
        can_submit: bool,
    },
    Reopen {
        can_submit: bool,
    },
    Unavailable,
}

impl ActionView {
    #[must_use]
    pub fn can_submit(&self) -> bool {
        match self {
            Self::Assign { can_submit, .. }
            | Self::Resolve { can_submit, .. }
            | Self::Reopen { can_submit } => *can_submit,
            Self::Unavailable => false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DetailView {
    pub id: IssueId,
    pub category: String,
    pub description: String,
    pub address: String,
    pub status: String,
    pub upvotes: u32,
    pub priority: String,
    pub reported_at: Option<String>,
    pub assigned_to: String,
    pub assignee_contact: String,
    pub before_image_url: String,
    pub after_image_url: Option<String>,
    pub action_label: Option<String>,
    pub action: ActionView,
    pub actions_enabled: bool,
    pub notice: Option<String>,
    pub submitting: bool,
    pub validation_message: Option<String>,
}

impl DetailView {
    #[must_use]
    pub fn build(issue: &Issue, panel: &DetailPanel, actions_enabled: bool) -> Self {
        let ready = panel.form.validate().is_ok() && actions_enabled && !panel.submitting;
        let action = match &panel.form {
            ActionForm::Assign {
                employee_name,
                employee_contact,
            } => ActionView::Assign {
                employee_name: employee_name.clone(),
                employee_contact: employee_contact.clone(),
                can_submit: ready,
            },
            ActionForm::Resolve { image } => ActionView::Resolve {
                image: ImageStagingView::from(image),
                can_submit: ready,
            },
            ActionForm::Reopen => ActionView::Reopen { can_submit: ready },
            ActionForm::Unavailable => ActionView::Unavailable,
        };

        Self {
            id: issue.id,
            category: issue.category.clone(),
            description: issue.description.clone(),
            address: issue.address.clone(),
            status: issue.status.display_name().to_string(),
            upvotes: issue.upvotes,
            priority: format!("{:.0}", issue.admin_priority_score.round()),
            reported_at: issue.created_at.clone(),
            assigned_to: issue.assignee().unwrap_or(NOT_AVAILABLE).to_string(),
            assignee_contact: issue.assignee_contact().unwrap_or(NOT_AVAILABLE).to_string(),
            before_image_url: issue.image_url.clone(),
            after_image_url: issue.resolved_image_url.clone(),
            action_label: panel
                .form
                .transition()
                .map(|t: Transition| t.label().to_string()),
            action,
            actions_enabled,
            notice: (!actions_enabled).then(|| ACTIONS_DISABLED_MESSAGE.to_string()),
            submitting: panel.submitting,
            validation_message: panel.validation.map(|v| v.to_string()),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub page: Page,
    pub data_source: DataSourceView,
    pub banner: Option<String>,
    pub is_refreshing: bool,
    pub content: PageContent,
    pub detail: Option<DetailView>,
    pub error: Option<UserFacingError>,
}

impl ViewModel {
    #[must_use]
    pub fn banner_for(source: &DataSource) -> Option<String> {
        source
            .is_fallback()
            .then(|| FALLBACK_BANNER_MESSAGE.to_string())
    }
}
