use serde::{Deserialize, Deserializer, Serialize};

use crate::capabilities::http::ValidatedUrl;
use crate::capabilities::EncodedImage;
use crate::{fallback, AppError, ImageError, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(pub u64);

impl IssueId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for IssueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a complaint as the backend reports it.
///
/// Wire values are `active`, `In Progress` and `Resolved`, matched exactly.
/// Anything else, including a missing status, is kept as `Unrecognized` so it
/// still counts toward totals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IssueStatus {
    Active,
    InProgress,
    Resolved,
    Unrecognized(String),
}

impl IssueStatus {
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "active" => Self::Active,
            "In Progress" => Self::InProgress,
            "Resolved" => Self::Resolved,
            _ => Self::Unrecognized(s.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
            Self::Unrecognized(raw) => raw,
        }
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::Active => "Active",
            Self::Unrecognized(raw) if raw.is_empty() => "Unknown",
            other => other.as_str(),
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved)
    }

    #[must_use]
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }

    /// Only issues past the assign step carry a meaningful assignee.
    #[must_use]
    pub fn has_assignee(&self) -> bool {
        matches!(self, Self::InProgress | Self::Resolved)
    }

    #[must_use]
    pub fn available_transition(&self) -> Option<Transition> {
        match self {
            Self::Active => Some(Transition::Assign),
            Self::InProgress => Some(Transition::Resolve),
            Self::Resolved => Some(Transition::Reopen),
            Self::Unrecognized(_) => None,
        }
    }
}

/// A record without a status matches no bucket.
impl Default for IssueStatus {
    fn default() -> Self {
        Self::Unrecognized(String::new())
    }
}

impl From<String> for IssueStatus {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<IssueStatus> for String {
    fn from(status: IssueStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Assign,
    Resolve,
    Reopen,
}

impl Transition {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Assign => "assign",
            Self::Resolve => "resolve",
            Self::Reopen => "reopen",
        }
    }

    /// Last path segment under `/api/complaints/{id}/`.
    #[must_use]
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::Assign => "assign",
            Self::Resolve => "resolve",
            Self::Reopen => "status",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Assign => "Assign Task",
            Self::Resolve => "Mark as Resolved",
            Self::Reopen => "Re-open Issue",
        }
    }

    #[must_use]
    pub fn target_status(self) -> IssueStatus {
        match self {
            Self::Assign | Self::Reopen => IssueStatus::InProgress,
            Self::Resolve => IssueStatus::Resolved,
        }
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: IssueId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub upvotes: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: IssueStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub admin_priority_score: f64,
    #[serde(default)]
    pub assigned_employee_name: Option<String>,
    #[serde(default)]
    pub assigned_employee_contact: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_url: String,
    #[serde(default)]
    pub resolved_image_url: Option<String>,
    #[serde(default)]
    pub satisfied_with_work: Option<bool>,
    #[serde(default)]
    pub satisfied_with_speed: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub resolved_at: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_phone: Option<String>,
}

impl Issue {
    #[must_use]
    pub fn new(id: IssueId, category: impl Into<String>, status: IssueStatus) -> Self {
        Self {
            id,
            category: category.into(),
            description: String::new(),
            address: String::new(),
            upvotes: 0,
            status,
            admin_priority_score: 0.0,
            assigned_employee_name: None,
            assigned_employee_contact: None,
            image_url: String::new(),
            resolved_image_url: None,
            satisfied_with_work: None,
            satisfied_with_speed: None,
            created_at: None,
            resolved_at: None,
            latitude: None,
            longitude: None,
            user_name: None,
            user_phone: None,
        }
    }

    #[must_use]
    pub fn assignee(&self) -> Option<&str> {
        if !self.status.has_assignee() {
            return None;
        }
        self.assigned_employee_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }

    #[must_use]
    pub fn assignee_contact(&self) -> Option<&str> {
        if !self.status.has_assignee() {
            return None;
        }
        self.assigned_employee_contact
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    #[must_use]
    pub fn has_feedback(&self) -> bool {
        self.status.is_resolved() && self.satisfied_with_work.is_some()
    }

    #[must_use]
    pub fn description_preview(&self, max_len: usize) -> String {
        crate::description_preview(&self.description, max_len)
    }
}

/// Where the current snapshot came from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataSource {
    #[default]
    Pending,
    Live,
    Fallback { error: AppError },
}

impl DataSource {
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }

    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Last fetched issue collection. Replaced wholesale, never patched.
#[derive(Debug, Clone, Default)]
pub struct IssueCache {
    issues: Vec<Issue>,
    source: DataSource,
    issued_refreshes: u64,
    awaiting: Option<u64>,
}

impl IssueCache {
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    #[must_use]
    pub fn source(&self) -> &DataSource {
        &self.source
    }

    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.source.is_live()
    }

    #[must_use]
    pub const fn is_refreshing(&self) -> bool {
        self.awaiting.is_some()
    }

    #[must_use]
    pub fn find(&self, id: IssueId) -> Option<&Issue> {
        self.issues.iter().find(|issue| issue.id == id)
    }

    /// Numbers a new refresh. Only the newest number may land.
    pub fn begin_refresh(&mut self) -> u64 {
        self.issued_refreshes += 1;
        self.awaiting = Some(self.issued_refreshes);
        self.issued_refreshes
    }

    #[must_use]
    pub fn is_current(&self, seq: u64) -> bool {
        self.awaiting == Some(seq)
    }

    pub fn replace_live(&mut self, issues: Vec<Issue>) {
        self.issues = issues;
        self.source = DataSource::Live;
        self.awaiting = None;
    }

    pub fn replace_with_fallback(&mut self, error: AppError) {
        self.issues = fallback::fallback_issues();
        self.source = DataSource::Fallback { error };
        self.awaiting = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    #[default]
    Dashboard,
    Issues,
    Resolved,
    Feedback,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Dashboard, Page::Issues, Page::Resolved, Page::Feedback];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Issues => "Issues",
            Self::Resolved => "Resolved",
            Self::Feedback => "Feedback",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueOrdering {
    /// Highest `adminPriorityScore` first; ties keep arrival order.
    #[default]
    Priority,
    /// Snapshot order as received.
    Arrival,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedImage {
    pub file_name: String,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    pub data_url: String,
}

impl StagedImage {
    #[must_use]
    pub fn new(file_name: String, encoded: EncodedImage) -> Self {
        Self {
            file_name,
            mime_type: encoded.mime_type,
            width: encoded.width,
            height: encoded.height,
            data_url: encoded.data_url,
        }
    }

    #[must_use]
    pub fn encoded_len(&self) -> usize {
        self.data_url.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageStaging {
    #[default]
    Empty,
    Encoding {
        staging_id: u64,
        file_name: String,
    },
    Ready(StagedImage),
    Failed {
        file_name: String,
        error: ImageError,
    },
}

/// JSON bodies of the three transition endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TransitionPayload {
    Assign {
        name: String,
        contact: String,
    },
    Resolve {
        #[serde(rename = "resolvedImageUrl")]
        resolved_image_url: String,
    },
    Reopen {
        status: IssueStatus,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionForm {
    Assign {
        employee_name: String,
        employee_contact: String,
    },
    Resolve {
        image: ImageStaging,
    },
    Reopen,
    Unavailable,
}

impl ActionForm {
    #[must_use]
    pub fn for_status(status: &IssueStatus) -> Self {
        match status.available_transition() {
            Some(Transition::Assign) => Self::Assign {
                employee_name: String::new(),
                employee_contact: String::new(),
            },
            Some(Transition::Resolve) => Self::Resolve {
                image: ImageStaging::Empty,
            },
            Some(Transition::Reopen) => Self::Reopen,
            None => Self::Unavailable,
        }
    }

    #[must_use]
    pub const fn transition(&self) -> Option<Transition> {
        match self {
            Self::Assign { .. } => Some(Transition::Assign),
            Self::Resolve { .. } => Some(Transition::Resolve),
            Self::Reopen => Some(Transition::Reopen),
            Self::Unavailable => None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Assign {
                employee_name,
                employee_contact,
            } => {
                if employee_name.trim().is_empty() {
                    return Err(ValidationError::MissingEmployeeName);
                }
                if employee_contact.trim().is_empty() {
                    return Err(ValidationError::MissingEmployeeContact);
                }
                Ok(())
            }
            Self::Resolve { image } => match image {
                ImageStaging::Ready(_) => Ok(()),
                ImageStaging::Encoding { .. } => Err(ValidationError::ImageStillEncoding),
                ImageStaging::Empty | ImageStaging::Failed { .. } => {
                    Err(ValidationError::ImageNotStaged)
                }
            },
            Self::Reopen => Ok(()),
            Self::Unavailable => Err(ValidationError::NoActionAvailable),
        }
    }

    pub fn payload(&self) -> Result<TransitionPayload, ValidationError> {
        self.validate()?;
        match self {
            Self::Assign {
                employee_name,
                employee_contact,
            } => Ok(TransitionPayload::Assign {
                name: employee_name.trim().to_string(),
                contact: employee_contact.trim().to_string(),
            }),
            Self::Resolve {
                image: ImageStaging::Ready(staged),
            } => Ok(TransitionPayload::Resolve {
                resolved_image_url: staged.data_url.clone(),
            }),
            Self::Reopen => Ok(TransitionPayload::Reopen {
                status: Transition::Reopen.target_status(),
            }),
            Self::Resolve { .. } => Err(ValidationError::ImageNotStaged),
            Self::Unavailable => Err(ValidationError::NoActionAvailable),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailPanel {
    pub issue_id: IssueId,
    pub form: ActionForm,
    pub submitting: bool,
    pub validation: Option<ValidationError>,
}

impl DetailPanel {
    #[must_use]
    pub fn open(issue: &Issue) -> Self {
        Self {
            issue_id: issue.id,
            form: ActionForm::for_status(&issue.status),
            submitting: false,
            validation: None,
        }
    }

    /// Rebuilds the form when a refresh moved the issue to another status.
    pub fn sync_with(&mut self, issue: &Issue) {
        if self.form.transition() != issue.status.available_transition() {
            self.form = ActionForm::for_status(&issue.status);
            self.validation = None;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Model {
    pub api_base: Option<ValidatedUrl>,
    pub cache: IssueCache,
    pub page: Page,
    pub ordering: IssueOrdering,
    pub panel: Option<DetailPanel>,
    pub active_error: Option<AppError>,
    pub(crate) staging_counter: u64,
}

impl Model {
    pub fn set_error(&mut self, error: AppError) {
        self.active_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.active_error = None;
    }

    pub fn next_staging_id(&mut self) -> u64 {
        self.staging_counter += 1;
        self.staging_counter
    }

    #[must_use]
    pub fn panel_issue(&self) -> Option<&Issue> {
        self.panel
            .as_ref()
            .and_then(|panel| self.cache.find(panel.issue_id))
    }

    #[must_use]
    pub fn is_panel_open_for(&self, issue_id: IssueId) -> bool {
        self.panel.as_ref().is_some_and(|p| p.issue_id == issue_id)
    }

    /// Closes the panel if its issue left the snapshot, otherwise keeps its
    /// form in step with the issue's status.
    pub fn sync_panel(&mut self) {
        let Some(panel) = self.panel.as_mut() else {
            return;
        };
        match self.cache.find(panel.issue_id) {
            Some(issue) => panel.sync_with(issue),
            None => self.panel = None,
        }
    }
}
