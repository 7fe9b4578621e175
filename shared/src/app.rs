use crux_http::http::{Body, Method};
use tracing::{debug, info, warn};

use crate::capabilities::http::{self, ACCEPT_HEADER, JSON_CONTENT_TYPE, REQUEST_ID_HEADER};
use crate::capabilities::{Capabilities, ImageResult, ValidatedUrl};
use crate::event::{Event, IssuesResult, TransitionResult};
use crate::model::{
    ActionForm, DetailPanel, ImageStaging, Issue, IssueId, Model, StagedImage, Transition,
    TransitionPayload,
};
use crate::view::{DataSourceView, DetailView, PageContent, ViewModel};
use crate::{
    AppError, ErrorKind, ImageError, TransitionError, UserFacingError, ADMIN_VIEW_PATH,
    COMPLAINTS_PATH,
};

#[derive(Default)]
pub struct App;

impl App {
    fn refresh(model: &mut Model, caps: &Capabilities) {
        let Some(base) = model.api_base.as_ref() else {
            warn!("no API base URL configured, showing sample data");
            model.cache.replace_with_fallback(AppError::new(
                ErrorKind::Configuration,
                "API base URL is not configured",
            ));
            model.sync_panel();
            return;
        };

        match base.join(ADMIN_VIEW_PATH) {
            Ok(url) => {
                let seq = model.cache.begin_refresh();
                let request_id = http::new_request_id();
                debug!(%url, %request_id, seq, "requesting issue snapshot");
                caps.http
                    .request(Method::Get, url.url().clone())
                    .header(ACCEPT_HEADER, JSON_CONTENT_TYPE)
                    .header(REQUEST_ID_HEADER, request_id.as_str())
                    .expect_json::<Vec<Issue>>()
                    .send(move |result| Event::IssuesFetched { seq, result });
            }
            Err(e) => {
                warn!(error = %e, "could not build refresh request");
                model.cache.replace_with_fallback(e.into());
                model.sync_panel();
            }
        }
    }

    fn handle_refresh_response(seq: u64, result: IssuesResult, model: &mut Model) {
        if !model.cache.is_current(seq) {
            debug!(seq, "discarding superseded refresh");
            return;
        }

        let issues = result.map(|mut response| response.take_body().unwrap_or_default());

        match issues {
            Ok(issues) => {
                info!(count = issues.len(), "issue snapshot refreshed");
                model.cache.replace_live(issues);
            }
            Err(e) => {
                warn!(error = %e, "refresh failed, showing sample data");
                model.cache.replace_with_fallback(e.into());
            }
        }

        model.sync_panel();
    }

    fn transition_request(
        base: &ValidatedUrl,
        issue_id: IssueId,
        transition: Transition,
        payload: &TransitionPayload,
    ) -> Result<(ValidatedUrl, Body), AppError> {
        let path = format!(
            "{COMPLAINTS_PATH}/{issue_id}/{}",
            transition.path_segment()
        );
        Ok((base.join(&path)?, http::json_body(payload)?))
    }

    fn submit(transition: Transition, model: &mut Model, caps: &Capabilities) {
        let Some(panel) = model.panel.as_mut() else {
            warn!(%transition, "submit without an open panel");
            return;
        };

        if panel.submitting {
            debug!(%transition, issue_id = %panel.issue_id, "transition already in flight");
            return;
        }

        if panel.form.transition() != Some(transition) {
            let status = model
                .cache
                .find(panel.issue_id)
                .map(|issue| issue.status.clone())
                .unwrap_or_default();
            model.active_error = Some(TransitionError::NotAvailable { transition, status }.into());
            return;
        }

        let payload = match panel.form.payload() {
            Ok(payload) => payload,
            Err(validation) => {
                debug!(%transition, %validation, "submit rejected by validation");
                panel.validation = Some(validation);
                return;
            }
        };
        panel.validation = None;

        if !model.cache.is_live() {
            info!(%transition, "transition blocked while sample data is shown");
            model.active_error = Some(AppError::actions_disabled());
            return;
        }

        let Some(base) = model.api_base.as_ref() else {
            model.active_error = Some(AppError::new(
                ErrorKind::Configuration,
                "API base URL is not configured",
            ));
            return;
        };

        let issue_id = panel.issue_id;
        match Self::transition_request(base, issue_id, transition, &payload) {
            Ok((url, body)) => {
                let request_id = http::new_request_id();
                info!(%issue_id, %transition, %request_id, "submitting transition");
                panel.submitting = true;
                caps.http
                    .request(Method::Put, url.url().clone())
                    .header(ACCEPT_HEADER, JSON_CONTENT_TYPE)
                    .header(REQUEST_ID_HEADER, request_id.as_str())
                    .body(body)
                    .send(move |result| Event::TransitionCompleted {
                        issue_id,
                        transition,
                        result,
                    });
            }
            Err(e) => {
                warn!(%issue_id, %transition, error = %e, "could not build transition request");
                model.active_error = Some(AppError::action_failed(transition, issue_id, &e));
            }
        }
    }

    fn handle_transition_response(
        issue_id: IssueId,
        transition: Transition,
        result: TransitionResult,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        match result {
            Ok(response) => {
                info!(%issue_id, %transition, status = %response.status(), "transition applied");
                if model.is_panel_open_for(issue_id) {
                    model.panel = None;
                }
                Self::refresh(model, caps);
            }
            Err(e) => {
                warn!(%issue_id, %transition, error = %e, "transition failed");
                if let Some(panel) = model.panel.as_mut().filter(|p| p.issue_id == issue_id) {
                    panel.submitting = false;
                }
                let cause = AppError::from(e);
                model.set_error(AppError::action_failed(transition, issue_id, &cause));
            }
        }
    }

    fn stage_image(file_name: String, bytes: Vec<u8>, model: &mut Model, caps: &Capabilities) {
        let staging_id = model.next_staging_id();
        let Some(panel) = model.panel.as_mut() else {
            warn!("image chosen without an open panel");
            return;
        };
        let issue_id = panel.issue_id;
        let ActionForm::Resolve { image } = &mut panel.form else {
            warn!(%issue_id, "image chosen for an issue that is not in progress");
            return;
        };

        panel.validation = None;
        if bytes.is_empty() {
            *image = ImageStaging::Failed {
                file_name,
                error: ImageError::Empty,
            };
            return;
        }

        debug!(%issue_id, staging_id, size = bytes.len(), "staging resolution image");
        *image = ImageStaging::Encoding {
            staging_id,
            file_name: file_name.clone(),
        };
        caps.image.encode_data_url(file_name, bytes, move |result| {
            Event::ResolutionImageStaged {
                issue_id,
                staging_id,
                result,
            }
        });
    }

    fn handle_image_staged(
        issue_id: IssueId,
        staging_id: u64,
        result: ImageResult,
        model: &mut Model,
    ) {
        let Some(panel) = model.panel.as_mut().filter(|p| p.issue_id == issue_id) else {
            debug!(%issue_id, staging_id, "discarding image for a closed panel");
            return;
        };
        let ActionForm::Resolve { image } = &mut panel.form else {
            return;
        };
        let ImageStaging::Encoding {
            staging_id: current,
            file_name,
        } = image
        else {
            return;
        };
        if *current != staging_id {
            debug!(%issue_id, staging_id, "discarding superseded image");
            return;
        }

        let file_name = std::mem::take(file_name);
        *image = match result {
            Ok(encoded) => {
                debug!(%issue_id, mime = %encoded.mime_type, "resolution image ready");
                ImageStaging::Ready(StagedImage::new(file_name, encoded))
            }
            Err(error) => {
                warn!(%issue_id, %error, "resolution image rejected");
                ImageStaging::Failed { file_name, error }
            }
        };
    }

}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        debug!(event = event.name(), user = event.is_user_initiated(), "update");

        match event {
            Event::Started { api_base_url } => match ValidatedUrl::new(api_base_url) {
                Ok(url) => {
                    info!(api_base = %url, "dashboard started");
                    model.api_base = Some(url);
                    Self::refresh(model, caps);
                }
                Err(e) => {
                    warn!(error = %e, "rejected API base URL");
                    model.api_base = None;
                    model.cache.replace_with_fallback(e.into());
                    model.sync_panel();
                }
            },

            Event::RefreshRequested => Self::refresh(model, caps),

            Event::IssuesFetched { seq, result } => {
                Self::handle_refresh_response(seq, result, model);
            }

            Event::PageSelected(page) => model.page = page,

            Event::IssueOrderingSelected(ordering) => model.ordering = ordering,

            Event::IssueSelected(issue_id) => match model.cache.find(issue_id) {
                Some(issue) => model.panel = Some(DetailPanel::open(issue)),
                None => {
                    warn!(%issue_id, "selected issue is not in the snapshot");
                    model.set_error(
                        AppError::new(ErrorKind::NotFound, "Issue not found")
                            .with_context("issue_id", issue_id.to_string()),
                    );
                }
            },

            Event::PanelClosed => model.panel = None,

            Event::EmployeeNameChanged(name) => {
                if let Some(panel) = model.panel.as_mut() {
                    if let ActionForm::Assign { employee_name, .. } = &mut panel.form {
                        *employee_name = name;
                        panel.validation = None;
                    }
                }
            }

            Event::EmployeeContactChanged(contact) => {
                if let Some(panel) = model.panel.as_mut() {
                    if let ActionForm::Assign {
                        employee_contact, ..
                    } = &mut panel.form
                    {
                        *employee_contact = contact;
                        panel.validation = None;
                    }
                }
            }

            Event::ResolutionImageChosen { file_name, bytes } => {
                Self::stage_image(file_name, bytes, model, caps);
            }

            Event::ResolutionImageStaged {
                issue_id,
                staging_id,
                result,
            } => Self::handle_image_staged(issue_id, staging_id, result, model),

            Event::AssignSubmitted => Self::submit(Transition::Assign, model, caps),
            Event::ResolveSubmitted => Self::submit(Transition::Resolve, model, caps),
            Event::ReopenSubmitted => Self::submit(Transition::Reopen, model, caps),

            Event::TransitionCompleted {
                issue_id,
                transition,
                result,
            } => Self::handle_transition_response(issue_id, transition, result, model, caps),

            Event::ErrorDismissed => model.clear_error(),
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        let source = model.cache.source();
        let actions_enabled = model.cache.is_live();

        let detail = model.panel.as_ref().and_then(|panel| {
            model
                .cache
                .find(panel.issue_id)
                .map(|issue| DetailView::build(issue, panel, actions_enabled))
        });

        ViewModel {
            page: model.page,
            data_source: DataSourceView::from(source),
            banner: ViewModel::banner_for(source),
            is_refreshing: model.cache.is_refreshing(),
            content: PageContent::project(model.page, model.cache.issues(), model.ordering),
            detail,
            error: model.active_error.as_ref().map(UserFacingError::from),
        }
    }
}
