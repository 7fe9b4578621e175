mod common;

use common::{
    body_json, connection_refused, empty, http_count, json, resolve, start, take_http,
    take_image, Tester,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use shared::capabilities::EncodedImage;
use shared::view::{ActionView, ImageStagingView};
use shared::{
    Event, ImageError, Issue, IssueId, IssueStatus, Model, ACTIONS_DISABLED_MESSAGE,
    ACTION_FAILED_MESSAGE,
};

fn loaded_model(app: &Tester, issues: &[Issue]) -> Model {
    let mut model = Model::default();
    let mut update = start(app, &mut model);
    let mut request = take_http(&mut update);
    resolve(app, &mut request, json(200, issues), &mut model);
    model
}

fn fallback_model(app: &Tester) -> Model {
    let mut model = Model::default();
    let mut update = start(app, &mut model);
    let mut request = take_http(&mut update);
    resolve(app, &mut request, connection_refused(), &mut model);
    model
}

fn photo() -> EncodedImage {
    EncodedImage {
        mime_type: "image/jpeg".into(),
        width: 640,
        height: 480,
        data_url: "data:image/jpeg;base64,/9j/4AAQSkZJRg==".into(),
    }
}

#[test]
fn test_assign_flow() {
    let app = Tester::default();
    let mut model = loaded_model(&app, &[Issue::new(IssueId(7), "Garbage", IssueStatus::Active)]);

    // 1. Open the panel
    app.update(Event::IssueSelected(IssueId(7)), &mut model);
    let detail = app.view(&model).detail.unwrap();
    assert_eq!(detail.action_label.as_deref(), Some("Assign Task"));
    assert_eq!(detail.assigned_to, "N/A");

    // 2. Submitting with only a contact never reaches the network
    app.update(Event::EmployeeContactChanged("9840012345".into()), &mut model);
    let update = app.update(Event::AssignSubmitted, &mut model);
    assert_eq!(http_count(&update), 0);

    // 3. Fill the name and submit
    app.update(Event::EmployeeNameChanged("  Ravi Kumar ".into()), &mut model);
    let mut update = app.update(Event::AssignSubmitted, &mut model);
    let mut request = take_http(&mut update);
    assert_eq!(request.operation.method, "PUT");
    assert_eq!(
        request.operation.url,
        "http://localhost:8080/api/complaints/7/assign"
    );
    assert_eq!(
        body_json(&request.operation),
        json!({"name": "Ravi Kumar", "contact": "9840012345"})
    );
    assert!(app.view(&model).detail.unwrap().submitting);

    // 4. Success closes the panel and reloads the snapshot
    let mut update = resolve(&app, &mut request, empty(200), &mut model);
    assert!(app.view(&model).detail.is_none());
    let mut refresh = take_http(&mut update);
    assert_eq!(refresh.operation.method, "GET");
    assert_eq!(
        refresh.operation.url,
        "http://localhost:8080/api/complaints/admin-view"
    );

    let mut assigned = Issue::new(IssueId(7), "Garbage", IssueStatus::InProgress);
    assigned.assigned_employee_name = Some("Ravi Kumar".into());
    resolve(&app, &mut refresh, json(200, vec![assigned]), &mut model);
    assert_eq!(model.cache.issues()[0].status, IssueStatus::InProgress);
}

#[test]
fn test_resolve_requires_staged_image() {
    let app = Tester::default();
    let mut model = loaded_model(
        &app,
        &[Issue::new(IssueId(3), "Streetlights", IssueStatus::InProgress)],
    );

    app.update(Event::IssueSelected(IssueId(3)), &mut model);

    // 1. Nothing staged yet
    let update = app.update(Event::ResolveSubmitted, &mut model);
    assert_eq!(http_count(&update), 0);
    let detail = app.view(&model).detail.unwrap();
    assert!(detail.validation_message.is_some());
    assert!(!detail.action.can_submit());

    // 2. Staging runs as an effect and blocks submission until it lands
    let mut update = app.update(
        Event::ResolutionImageChosen {
            file_name: "fixed.jpg".into(),
            bytes: vec![0xFF, 0xD8, 0xFF],
        },
        &mut model,
    );
    let mut staging = take_image(&mut update);
    assert_eq!(staging.operation.file_name(), "fixed.jpg");
    let update = app.update(Event::ResolveSubmitted, &mut model);
    assert_eq!(http_count(&update), 0);

    resolve(&app, &mut staging, Ok(photo()), &mut model);
    let detail = app.view(&model).detail.unwrap();
    let ActionView::Resolve { image, can_submit } = detail.action else {
        panic!("expected resolve action");
    };
    assert!(can_submit);
    assert!(matches!(image, ImageStagingView::Ready { .. }));

    // 3. Submit sends the data URL
    let mut update = app.update(Event::ResolveSubmitted, &mut model);
    let request = take_http(&mut update);
    assert_eq!(
        request.operation.url,
        "http://localhost:8080/api/complaints/3/resolve"
    );
    assert_eq!(
        body_json(&request.operation),
        json!({"resolvedImageUrl": "data:image/jpeg;base64,/9j/4AAQSkZJRg=="})
    );
}

#[test]
fn test_rejected_image_can_be_replaced() {
    let app = Tester::default();
    let mut model = loaded_model(
        &app,
        &[Issue::new(IssueId(3), "Streetlights", IssueStatus::InProgress)],
    );
    app.update(Event::IssueSelected(IssueId(3)), &mut model);

    let mut update = app.update(
        Event::ResolutionImageChosen {
            file_name: "notes.txt".into(),
            bytes: b"hello".to_vec(),
        },
        &mut model,
    );
    let mut staging = take_image(&mut update);
    resolve(&app, &mut staging, Err(ImageError::UnsupportedFormat), &mut model);

    let detail = app.view(&model).detail.unwrap();
    assert!(!detail.action.can_submit());

    let mut update = app.update(
        Event::ResolutionImageChosen {
            file_name: "fixed.jpg".into(),
            bytes: vec![1, 2, 3],
        },
        &mut model,
    );
    let mut staging = take_image(&mut update);
    resolve(&app, &mut staging, Ok(photo()), &mut model);
    assert!(app.view(&model).detail.unwrap().action.can_submit());
}

#[test]
fn test_reopen_sends_in_progress_status() {
    let app = Tester::default();
    let mut model = loaded_model(
        &app,
        &[Issue::new(IssueId(5), "Water", IssueStatus::Resolved)],
    );

    app.update(Event::IssueSelected(IssueId(5)), &mut model);
    let mut update = app.update(Event::ReopenSubmitted, &mut model);
    let request = take_http(&mut update);

    assert_eq!(
        request.operation.url,
        "http://localhost:8080/api/complaints/5/status"
    );
    assert_eq!(body_json(&request.operation), json!({"status": "In Progress"}));
}

#[test]
fn test_sample_data_blocks_every_transition() {
    let app = Tester::default();
    let mut model = fallback_model(&app);

    // Sample issue 1 is Active
    app.update(Event::IssueSelected(IssueId(1)), &mut model);
    app.update(Event::EmployeeNameChanged("Ravi".into()), &mut model);
    app.update(Event::EmployeeContactChanged("98400".into()), &mut model);
    let detail = app.view(&model).detail.unwrap();
    assert!(!detail.actions_enabled);
    assert_eq!(detail.notice.as_deref(), Some(ACTIONS_DISABLED_MESSAGE));

    let update = app.update(Event::AssignSubmitted, &mut model);
    assert_eq!(http_count(&update), 0);
    assert_eq!(
        app.view(&model).error.map(|e| e.message).as_deref(),
        Some(ACTIONS_DISABLED_MESSAGE)
    );

    // Sample issue 3 is Resolved
    app.update(Event::ErrorDismissed, &mut model);
    app.update(Event::IssueSelected(IssueId(3)), &mut model);
    let update = app.update(Event::ReopenSubmitted, &mut model);
    assert_eq!(http_count(&update), 0);
    assert!(app.view(&model).error.is_some());
}

#[test]
fn test_failed_action_keeps_panel_open() {
    let app = Tester::default();
    let issues = [Issue::new(IssueId(5), "Water", IssueStatus::Resolved)];
    let mut model = loaded_model(&app, &issues);

    app.update(Event::IssueSelected(IssueId(5)), &mut model);
    let mut update = app.update(Event::ReopenSubmitted, &mut model);
    let mut request = take_http(&mut update);

    let failure = json(500, json!({"message": "database unavailable"}));
    let update = resolve(&app, &mut request, failure, &mut model);

    // no refresh, cache untouched, panel still open and usable
    assert_eq!(http_count(&update), 0);
    assert_eq!(model.cache.issues(), &issues[..]);
    let view = app.view(&model);
    let error = view.error.unwrap();
    assert_eq!(error.message, ACTION_FAILED_MESSAGE);
    let detail = view.detail.unwrap();
    assert!(!detail.submitting);
    assert!(detail.action.can_submit());

    // the alert is one-shot
    app.update(Event::ErrorDismissed, &mut model);
    assert!(app.view(&model).error.is_none());
}

#[test]
fn test_refresh_closes_panel_for_vanished_issue() {
    let app = Tester::default();
    let mut model = loaded_model(
        &app,
        &[
            Issue::new(IssueId(1), "Potholes", IssueStatus::Active),
            Issue::new(IssueId(2), "Garbage", IssueStatus::Active),
        ],
    );
    app.update(Event::IssueSelected(IssueId(2)), &mut model);

    let mut update = app.update(Event::RefreshRequested, &mut model);
    let mut request = take_http(&mut update);
    let remaining = vec![Issue::new(IssueId(1), "Potholes", IssueStatus::Active)];
    resolve(&app, &mut request, json(200, &remaining), &mut model);

    assert!(app.view(&model).detail.is_none());
}
