#![allow(dead_code)]

use crux_core::capability::Operation;
use crux_core::testing::{AppTester, Update};
use crux_core::Request;
use crux_http::protocol::{HttpRequest, HttpResponse, HttpResult};
use serde::Serialize;
use shared::capabilities::ImageOperation;
use shared::{App, Effect, Event, Model};

pub type Tester = AppTester<App, Effect>;

pub const BASE: &str = "http://localhost:8080";

pub fn start(app: &Tester, model: &mut Model) -> Update<Effect, Event> {
    app.update(
        Event::Started {
            api_base_url: BASE.into(),
        },
        model,
    )
}

pub fn http_count(update: &Update<Effect, Event>) -> usize {
    update.effects().filter(|e| e.is_http()).count()
}

pub fn take_http(update: &mut Update<Effect, Event>) -> Request<HttpRequest> {
    let index = update
        .effects
        .iter()
        .position(Effect::is_http)
        .expect("an http request");
    update.effects.remove(index).into_http().unwrap()
}

pub fn take_image(update: &mut Update<Effect, Event>) -> Request<ImageOperation> {
    let index = update
        .effects
        .iter()
        .position(Effect::is_image)
        .expect("an image request");
    update.effects.remove(index).into_image().unwrap()
}

/// Resolves `request`, then runs the events the capability emits.
pub fn resolve<Op: Operation>(
    app: &Tester,
    request: &mut Request<Op>,
    output: Op::Output,
    model: &mut Model,
) -> Update<Effect, Event> {
    let resolved = app.resolve(request, output).expect("request should resolve");
    let mut effects = resolved.effects;
    let mut events = Vec::new();
    for event in resolved.events {
        let update = app.update(event, model);
        effects.extend(update.effects);
        events.extend(update.events);
    }
    Update { effects, events }
}

pub fn json(status: u16, body: impl Serialize) -> HttpResult {
    HttpResult::Ok(HttpResponse::status(status).json(body).build())
}

pub fn empty(status: u16) -> HttpResult {
    HttpResult::Ok(HttpResponse::status(status).build())
}

pub fn connection_refused() -> HttpResult {
    HttpResult::Err(crux_http::Error::Io("connection refused".into()))
}

pub fn header<'a>(request: &'a HttpRequest, name: &str) -> Option<&'a str> {
    request
        .headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

pub fn body_json(request: &HttpRequest) -> serde_json::Value {
    serde_json::from_slice(&request.body).expect("a JSON body")
}
