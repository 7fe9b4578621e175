//! Side effects the core asks its shell to perform.
//!
//! `update` never does I/O. It calls the capabilities below; Crux turns each
//! call into an [`Effect`] for the shell and feeds the shell's answer back as
//! the next [`Event`].

pub mod http;
pub mod image;

pub use crux_core::render::Render;
pub use crux_http::Http;

pub use self::http::{HttpError, ValidatedUrl};
pub use self::image::{EncodedImage, ImageEncoder, ImageOperation, ImageResult};

use crate::app::App;
use crate::event::Event;

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub http: Http<Event>,
    pub image: ImageEncoder<Event>,
    pub render: Render<Event>,
}
