use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

use crate::ImageError;

/// Hands chosen photos to the shell's encoder and reports the data URL back.
pub struct ImageEncoder<Ev> {
    context: CapabilityContext<ImageOperation, Ev>,
}

impl<Ev> Capability<Ev> for ImageEncoder<Ev> {
    type Operation = ImageOperation;
    type MappedSelf<MappedEv> = ImageEncoder<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        ImageEncoder::new(self.context.map_event(f))
    }
}

impl<Ev> ImageEncoder<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<ImageOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn encode_data_url<F>(&self, file_name: String, bytes: Vec<u8>, make_event: F)
    where
        F: FnOnce(ImageResult) -> Ev + Send + 'static,
    {
        let operation = ImageOperation::EncodeDataUrl { file_name, bytes };
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(operation).await;
            context.update_app(make_event(result));
        });
    }
}

/// Work the core hands to the shell's image encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageOperation {
    /// Turn a chosen file into a self-contained `data:` URL.
    EncodeDataUrl { file_name: String, bytes: Vec<u8> },
}

impl ImageOperation {
    #[must_use]
    pub fn file_name(&self) -> &str {
        match self {
            Self::EncodeDataUrl { file_name, .. } => file_name,
        }
    }

    #[must_use]
    pub fn input_len(&self) -> usize {
        match self {
            Self::EncodeDataUrl { bytes, .. } => bytes.len(),
        }
    }
}

impl Operation for ImageOperation {
    type Output = ImageResult;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    pub data_url: String,
}

pub type ImageResult = Result<EncodedImage, ImageError>;
