use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::{
    DynamicImage, ExtendedColorType, GenericImageView, ImageEncoder, ImageFormat, ImageReader,
    Limits,
};
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};

use crate::capabilities::{EncodedImage, ImageOperation, ImageResult};
use crate::{
    ImageError, DEFAULT_JPEG_QUALITY, MAX_CONCURRENT_ENCODES, MAX_IMAGE_ALLOC, MAX_IMAGE_BYTES,
    MAX_IMAGE_DIMENSION, MAX_IMAGE_PIXELS, MAX_PROCESSED_DIMENSION,
};

#[derive(Debug, Error)]
pub enum ImageProcessingError {
    #[error("failed to decode image: {source}")]
    Decode {
        #[from]
        source: image::ImageError,
    },

    #[error("jpeg encoding failed: width={width}, height={height}, reason={reason}")]
    JpegEncode {
        width: u32,
        height: u32,
        reason: String,
    },

    #[error("image too large: {width}x{height} = {pixels} pixels, max {max_pixels}")]
    ImageTooLarge {
        width: u32,
        height: u32,
        pixels: u64,
        max_pixels: u64,
    },

    #[error("input too large: {size} bytes, max {max_size}")]
    InputTooLarge { size: usize, max_size: usize },

    #[error("input bytes empty")]
    EmptyInput,

    #[error("unsupported image format")]
    UnsupportedFormat,

    #[error("encoder task aborted")]
    TaskAborted,

    #[error("encoder overloaded, try again later")]
    Overloaded,
}

impl From<ImageProcessingError> for ImageError {
    fn from(e: ImageProcessingError) -> Self {
        match e {
            ImageProcessingError::EmptyInput => ImageError::Empty,
            ImageProcessingError::InputTooLarge { size, max_size } => ImageError::TooLarge {
                size,
                max: max_size,
            },
            ImageProcessingError::ImageTooLarge { width, height, .. } => {
                ImageError::DimensionsTooLarge { width, height }
            }
            ImageProcessingError::UnsupportedFormat => ImageError::UnsupportedFormat,
            ImageProcessingError::Decode {
                source: image::ImageError::Unsupported(_),
            } => ImageError::UnsupportedFormat,
            ImageProcessingError::Decode { source } => ImageError::DecodeFailed(source.to_string()),
            ImageProcessingError::JpegEncode { reason, .. } => ImageError::EncodeFailed(reason),
            ImageProcessingError::Overloaded => ImageError::Overloaded,
            ImageProcessingError::TaskAborted => {
                ImageError::ProcessingFailed("encoder task aborted".into())
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProcessingConfig {
    pub max_image_pixels: u64,
    pub max_input_bytes: usize,
    pub max_alloc_bytes: u64,
    /// Largest width or height accepted from the decoder.
    pub max_dimension: u32,
    /// Longest side of the re-encoded output. Smaller images pass through untouched.
    pub output_max_dimension: u32,
    pub jpeg_quality: u8,
    pub max_concurrent_ops: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_image_pixels: MAX_IMAGE_PIXELS,
            max_input_bytes: MAX_IMAGE_BYTES,
            max_alloc_bytes: MAX_IMAGE_ALLOC,
            max_dimension: MAX_IMAGE_DIMENSION,
            output_max_dimension: MAX_PROCESSED_DIMENSION,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            max_concurrent_ops: MAX_CONCURRENT_ENCODES,
        }
    }
}

/// Turns chosen resolution photos into `data:` URLs off the async runtime.
pub struct ImageProcessor {
    config: ProcessingConfig,
    semaphore: Arc<Semaphore>,
}

impl ImageProcessor {
    #[must_use]
    pub fn new(config: ProcessingConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_ops.max(1)));
        Self { config, semaphore }
    }

    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ProcessingConfig::default())
    }

    #[must_use]
    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Runs an [`ImageOperation`] requested by the core.
    pub async fn execute(&self, operation: ImageOperation) -> ImageResult {
        match operation {
            ImageOperation::EncodeDataUrl { file_name, bytes } => {
                debug!(%file_name, "encoding resolution image");
                self.encode_data_url(bytes).await.map_err(ImageError::from)
            }
        }
    }

    #[instrument(skip(self, raw_bytes), fields(input_size = raw_bytes.len()))]
    pub async fn encode_data_url(
        &self,
        raw_bytes: Vec<u8>,
    ) -> Result<EncodedImage, ImageProcessingError> {
        let start = Instant::now();

        let _permit = self
            .semaphore
            .try_acquire()
            .map_err(|_| ImageProcessingError::Overloaded)?;

        let config = self.config.clone();
        let result =
            tokio::task::spawn_blocking(move || Self::encode_data_url_sync(&config, &raw_bytes))
                .await
                .map_err(|_| ImageProcessingError::TaskAborted)?;

        match &result {
            Ok(encoded) => debug!(
                mime = %encoded.mime_type,
                width = encoded.width,
                height = encoded.height,
                output_size = encoded.data_url.len(),
                elapsed_ms = start.elapsed().as_millis(),
                "image encoded"
            ),
            Err(e) => warn!(error = %e, "encode_data_url failed"),
        }

        result
    }

    fn encode_data_url_sync(
        config: &ProcessingConfig,
        raw_bytes: &[u8],
    ) -> Result<EncodedImage, ImageProcessingError> {
        let (img, format) = decode_image(config, raw_bytes)?;
        let (width, height) = img.dimensions();

        if width.max(height) <= config.output_max_dimension {
            let mime_type = mime_type(format);
            return Ok(EncodedImage {
                data_url: data_url(mime_type, raw_bytes),
                mime_type: mime_type.to_string(),
                width,
                height,
            });
        }

        let resized = img.resize(
            config.output_max_dimension,
            config.output_max_dimension,
            image::imageops::FilterType::Triangle,
        );
        let (width, height) = resized.dimensions();
        let jpeg = encode_jpeg(&resized, config.jpeg_quality)?;
        let mime_type = mime_type(ImageFormat::Jpeg);

        Ok(EncodedImage {
            data_url: data_url(mime_type, &jpeg),
            mime_type: mime_type.to_string(),
            width,
            height,
        })
    }
}

fn mime_type(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Gif => "image/gif",
        _ => "image/jpeg",
    }
}

fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

fn decode_image(
    config: &ProcessingConfig,
    raw_bytes: &[u8],
) -> Result<(DynamicImage, ImageFormat), ImageProcessingError> {
    if raw_bytes.is_empty() {
        return Err(ImageProcessingError::EmptyInput);
    }

    if raw_bytes.len() > config.max_input_bytes {
        return Err(ImageProcessingError::InputTooLarge {
            size: raw_bytes.len(),
            max_size: config.max_input_bytes,
        });
    }

    let mut reader = ImageReader::new(Cursor::new(raw_bytes))
        .with_guessed_format()
        .map_err(|e| ImageProcessingError::Decode { source: e.into() })?;

    let format = match reader.format() {
        Some(
            format @ (ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP | ImageFormat::Gif),
        ) => format,
        _ => return Err(ImageProcessingError::UnsupportedFormat),
    };

    let mut limits = Limits::default();
    limits.max_image_width = Some(config.max_dimension);
    limits.max_image_height = Some(config.max_dimension);
    limits.max_alloc = Some(config.max_alloc_bytes);
    reader.limits(limits);

    let img = reader.decode()?;
    let (w, h) = img.dimensions();
    let pixels = u64::from(w) * u64::from(h);

    if pixels > config.max_image_pixels {
        return Err(ImageProcessingError::ImageTooLarge {
            width: w,
            height: h,
            pixels,
            max_pixels: config.max_image_pixels,
        });
    }

    Ok((img, format))
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, ImageProcessingError> {
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();

    if width == 0 || height == 0 {
        return Err(ImageProcessingError::JpegEncode {
            width,
            height,
            reason: "zero dimension".into(),
        });
    }

    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
        .map_err(|e| ImageProcessingError::JpegEncode {
            width,
            height,
            reason: e.to_string(),
        })?;

    if buffer.len() < 2 || buffer[0..2] != [0xFF, 0xD8] {
        return Err(ImageProcessingError::JpegEncode {
            width,
            height,
            reason: "invalid jpeg magic bytes".into(),
        });
    }

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn create_test_png(width: u32, height: u32) -> Vec<u8> {
        use image::{ImageBuffer, Rgba};
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
        });
        let mut buffer = Vec::new();
        image::codecs::png::PngEncoder::new(&mut buffer)
            .write_image(img.as_raw(), width, height, ExtendedColorType::Rgba8)
            .unwrap();
        buffer
    }

    fn decode_payload(data_url: &str) -> Vec<u8> {
        let (_, payload) = data_url.split_once(";base64,").unwrap();
        STANDARD.decode(payload).unwrap()
    }

    #[test]
    fn decode_rejects_empty() {
        let result = decode_image(&ProcessingConfig::default(), &[]);
        assert!(matches!(result, Err(ImageProcessingError::EmptyInput)));
    }

    #[test]
    fn decode_rejects_garbage() {
        let result = decode_image(&ProcessingConfig::default(), b"definitely not an image");
        assert!(matches!(
            result,
            Err(ImageProcessingError::UnsupportedFormat)
        ));
    }

    #[test]
    fn decode_rejects_oversized_input() {
        let config = ProcessingConfig {
            max_input_bytes: 100,
            ..Default::default()
        };
        let result = decode_image(&config, &[0u8; 200]);
        assert!(matches!(
            result,
            Err(ImageProcessingError::InputTooLarge { size: 200, max_size: 100 })
        ));
    }

    #[test]
    fn decode_rejects_too_many_pixels() {
        let config = ProcessingConfig {
            max_image_pixels: 100,
            ..Default::default()
        };
        let png = create_test_png(20, 20);
        let result = decode_image(&config, &png);
        assert!(matches!(
            result,
            Err(ImageProcessingError::ImageTooLarge { pixels: 400, .. })
        ));
    }

    #[test]
    fn small_image_passes_through_unchanged() {
        let png = create_test_png(40, 30);
        let encoded =
            ImageProcessor::encode_data_url_sync(&ProcessingConfig::default(), &png).unwrap();

        assert_eq!(encoded.mime_type, "image/png");
        assert_eq!((encoded.width, encoded.height), (40, 30));
        assert!(encoded.data_url.starts_with("data:image/png;base64,"));
        assert_eq!(decode_payload(&encoded.data_url), png);
    }

    #[test]
    fn large_image_is_downscaled_to_jpeg() {
        let config = ProcessingConfig {
            output_max_dimension: 64,
            ..Default::default()
        };
        let png = create_test_png(256, 128);
        let encoded = ImageProcessor::encode_data_url_sync(&config, &png).unwrap();

        assert_eq!(encoded.mime_type, "image/jpeg");
        assert_eq!((encoded.width, encoded.height), (64, 32));
        let jpeg = decode_payload(&encoded.data_url);
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn processing_errors_map_to_image_errors() {
        assert_eq!(
            ImageError::from(ImageProcessingError::EmptyInput),
            ImageError::Empty
        );
        assert_eq!(
            ImageError::from(ImageProcessingError::Overloaded),
            ImageError::Overloaded
        );
        assert_eq!(
            ImageError::from(ImageProcessingError::InputTooLarge {
                size: 11,
                max_size: 10
            }),
            ImageError::TooLarge { size: 11, max: 10 }
        );
    }

    #[tokio::test]
    async fn processor_rejects_when_overloaded() {
        let config = ProcessingConfig {
            max_concurrent_ops: 1,
            ..Default::default()
        };
        let processor = ImageProcessor::new(config);
        let png = create_test_png(50, 50);

        let _permit = processor.semaphore.try_acquire().unwrap();

        let result = processor.encode_data_url(png).await;
        assert!(matches!(result, Err(ImageProcessingError::Overloaded)));
    }

    #[tokio::test]
    async fn execute_reports_unsupported_format() {
        let processor = ImageProcessor::with_defaults();
        let result = processor
            .execute(ImageOperation::EncodeDataUrl {
                file_name: "notes.txt".into(),
                bytes: b"plain text".to_vec(),
            })
            .await;
        assert_eq!(result, Err(ImageError::UnsupportedFormat));
    }

    proptest! {
        #[test]
        fn downscaled_output_respects_bound(
            width in 1u32..200,
            height in 1u32..200,
            bound in 8u32..100,
        ) {
            let config = ProcessingConfig {
                output_max_dimension: bound,
                ..Default::default()
            };
            let png = create_test_png(width, height);
            let encoded = ImageProcessor::encode_data_url_sync(&config, &png).unwrap();
            prop_assert!(encoded.width.max(encoded.height) <= bound);
            prop_assert!(encoded.width >= 1 && encoded.height >= 1);
        }
    }
}
