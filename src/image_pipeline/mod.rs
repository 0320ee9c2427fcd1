//! Image ingestion pipeline.
//!
//! Backends impose a roughly 1 MiB document ceiling, and embedding an image as
//! base64 grows it by about a third. Uploads above a soft threshold are
//! downscaled and re-encoded as JPEG through a fixed ladder of progressively
//! smaller dimensions and lower qualities until the encoded result fits the
//! safe ceiling. Inputs that cannot be made to fit are rejected rather than
//! truncated.
//!
//! Decoding and encoding run on the blocking thread pool to keep the async
//! runtime responsive.

use std::io::Cursor;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageOutputFormat};

use crate::errors::AppError;

/// Hard ceiling on raw upload size. Anything larger is rejected outright.
pub const MAX_RAW_BYTES: usize = 1024 * 1024;

/// Uploads at or below this size are stored as-is in their original format.
pub const SOFT_THRESHOLD_BYTES: usize = 300 * 1024;

/// Largest encoded output that stays inside the document ceiling once the
/// +33% base64 growth is added.
pub const MAX_ENCODED_BYTES: usize = 950 * 1024;

/// Upper bound on the whole ingestion pipeline, decode through store.
pub const PIPELINE_TIMEOUT: Duration = Duration::from_secs(60);

/// Ordered (max width, max height, JPEG quality) attempts. The first tier is
/// the normal compression pass; the rest are the degradation steps tried when
/// the encoded result still exceeds [`MAX_ENCODED_BYTES`].
const COMPRESSION_LADDER: [(u32, u32, u8); 3] = [(1200, 900, 80), (1000, 750, 70), (800, 600, 60)];

/// A persistable image representation.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub data: Bytes,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
}

impl ProcessedImage {
    /// Embeddable `data:` URI for this image.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.content_type, BASE64.encode(&self.data))
    }
}

/// Run the ingestion pipeline on raw upload bytes (blocking version).
///
/// Call [`process_async`] from async code.
pub fn process(data: &[u8]) -> Result<ProcessedImage, AppError> {
    let format = image::guess_format(data).map_err(|_| {
        AppError::Validation("The uploaded file is not a recognized image format".to_string())
    })?;

    if data.len() > MAX_RAW_BYTES {
        return Err(AppError::TooLarge(format!(
            "Image is {} KiB; the upload limit is {} KiB",
            data.len() / 1024,
            MAX_RAW_BYTES / 1024
        )));
    }

    let img = image::load_from_memory(data)?;
    let (width, height) = img.dimensions();

    if data.len() <= SOFT_THRESHOLD_BYTES {
        tracing::debug!(size = data.len(), "Image within soft threshold, storing as-is");
        return Ok(ProcessedImage {
            data: Bytes::copy_from_slice(data),
            content_type: mime_for(format),
            width,
            height,
        });
    }

    for (max_w, max_h, quality) in COMPRESSION_LADDER {
        let resized = shrink_to_fit(&img, max_w, max_h);
        let (w, h) = resized.dimensions();
        let encoded = encode_jpeg(&resized, quality)?;

        tracing::debug!(
            width = w,
            height = h,
            quality,
            size = encoded.len(),
            "Compression attempt"
        );

        if encoded.len() <= MAX_ENCODED_BYTES {
            return Ok(ProcessedImage {
                data: encoded,
                content_type: "image/jpeg",
                width: w,
                height: h,
            });
        }
    }

    Err(AppError::TooLarge(
        "Image is too large to store, even after maximum compression".to_string(),
    ))
}

/// Run the ingestion pipeline on a dedicated blocking thread.
pub async fn process_async(data: Bytes) -> Result<ProcessedImage, AppError> {
    tokio::task::spawn_blocking(move || process(&data))
        .await
        .map_err(|e| AppError::Internal(format!("Image task panicked: {}", e)))?
}

/// Downscale preserving aspect ratio so both dimensions fit the bounds.
/// Images already inside the bounds are left untouched, never upscaled.
fn shrink_to_fit(img: &DynamicImage, max_w: u32, max_h: u32) -> DynamicImage {
    let (w, h) = img.dimensions();
    if w <= max_w && h <= max_h {
        img.clone()
    } else {
        img.resize(max_w, max_h, FilterType::Triangle)
    }
}

/// Encode as JPEG at the given quality. Alpha is dropped first since JPEG
/// cannot carry it.
fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Bytes, AppError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Vec::new();
    let mut cursor = Cursor::new(&mut buf);

    rgb.write_to(&mut cursor, ImageOutputFormat::Jpeg(quality))
        .map_err(|e| AppError::Internal(format!("Failed to encode JPEG: {}", e)))?;

    Ok(Bytes::from(buf))
}

/// Split a `data:` URI produced by [`ProcessedImage::to_data_uri`] back into
/// its media type and raw bytes.
pub fn decode_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    let rest = uri.strip_prefix("data:")?;
    let (mime, payload) = rest.split_once(";base64,")?;
    let data = BASE64.decode(payload).ok()?;
    Some((mime.to_string(), data))
}

fn mime_for(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        _ => "application/octet-stream",
    }
}
