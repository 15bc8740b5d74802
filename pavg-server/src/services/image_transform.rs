//! Photo resize and re-encode
//!
//! Every imported photo passes through [`try_transform`]: decode, flatten onto
//! an opaque white background, shrink to fit the requested bounding box
//! (never enlarge), then encode according to the destination extension.
//!
//! The output is fully encoded in memory before anything touches the
//! destination, so a failed transform leaves no partial file behind.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageReader, RgbImage};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Source extensions accepted by the importer (compared lowercase)
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff"];

/// Image transform errors
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Source image not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// libwebp effort level (0 fastest, 6 smallest)
const WEBP_METHOD: i32 = 6;

/// Encoded output format, chosen from the destination extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
}

/// Basic facts about an image on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: Option<String>,
    pub size_bytes: u64,
}

/// True if `path` has one of [`SUPPORTED_EXTENSIONS`] (case-insensitive)
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Resolve the path that will actually be written and its format
///
/// Unrecognized destination extensions are redirected to a `.jpg` sibling.
pub fn output_target(dest: &Path) -> (PathBuf, OutputFormat) {
    let ext = dest
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => (dest.to_path_buf(), OutputFormat::Jpeg),
        Some("png") => (dest.to_path_buf(), OutputFormat::Png),
        Some("webp") => (dest.to_path_buf(), OutputFormat::WebP),
        _ => (dest.with_extension("jpg"), OutputFormat::Jpeg),
    }
}

/// Largest size fitting `max_width × max_height` with the source aspect ratio
///
/// Returns the source size untouched when it already fits. Fits width first,
/// then refits to height if the height still overflows. Truncates like an
/// integer cast; never returns a zero dimension.
pub fn fit_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }

    let aspect = width as f64 / height as f64;

    let mut new_width = max_width;
    let mut new_height = (new_width as f64 / aspect) as u32;

    if new_height > max_height {
        new_height = max_height;
        new_width = (new_height as f64 * aspect) as u32;
    }

    (new_width.max(1), new_height.max(1))
}

/// Resize and re-encode `source` into `dest`
///
/// Returns `true` on success. Failures are logged and reported as `false`;
/// nothing is written in that case.
pub fn transform(source: &Path, dest: &Path, max_width: u32, max_height: u32, quality: u8) -> bool {
    match try_transform(source, dest, max_width, max_height, quality) {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(source = %source.display(), error = %e, "Image transform failed");
            false
        }
    }
}

/// Like [`transform`] but returns the written path or the failure reason
pub fn try_transform(
    source: &Path,
    dest: &Path,
    max_width: u32,
    max_height: u32,
    quality: u8,
) -> Result<PathBuf, TransformError> {
    if !source.is_file() {
        return Err(TransformError::SourceNotFound(source.to_path_buf()));
    }

    let decoded = ImageReader::open(source)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| TransformError::Decode(e.to_string()))?;

    let flattened = flatten_onto_white(decoded);
    let (width, height) = flattened.dimensions();
    let (new_width, new_height) = fit_dimensions(width, height, max_width, max_height);

    let resized = if new_width < width || new_height < height {
        image::imageops::resize(&flattened, new_width, new_height, FilterType::Lanczos3)
    } else {
        flattened
    };

    let (target, format) = output_target(dest);
    let bytes = encode(&resized, format, quality)?;

    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&target, bytes)?;

    tracing::debug!(
        source = %source.display(),
        target = %target.display(),
        width = resized.width(),
        height = resized.height(),
        "Image transformed"
    );

    Ok(target)
}

/// Read dimensions and detected format without a full decode
pub fn image_info(path: &Path) -> Option<ImageInfo> {
    let read = || -> Result<ImageInfo, TransformError> {
        let size_bytes = std::fs::metadata(path)?.len();
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let format = reader.format().map(|f| format!("{:?}", f).to_uppercase());
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| TransformError::Decode(e.to_string()))?;
        Ok(ImageInfo {
            width,
            height,
            format,
            size_bytes,
        })
    };

    match read() {
        Ok(info) => Some(info),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Could not read image info");
            None
        }
    }
}

/// Composite alpha (and expanded palette transparency) onto opaque white
fn flatten_onto_white(image: DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = pixel[3] as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        out.put_pixel(x, y, image::Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
    }
    out
}

fn encode(image: &RgbImage, format: OutputFormat, quality: u8) -> Result<Vec<u8>, TransformError> {
    let mut buf = Vec::new();
    let quality = quality.clamp(1, 100);
    let (width, height) = image.dimensions();

    let result = match format {
        OutputFormat::Jpeg => JpegEncoder::new_with_quality(&mut buf, quality).write_image(
            image.as_raw(),
            width,
            height,
            ExtendedColorType::Rgb8,
        ),
        OutputFormat::Png => {
            PngEncoder::new_with_quality(&mut buf, CompressionType::Best, PngFilter::Adaptive)
                .write_image(image.as_raw(), width, height, ExtendedColorType::Rgb8)
        }
        OutputFormat::WebP => return encode_webp(image, quality),
    };

    result.map_err(|e| TransformError::Encode(e.to_string()))?;
    Ok(buf)
}

/// Lossy WebP at `quality` with the slowest, most thorough method
fn encode_webp(image: &RgbImage, quality: u8) -> Result<Vec<u8>, TransformError> {
    let mut config = webp::WebPConfig::new()
        .map_err(|_| TransformError::Encode("WebP config init failed".to_string()))?;
    config.lossless = 0;
    config.quality = quality as f32;
    config.method = WEBP_METHOD;

    let (width, height) = image.dimensions();
    let encoded = webp::Encoder::from_rgb(image.as_raw(), width, height)
        .encode_advanced(&config)
        .map_err(|e| TransformError::Encode(format!("WebP encode failed: {:?}", e)))?;
    Ok(encoded.to_vec())
}
