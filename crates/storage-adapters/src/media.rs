//! # ImageResizer
//!
//! `ImageProcessor` implementation on top of the `image` crate. Uploads are
//! scaled to a fixed width (aspect ratio kept), averaged to a single color, and
//! re-encoded in their original format. Decoding runs on the blocking pool.

use std::io::Cursor;

use async_trait::async_trait;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use mime::Mime;

use domains::color::Rgb;
use domains::error::{AppError, Result};
use domains::media::DataUrl;
use domains::traits::{ImageProcessor, ProcessedImage};

pub const DEFAULT_TARGET_WIDTH: u32 = 1920;

#[derive(Debug, Clone)]
pub struct ImageResizer {
    target_width: u32,
}

impl Default for ImageResizer {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_WIDTH)
    }
}

impl ImageResizer {
    pub fn new(target_width: u32) -> Self {
        Self { target_width: target_width.max(1) }
    }
}

fn format_of(media_type: &Mime) -> Result<ImageFormat> {
    let unsupported = || AppError::ValidationError(format!("unsupported background type {media_type}"));
    if media_type.type_() != mime::IMAGE {
        return Err(unsupported());
    }
    match media_type.subtype().as_str() {
        "png" => Ok(ImageFormat::Png),
        "jpeg" | "jpg" => Ok(ImageFormat::Jpeg),
        _ => Err(unsupported()),
    }
}

/// Mean of every pixel, alpha ignored.
fn average_color(img: &DynamicImage) -> Rgb {
    let rgb = img.to_rgb8();
    let count = u64::from(rgb.width()) * u64::from(rgb.height());
    if count == 0 {
        return Rgb::new(0, 0, 0);
    }
    let (r, g, b) = rgb.pixels().fold((0u64, 0u64, 0u64), |(r, g, b), p| {
        (r + u64::from(p[0]), g + u64::from(p[1]), b + u64::from(p[2]))
    });
    // Each mean is at most 255.
    Rgb::new((r / count) as u8, (g / count) as u8, (b / count) as u8)
}

fn process_blocking(upload: DataUrl, target_width: u32) -> Result<ProcessedImage> {
    let format = format_of(&upload.mime)?;
    let img = image::load_from_memory_with_format(&upload.payload, format)
        .map_err(|e| AppError::internal(format!("decode background: {e}")))?;

    let (width, height) = img.dimensions();
    let target_height = ((u64::from(height) * u64::from(target_width)) / u64::from(width.max(1))).max(1);
    let target_height = u32::try_from(target_height).unwrap_or(u32::MAX);
    let resized = img.resize_exact(target_width, target_height, FilterType::Lanczos3);

    let color = average_color(&resized);

    let mut out = Cursor::new(Vec::new());
    let written = match format {
        // JPEG has no alpha channel.
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(resized.to_rgb8()).write_to(&mut out, format),
        _ => resized.write_to(&mut out, format),
    };
    written.map_err(|e| AppError::internal(format!("encode background: {e}")))?;

    Ok(ProcessedImage {
        image: DataUrl::new(upload.mime, out.into_inner()),
        average_color: color.to_string(),
    })
}

#[async_trait]
impl ImageProcessor for ImageResizer {
    async fn process(&self, upload: DataUrl) -> Result<ProcessedImage> {
        let target_width = self.target_width;
        tracing::debug!(mime = %upload.mime, bytes = upload.payload.len(), target_width, "processing background");
        tokio::task::spawn_blocking(move || process_blocking(upload, target_width))
            .await
            .map_err(|e| AppError::internal(format!("image worker: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use image::{ImageBuffer, Rgb as Pixel};

    use super::*;

    fn encoded(format: ImageFormat, width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Pixel(color));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img).write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    #[tokio::test]
    async fn png_is_resized_and_averaged() {
        let resizer = ImageResizer::new(8);
        let upload = DataUrl::new(mime::IMAGE_PNG, encoded(ImageFormat::Png, 4, 2, [10, 20, 30]));

        let processed = resizer.process(upload).await.unwrap();

        assert_eq!(processed.average_color, "#0a141e");
        assert_eq!(processed.image.mime, mime::IMAGE_PNG);
        let decoded = image::load_from_memory(&processed.image.payload).unwrap();
        assert_eq!(decoded.dimensions(), (8, 4));
    }

    #[tokio::test]
    async fn jpeg_keeps_its_format() {
        let resizer = ImageResizer::new(16);
        let upload = DataUrl::new(mime::IMAGE_JPEG, encoded(ImageFormat::Jpeg, 32, 32, [200, 200, 200]));

        let processed = resizer.process(upload).await.unwrap();

        assert_eq!(image::guess_format(&processed.image.payload).unwrap(), ImageFormat::Jpeg);
        assert_eq!(image::load_from_memory(&processed.image.payload).unwrap().dimensions(), (16, 16));
    }

    #[tokio::test]
    async fn unsupported_or_corrupt_uploads_fail() {
        let resizer = ImageResizer::default();
        let gif = DataUrl::new(mime::IMAGE_GIF, vec![1, 2, 3]);
        assert!(matches!(resizer.process(gif).await, Err(AppError::ValidationError(_))));

        let garbage = DataUrl::new(mime::IMAGE_PNG, vec![1, 2, 3]);
        assert!(matches!(resizer.process(garbage).await, Err(AppError::Internal(_))));
    }
}
