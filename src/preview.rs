//! Local preview generation.
//!
//! Decoding runs on the blocking pool so it never stalls the controller loop.
//! The terminal renders the downsampled RGB thumbnail, never the full image.

use crate::error::DecodeError;
use crate::model::{PreviewArtifact, SourceFile, Thumbnail};
use image::DynamicImage;

/// Bounds of the raster kept for terminal rendering.
pub const THUMBNAIL_MAX_WIDTH: u32 = 160;
pub const THUMBNAIL_MAX_HEIGHT: u32 = 120;

pub async fn generate_preview(file: SourceFile) -> Result<PreviewArtifact, DecodeError> {
    tokio::task::spawn_blocking(move || decode_preview(&file))
        .await
        .map_err(|e| DecodeError::Task(e.to_string()))?
}

pub fn decode_preview(file: &SourceFile) -> Result<PreviewArtifact, DecodeError> {
    let img = image::load_from_memory(&file.bytes)?;
    Ok(PreviewArtifact {
        width: img.width(),
        height: img.height(),
        thumbnail: thumbnail_of(&img),
    })
}

/// Thumbnail for an arbitrary encoded payload, e.g. the colorized result.
pub async fn render_thumbnail(bytes: bytes::Bytes) -> Result<Thumbnail, DecodeError> {
    tokio::task::spawn_blocking(move || -> Result<Thumbnail, DecodeError> {
        let img = image::load_from_memory(&bytes)?;
        Ok(thumbnail_of(&img))
    })
    .await
    .map_err(|e| DecodeError::Task(e.to_string()))?
}

fn thumbnail_of(img: &DynamicImage) -> Thumbnail {
    let small = if img.width() > THUMBNAIL_MAX_WIDTH || img.height() > THUMBNAIL_MAX_HEIGHT {
        img.thumbnail(THUMBNAIL_MAX_WIDTH, THUMBNAIL_MAX_HEIGHT)
    } else {
        img.clone()
    };
    let rgb = small.to_rgb8();
    Thumbnail {
        width: rgb.width(),
        height: rgb.height(),
        pixels: rgb.pixels().map(|p| p.0).collect(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use bytes::Bytes;
    use std::io::Cursor;
    use std::path::PathBuf;

    pub(crate) fn png_bytes(width: u32, height: u32, shade: u8) -> Vec<u8> {
        let img = image::GrayImage::from_pixel(width, height, image::Luma([shade]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .expect("encode png");
        out.into_inner()
    }

    fn source(bytes: Vec<u8>, media_type: &str) -> SourceFile {
        SourceFile {
            name: "photo.png".into(),
            path: PathBuf::from("photo.png"),
            media_type: media_type.into(),
            bytes: Bytes::from(bytes),
        }
    }

    #[tokio::test]
    async fn decodes_preview_off_thread() {
        let file = source(png_bytes(4, 3, 128), "image/png");
        let preview = generate_preview(file).await.expect("preview");
        assert_eq!((preview.width, preview.height), (4, 3));
        assert_eq!(preview.thumbnail.pixels.len(), 12);
        assert_eq!(preview.thumbnail.pixel(0, 0), [128, 128, 128]);
    }

    #[test]
    fn large_images_are_thumbnailed_within_bounds() {
        let file = source(png_bytes(800, 400, 10), "image/png");
        let preview = decode_preview(&file).expect("preview");
        assert_eq!((preview.width, preview.height), (800, 400));
        assert!(preview.thumbnail.width <= THUMBNAIL_MAX_WIDTH);
        assert!(preview.thumbnail.height <= THUMBNAIL_MAX_HEIGHT);
        assert!(preview.thumbnail.width > preview.thumbnail.height);
    }

    #[tokio::test]
    async fn corrupt_bytes_fail_to_decode() {
        let file = source(b"definitely not a png".to_vec(), "image/png");
        let err = generate_preview(file).await.unwrap_err();
        assert!(matches!(err, DecodeError::Image(_)));
    }

    #[tokio::test]
    async fn result_thumbnail_from_payload() {
        let thumb = render_thumbnail(Bytes::from(png_bytes(2, 2, 200)))
            .await
            .expect("thumb");
        assert_eq!((thumb.width, thumb.height), (2, 2));
    }
}
