//! Image upload validation.

use crate::error::EditorError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, ImageReader};
use std::io::Cursor;

const ACCEPTED: [ImageFormat; 4] = [
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// Check an uploaded file and turn it into a `data:` URL usable as an image
/// widget's source.
///
/// The format is sniffed from the bytes; a declared MIME type (from the
/// file picker) must agree with an accepted type when present.
pub fn validate_image(
    bytes: &[u8],
    declared_mime: Option<&str>,
    limit: usize,
) -> Result<String, EditorError> {
    if let Some(mime) = declared_mime
        && !ACCEPTED.iter().any(|f| f.to_mime_type() == mime)
    {
        return Err(EditorError::UnsupportedImageType(Some(mime.to_string())));
    }
    if bytes.len() > limit {
        return Err(EditorError::ImageTooLarge {
            size: bytes.len(),
            limit,
        });
    }
    let format = image::guess_format(bytes)
        .ok()
        .filter(|f| ACCEPTED.contains(f))
        .ok_or_else(|| EditorError::UnsupportedImageType(declared_mime.map(str::to_string)))?;

    log::debug!("accepted {} upload ({} bytes)", format.to_mime_type(), bytes.len());
    Ok(format!(
        "data:{};base64,{}",
        format.to_mime_type(),
        STANDARD.encode(bytes)
    ))
}

/// Uploaded images are scaled to fit a square of this size on insertion.
pub const UPLOAD_FIT: f64 = 300.0;

/// Size that fits the image inside a `max` × `max` square, keeping its
/// aspect ratio. `None` when the header cannot be read.
pub fn fitted_size(bytes: &[u8], max: f64) -> Option<(f64, f64)> {
    let (w, h) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()?;
    if w == 0 || h == 0 {
        return None;
    }
    let scale = (max / w as f64).min(max / h as f64);
    Some((w as f64 * scale, h as f64 * scale))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn png_becomes_data_url() {
        let url = validate_image(PNG_MAGIC, Some("image/png"), 1024).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn declared_type_must_be_accepted() {
        let err = validate_image(PNG_MAGIC, Some("image/svg+xml"), 1024).unwrap_err();
        assert!(matches!(err, EditorError::UnsupportedImageType(Some(m)) if m == "image/svg+xml"));
    }

    #[test]
    fn unknown_bytes_are_refused() {
        let err = validate_image(b"plain text", None, 1024).unwrap_err();
        assert!(matches!(err, EditorError::UnsupportedImageType(None)));
    }

    #[test]
    fn oversized_upload_is_refused() {
        let err = validate_image(PNG_MAGIC, None, 4).unwrap_err();
        assert!(matches!(
            err,
            EditorError::ImageTooLarge {
                size: 16,
                limit: 4
            }
        ));
    }

    #[test]
    fn wide_image_fits_the_upload_box() {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(600, 200));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        assert_eq!(fitted_size(&bytes, UPLOAD_FIT), Some((300.0, 100.0)));
        assert_eq!(fitted_size(PNG_MAGIC, UPLOAD_FIT), None);
    }
}
