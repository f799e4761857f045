// ABOUTME: Image decoding collaborator backed by the image crate
// ABOUTME: Reports container format and size, yields RGB8 buffers, resizes in place of format

use crate::error::Result;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;

#[derive(Debug)]
pub struct DecodedImage {
    format: Option<ImageFormat>,
    image: DynamicImage,
}

/// Decode `bytes`, guessing the container format from its magic number.
pub fn inspect(bytes: &[u8]) -> Result<DecodedImage> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let format = reader.format();
    let image = reader.decode()?;
    Ok(DecodedImage { format, image })
}

/// Resize `bytes` to exactly `width x height`, re-encoding in the source format.
pub fn resize_preserving_format(bytes: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    inspect(bytes)?.resized(width, height)
}

impl DecodedImage {
    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    pub fn is_png(&self) -> bool {
        self.format == Some(ImageFormat::Png)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Tightly packed 8-bit RGB pixels, row-major.
    pub fn rgb8(&self) -> Vec<u8> {
        self.image.to_rgb8().into_raw()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_image(self) -> DynamicImage {
        self.image
    }

    pub fn resized(&self, width: u32, height: u32) -> Result<Vec<u8>> {
        let resized = self
            .image
            .resize_exact(width.max(1), height.max(1), FilterType::Lanczos3);

        // Formats the encoder side cannot write go out as PNG
        let format = self
            .format
            .filter(|f| f.writing_enabled())
            .unwrap_or(ImageFormat::Png);
        let resized = match format {
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(resized.to_rgb8()),
            _ => resized,
        };

        let mut out = Cursor::new(Vec::new());
        resized.write_to(&mut out, format)?;
        Ok(out.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TermImgError;
    use crate::testing::{jpeg_bytes, png_bytes};

    #[test]
    fn test_inspect_png() {
        let decoded = inspect(&png_bytes(3, 2)).unwrap();
        assert!(decoded.is_png());
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
        assert_eq!(decoded.rgb8().len(), 3 * 2 * 3);
    }

    #[test]
    fn test_inspect_jpeg() {
        let decoded = inspect(&jpeg_bytes(8, 4)).unwrap();
        assert_eq!(decoded.format(), Some(ImageFormat::Jpeg));
        assert!(!decoded.is_png());
        assert_eq!((decoded.width(), decoded.height()), (8, 4));
    }

    #[test]
    fn test_inspect_garbage_fails() {
        let result = inspect(b"definitely not an image");
        assert!(matches!(result, Err(TermImgError::Decode(_))));
    }

    #[test]
    fn test_resize_keeps_format() {
        let resized = resize_preserving_format(&jpeg_bytes(40, 20), 10, 5).unwrap();
        let decoded = inspect(&resized).unwrap();

        assert_eq!(decoded.format(), Some(ImageFormat::Jpeg));
        assert_eq!((decoded.width(), decoded.height()), (10, 5));
    }
}
