//! Sanity checks for user-supplied card images
//!
//! Custom backs and commanders come from arbitrary URLs. Hosts often answer
//! a dead link with a tiny placeholder instead of an error, so a response
//! is only accepted when it is a recognizable image of plausible size.

use crate::{FatesealError, Result};
use imagesize::ImageType;

/// Smallest width or height accepted for a card image, in pixels
pub const MIN_CARD_DIMENSION: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    WebP,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

/// Identify an image and reject unreadable or implausibly small ones
pub fn check_image(bytes: &[u8]) -> Result<ImageInfo> {
    let format = match imagesize::image_type(bytes) {
        Ok(ImageType::Png) => ImageFormat::Png,
        Ok(ImageType::Jpeg) => ImageFormat::Jpeg,
        Ok(ImageType::Gif) => ImageFormat::Gif,
        Ok(ImageType::Webp) => ImageFormat::WebP,
        _ => {
            return Err(FatesealError::ImageLoad(
                "not a PNG, JPEG, GIF or WebP image".to_string(),
            ))
        }
    };

    let size = imagesize::blob_size(bytes)
        .map_err(|e| FatesealError::ImageLoad(format!("unreadable image header: {e}")))?;
    let info = ImageInfo {
        format,
        width: u32::try_from(size.width).unwrap_or(u32::MAX),
        height: u32::try_from(size.height).unwrap_or(u32::MAX),
    };

    if info.width < MIN_CARD_DIMENSION || info.height < MIN_CARD_DIMENSION {
        return Err(FatesealError::ImageLoad(format!(
            "image is only {}x{} pixels",
            info.width, info.height
        )));
    }
    Ok(info)
}
