//! Image container handling for the `image_bytes` kind.
//!
//! PNG is the one container the encoder writes. The decoder accepts any
//! container the `image` crate is built with (PNG, JPEG, WebP) and always
//! normalizes to 8-bit RGB.

use std::io::Cursor;

use image::{ImageFormat, RgbImage};

use crate::error::CodecError;

/// Encode an RGB image as PNG bytes.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, CodecError> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| CodecError::malformed("image_bytes", format!("PNG encoding failed: {e}")))?;
    Ok(buffer.into_inner())
}

/// Decode container bytes into RGB, whatever the source color mode.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, CodecError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| CodecError::ImageDecode(e.to_string()))?;
    Ok(decoded.to_rgb8())
}
