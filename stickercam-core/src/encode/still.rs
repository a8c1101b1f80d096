//! Still image export

use bytes::Bytes;
use std::io::Cursor;

use crate::compositor::Surface;
use crate::error::{Result, StickercamError};

/// File extension of exported photos
pub const STILL_EXTENSION: &str = "png";
/// MIME type of exported photos
pub const STILL_MIME: &str = "image/png";

/// Encode a surface as PNG
pub fn encode_png(surface: &Surface) -> Result<Bytes> {
    let mut buffer = Vec::new();
    surface
        .as_image()
        .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
        .map_err(|e| StickercamError::encoder(format!("PNG encoding failed: {}", e)))?;
    Ok(Bytes::from(buffer))
}
