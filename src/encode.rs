//! Frame codec: zero-border padding and JPEG compression.
//!
//! Runs on the blocking pool together with the render call. Four-channel
//! rasters lose their alpha before compression; JPEG has no use for it.

#[cfg(test)]
#[path = "encode_test.rs"]
mod encode_test;

use axum::body::Bytes;
use image::ExtendedColorType;
use image::codecs::jpeg::JpegEncoder;
use viewport::resolution::{Padding, Size};

use crate::render::{RasterImage, byte_len};

/// Fixed JPEG quality for every published frame.
pub const JPEG_QUALITY: u8 = 90;

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("jpeg encoding failed: {0}")]
    Jpeg(#[from] image::ImageError),
}

/// A compressed frame ready to publish. Cheap to clone for broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    pub bytes: Bytes,
    /// Size of the encoded image, padding included.
    pub size: Size,
}

/// Surround `image` with black borders of `padding` pixels.
#[must_use]
pub fn pad(image: &RasterImage, padding: Padding) -> RasterImage {
    if padding.is_zero() || image.size().is_empty() {
        return image.clone();
    }
    let outer = image.size().padded(padding);
    let channels = image.channels();
    let px = usize::from(channels);

    let mut data = vec![0u8; byte_len(outer.width, outer.height, channels)];

    let src_row = image.width() as usize * px;
    let dst_row = outer.width as usize * px;
    let left = padding.x as usize * px;
    for (y, row) in image.data().chunks_exact(src_row).enumerate() {
        let start = (y + padding.y as usize) * dst_row + left;
        data[start..start + src_row].copy_from_slice(row);
    }

    RasterImage::from_raw(outer.width, outer.height, channels, data)
}

/// Compress `image` as baseline JPEG.
///
/// # Errors
///
/// Returns [`EncodeError::Jpeg`] if the encoder rejects the image, for
/// instance when a side exceeds the format's 65535 pixel limit.
pub fn encode_jpeg(image: &RasterImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    match image.channels() {
        1 => encoder.encode(image.data(), image.width(), image.height(), ExtendedColorType::L8)?,
        3 => encoder.encode(image.data(), image.width(), image.height(), ExtendedColorType::Rgb8)?,
        _ => {
            let rgb: Vec<u8> = image.data().chunks_exact(4).flat_map(|px| [px[0], px[1], px[2]]).collect();
            encoder.encode(&rgb, image.width(), image.height(), ExtendedColorType::Rgb8)?;
        }
    }
    Ok(buf)
}

/// Pad then compress.
///
/// # Errors
///
/// Propagates [`encode_jpeg`] failures.
pub fn encode_frame(image: &RasterImage, padding: Padding, quality: u8) -> Result<EncodedFrame, EncodeError> {
    let padded = pad(image, padding);
    let bytes = encode_jpeg(&padded, quality)?;
    Ok(EncodedFrame { bytes: Bytes::from(bytes), size: padded.size() })
}
