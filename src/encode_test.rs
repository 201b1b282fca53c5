use image::{GenericImageView, ImageFormat};

use super::*;

fn decode(bytes: &[u8]) -> image::DynamicImage {
    image::load_from_memory_with_format(bytes, ImageFormat::Jpeg).unwrap()
}

// =============================================================================
// pad
// =============================================================================

#[test]
fn pad_zero_is_identity() {
    let image = RasterImage::filled_rgb(4, 4, [9, 9, 9]);
    assert_eq!(pad(&image, Padding::ZERO), image);
}

#[test]
fn pad_adds_black_border_on_every_side() {
    let image = RasterImage::filled_rgb(2, 1, [255, 255, 255]);
    let padded = pad(&image, Padding { x: 1, y: 1 });
    assert_eq!(padded.size(), Size::new(4, 3));

    let pixel = |x: usize, y: usize| {
        let i = (y * 4 + x) * 3;
        &padded.data()[i..i + 3]
    };
    assert_eq!(pixel(0, 0), [0, 0, 0]);
    assert_eq!(pixel(3, 2), [0, 0, 0]);
    assert_eq!(pixel(0, 1), [0, 0, 0]);
    assert_eq!(pixel(1, 1), [255, 255, 255]);
    assert_eq!(pixel(2, 1), [255, 255, 255]);
    assert_eq!(pixel(3, 1), [0, 0, 0]);
}

#[test]
fn pad_keeps_channel_count() {
    let image = RasterImage::new(2, 2, 1, vec![200; 4]).unwrap();
    let padded = pad(&image, Padding { x: 0, y: 2 });
    assert_eq!(padded.channels(), 1);
    assert_eq!(padded.size(), Size::new(2, 6));
    assert_eq!(&padded.data()[..4], &[0, 0, 0, 0]);
    assert_eq!(&padded.data()[4..8], &[200, 200, 200, 200]);
}

// =============================================================================
// encode
// =============================================================================

#[test]
fn encode_jpeg_produces_decodable_rgb() {
    let image = RasterImage::filled_rgb(32, 16, [10, 120, 240]);
    let bytes = encode_jpeg(&image, JPEG_QUALITY).unwrap();
    assert_eq!(&bytes[..2], &[0xFF, 0xD8], "JPEG SOI marker");
    assert_eq!(decode(&bytes).dimensions(), (32, 16));
}

#[test]
fn encode_jpeg_accepts_grayscale() {
    let image = RasterImage::new(8, 8, 1, vec![128; 64]).unwrap();
    let decoded = decode(&encode_jpeg(&image, JPEG_QUALITY).unwrap());
    assert_eq!(decoded.dimensions(), (8, 8));
}

#[test]
fn encode_jpeg_drops_alpha() {
    let image = RasterImage::new(8, 8, 4, [255, 0, 0, 7].repeat(64)).unwrap();
    let decoded = decode(&encode_jpeg(&image, JPEG_QUALITY).unwrap());
    assert_eq!(decoded.color(), image::ColorType::Rgb8);
    let [r, g, b, _] = decoded.get_pixel(4, 4).0;
    assert!(r > 200 && g < 60 && b < 60, "expected red, got {r},{g},{b}");
}

#[test]
fn encode_frame_reports_padded_size() {
    let image = RasterImage::filled_rgb(64, 64, [255, 255, 255]);
    let frame = encode_frame(&image, Padding { x: 32, y: 0 }, JPEG_QUALITY).unwrap();
    assert_eq!(frame.size, Size::new(128, 64));

    let decoded = decode(&frame.bytes);
    assert_eq!(decoded.dimensions(), (128, 64));
    let border = decoded.get_pixel(4, 32).0;
    let center = decoded.get_pixel(64, 32).0;
    assert!(border[0] < 20, "border should be black: {border:?}");
    assert!(center[0] > 235, "content should be white: {center:?}");
}

#[test]
fn encode_frame_letterboxed_for_sliver_canvas_stays_within_jpeg_limit() {
    let image = RasterImage::filled_rgb(8, 8, [255, 255, 255]);
    let padding = viewport::resolution::letterbox_padding(image.size(), Size::new(1, u32::MAX));
    let frame = encode_frame(&image, padding, JPEG_QUALITY).unwrap();
    assert_eq!(frame.size.width, 8);
    assert!(frame.size.height <= viewport::consts::MAX_ENCODABLE_PIXEL);
    assert_eq!(decode(&frame.bytes).dimensions(), (frame.size.width, frame.size.height));
}
