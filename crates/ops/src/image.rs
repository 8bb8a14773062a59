//! Image domain operations.
//!
//! Every operation takes an RGB raster as its first parameter and returns a
//! new raster (or, for `check`, a summary map). Inputs are never modified.

use std::collections::BTreeMap;

use image::{imageops, Rgb, RgbImage};
use jobwire_core::codec::Value;

use crate::args::CallArgs;
use crate::error::OperationError;
use crate::registry::OperationTable;

/// Largest output dimension accepted by `resize`.
pub const MAX_DIMENSION: i64 = 16_384;

/// Largest output area accepted by `resize`, 48 MiB as RGB8.
pub const MAX_PIXELS: i64 = 16 * 1024 * 1024;

/// Largest radius accepted by `blur`.
pub const MAX_BLUR_RADIUS: i64 = 256;

pub fn table() -> OperationTable {
    OperationTable::new()
        .with("check", check)
        .with("resize", resize)
        .with("rotate", rotate)
        .with("grayscale", grayscale)
        .with("blur", blur)
        .with("flip", flip)
        .with("mirror", mirror)
}

/// Report basic facts about an image: `{width, height, channels}`.
pub fn check(call: &CallArgs) -> Result<Value, OperationError> {
    let bound = call.bind("check", &["image"])?;
    let image = bound.image(0)?;

    let mut summary = BTreeMap::new();
    summary.insert("width".to_string(), Value::Int(image.width().into()));
    summary.insert("height".to_string(), Value::Int(image.height().into()));
    summary.insert("channels".to_string(), Value::Int(3));
    Ok(Value::Map(summary))
}

/// Resample to `height` x `width` with bilinear filtering.
pub fn resize(call: &CallArgs) -> Result<Value, OperationError> {
    let bound = call.bind("resize", &["image", "height", "width"])?;
    let image = bound.image(0)?;
    let height = bound.int(1)?;
    let width = bound.int(2)?;

    for (index, value) in [(1, height), (2, width)] {
        if !(1..=MAX_DIMENSION).contains(&value) {
            return Err(bound.invalid(
                index,
                format!("must be between 1 and {MAX_DIMENSION}, got {value}"),
            ));
        }
    }

    // Both sides are at most MAX_DIMENSION, so the product fits.
    if height * width > MAX_PIXELS {
        return Err(bound.invalid(
            2,
            format!("output of {width}x{height} exceeds {MAX_PIXELS} pixels"),
        ));
    }

    // Both values are range checked above.
    let resized = imageops::resize(
        image,
        width as u32,
        height as u32,
        imageops::FilterType::Triangle,
    );
    Ok(Value::Image(resized))
}

/// Rotate counter-clockwise by `angle` degrees.
///
/// The canvas grows to fit the whole rotated image; uncovered pixels are
/// black. Multiples of 90 degrees are exact.
pub fn rotate(call: &CallArgs) -> Result<Value, OperationError> {
    let bound = call.bind("rotate", &["image", "angle"])?;
    let image = bound.image(0)?;
    let angle = bound.number(1)?;
    if !angle.is_finite() {
        return Err(bound.invalid(1, format!("angle must be finite, got {angle}")));
    }
    Ok(Value::Image(rotate_expand(image, angle)))
}

pub fn grayscale(call: &CallArgs) -> Result<Value, OperationError> {
    let bound = call.bind("grayscale", &["image"])?;
    let image = bound.image(0)?;

    let luma = imageops::grayscale(image);
    let rgb = RgbImage::from_fn(luma.width(), luma.height(), |x, y| {
        let [l] = luma.get_pixel(x, y).0;
        Rgb([l, l, l])
    });
    Ok(Value::Image(rgb))
}

/// Gaussian blur with an integer `radius`.
pub fn blur(call: &CallArgs) -> Result<Value, OperationError> {
    let bound = call.bind("blur", &["image", "radius"])?;
    let image = bound.image(0)?;
    let radius = bound.int(1)?;
    if !(1..=MAX_BLUR_RADIUS).contains(&radius) {
        return Err(bound.invalid(
            1,
            format!("invalid blur radius {radius}, expected an integer between 1 and {MAX_BLUR_RADIUS}"),
        ));
    }
    Ok(Value::Image(imageops::blur(image, radius as f32)))
}

/// Flip top to bottom.
pub fn flip(call: &CallArgs) -> Result<Value, OperationError> {
    let bound = call.bind("flip", &["image"])?;
    Ok(Value::Image(imageops::flip_vertical(bound.image(0)?)))
}

/// Flip left to right.
pub fn mirror(call: &CallArgs) -> Result<Value, OperationError> {
    let bound = call.bind("mirror", &["image"])?;
    Ok(Value::Image(imageops::flip_horizontal(bound.image(0)?)))
}

fn rotate_expand(image: &RgbImage, degrees: f64) -> RgbImage {
    let normalized = degrees.rem_euclid(360.0);
    // imageops rotates clockwise.
    if normalized == 0.0 {
        return image.clone();
    } else if normalized == 90.0 {
        return imageops::rotate270(image);
    } else if normalized == 180.0 {
        return imageops::rotate180(image);
    } else if normalized == 270.0 {
        return imageops::rotate90(image);
    }

    let (sin, cos) = normalized.to_radians().sin_cos();
    let (width, height) = (f64::from(image.width()), f64::from(image.height()));
    let out_width = (width * cos.abs() + height * sin.abs()).round().max(1.0);
    let out_height = (width * sin.abs() + height * cos.abs()).round().max(1.0);
    let (cx, cy) = (width / 2.0, height / 2.0);
    let (ocx, ocy) = (out_width / 2.0, out_height / 2.0);

    // Inverse mapping, nearest neighbour.
    RgbImage::from_fn(out_width as u32, out_height as u32, |x, y| {
        let dx = f64::from(x) + 0.5 - ocx;
        let dy = f64::from(y) + 0.5 - ocy;
        let sx = dx * cos - dy * sin + cx;
        let sy = dx * sin + dy * cos + cy;
        if sx >= 0.0 && sy >= 0.0 && sx < width && sy < height {
            *image.get_pixel(sx as u32, sy as u32)
        } else {
            Rgb([0, 0, 0])
        }
    })
}
