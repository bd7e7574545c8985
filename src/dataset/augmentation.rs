//! Rotation augmentation for station markers
//!
//! Station imagery is sparse, so every resized station crop is expanded
//! into four rotated copies sharing one label. The crops are square, so
//! quarter-turn rotations preserve the canvas size. Train-car crops are
//! not square and receive no rotation.

use image::imageops;
use image::RgbImage;

/// Produce the four quarter-turn rotations of a square crop, starting with
/// the unrotated image.
pub fn quarter_rotations(img: &RgbImage) -> [RgbImage; 4] {
    debug_assert_eq!(img.width(), img.height(), "rotation requires a square canvas");

    [
        img.clone(),
        imageops::rotate90(img),
        imageops::rotate180(img),
        imageops::rotate270(img),
    ]
}
