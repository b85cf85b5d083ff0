use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use std::path::Path;

use crate::domain::detection::Detection;

const PALETTE: [[u8; 3]; 6] = [
    [255, 56, 56],
    [255, 157, 151],
    [255, 112, 31],
    [72, 249, 10],
    [0, 194, 255],
    [132, 56, 255],
];

const THICKNESS: i32 = 2;

fn class_color(class_id: usize) -> Rgb<u8> {
    Rgb(PALETTE[class_id % PALETTE.len()])
}

/// Copia de `image` con un rectángulo por detección, coloreado por clase.
pub fn annotate(image: &RgbImage, detections: &[Detection]) -> RgbImage {
    let mut canvas = image.clone();
    for det in detections {
        let color = class_color(det.class_id);
        for inset in 0..THICKNESS {
            let x = det.x1.round() as i32 + inset;
            let y = det.y1.round() as i32 + inset;
            let w = det.width().round() as i32 - 2 * inset;
            let h = det.height().round() as i32 - 2 * inset;
            if w <= 0 || h <= 0 {
                break;
            }
            draw_hollow_rect_mut(&mut canvas, Rect::at(x, y).of_size(w as u32, h as u32), color);
        }
    }
    canvas
}

pub fn save_annotated(image: &RgbImage, detections: &[Detection], path: &Path) -> Result<()> {
    annotate(image, detections)
        .save(path)
        .with_context(|| format!("cannot write annotated image to {}", path.display()))
}
