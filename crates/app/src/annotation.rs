//! Skeleton overlay drawing and JPEG encoding for the MJPEG feed.

use anyhow::{anyhow, Result};
use image::{codecs::jpeg::JpegEncoder, ImageBuffer, Rgb};

use cam_ingest::Frame;

use crate::landmarks::{LandmarkIndex, LandmarkPoint, PoseSnapshot};

const BONE_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const JOINT_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const JOINT_RADIUS: i32 = 3;

/// Landmark pairs joined by a segment in the overlay.
const CONNECTIONS: &[(LandmarkIndex, LandmarkIndex)] = &[
    (LandmarkIndex::LeftShoulder, LandmarkIndex::RightShoulder),
    (LandmarkIndex::LeftShoulder, LandmarkIndex::LeftElbow),
    (LandmarkIndex::LeftElbow, LandmarkIndex::LeftWrist),
    (LandmarkIndex::RightShoulder, LandmarkIndex::RightElbow),
    (LandmarkIndex::RightElbow, LandmarkIndex::RightWrist),
    (LandmarkIndex::LeftShoulder, LandmarkIndex::LeftHip),
    (LandmarkIndex::RightShoulder, LandmarkIndex::RightHip),
    (LandmarkIndex::LeftHip, LandmarkIndex::RightHip),
    (LandmarkIndex::LeftHip, LandmarkIndex::LeftKnee),
    (LandmarkIndex::LeftKnee, LandmarkIndex::LeftAnkle),
    (LandmarkIndex::LeftAnkle, LandmarkIndex::LeftHeel),
    (LandmarkIndex::LeftHeel, LandmarkIndex::LeftFootIndex),
    (LandmarkIndex::LeftAnkle, LandmarkIndex::LeftFootIndex),
    (LandmarkIndex::RightHip, LandmarkIndex::RightKnee),
    (LandmarkIndex::RightKnee, LandmarkIndex::RightAnkle),
    (LandmarkIndex::RightAnkle, LandmarkIndex::RightHeel),
    (LandmarkIndex::RightHeel, LandmarkIndex::RightFootIndex),
    (LandmarkIndex::RightAnkle, LandmarkIndex::RightFootIndex),
];

/// Draw the detected skeleton on the frame and encode it as JPEG.
///
/// Points below `min_visibility` are neither drawn nor connected. An empty
/// snapshot produces a clean encode of the raw frame.
pub(crate) fn annotate_frame(
    frame: &Frame,
    snapshot: &PoseSnapshot,
    jpeg_quality: i32,
    min_visibility: f32,
) -> Result<Vec<u8>> {
    let width = frame.width.max(0) as u32;
    let height = frame.height.max(0) as u32;
    let rgb = bgr_to_rgb(&frame.data);
    let mut image = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_vec(width, height, rgb)
        .ok_or_else(|| anyhow!("failed to convert frame into image buffer"))?;

    for (from, to) in CONNECTIONS {
        let (Some(a), Some(b)) = (
            visible_point(snapshot, *from, min_visibility),
            visible_point(snapshot, *to, min_visibility),
        ) else {
            continue;
        };
        draw_segment(
            &mut image,
            to_pixel(a, width, height),
            to_pixel(b, width, height),
            BONE_COLOR,
        );
    }

    for point in &snapshot.points {
        if point.visibility < min_visibility {
            continue;
        }
        draw_disc(
            &mut image,
            to_pixel(point, width, height),
            JOINT_RADIUS,
            JOINT_COLOR,
        );
    }

    let mut buffer = Vec::new();
    let quality = jpeg_quality.clamp(1, 100) as u8;
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .encode_image(&image)
        .map_err(|err| anyhow!("JPEG encode failed: {err}"))?;

    Ok(buffer)
}

fn visible_point(
    snapshot: &PoseSnapshot,
    index: LandmarkIndex,
    min_visibility: f32,
) -> Option<&LandmarkPoint> {
    snapshot
        .points
        .iter()
        .find(|p| p.id == index as u32 && p.visibility >= min_visibility)
}

/// Map a normalized point onto pixel coordinates, clamped to the frame.
fn to_pixel(point: &LandmarkPoint, width: u32, height: u32) -> (i32, i32) {
    let x = (point.x * width as f32).round() as i32;
    let y = (point.y * height as f32).round() as i32;
    (
        x.clamp(0, width.saturating_sub(1) as i32),
        y.clamp(0, height.saturating_sub(1) as i32),
    )
}

fn bgr_to_rgb(input: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(input.len());
    for chunk in input.chunks_exact(3) {
        output.push(chunk[2]);
        output.push(chunk[1]);
        output.push(chunk[0]);
    }
    output
}

fn put_pixel(image: &mut ImageBuffer<Rgb<u8>, Vec<u8>>, x: i32, y: i32, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < image.width() && (y as u32) < image.height() {
        *image.get_pixel_mut(x as u32, y as u32) = color;
    }
}

fn draw_disc(image: &mut ImageBuffer<Rgb<u8>, Vec<u8>>, center: (i32, i32), radius: i32, color: Rgb<u8>) {
    let (cx, cy) = center;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put_pixel(image, cx + dx, cy + dy, color);
            }
        }
    }
}

/// Bresenham segment between two pixel positions.
fn draw_segment(
    image: &mut ImageBuffer<Rgb<u8>, Vec<u8>>,
    from: (i32, i32),
    to: (i32, i32),
    color: Rgb<u8>,
) {
    let (mut x, mut y) = from;
    let (x1, y1) = to;
    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        put_pixel(image, x, y, color);
        if x == x1 && y == y1 {
            break;
        }
        let doubled = 2 * err;
        if doubled >= dy {
            err += dy;
            x += sx;
        }
        if doubled <= dx {
            err += dx;
            y += sy;
        }
    }
}
