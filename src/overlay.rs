//! Detection overlay drawing.
//!
//! This module renders marker detections onto display frames:
//! - Outline box around each detected marker
//! - Orientation arrows along the bottom and left marker edges
//! - Center point and marker ID label
//! - Status bar appended below the frame
//!
//! Detection runs on native frames while display frames may be resized, so
//! every drawing call takes the display scale and maps corner coordinates
//! accordingly. Strokes are drawn twice, a thick black pass under a thinner
//! colored pass, so overlays stay readable on any background.

use anyhow::{Context, Result};
use opencv::core::{self, Mat, Point, Scalar, Size, CV_8UC3};
use opencv::imgproc;
use opencv::prelude::*;

use crate::detect::MarkerHit;

const ARROW_SCALE: f32 = 0.55;
const STROKE_FG: i32 = 3;
const STROKE_BG: i32 = 5;
const FONT_SCALE: f64 = 1.0;
const CENTER_RADIUS: i32 = 3;
const STATUS_BAR_HEIGHT: i32 = 28;

fn marker_green() -> Scalar {
    Scalar::new(0.0, 255.0, 0.0, 0.0)
}

fn axis_red() -> Scalar {
    Scalar::new(0.0, 0.0, 255.0, 0.0)
}

fn stroke_black() -> Scalar {
    Scalar::all(0.0)
}

/// Draw every detection onto a display frame.
///
/// `scale` maps native frame coordinates onto the display frame.
pub fn draw_hits(frame: &mut Mat, hits: &[MarkerHit], scale: f64) -> Result<()> {
    for hit in hits {
        draw_hit(frame, hit, scale)?;
    }
    Ok(())
}

fn draw_hit(frame: &mut Mat, hit: &MarkerHit, scale: f64) -> Result<()> {
    let corners = hit.corners.map(|corner| {
        Point::new(
            (f64::from(corner.x) * scale).round() as i32,
            (f64::from(corner.y) * scale).round() as i32,
        )
    });
    let [tl, _tr, br, bl] = corners;

    let min_x = corners.iter().map(|point| point.x).min().unwrap_or(0);
    let max_x = corners.iter().map(|point| point.x).max().unwrap_or(0);
    let min_y = corners.iter().map(|point| point.y).min().unwrap_or(0);
    let max_y = corners.iter().map(|point| point.y).max().unwrap_or(0);
    let mid = Point::new(
        ((min_x + max_x) as f64 * 0.5) as i32,
        ((min_y + max_y) as f64 * 0.5) as i32,
    );

    // Orientation arrows extend past the bottom-right and top-left corners,
    // away from the bottom-left origin corner.
    let x_arrow = extend_past(br, bl, ARROW_SCALE);
    let y_arrow = extend_past(tl, bl, ARROW_SCALE);
    stroked_line(frame, br, x_arrow, axis_red())?;
    stroked_line(frame, tl, y_arrow, axis_red())?;

    imgproc::circle(
        frame,
        mid,
        CENTER_RADIUS,
        axis_red(),
        imgproc::FILLED,
        imgproc::LINE_8,
        0,
    )
    .context("failed to draw marker center")?;

    stroked_quad(frame, corners, marker_green())?;

    let label = format!("ID: {}", hit.id);
    let mut baseline = 0;
    let text_size = imgproc::get_text_size(
        &label,
        imgproc::FONT_HERSHEY_SIMPLEX,
        FONT_SCALE,
        STROKE_FG,
        &mut baseline,
    )
    .context("failed to measure marker label")?;
    let anchor = Point::new(mid.x - text_size.width / 2, mid.y + text_size.height / 2);
    stroked_text(frame, &label, anchor, marker_green())?;

    Ok(())
}

fn extend_past(tip: Point, base: Point, scale: f32) -> Point {
    let dx = (tip.x - base.x) as f32 * scale;
    let dy = (tip.y - base.y) as f32 * scale;
    Point::new(tip.x + dx as i32, tip.y + dy as i32)
}

fn stroked_line(frame: &mut Mat, from: Point, to: Point, color: Scalar) -> Result<()> {
    imgproc::line(
        frame,
        from,
        to,
        stroke_black(),
        STROKE_BG,
        imgproc::LINE_AA,
        0,
    )
    .context("failed to draw line background")?;
    imgproc::line(frame, from, to, color, STROKE_FG, imgproc::LINE_AA, 0)
        .context("failed to draw line")?;
    Ok(())
}

/// Closed quad. The background pass covers all four edges before any
/// foreground edge is drawn.
fn stroked_quad(frame: &mut Mat, corners: [Point; 4], color: Scalar) -> Result<()> {
    let edges = quad_edges(corners);
    for (from, to) in edges {
        imgproc::line(
            frame,
            from,
            to,
            stroke_black(),
            STROKE_BG,
            imgproc::LINE_AA,
            0,
        )
        .context("failed to draw box background")?;
    }
    for (from, to) in edges {
        imgproc::line(frame, from, to, color, STROKE_FG, imgproc::LINE_AA, 0)
            .context("failed to draw box")?;
    }
    Ok(())
}

fn quad_edges(corners: [Point; 4]) -> [(Point, Point); 4] {
    [
        (corners[0], corners[1]),
        (corners[1], corners[2]),
        (corners[2], corners[3]),
        (corners[3], corners[0]),
    ]
}

fn stroked_text(frame: &mut Mat, text: &str, anchor: Point, color: Scalar) -> Result<()> {
    imgproc::put_text(
        frame,
        text,
        anchor,
        imgproc::FONT_HERSHEY_SIMPLEX,
        FONT_SCALE,
        stroke_black(),
        STROKE_BG,
        imgproc::LINE_AA,
        false,
    )
    .context("failed to draw label background")?;
    imgproc::put_text(
        frame,
        text,
        anchor,
        imgproc::FONT_HERSHEY_SIMPLEX,
        FONT_SCALE,
        color,
        STROKE_FG,
        imgproc::LINE_AA,
        false,
    )
    .context("failed to draw label")?;
    Ok(())
}

/// Resize a native frame for display. Returns the frame untouched when the
/// scale is already 1.
pub fn scale_for_display(frame: Mat, scale: f64) -> Result<Mat> {
    if (scale - 1.0).abs() < f64::EPSILON {
        return Ok(frame);
    }
    let mut resized = Mat::default();
    imgproc::resize(
        &frame,
        &mut resized,
        Size::new(0, 0),
        scale,
        scale,
        imgproc::INTER_LINEAR,
    )
    .context("failed to resize frame for display")?;
    Ok(resized)
}

/// Append a status bar below the frame and return the combined image.
pub fn append_status_bar(frame: &Mat, status: &str) -> Result<Mat> {
    let mut bar = Mat::new_rows_cols_with_default(
        STATUS_BAR_HEIGHT,
        frame.cols(),
        CV_8UC3,
        Scalar::all(0.0),
    )
    .context("failed to build status bar")?;
    imgproc::put_text(
        &mut bar,
        status,
        Point::new(8, 19),
        imgproc::FONT_HERSHEY_SIMPLEX,
        0.5,
        Scalar::all(255.0),
        1,
        imgproc::LINE_AA,
        false,
    )
    .context("failed to draw status text")?;

    let mut combined = Mat::default();
    core::vconcat2(frame, &bar, &mut combined).context("failed to append status bar")?;
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::StubDetector;

    fn canvas(rows: i32, cols: i32) -> Mat {
        Mat::new_rows_cols_with_default(rows, cols, CV_8UC3, Scalar::all(20.0)).expect("canvas")
    }

    #[test]
    fn empty_hit_list_leaves_frame_untouched() {
        let mut frame = canvas(60, 80);
        let before = frame.data_bytes().expect("bytes").to_vec();
        draw_hits(&mut frame, &[], 1.0).expect("draw");
        assert_eq!(frame.data_bytes().expect("bytes"), &before[..]);
    }

    #[test]
    fn drawing_a_hit_changes_pixels() {
        let mut frame = canvas(120, 160);
        let before = frame.data_bytes().expect("bytes").to_vec();
        let hit = StubDetector::square_hit(7, 80.0, 60.0, 20.0);
        draw_hits(&mut frame, &[hit], 1.0).expect("draw");
        assert_ne!(frame.data_bytes().expect("bytes"), &before[..]);
    }

    #[test]
    fn hits_outside_the_frame_do_not_panic() {
        let mut frame = canvas(40, 40);
        let hit = StubDetector::square_hit(1, 500.0, 500.0, 20.0);
        draw_hits(&mut frame, &[hit], 2.0).expect("draw");
    }

    #[test]
    fn unit_scale_keeps_frame_dimensions() {
        let frame = canvas(48, 64);
        let scaled = scale_for_display(frame, 1.0).expect("scale");
        assert_eq!((scaled.cols(), scaled.rows()), (64, 48));
    }

    #[test]
    fn scale_resizes_both_dimensions() {
        let frame = canvas(48, 64);
        let scaled = scale_for_display(frame, 2.0).expect("scale");
        assert_eq!((scaled.cols(), scaled.rows()), (128, 96));
    }

    #[test]
    fn status_bar_extends_frame_height() {
        let frame = canvas(48, 64);
        let combined = append_status_bar(&frame, "4x4:1000 | 640x480").expect("bar");
        assert_eq!(combined.cols(), 64);
        assert_eq!(combined.rows(), 48 + STATUS_BAR_HEIGHT);
    }
}
