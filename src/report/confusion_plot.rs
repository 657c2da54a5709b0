//! Confusion-matrix heatmap rendered to PNG bytes
//!
//! The chart is drawn with `plotters` into an RGB buffer which `image` then
//! encodes as PNG, so nothing touches the filesystem until the tracker
//! stores the artifact.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbImage};
use plotters::prelude::*;
use plotters::coord::combinators::WithKeyPoints;
use plotters::coord::ranged1d::{KeyPointHint, NoDefaultFormatting, ValueFormatter};
use plotters::coord::types::RangedCoordf64;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::model::ConfusionMatrix;
use crate::pipeline::{PipelineError, Result};

/// File name the artifact is stored under
pub const CONFUSION_MATRIX_FILE: &str = "confusion_matrix.png";

const WIDTH: u32 = 640;
const HEIGHT: u32 = 560;
const FONT: &str = "sans-serif";

const BLUES_LOW: [f64; 3] = [247.0, 251.0, 255.0];
const BLUES_HIGH: [f64; 3] = [8.0, 48.0, 107.0];
const CELL_BORDER: RGBColor = RGBColor(200, 200, 200);

/// PNG image plus the name it should be stored under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrixArtifact {
    pub file_name: String,
    pub png: Vec<u8>,
}

/// Render the matrix as an annotated 2×2 heatmap.
///
/// Rows are the true class (class 0 on top), columns the predicted class.
/// Cell shading is relative to the largest count.
pub fn render_confusion_matrix(cm: &ConfusionMatrix) -> Result<ConfusionMatrixArtifact> {
    let mut buf = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
    draw_heatmap(&mut buf, cm).map_err(|e| PipelineError::Chart(e.to_string()))?;

    let img = RgbImage::from_raw(WIDTH, HEIGHT, buf)
        .ok_or_else(|| PipelineError::Chart("bitmap buffer has the wrong size".to_string()))?;
    let mut png = Vec::new();
    DynamicImage::ImageRgb8(img).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    Ok(ConfusionMatrixArtifact {
        file_name: CONFUSION_MATRIX_FILE.to_string(),
        png,
    })
}

/// `WithKeyPoints<RangedCoordf64>` lacks the `ValueFormatter` impl that
/// `configure_mesh` requires; this forwards to it and supplies one.
struct CellAxis(WithKeyPoints<RangedCoordf64>);

impl Ranged for CellAxis {
    type ValueType = f64;
    type FormatOption = NoDefaultFormatting;

    fn range(&self) -> std::ops::Range<f64> {
        self.0.range()
    }

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        self.0.map(value, limit)
    }

    fn key_points<Hint: KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        self.0.key_points(hint)
    }

    fn axis_pixel_range(&self, limit: (i32, i32)) -> std::ops::Range<i32> {
        self.0.axis_pixel_range(limit)
    }
}

impl ValueFormatter<f64> for CellAxis {
    fn format(value: &f64) -> String {
        RangedCoordf64::format(value)
    }
}

fn draw_heatmap(buf: &mut [u8], cm: &ConfusionMatrix) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::with_buffer(buf, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Confusion Matrix", (FONT, 28))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d(
            CellAxis((0f64..2f64).with_key_points(vec![0.5, 1.5])),
            CellAxis((0f64..2f64).with_key_points(vec![0.5, 1.5])),
        )?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Predicted Label")
        .y_desc("True Label")
        .x_label_formatter(&|v| format!("{}", v.floor() as i64))
        .y_label_formatter(&|v| format!("{}", 1 - v.floor() as i64))
        .label_style((FONT, 18))
        .axis_desc_style((FONT, 20))
        .draw()?;

    let max_count = cm.counts.iter().flatten().copied().max().unwrap_or(0).max(1);
    let cells: Vec<(f64, f64, usize, f64)> = cm
        .counts
        .iter()
        .enumerate()
        .flat_map(|(row, counts)| {
            counts.iter().enumerate().map(move |(col, &count)| {
                // true class 0 is drawn in the upper band
                let y = (1 - row) as f64;
                (col as f64, y, count, count as f64 / max_count as f64)
            })
        })
        .collect();

    chart.draw_series(
        cells
            .iter()
            .map(|&(x, y, _, t)| Rectangle::new([(x, y), (x + 1.0, y + 1.0)], blues(t).filled())),
    )?;
    chart.draw_series(
        cells
            .iter()
            .map(|&(x, y, _, _)| Rectangle::new([(x, y), (x + 1.0, y + 1.0)], CELL_BORDER.stroke_width(1))),
    )?;

    let centered = Pos::new(HPos::Center, VPos::Center);
    chart.draw_series(cells.iter().map(|&(x, y, count, t)| {
        let ink = if t > 0.5 { WHITE } else { BLACK };
        Text::new(
            count.to_string(),
            (x + 0.5, y + 0.5),
            (FONT, 32).into_font().color(&ink).pos(centered),
        )
    }))?;

    root.present()?;
    Ok(())
}

fn blues(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let channel = |i: usize| (BLUES_LOW[i] + (BLUES_HIGH[i] - BLUES_LOW[i]) * t).round() as u8;
    RGBColor(channel(0), channel(1), channel(2))
}
