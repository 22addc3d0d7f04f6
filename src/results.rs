//! Detection results table.

use std::fmt;

use crate::detect::Detection;

pub const EMPTY_RESULTS_MESSAGE: &str = "No objects detected in the image.";

const BAR_WIDTH: usize = 20;
const HEADERS: [&str; 3] = ["Object", "Confidence", "Bounding Box"];

/// One table row, already formatted for display.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectionRow {
    pub class_name: String,
    /// Percent with one decimal, e.g. `87.3%`.
    pub confidence_label: String,
    /// Fraction of the confidence bar to fill, `0..=1`.
    pub bar_fill: f64,
    /// Rounded corners, e.g. `[10, 20, 110, 220]`.
    pub bbox_label: String,
}

impl DetectionRow {
    pub fn from_detection(detection: &Detection) -> Self {
        let coords = detection
            .rounded_bbox()
            .iter()
            .map(|coord| coord.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            class_name: detection.class_name.clone(),
            confidence_label: format!("{:.1}%", detection.confidence * 100.0),
            bar_fill: detection.clamped_confidence(),
            bbox_label: format!("[{}]", coords),
        }
    }

    /// Text bar of `width` cells filled in proportion to confidence.
    pub fn bar(&self, width: usize) -> String {
        let filled = ((self.bar_fill * width as f64).round() as usize).min(width);
        format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
    }
}

/// Results pane: an explicit placeholder when nothing was found, otherwise a
/// table in server order.
#[derive(Clone, Debug, PartialEq)]
pub enum ResultsView {
    Empty,
    Table(Vec<DetectionRow>),
}

impl ResultsView {
    pub fn from_detections(detections: &[Detection]) -> Self {
        if detections.is_empty() {
            return Self::Empty;
        }
        Self::Table(detections.iter().map(DetectionRow::from_detection).collect())
    }

    pub fn rows(&self) -> &[DetectionRow] {
        match self {
            Self::Empty => &[],
            Self::Table(rows) => rows,
        }
    }

    pub fn heading(&self) -> String {
        match self {
            Self::Empty => EMPTY_RESULTS_MESSAGE.to_string(),
            Self::Table(rows) => format!("Detected Objects ({})", rows.len()),
        }
    }
}

impl fmt::Display for ResultsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = match self {
            Self::Empty => return writeln!(f, "{}", EMPTY_RESULTS_MESSAGE),
            Self::Table(rows) => rows,
        };

        let class_width = rows
            .iter()
            .map(|row| row.class_name.chars().count())
            .chain(std::iter::once(HEADERS[0].len()))
            .max()
            .unwrap_or(0);
        let confidence_width = rows
            .iter()
            .map(|row| row.confidence_label.len() + 1 + BAR_WIDTH)
            .chain(std::iter::once(HEADERS[1].len()))
            .max()
            .unwrap_or(0);

        writeln!(f, "{}", self.heading())?;
        writeln!(
            f,
            "{:<cw$}  {:<pw$}  {}",
            HEADERS[0].to_uppercase(),
            HEADERS[1].to_uppercase(),
            HEADERS[2].to_uppercase(),
            cw = class_width,
            pw = confidence_width
        )?;
        for row in rows {
            let confidence = format!("{:>6} {}", row.confidence_label, row.bar(BAR_WIDTH));
            writeln!(
                f,
                "{:<cw$}  {:<pw$}  {}",
                row.class_name,
                confidence,
                row.bbox_label,
                cw = class_width,
                pw = confidence_width
            )?;
        }
        Ok(())
    }
}
