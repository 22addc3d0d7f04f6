//! Whole-page view for the current controller state.

use std::fmt;

use crate::controller::{AppController, Phase};
use crate::preview::PreviewView;
use crate::results::ResultsView;

pub const APP_TITLE: &str = "VisionGuard";
pub const APP_TAGLINE: &str = "Real-time Object Detection";
pub const UPLOAD_HEADLINE: &str = "Upload Image for Object Detection";
pub const UPLOAD_SUBTITLE: &str = "Select an image to detect objects using our YOLO model";

/// Snapshot of everything the page shows.
#[derive(Clone, Debug, PartialEq)]
pub struct PageView {
    pub phase: Phase,
    pub file_name: Option<String>,
    pub error: Option<String>,
    pub preview: Option<PreviewView>,
    pub results: Option<ResultsView>,
}

impl PageView {
    pub fn from_controller(controller: &AppController) -> Self {
        Self {
            phase: controller.phase(),
            file_name: controller.selected_file().map(|file| file.name().to_string()),
            error: controller.error().map(str::to_string),
            preview: controller.preview_view(),
            results: controller.results_view(),
        }
    }

    /// Upload prompt instead of the action buttons.
    pub fn shows_upload_prompt(&self) -> bool {
        self.phase == Phase::Idle
    }

    /// Detect and reset buttons are disabled while a request is in flight.
    pub fn controls_enabled(&self) -> bool {
        self.phase != Phase::Detecting
    }

    pub fn detect_button_label(&self) -> &'static str {
        if self.phase == Phase::Detecting {
            "Detecting Objects..."
        } else {
            "Detect Objects"
        }
    }
}

impl fmt::Display for PageView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} | {}", APP_TITLE, APP_TAGLINE)?;
        writeln!(f)?;

        if self.shows_upload_prompt() {
            writeln!(f, "{}", UPLOAD_HEADLINE)?;
            writeln!(f, "{}", UPLOAD_SUBTITLE)?;
            writeln!(f, "  Upload an image: drag and drop or choose a file")?;
            return Ok(());
        }

        if let Some(name) = &self.file_name {
            writeln!(f, "Selected: {}", name)?;
        }
        let suffix = if self.controls_enabled() {
            ""
        } else {
            " (disabled)"
        };
        writeln!(
            f,
            "[ {} ]  [ Upload New Image ]{}",
            self.detect_button_label(),
            suffix
        )?;

        if let Some(error) = &self.error {
            writeln!(f)?;
            writeln!(f, "Error: {}", error)?;
        }
        if let Some(preview) = &self.preview {
            writeln!(f)?;
            write!(f, "{}", preview)?;
        }
        if let Some(results) = &self.results {
            writeln!(f)?;
            write!(f, "{}", results)?;
        }
        Ok(())
    }
}
