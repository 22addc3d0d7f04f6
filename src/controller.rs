//! Application controller.
//!
//! Owns every piece of transient state: the selected file, its preview
//! handle, the last detection result, the loading flag and the error
//! message. The phases are
//!
//! ```text
//! Idle --select--> Ready --begin--> Detecting --complete--> ReadyWithResult
//!                                                       \--> ReadyWithError
//! ```
//!
//! `select_file` and `reset` are accepted in every phase.
//!
//! Each request carries a [`RequestTicket`] stamped with the generation at
//! the time it was issued. Selecting a file, resetting, or issuing a new
//! request moves the generation on, so a completion that arrives late is
//! recognised as stale and dropped instead of overwriting newer state.

use anyhow::Result;

use crate::detect::{DetectionResponse, DetectionService};
use crate::preview::{PreviewHandle, PreviewRegistry, PreviewView};
use crate::results::ResultsView;
use crate::upload::SelectedFile;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No file selected; the upload prompt is showing.
    Idle,
    Ready,
    Detecting,
    ReadyWithResult,
    ReadyWithError,
}

/// Identifies one outgoing detection request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Work handed to whoever performs the request.
#[derive(Clone, Debug)]
pub struct DetectionRequest {
    pub ticket: RequestTicket,
    pub file: SelectedFile,
}

/// What happened to a completion handed back to the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// The state moved on since the request was issued; nothing changed.
    Stale,
}

#[derive(Debug)]
pub struct AppController {
    previews: PreviewRegistry,
    selected: Option<SelectedFile>,
    preview: Option<PreviewHandle>,
    result: Option<DetectionResponse>,
    error: Option<String>,
    loading: bool,
    generation: u64,
}

impl AppController {
    pub fn new(previews: PreviewRegistry) -> Self {
        Self {
            previews,
            selected: None,
            preview: None,
            result: None,
            error: None,
            loading: false,
            generation: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.selected.is_none() {
            Phase::Idle
        } else if self.loading {
            Phase::Detecting
        } else if self.error.is_some() {
            Phase::ReadyWithError
        } else if self.result.is_some() {
            Phase::ReadyWithResult
        } else {
            Phase::Ready
        }
    }

    /// Make `file` the current selection.
    ///
    /// Clears any result or error and swaps the preview, revoking the old
    /// URL. A request still in flight becomes stale.
    pub fn select_file(&mut self, file: SelectedFile) -> Result<()> {
        let handle = self.previews.create(&file)?;
        self.generation += 1;
        self.preview = Some(handle);
        self.selected = Some(file);
        self.result = None;
        self.error = None;
        self.loading = false;
        Ok(())
    }

    /// Start a detection for the current selection.
    ///
    /// Returns `None`, and changes nothing, when no file is selected or a
    /// request is already in flight.
    pub fn begin_detection(&mut self) -> Option<DetectionRequest> {
        if self.loading {
            log::debug!("detection already in flight; ignoring trigger");
            return None;
        }
        let file = self.selected.clone()?;
        self.generation += 1;
        self.loading = true;
        self.error = None;
        Some(DetectionRequest {
            ticket: RequestTicket(self.generation),
            file,
        })
    }

    /// Apply the outcome of the request identified by `ticket`.
    pub fn complete_detection(
        &mut self,
        ticket: RequestTicket,
        outcome: Result<DetectionResponse>,
    ) -> Completion {
        if ticket.0 != self.generation || !self.loading {
            log::debug!(
                "dropping stale detection completion (request {}, current {})",
                ticket.0,
                self.generation
            );
            return Completion::Stale;
        }
        self.loading = false;
        match outcome {
            Ok(response) => {
                self.result = Some(response);
                self.error = None;
            }
            Err(err) => {
                log::warn!("detection error: {:#}", err);
                self.result = None;
                self.error = Some(format!("{:#}", err));
            }
        }
        Completion::Applied
    }

    /// Begin, call `service`, and complete in one go.
    ///
    /// `None` when there was nothing to do.
    pub fn run_detection(&mut self, service: &dyn DetectionService) -> Option<Completion> {
        let request = self.begin_detection()?;
        log::debug!("running detection via {}", service.name());
        let outcome = service.detect_image(&request.file);
        Some(self.complete_detection(request.ticket, outcome))
    }

    /// Back to the upload prompt, releasing the preview.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.preview = None;
        self.selected = None;
        self.result = None;
        self.error = None;
        self.loading = false;
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn preview_url(&self) -> Option<&str> {
        self.preview.as_ref().map(|handle| handle.url())
    }

    pub fn preview_view(&self) -> Option<PreviewView> {
        self.preview
            .as_ref()
            .map(|handle| PreviewView::new(handle, self.result.as_ref()))
    }

    pub fn result(&self) -> Option<&DetectionResponse> {
        self.result.as_ref()
    }

    pub fn results_view(&self) -> Option<ResultsView> {
        self.result
            .as_ref()
            .map(|response| ResultsView::from_detections(&response.detections))
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }
}

impl Default for AppController {
    fn default() -> Self {
        Self::new(PreviewRegistry::new())
    }
}
