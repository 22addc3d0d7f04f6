//! VisionGuard client
//!
//! Upload an image, send it to a remote object-detection server, and review
//! the returned bounding boxes and confidence scores next to the server's
//! annotated copy of the image.
//!
//! No inference happens here. The detection model lives behind one HTTP
//! endpoint; this crate owns the upload → request → result cycle around it.
//!
//! # Module Structure
//!
//! - `api`: blocking HTTP client (`POST /detect/image`, `GET /`)
//! - `detect`: wire types and the `DetectionService` seam
//! - `upload`: file selection and the shared image validation
//! - `preview`: revocable preview URLs and the preview pane
//! - `results`: detections table
//! - `controller`: state machine with stale-response protection
//! - `view`, `report`: terminal page and self-contained HTML page
//! - `shell`: interactive session over stdin
//! - `config`, `ui`: configuration loading and progress output

pub mod api;
pub mod config;
pub mod controller;
pub mod detect;
pub mod preview;
pub mod report;
pub mod results;
pub mod shell;
pub mod ui;
pub mod upload;
pub mod view;

pub use api::{ApiClient, ApiConfig};
pub use config::ClientConfig;
pub use controller::{AppController, Completion, DetectionRequest, Phase, RequestTicket};
pub use detect::{Detection, DetectionResponse, DetectionService, HealthStatus};
pub use preview::{AnnotatedImage, PreviewHandle, PreviewRegistry, PreviewView};
pub use results::{DetectionRow, ResultsView};
pub use ui::{Ui, UiMode};
pub use upload::{validate_image_file, SelectedFile, UploadSource, UploadSurface};
pub use view::PageView;
