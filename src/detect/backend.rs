use anyhow::Result;

use crate::detect::result::{DetectionResponse, HealthStatus};
use crate::upload::SelectedFile;

/// Remote detection service the controller talks to.
///
/// `ApiClient` is the HTTP implementation. Implementations must not retry:
/// one call is one request, and any failure is returned to the caller as is.
pub trait DetectionService: Send + Sync {
    /// Short identifier used in log lines.
    fn name(&self) -> &str;

    /// Submit one image and return the server's detections.
    fn detect_image(&self, file: &SelectedFile) -> Result<DetectionResponse>;

    /// Liveness probe. Not used by the upload/detect flow.
    fn check_health(&self) -> Result<HealthStatus>;
}
