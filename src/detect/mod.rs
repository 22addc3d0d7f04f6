mod backend;
mod result;

pub use backend::DetectionService;
pub use result::{Detection, DetectionResponse, HealthStatus};
