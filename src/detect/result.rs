use serde::{Deserialize, Serialize};

/// One recognized object as reported by the detection server.
///
/// `bbox` is `[x1, y1, x2, y2]` in pixel coordinates of the uploaded image
/// (top-left and bottom-right corners).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class_name: String,
    /// Model confidence in `0..=1`.
    pub confidence: f64,
    pub bbox: [f64; 4],
}

impl Detection {
    /// Bounding box corners rounded to whole pixels.
    pub fn rounded_bbox(&self) -> [i64; 4] {
        self.bbox.map(|coord| coord.round() as i64)
    }

    /// Confidence clamped into `0..=1`, for proportional displays.
    pub fn clamped_confidence(&self) -> f64 {
        if self.confidence.is_nan() {
            return 0.0;
        }
        self.confidence.clamp(0.0, 1.0)
    }
}

/// Full reply of `POST /detect/image`.
///
/// `detections` keeps server order. `annotated_image` is a base64 JPEG of the
/// input with the boxes drawn server-side; the server may omit it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResponse {
    pub detections: Vec<Detection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotated_image: Option<String>,
}

impl DetectionResponse {
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}

/// Reply of the liveness endpoint `GET /`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub message: String,
    pub status: String,
}
