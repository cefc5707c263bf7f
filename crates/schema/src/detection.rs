use serde::{Deserialize, Serialize};

/// One predicted object: class label, score and `[x_min, y_min, x_max, y_max]`
/// box in the pixel space of the image returned alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "class")]
    pub class_label: String,
    pub confidence: f32,
    pub bbox: [f32; 4],
}

/// Body of a `/predict` response.
///
/// The service only ever produces `Success`; `Failure` is what an older or
/// proxying backend may send with a 200, and the client must render it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionResponse {
    Failure {
        error: String,
    },
    Success {
        detections: Vec<Detection>,
        image: String,
    },
}

/// Body of every 4xx/5xx response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl ErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detection_serializes_class_field() {
        let det = Detection {
            class_label: "dog".to_string(),
            confidence: 0.75,
            bbox: [1.0, 2.0, 30.5, 40.0],
        };

        let value = serde_json::to_value(&det).unwrap();
        assert_eq!(
            value,
            json!({"class": "dog", "confidence": 0.75, "bbox": [1.0, 2.0, 30.5, 40.0]})
        );
    }

    #[test]
    fn test_success_response_shape() {
        let response = PredictionResponse::Success {
            detections: vec![],
            image: "data:image/jpeg;base64,AAAA".to_string(),
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({"detections": [], "image": "data:image/jpeg;base64,AAAA"})
        );
    }

    #[test]
    fn test_deserializes_both_response_shapes() {
        let ok: PredictionResponse = serde_json::from_str(
            r#"{"detections":[{"class":"person","confidence":0.9,"bbox":[0,0,10,20]}],"image":"data:image/jpeg;base64,"}"#,
        )
        .unwrap();
        match ok {
            PredictionResponse::Success { detections, .. } => {
                assert_eq!(detections.len(), 1);
                assert_eq!(detections[0].class_label, "person");
                assert_eq!(detections[0].bbox, [0.0, 0.0, 10.0, 20.0]);
            }
            other => panic!("Expected success, got {:?}", other),
        }

        let failed: PredictionResponse =
            serde_json::from_str(r#"{"error":"model exploded"}"#).unwrap();
        assert_eq!(
            failed,
            PredictionResponse::Failure {
                error: "model exploded".to_string()
            }
        );
    }

    #[test]
    fn test_rejects_unrelated_body() {
        let result = serde_json::from_str::<PredictionResponse>(r#"{"detail":"nope"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_error_body() {
        let body = ErrorBody::new("Empty file received");
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"detail":"Empty file received"}"#
        );
    }
}
