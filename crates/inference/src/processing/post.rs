use schema::CONFIDENCE_THRESHOLD;
use std::cmp::Ordering;

pub struct TransformParams {
    pub orig_width: u32,
    pub orig_height: u32,
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

/// A detection in original-image pixel coordinates, before class names are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub confidence: f32,
    pub class_id: usize,
}

impl RawDetection {
    fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    fn iou(&self, other: &Self) -> f32 {
        let ix = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0.0);
        let iy = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0.0);
        let intersection = ix * iy;
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }
}

pub struct PostProcessor {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
}

impl PostProcessor {
    pub fn new(iou_threshold: f32, max_detections: usize) -> Self {
        Self {
            confidence_threshold: CONFIDENCE_THRESHOLD,
            iou_threshold,
            max_detections,
        }
    }

    /// Parse YOLO output `[1, 4 + num_classes, num_anchors]` into detections,
    /// highest confidence first.
    #[tracing::instrument(skip(self, preds, transform))]
    pub fn parse_detections(
        &self,
        preds: &ndarray::ArrayViewD<f32>,
        transform: &TransformParams,
    ) -> anyhow::Result<Vec<RawDetection>> {
        let shape = preds.shape();
        if shape.len() != 3 || shape[0] != 1 || shape[1] <= 4 {
            anyhow::bail!("Unexpected model output shape {:?}", shape);
        }

        let num_classes = shape[1] - 4;
        let num_anchors = shape[2];

        let mut candidates = Vec::new();

        for i in 0..num_anchors {
            // argmax over class scores
            let mut confidence = f32::NEG_INFINITY;
            let mut class_id = 0usize;
            for c in 0..num_classes {
                let score = preds[[0, 4 + c, i]];
                if score > confidence {
                    confidence = score;
                    class_id = c;
                }
            }

            if !confidence.is_finite() || confidence < self.confidence_threshold {
                continue;
            }

            let cx = preds[[0, 0, i]];
            let cy = preds[[0, 1, i]];
            let w = preds[[0, 2, i]];
            let h = preds[[0, 3, i]];

            let (x1_input, y1_input, x2_input, y2_input) = cxcywh_to_xyxy(cx, cy, w, h);

            // Apply inverse letterbox transform to original image coordinates
            let x1 = ((x1_input - transform.offset_x) / transform.scale)
                .max(0.0)
                .min(transform.orig_width as f32);
            let y1 = ((y1_input - transform.offset_y) / transform.scale)
                .max(0.0)
                .min(transform.orig_height as f32);
            let x2 = ((x2_input - transform.offset_x) / transform.scale)
                .max(0.0)
                .min(transform.orig_width as f32);
            let y2 = ((y2_input - transform.offset_y) / transform.scale)
                .max(0.0)
                .min(transform.orig_height as f32);

            candidates.push(RawDetection {
                x1,
                y1,
                x2,
                y2,
                confidence: confidence.min(1.0),
                class_id,
            });
        }

        let mut detections = non_max_suppression(candidates, self.iou_threshold);
        detections.truncate(self.max_detections);

        tracing::trace!(
            num_anchors,
            kept = detections.len(),
            "Parsed detections"
        );

        Ok(detections)
    }
}

/// Class-aware NMS: a box is only suppressed by a higher-scoring box of the same class.
pub fn non_max_suppression(mut boxes: Vec<RawDetection>, iou_threshold: f32) -> Vec<RawDetection> {
    boxes.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut kept: Vec<RawDetection> = Vec::with_capacity(boxes.len());
    for candidate in boxes {
        let suppressed = kept
            .iter()
            .any(|k| k.class_id == candidate.class_id && k.iou(&candidate) > iou_threshold);
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}

/// Convert bounding box from center-width-height format to corner format
#[inline]
fn cxcywh_to_xyxy(cx: f32, cy: f32, w: f32, h: f32) -> (f32, f32, f32, f32) {
    let x1 = cx - w / 2.0;
    let y1 = cy - h / 2.0;
    let x2 = cx + w / 2.0;
    let y2 = cy + h / 2.0;
    (x1, y1, x2, y2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, IxDyn};

    const NUM_CLASSES: usize = 80;

    fn test_postprocessor() -> PostProcessor {
        PostProcessor::new(0.7, 300)
    }

    fn identity_transform(orig_width: u32, orig_height: u32) -> TransformParams {
        TransformParams {
            orig_width,
            orig_height,
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    /// Build a `[1, 4 + NUM_CLASSES, n]` YOLO output from (cxcywh, class, score)
    /// rows; every other class score is zero.
    fn create_yolo_output(rows: Vec<([f32; 4], usize, f32)>) -> Array<f32, IxDyn> {
        let n = rows.len();
        let mut out = Array::zeros(IxDyn(&[1, 4 + NUM_CLASSES, n]));
        for (i, (bbox, class_id, score)) in rows.into_iter().enumerate() {
            for (k, v) in bbox.iter().enumerate() {
                out[[0, k, i]] = *v;
            }
            out[[0, 4 + class_id, i]] = score;
        }
        out
    }

    #[test]
    fn test_cxcywh_to_xyxy() {
        let (x1, y1, x2, y2) = cxcywh_to_xyxy(50.0, 50.0, 40.0, 20.0);
        assert_eq!((x1, y1, x2, y2), (30.0, 40.0, 70.0, 60.0));
    }

    /// Test that confidence threshold filters detections correctly
    #[test]
    fn test_confidence_threshold_filtering() {
        let preds = create_yolo_output(vec![
            ([50.0, 50.0, 20.0, 20.0], 0, 0.49),
            ([150.0, 150.0, 20.0, 20.0], 1, 0.5),
            ([250.0, 250.0, 20.0, 20.0], 2, 0.8),
        ]);

        let detections = test_postprocessor()
            .parse_detections(&preds.view(), &identity_transform(640, 640))
            .unwrap();

        assert_eq!(detections.len(), 2, "Should filter out confidence < 0.5");
        assert_eq!(detections[0].class_id, 2, "Highest confidence first");
        assert_eq!(detections[1].class_id, 1, "Boundary 0.5 is kept");
        assert!(detections.iter().all(|d| d.confidence >= 0.5));
    }

    /// Test coordinate inverse transformation with known values
    #[test]
    fn test_coordinate_inverse_transformation() {
        // Original 800x600 letterboxed into 640x640: scale 0.8, offset_y 80.
        // Box in input space: cx=320, cy=320, w=128, h=128 -> (256, 256, 384, 384)
        // Back in original space:
        //   x1 = 256 / 0.8 = 320, y1 = (256 - 80) / 0.8 = 220
        //   x2 = 384 / 0.8 = 480, y2 = (384 - 80) / 0.8 = 380
        let preds = create_yolo_output(vec![([320.0, 320.0, 128.0, 128.0], 0, 0.9)]);
        let transform = TransformParams {
            orig_width: 800,
            orig_height: 600,
            scale: 0.8,
            offset_x: 0.0,
            offset_y: 80.0,
        };

        let detections = test_postprocessor()
            .parse_detections(&preds.view(), &transform)
            .unwrap();

        assert_eq!(detections.len(), 1);
        let det = &detections[0];
        assert!((det.x1 - 320.0).abs() < 0.1, "x1 incorrect: {}", det.x1);
        assert!((det.y1 - 220.0).abs() < 0.1, "y1 incorrect: {}", det.y1);
        assert!((det.x2 - 480.0).abs() < 0.1, "x2 incorrect: {}", det.x2);
        assert!((det.y2 - 380.0).abs() < 0.1, "y2 incorrect: {}", det.y2);
    }

    /// Test that coordinates are clamped to image bounds
    #[test]
    fn test_coordinates_clamped_to_image_bounds() {
        let preds = create_yolo_output(vec![
            ([10.0, 10.0, 80.0, 80.0], 0, 0.9),
            ([440.0, 440.0, 80.0, 80.0], 1, 0.9),
        ]);
        let transform = TransformParams {
            orig_width: 400,
            orig_height: 400,
            scale: 1.0,
            offset_x: 50.0,
            offset_y: 50.0,
        };

        let detections = test_postprocessor()
            .parse_detections(&preds.view(), &transform)
            .unwrap();

        assert_eq!(detections.len(), 2);
        for det in &detections {
            assert!(det.x1 >= 0.0 && det.y1 >= 0.0);
            assert!(det.x2 <= 400.0 && det.y2 <= 400.0);
        }
        assert!(detections.iter().any(|d| d.x1 == 0.0 && d.y1 == 0.0));
        assert!(detections.iter().any(|d| d.x2 == 400.0 && d.y2 == 400.0));
    }

    #[test]
    fn test_zero_detections_when_all_below_threshold() {
        let preds = create_yolo_output(vec![
            ([50.0, 50.0, 20.0, 20.0], 0, 0.1),
            ([60.0, 60.0, 20.0, 20.0], 5, 0.3),
        ]);

        let detections = test_postprocessor()
            .parse_detections(&preds.view(), &identity_transform(640, 640))
            .unwrap();

        assert!(detections.is_empty());
    }

    #[test]
    fn test_class_id_argmax() {
        let mut preds = create_yolo_output(vec![([100.0, 100.0, 50.0, 50.0], 16, 0.9)]);
        // A weaker competing class on the same anchor
        preds[[0, 4 + 3, 0]] = 0.6;

        let detections = test_postprocessor()
            .parse_detections(&preds.view(), &identity_transform(640, 640))
            .unwrap();

        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].class_id, 16);
        assert!((detections[0].confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_nms_suppresses_same_class_overlap_only() {
        let preds = create_yolo_output(vec![
            ([100.0, 100.0, 50.0, 50.0], 0, 0.9),
            ([102.0, 101.0, 50.0, 50.0], 0, 0.8), // same class, heavy overlap
            ([101.0, 100.0, 50.0, 50.0], 2, 0.7), // other class, same place
            ([400.0, 400.0, 50.0, 50.0], 0, 0.6), // same class, far away
        ]);

        let detections = test_postprocessor()
            .parse_detections(&preds.view(), &identity_transform(640, 640))
            .unwrap();

        let summary: Vec<(usize, f32)> = detections
            .iter()
            .map(|d| (d.class_id, d.confidence))
            .collect();
        assert_eq!(summary, vec![(0, 0.9), (2, 0.7), (0, 0.6)]);
    }

    #[test]
    fn test_max_detections_cap() {
        let rows = (0..10)
            .map(|i| ([20.0 + i as f32 * 60.0, 20.0, 10.0, 10.0], 0, 0.9))
            .collect();
        let preds = create_yolo_output(rows);

        let detections = PostProcessor::new(0.7, 3)
            .parse_detections(&preds.view(), &identity_transform(640, 640))
            .unwrap();

        assert_eq!(detections.len(), 3);
    }

    #[test]
    fn test_empty_input() {
        let preds = Array::<f32, _>::zeros(IxDyn(&[1, 4 + NUM_CLASSES, 0]));

        let detections = test_postprocessor()
            .parse_detections(&preds.view(), &identity_transform(640, 640))
            .unwrap();

        assert!(detections.is_empty());
    }

    #[test]
    fn test_rejects_unexpected_shape() {
        let preds = Array::<f32, _>::zeros(IxDyn(&[1, 4, 8400]));

        let result =
            test_postprocessor().parse_detections(&preds.view(), &identity_transform(640, 640));

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("shape"));
    }

    #[test]
    fn test_iou() {
        let a = RawDetection {
            x1: 0.0,
            y1: 0.0,
            x2: 10.0,
            y2: 10.0,
            confidence: 0.9,
            class_id: 0,
        };
        let b = RawDetection {
            x1: 5.0,
            y1: 0.0,
            x2: 15.0,
            y2: 10.0,
            ..a.clone()
        };
        // intersection 50, union 150
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(a.iou(&a), 1.0);
    }
}
