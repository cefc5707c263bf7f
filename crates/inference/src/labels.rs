use regex::Regex;
use std::sync::LazyLock;

/// The 80 COCO classes in the order Ultralytics models index them.
pub const COCO_CLASSES: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange",
    "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch", "potted plant",
    "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote", "keyboard", "cell phone",
    "microwave", "oven", "toaster", "sink", "refrigerator", "book", "clock", "vase", "scissors",
    "teddy bear", "hair drier", "toothbrush",
];

// `{0: 'person', 1: 'bicycle', ..., 27: "yellow_lady's_slipper"}`
static NAME_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\d+)\s*:\s*(?:'([^']*)'|"([^"]*)")"#).expect("valid names regex")
});

pub fn coco_class_names() -> Vec<String> {
    COCO_CLASSES.iter().map(|s| s.to_string()).collect()
}

/// Parse the `names` entry an Ultralytics export stores in the ONNX metadata.
///
/// Entries are placed by their numeric key; gaps are filled with `class_<id>`.
/// Returns an empty list when nothing parses.
pub fn parse_names_metadata(raw: &str) -> Vec<String> {
    let mut entries: Vec<(usize, String)> = NAME_ENTRY
        .captures_iter(raw)
        .filter_map(|caps| {
            let id = caps.get(1)?.as_str().parse().ok()?;
            let name = caps.get(2).or_else(|| caps.get(3))?.as_str().to_string();
            Some((id, name))
        })
        .collect();

    let Some(max_id) = entries.iter().map(|(id, _)| *id).max() else {
        return Vec::new();
    };

    let mut names: Vec<String> = (0..=max_id).map(fallback_label).collect();
    for (id, name) in entries.drain(..) {
        names[id] = name;
    }
    names
}

/// Label for a class id the model's table does not cover.
pub fn fallback_label(class_id: usize) -> String {
    format!("class_{}", class_id)
}
