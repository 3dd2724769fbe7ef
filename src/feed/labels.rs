use std::fs;
use std::path::Path;

use super::log::DetectionLogError;

/// Label given to class ids the vocabulary does not know
pub const UNKNOWN_LABEL: &str = "unknown";

/// The 80 COCO class names, indexed by class id
const COCO_LABELS: [&str; 80] = [
    "person",
    "bicycle",
    "car",
    "motorcycle",
    "airplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "backpack",
    "umbrella",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "couch",
    "potted plant",
    "bed",
    "dining table",
    "toilet",
    "tv",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];

/// Maps detector class ids to label strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelVocabulary {
    names: Vec<String>,
}

impl LabelVocabulary {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// COCO vocabulary used by stock YOLO detectors
    pub fn coco() -> Self {
        Self::new(COCO_LABELS.iter().map(|s| s.to_string()).collect())
    }

    /// Load a class file with one name per line
    ///
    /// Line numbers are class ids, so blank lines are kept as empty names.
    pub fn from_file(path: &Path) -> Result<Self, DetectionLogError> {
        let contents = fs::read_to_string(path).map_err(|source| DetectionLogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&contents))
    }

    pub fn parse(contents: &str) -> Self {
        Self::new(contents.lines().map(|l| l.trim().to_string()).collect())
    }

    /// Name for `class_id`, or [`UNKNOWN_LABEL`]
    pub fn name(&self, class_id: u32) -> &str {
        self.names
            .get(class_id as usize)
            .map(String::as_str)
            .filter(|n| !n.is_empty())
            .unwrap_or(UNKNOWN_LABEL)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for LabelVocabulary {
    fn default() -> Self {
        Self::coco()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_coco_ids() {
        let vocab = LabelVocabulary::coco();
        assert_eq!(vocab.len(), 80);
        assert_eq!(vocab.name(0), "person");
        assert_eq!(vocab.name(2), "car");
        assert_eq!(vocab.name(7), "truck");
        assert_eq!(vocab.name(79), "toothbrush");
        assert_eq!(vocab.name(80), UNKNOWN_LABEL);
    }

    #[test]
    fn test_parse_keeps_line_numbers() {
        let vocab = LabelVocabulary::parse("background\n\ncar\n");
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.name(0), "background");
        assert_eq!(vocab.name(1), UNKNOWN_LABEL);
        assert_eq!(vocab.name(2), "car");
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "person").unwrap();
        writeln!(file, "car").unwrap();

        let vocab = LabelVocabulary::from_file(file.path()).unwrap();
        assert_eq!(vocab.name(1), "car");
    }

    #[test]
    fn test_missing_file() {
        let err = LabelVocabulary::from_file(Path::new("/nonexistent/coco.txt")).unwrap_err();
        assert!(matches!(err, DetectionLogError::Io { .. }));
    }
}
