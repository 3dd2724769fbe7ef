//! JSON-lines detection log reader
//!
//! Each non-empty line holds one frame:
//!
//! ```text
//! {"frame": 0, "detections": [{"bbox": [10, 20, 60, 80], "label": "car", "confidence": 0.91}]}
//! {"frame": 1, "detections": [{"bbox": [10, 20, 60, 80], "class_id": 2, "confidence": 0.88}]}
//! {"frame": 2, "detections": [[10, 20, 60, 80, 0.87, 2]]}
//! ```
//!
//! The last form is the raw detector row `[x1, y1, x2, y2, confidence, class_id]`.
//! Class ids are resolved through a [`LabelVocabulary`].

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use super::labels::{LabelVocabulary, UNKNOWN_LABEL};
use crate::domain::{BoundingBox, Detection};

#[derive(Debug, Error)]
pub enum DetectionLogError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("line {line}: {source}")]
    Read {
        line: usize,
        source: std::io::Error,
    },
    #[error("line {line}: invalid frame record: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },
    #[error("line {line}: detection {index} has neither a label nor a class_id")]
    MissingLabel { line: usize, index: usize },
}

/// Detections reported for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameDetections {
    pub index: u64,
    pub detections: Vec<Detection>,
}

impl AsRef<[Detection]> for FrameDetections {
    fn as_ref(&self) -> &[Detection] {
        &self.detections
    }
}

#[derive(Debug, Deserialize)]
struct FrameRecord {
    #[serde(default)]
    frame: Option<u64>,
    #[serde(default)]
    detections: Vec<DetectionRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DetectionRecord {
    Tagged {
        bbox: [f64; 4],
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        class_id: Option<u32>,
        #[serde(default)]
        confidence: f32,
    },
    Row([f64; 6]),
}

impl DetectionRecord {
    fn into_detection(self, vocab: &LabelVocabulary) -> Option<Detection> {
        match self {
            DetectionRecord::Tagged {
                bbox: [x1, y1, x2, y2],
                label,
                class_id,
                confidence,
            } => {
                let label = match (label, class_id) {
                    (Some(label), _) => label,
                    (None, Some(id)) => vocab.name(id).to_string(),
                    (None, None) => return None,
                };
                Some(Detection::new(
                    BoundingBox::new(x1, y1, x2, y2),
                    label,
                    confidence,
                ))
            }
            DetectionRecord::Row([x1, y1, x2, y2, confidence, class_id]) => {
                let label = if class_id >= 0.0 && class_id.fract() == 0.0 {
                    vocab.name(class_id as u32)
                } else {
                    UNKNOWN_LABEL
                };
                Some(Detection::new(
                    BoundingBox::new(x1, y1, x2, y2),
                    label,
                    confidence as f32,
                ))
            }
        }
    }
}

/// Parse a detection log from any buffered reader
///
/// Frames without an explicit `frame` field are numbered by their position
/// among the non-empty lines.
pub fn parse_detection_log<R: BufRead>(
    reader: R,
    vocab: &LabelVocabulary,
) -> Result<Vec<FrameDetections>, DetectionLogError> {
    let mut frames = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line.map_err(|source| DetectionLogError::Read {
            line: line_no,
            source,
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let record: FrameRecord =
            serde_json::from_str(trimmed).map_err(|source| DetectionLogError::Parse {
                line: line_no,
                source,
            })?;

        let detections = record
            .detections
            .into_iter()
            .enumerate()
            .map(|(index, d)| {
                d.into_detection(vocab)
                    .ok_or(DetectionLogError::MissingLabel {
                        line: line_no,
                        index,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let index = record.frame.unwrap_or(frames.len() as u64);
        frames.push(FrameDetections { index, detections });
    }

    Ok(frames)
}

/// Read a detection log file
pub fn read_detection_log(
    path: &Path,
    vocab: &LabelVocabulary,
) -> Result<Vec<FrameDetections>, DetectionLogError> {
    let file = File::open(path).map_err(|source| DetectionLogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_detection_log(BufReader::new(file), vocab)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_all_record_forms() {
        let log = r#"{"frame": 4, "detections": [{"bbox": [10, 20, 60, 80], "label": "car", "confidence": 0.91}]}

{"detections": [{"bbox": [1.5, 2, 3, 4], "class_id": 7}]}
{"frame": 9, "detections": [[10, 20, 60, 80, 0.87, 2], [0, 0, 1, 1, 0.5, 999]]}
{"frame": 10}
"#;
        let frames = parse_detection_log(log.as_bytes(), &LabelVocabulary::coco()).unwrap();

        assert_eq!(frames.len(), 4);

        assert_eq!(frames[0].index, 4);
        assert_eq!(frames[0].detections.len(), 1);
        assert_eq!(
            frames[0].detections[0].bbox,
            BoundingBox::new(10.0, 20.0, 60.0, 80.0)
        );
        assert_eq!(frames[0].detections[0].label, "car");
        assert!((frames[0].detections[0].confidence - 0.91).abs() < 1e-6);

        assert_eq!(frames[1].index, 1);
        assert_eq!(frames[1].detections[0].label, "truck");
        assert_eq!(frames[1].detections[0].bbox.x1, 1.5);
        assert_eq!(frames[1].detections[0].confidence, 0.0);

        assert_eq!(frames[2].index, 9);
        assert_eq!(frames[2].detections[0].label, "car");
        assert_eq!(frames[2].detections[1].label, "unknown");

        assert!(frames[3].detections.is_empty());
    }

    #[test]
    fn test_label_wins_over_class_id() {
        let log = r#"{"detections": [{"bbox": [0, 0, 1, 1], "label": "van", "class_id": 2}]}"#;
        let frames = parse_detection_log(log.as_bytes(), &LabelVocabulary::coco()).unwrap();
        assert_eq!(frames[0].detections[0].label, "van");
    }

    #[test]
    fn test_missing_label() {
        let log = "{\"detections\": []}\n{\"detections\": [{\"bbox\": [0, 0, 1, 1]}]}\n";
        let err = parse_detection_log(log.as_bytes(), &LabelVocabulary::coco()).unwrap_err();
        assert!(matches!(
            err,
            DetectionLogError::MissingLabel { line: 2, index: 0 }
        ));
    }

    #[test]
    fn test_invalid_json_reports_line() {
        let log = "{\"detections\": []}\nnot json\n";
        let err = parse_detection_log(log.as_bytes(), &LabelVocabulary::coco()).unwrap_err();
        assert!(matches!(err, DetectionLogError::Parse { line: 2, .. }));
        assert!(err.to_string().starts_with("line 2:"));
    }

    #[test]
    fn test_read_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"frame": 0, "detections": [[2, 2, 4, 4, 0.9, 2]]}}"#
        )
        .unwrap();

        let frames = read_detection_log(file.path(), &LabelVocabulary::coco()).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].detections[0].bbox.center(), geo::coord! { x: 3.0, y: 3.0 });
    }

    #[test]
    fn test_missing_file() {
        let err =
            read_detection_log(Path::new("/nonexistent/frames.jsonl"), &LabelVocabulary::coco())
                .unwrap_err();
        assert!(matches!(err, DetectionLogError::Io { .. }));
    }
}
