use super::{FrameRecord, ReportSink};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes one JSON object per frame
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
}

impl JsonLinesSink<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create report file: {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Number of frames written so far
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for JsonLinesSink<W> {
    fn write_frame(&mut self, record: &FrameRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record).context("Failed to encode frame record")?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::occupancy::{FrameReport, StatusLevel};
    use std::fs;
    use tempfile::tempdir;

    fn record(frame: u64, occupied: Vec<usize>) -> FrameRecord {
        let occupied_count = occupied.len();
        FrameRecord {
            frame,
            report: FrameReport {
                total_zones: 12,
                occupied_count,
                available_count: 12 - occupied_count,
                status_level: StatusLevel::Normal,
            },
            occupied_zones: occupied,
            skipped: 0,
        }
    }

    #[test]
    fn test_record_layout() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.write_frame(&record(3, vec![0, 4])).unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            out,
            "{\"frame\":3,\"total_zones\":12,\"occupied_count\":2,\"available_count\":10,\
             \"status_level\":\"normal\",\"occupied_zones\":[0,4],\"skipped\":0}\n"
        );
    }

    #[test]
    fn test_write_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reports.jsonl");

        let mut sink = JsonLinesSink::create(&path).unwrap();
        sink.write_frame(&record(0, vec![])).unwrap();
        sink.write_frame(&record(1, vec![2])).unwrap();
        sink.finish().unwrap();
        assert_eq!(sink.written(), 2);

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["frame"], 1);
        assert_eq!(second["available_count"], 11);
    }
}
