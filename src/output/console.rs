use super::{FrameRecord, ReportSink};
use crate::domain::ZoneMap;
use crate::occupancy::StatusLevel;
use anyhow::Result;
use std::io::Write;

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

/// Human-readable per-frame lines, optionally colored by status
pub struct ConsoleSink<'a, W: Write> {
    writer: W,
    zones: &'a ZoneMap,
    color: bool,
    show_zones: bool,
}

impl<'a, W: Write> ConsoleSink<'a, W> {
    pub fn new(writer: W, zones: &'a ZoneMap) -> Self {
        Self {
            writer,
            zones,
            color: false,
            show_zones: false,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Also list the names of occupied zones
    pub fn with_zone_names(mut self, show_zones: bool) -> Self {
        self.show_zones = show_zones;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn paint(&self, level: StatusLevel, text: String) -> String {
        if !self.color {
            return text;
        }
        let code = match level {
            StatusLevel::Low => RED,
            StatusLevel::Normal => GREEN,
        };
        format!("{}{}{}", code, text, RESET)
    }
}

impl<W: Write> ReportSink for ConsoleSink<'_, W> {
    fn write_frame(&mut self, record: &FrameRecord) -> Result<()> {
        let report = &record.report;
        let count = self.paint(report.status_level, report.available_count.to_string());

        write!(
            self.writer,
            "Frame {}: Available Parking Lots: {} / {} ({})",
            record.frame, count, report.total_zones, report.status_level
        )?;

        if record.skipped > 0 {
            write!(self.writer, " [{} skipped]", record.skipped)?;
        }

        if self.show_zones && !record.occupied_zones.is_empty() {
            let names: Vec<&str> = record
                .occupied_zones
                .iter()
                .filter_map(|&id| self.zones.get(id))
                .map(|z| z.name.as_str())
                .collect();
            write!(self.writer, " occupied: {}", names.join(", "))?;
        }

        writeln!(self.writer)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
