use std::io::BufRead;

use crate::ingest::domain::tracking_event::TrackingEvent;

/// Reads one tracking payload per line. Blank lines are ignored; lines that
/// fail to parse are logged and skipped.
pub struct JsonLinesEventSource<R: BufRead> {
    reader: R,
    line_no: usize,
    skipped: usize,
}

impl<R: BufRead> JsonLinesEventSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            skipped: 0,
        }
    }

    /// Lines rejected so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<R: BufRead> Iterator for JsonLinesEventSource<R> {
    type Item = TrackingEvent;

    fn next(&mut self) -> Option<TrackingEvent> {
        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    log::error!("Event stream read failed after line {}: {e}", self.line_no);
                    return None;
                }
            }
            self.line_no += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<TrackingEvent>(trimmed) {
                Ok(event) => return Some(event),
                Err(e) => {
                    self.skipped += 1;
                    log::warn!("Skipping malformed event on line {}: {e}", self.line_no);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const EVENT: &str = r#"{"camera_id":"c","frame_num":1,"object_id":4,"bbox_left":0,"bbox_top":0,"bbox_width":10,"bbox_height":20}"#;

    #[test]
    fn test_reads_events_and_skips_bad_lines() {
        let input = format!("{EVENT}\n\nnot json\n{{\"camera_id\":1}}\n{EVENT}\n");
        let mut source = JsonLinesEventSource::new(Cursor::new(input));
        let events: Vec<TrackingEvent> = source.by_ref().collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].track_id, 4);
        assert_eq!(source.skipped(), 2);
    }

    #[test]
    fn test_last_line_without_newline() {
        let source = JsonLinesEventSource::new(Cursor::new(EVENT.to_string()));
        assert_eq!(source.count(), 1);
    }
}
