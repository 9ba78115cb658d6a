//! Incremental decoder for `text/event-stream` bodies

/// One dispatched server-sent event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// `message` unless the server named the event
    pub event: String,
    pub data: String,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk of the body and returns the events it completed.
    /// Chunks may split lines, and even UTF-8 sequences, anywhere.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(end) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=end).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);

            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }
        events
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            // Comment, e.g. keep-alive
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            // `id` and `retry` are not used by the dashboard
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }

        Some(SseEvent {
            event: event.unwrap_or_else(|| "message".to_string()),
            data: std::mem::take(&mut self.data).join("\n"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_named_events() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(
            b"event: change\ndata: {\"kind\":\"INSERT\"}\n\n:keep-alive\n\ndata: plain\n\n",
        );

        assert_eq!(
            events,
            vec![
                SseEvent {
                    event: "change".to_string(),
                    data: "{\"kind\":\"INSERT\"}".to_string(),
                },
                SseEvent {
                    event: "message".to_string(),
                    data: "plain".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_handles_split_chunks_and_crlf() {
        let mut decoder = SseDecoder::new();
        let body = "event: resync\r\ndata: 3\r\n\r\nevent: change\r\ndata: ünïcode\r\n\r\n";
        let bytes = body.as_bytes();

        let mut events = Vec::new();
        for chunk in bytes.chunks(3) {
            events.extend(decoder.push(chunk));
        }

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, "resync");
        assert_eq!(events[0].data, "3");
        assert_eq!(events[1].data, "ünïcode");
    }

    #[test]
    fn test_multi_line_data_and_missing_space() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"data:first\ndata: second\nid: 7\n\n");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "first\nsecond");
    }

    #[test]
    fn test_incomplete_event_is_held_back() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: change\ndata: x\n").is_empty());
        assert_eq!(decoder.push(b"\n").len(), 1);
    }
}
