//! Server-sent event stream of a single appliance.

use serde::Deserialize;

use super::appliance::StatusItem;
use super::appliance::StatusMap;

/// One `event:`/`data:`/`id:` block of a server-sent event stream
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawEvent {
    pub event: String,
    pub data: String,
    pub id: Option<String>,
}

/// Incremental parser for `text/event-stream` bodies.
///
/// Bytes may arrive split anywhere, including inside a line.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    current: RawEvent,
    data_lines: Vec<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every event completed by it
    pub fn push(&mut self, chunk: &[u8]) -> Vec<RawEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if let Some(event) = self.finish_event() {
                    events.push(event);
                }
                continue;
            }

            // Comment line
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };

            match field {
                "event" => self.current.event = value.to_string(),
                "data" => self.data_lines.push(value.to_string()),
                "id" => self.current.id = Some(value.to_string()),
                _ => {}
            }
        }
        events
    }

    fn finish_event(&mut self) -> Option<RawEvent> {
        if self.current.event.is_empty() && self.data_lines.is_empty() {
            return None;
        }
        let mut event = std::mem::take(&mut self.current);
        event.data = std::mem::take(&mut self.data_lines).join("\n");
        Some(event)
    }
}

#[derive(Debug, Deserialize)]
struct ItemsPayload {
    #[serde(default)]
    items: Vec<StatusItem>,
}

/// Decoded appliance event
#[derive(Debug, Clone, PartialEq)]
pub enum ApplianceEvent {
    /// Status values changed
    Status(Vec<StatusItem>),
    /// Discrete appliance event (e.g. program finished)
    Event(Vec<StatusItem>),
    /// Settings or program options changed
    Notify(Vec<StatusItem>),
    KeepAlive,
    Connected,
    Disconnected,
    Paired,
    Depaired,
}

impl ApplianceEvent {
    /// Decode a raw event. Unknown event types return `Ok(None)`.
    pub fn from_raw(raw: &RawEvent) -> Result<Option<Self>, serde_json::Error> {
        let items = || -> Result<Vec<StatusItem>, serde_json::Error> {
            if raw.data.trim().is_empty() {
                return Ok(Vec::new());
            }
            Ok(serde_json::from_str::<ItemsPayload>(&raw.data)?.items)
        };

        let event = match raw.event.as_str() {
            "STATUS" => ApplianceEvent::Status(items()?),
            "EVENT" => ApplianceEvent::Event(items()?),
            "NOTIFY" => ApplianceEvent::Notify(items()?),
            "KEEP-ALIVE" => ApplianceEvent::KeepAlive,
            "CONNECTED" => ApplianceEvent::Connected,
            "DISCONNECTED" => ApplianceEvent::Disconnected,
            "PAIRED" => ApplianceEvent::Paired,
            "DEPAIRED" => ApplianceEvent::Depaired,
            _ => return Ok(None),
        };
        Ok(Some(event))
    }

    /// Merge the event's items into the status map, returning whether anything was applied
    pub fn apply(self, status: &mut StatusMap) -> bool {
        match self {
            ApplianceEvent::Status(items)
            | ApplianceEvent::Event(items)
            | ApplianceEvent::Notify(items) => {
                if items.is_empty() {
                    return false;
                }
                status.merge(items);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::integrations::homeconnect::keys;

    #[test]
    fn test_parse_single_event() {
        let mut parser = SseParser::new();
        let events = parser.push(
            b"event: STATUS\ndata: {\"items\":[{\"key\":\"BSH.Common.Status.DoorState\",\"value\":\"BSH.Common.EnumType.DoorState.Open\"}],\"haId\":\"X\"}\nid: X\n\n",
        );

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "STATUS");
        assert_eq!(events[0].id.as_deref(), Some("X"));

        let decoded = ApplianceEvent::from_raw(&events[0]).unwrap().unwrap();
        let ApplianceEvent::Status(items) = decoded else {
            panic!("expected status event");
        };
        assert_eq!(items[0].key, keys::DOOR_STATE);
    }

    #[test]
    fn test_parse_split_chunks() {
        let mut parser = SseParser::new();
        assert!(parser.push(b"event: KEEP-").is_empty());
        assert!(parser.push(b"ALIVE\r\n").is_empty());
        let events = parser.push(b"\r\nevent: DISCONNECTED\ndata:\n\n");

        assert_eq!(events.len(), 2);
        assert_eq!(
            ApplianceEvent::from_raw(&events[0]).unwrap(),
            Some(ApplianceEvent::KeepAlive)
        );
        assert_eq!(
            ApplianceEvent::from_raw(&events[1]).unwrap(),
            Some(ApplianceEvent::Disconnected)
        );
    }

    #[test]
    fn test_comments_and_blank_lines_ignored() {
        let mut parser = SseParser::new();
        let events = parser.push(b": heartbeat\n\n\n");
        assert!(events.is_empty());
    }

    #[test]
    fn test_unknown_event_type() {
        let raw = RawEvent {
            event: "SOMETHING-NEW".to_string(),
            data: String::new(),
            id: None,
        };
        assert_eq!(ApplianceEvent::from_raw(&raw).unwrap(), None);
    }

    #[test]
    fn test_invalid_payload_is_error() {
        let raw = RawEvent {
            event: "NOTIFY".to_string(),
            data: "{not json".to_string(),
            id: None,
        };
        assert!(ApplianceEvent::from_raw(&raw).is_err());
    }

    #[test]
    fn test_apply_notify_updates_active_program() {
        let mut status = StatusMap::new();
        let event = ApplianceEvent::Notify(vec![StatusItem {
            key: keys::ACTIVE_PROGRAM.to_string(),
            value: Some(json!("Dishcare.Dishwasher.Program.Eco50")),
            unit: None,
        }]);

        assert!(event.apply(&mut status));
        assert_eq!(
            status.str_value(keys::ACTIVE_PROGRAM),
            Some("Dishcare.Dishwasher.Program.Eco50")
        );

        assert!(!ApplianceEvent::KeepAlive.apply(&mut status));
    }
}
