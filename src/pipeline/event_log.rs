// src/pipeline/event_log.rs
//
// Append-only audit log of confirmed zone crossings. Entries are never
// mutated or removed; readers get copies, newest first.

use crate::zones::{zone_label, Zone};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneEventKind {
    Entry,
    Exit,
}

impl ZoneEventKind {
    /// Entering the incision is an entry; every other crossing is an exit.
    pub fn for_destination(to: Option<Zone>) -> Self {
        if to == Some(Zone::Incision) {
            Self::Entry
        } else {
            Self::Exit
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Exit => "exit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneEvent {
    pub id: u64,
    pub timestamp: f64,
    #[serde(rename = "type")]
    pub kind: ZoneEventKind,
    pub item_type: String,
    pub item_id: u64,
    pub from: Option<Zone>,
    pub to: Option<Zone>,
}

#[derive(Debug)]
pub struct EventLog {
    events: Vec<ZoneEvent>,
    next_id: u64,
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Empty log whose ids continue after `previous`.
    pub fn continuing_from(previous: &EventLog) -> Self {
        Self {
            events: Vec::new(),
            next_id: previous.next_id,
        }
    }

    pub fn record(
        &mut self,
        timestamp: f64,
        item_type: &str,
        item_id: u64,
        from: Option<Zone>,
        to: Option<Zone>,
    ) -> ZoneEvent {
        let event = ZoneEvent {
            id: self.next_id,
            timestamp,
            kind: ZoneEventKind::for_destination(to),
            item_type: item_type.to_string(),
            item_id,
            from,
            to,
        };
        self.next_id += 1;

        info!(
            "📋 Event #{} {}: {} T{} {} → {}",
            event.id,
            event.kind.as_str(),
            event.item_type,
            item_id,
            zone_label(from),
            zone_label(to)
        );

        self.events.push(event.clone());
        event
    }

    pub fn newest_first(&self) -> Vec<ZoneEvent> {
        self.events.iter().rev().cloned().collect()
    }

    pub fn latest(&self) -> Option<&ZoneEvent> {
        self.events.last()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_destination() {
        assert_eq!(
            ZoneEventKind::for_destination(Some(Zone::Incision)),
            ZoneEventKind::Entry
        );
        assert_eq!(
            ZoneEventKind::for_destination(Some(Zone::Tray)),
            ZoneEventKind::Exit
        );
        assert_eq!(ZoneEventKind::for_destination(None), ZoneEventKind::Exit);
    }

    #[test]
    fn test_default_log_ids_start_at_one() {
        let mut log = EventLog::default();
        let first = log.record(0.0, "clamp", 1, Some(Zone::Tray), Some(Zone::Incision));
        assert_eq!(first.id, 1);

        let mut next = EventLog::continuing_from(&log);
        assert!(next.is_empty());
        let second = next.record(10.0, "clamp", 1, Some(Zone::Incision), Some(Zone::Tray));
        assert_eq!(second.id, 2);
    }

    #[test]
    fn test_log_is_newest_first_with_increasing_ids() {
        let mut log = EventLog::new();
        log.record(100.0, "sponge", 4, Some(Zone::Tray), Some(Zone::Incision));
        log.record(200.0, "sponge", 4, Some(Zone::Incision), Some(Zone::Tray));

        let events = log.newest_first();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, 2);
        assert_eq!(events[0].kind, ZoneEventKind::Exit);
        assert_eq!(events[1].id, 1);
        assert_eq!(events[1].kind, ZoneEventKind::Entry);
        assert_eq!(log.latest().map(|e| e.timestamp), Some(200.0));
    }

    #[test]
    fn test_default_log_still_starts_at_one() {
        let mut log = EventLog::default();
        let event = log.record(0.0, "clamp", 1, None, Some(Zone::Tray));
        assert_eq!(event.id, 1);
    }

    #[test]
    fn test_event_serializes_like_the_ui_expects() {
        let mut log = EventLog::new();
        let event = log.record(5.0, "clamp", 9, Some(Zone::Tray), Some(Zone::Incision));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "entry");
        assert_eq!(value["itemType"], "clamp");
        assert_eq!(value["from"], "tray");
        assert_eq!(value["to"], "incision");
    }
}
