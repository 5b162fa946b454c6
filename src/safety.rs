// src/safety.rs
//
// Closure gate: the "close patient" action is only allowed when no tracked
// item is confirmed inside the incision zone.

use crate::tracking::TrackingSnapshot;
use crate::zones::Zone;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetainedItem {
    pub id: u64,
    pub item_type: String,
    pub last_seen_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "lowercase")]
pub enum ClosureVerdict {
    Clear,
    #[serde(rename_all = "camelCase")]
    Blocked {
        incision_count: usize,
        items: Vec<RetainedItem>,
    },
}

impl ClosureVerdict {
    pub fn evaluate(snapshot: &TrackingSnapshot) -> Self {
        let items: Vec<RetainedItem> = snapshot
            .tracked_items
            .iter()
            .filter(|t| t.stable_zone() == Some(Zone::Incision))
            .map(|t| RetainedItem {
                id: t.id,
                item_type: t.item_type.clone(),
                last_seen_ms: t.last_seen_ms,
            })
            .collect();

        if items.is_empty() {
            Self::Clear
        } else {
            Self::Blocked {
                incision_count: snapshot.counts.incision,
                items,
            }
        }
    }

    pub fn is_clear(&self) -> bool {
        matches!(self, Self::Clear)
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Clear => "clear to close".to_string(),
            Self::Blocked {
                incision_count,
                items,
            } => {
                let names: Vec<String> = items
                    .iter()
                    .map(|i| format!("{}#{}", i.item_type, i.id))
                    .collect();
                format!(
                    "WARNING: {} item(s) in patient: {}",
                    incision_count,
                    names.join(", ")
                )
            }
        }
    }
}
