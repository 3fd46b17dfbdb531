//! Output formatting for the `pollfeed` CLI.

use chrono::Local;
use pollfeed_core::Message;
use serde::Serialize;
use serde_json::{json, Value};

/// Output control settings from CLI flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputControls {
    pub json: bool,
    pub compact: bool,
}

impl OutputControls {
    /// Render a serializable value. Only meaningful in JSON mode.
    pub fn emit<T: Serialize>(&self, data: &T) -> String {
        let value = serde_json::to_value(data).unwrap_or(Value::Null);
        if self.compact {
            serde_json::to_string(&value).unwrap_or_else(|_| "{}".to_string())
        } else {
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
        }
    }

    pub fn print<T: Serialize>(&self, data: &T) {
        println!("{}", self.emit(data));
    }

    /// Print messages one per line, or as a JSON array.
    pub fn print_messages(&self, messages: &[Message]) {
        if self.json {
            self.print(&messages);
            return;
        }
        for msg in messages {
            println!("{}", format_message(msg));
        }
    }

    /// Print a single message as it arrives in a live feed. JSON mode
    /// always uses one line per message.
    pub fn print_live(&self, msg: &Message) {
        if self.json {
            println!("{}", serde_json::to_string(msg).unwrap_or_else(|_| "{}".to_string()));
        } else {
            println!("{}", format_message(msg));
        }
    }
}

/// Messages in `added` newer than `last_printed`, advancing the mark. A
/// resync returns the whole window, so anything already shown is skipped.
pub fn take_unprinted<'a>(added: &'a [Message], last_printed: &mut u64) -> Vec<&'a Message> {
    let floor = *last_printed;
    let fresh: Vec<&Message> = added.iter().filter(|m| m.id > floor).collect();
    if let Some(newest) = fresh.iter().map(|m| m.id).max() {
        *last_printed = newest;
    }
    fresh
}

/// `[HH:MM:SS] #id author: body` in local time.
pub fn format_message(msg: &Message) -> String {
    format!(
        "[{}] #{} {}: {}",
        msg.created_at.with_timezone(&Local).format("%H:%M:%S"),
        msg.id,
        msg.author,
        msg.body
    )
}

/// Format error as JSON, using the wire envelope shape.
pub fn format_error(error: &str) -> String {
    serde_json::to_string(&json!({
        "ok": false,
        "error": error,
    }))
    .unwrap_or_else(|_| format!(r#"{{"ok":false,"error":"{}"}}"#, error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample() -> Message {
        Message {
            id: 3,
            author: "Alice".to_string(),
            body: "hello there".to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_format_message_has_author_and_body() {
        let line = format_message(&sample());
        assert!(line.starts_with('['));
        assert!(line.ends_with("#3 Alice: hello there"));
    }

    #[test]
    fn test_emit_compact() {
        let controls = OutputControls { json: true, compact: true };
        let out = controls.emit(&sample());
        assert!(!out.contains('\n'));
        assert!(out.contains(r#""createdAt":"2025-06-01T12:00:00Z""#));
    }

    #[test]
    fn test_take_unprinted_skips_shown_messages() {
        let at = |id: u64| Message { id, ..sample() };
        let mut last = 0;

        let first = [at(1), at(2), at(3)];
        assert_eq!(take_unprinted(&first, &mut last).len(), 3);
        assert_eq!(last, 3);

        let resync = [at(2), at(3), at(4)];
        let fresh = take_unprinted(&resync, &mut last);
        assert_eq!(fresh.iter().map(|m| m.id).collect::<Vec<_>>(), vec![4]);
        assert_eq!(last, 4);

        assert!(take_unprinted(&[], &mut last).is_empty());
        assert_eq!(last, 4);
    }

    #[test]
    fn test_format_error_envelope() {
        let value: Value = serde_json::from_str(&format_error("Invalid action or method.")).unwrap();
        assert_eq!(value["ok"], false);
        assert_eq!(value["error"], "Invalid action or method.");
    }
}
