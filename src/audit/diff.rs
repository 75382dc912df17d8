//! Field diffs for audit entries

use serde_json::Value;

/// Summarize top-level field changes between two serialized entities
///
/// Returns `None` when nothing changed. Nested values are summarized rather
/// than walked, so a changed cleared set shows as an item count.
pub fn generate_diff(before: &Value, after: &Value) -> Option<String> {
    let changes: Vec<String> = match (before, after) {
        (Value::Object(before_obj), Value::Object(after_obj)) => {
            let changed_or_removed = before_obj.iter().filter_map(|(key, old)| {
                match after_obj.get(key) {
                    Some(new) if new == old => None,
                    Some(new) => Some(format!("{}: {} -> {}", key, format_value(old), format_value(new))),
                    None => Some(format!("{}: {} -> (removed)", key, format_value(old))),
                }
            });
            let added = after_obj
                .iter()
                .filter(|(key, _)| !before_obj.contains_key(*key))
                .map(|(key, new)| format!("{}: (added) -> {}", key, format_value(new)));

            changed_or_removed.chain(added).collect()
        }
        _ if before != after => vec![format!("{} -> {}", format_value(before), format_value(after))],
        _ => Vec::new(),
    };

    if changes.is_empty() {
        None
    } else {
        Some(changes.join(", "))
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if s.chars().count() > 50 => {
            let head: String = s.chars().take(47).collect();
            format!("\"{}...\"", head)
        }
        Value::String(s) => format!("\"{}\"", s),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cleared_flag_change() {
        let before = json!({"amount": -2000, "cleared": false, "reconciled": false});
        let after = json!({"amount": -2000, "cleared": true, "reconciled": false});

        assert_eq!(
            generate_diff(&before, &after).as_deref(),
            Some("cleared: false -> true")
        );
    }

    #[test]
    fn test_added_and_changed_fields() {
        let before = json!({"status": "in_progress", "cleared": ["a"]});
        let after = json!({
            "status": "completed",
            "cleared": ["a", "b"],
            "difference": 500
        });

        let diff = generate_diff(&before, &after).unwrap();
        assert!(diff.contains("status: \"in_progress\" -> \"completed\""));
        assert!(diff.contains("cleared: [1 items] -> [2 items]"));
        assert!(diff.contains("difference: (added) -> 500"));
    }

    #[test]
    fn test_removed_field() {
        let before = json!({"memo": "rent"});
        let after = json!({});
        assert_eq!(
            generate_diff(&before, &after).as_deref(),
            Some("memo: \"rent\" -> (removed)")
        );
    }

    #[test]
    fn test_no_changes() {
        let value = json!({"name": "Checking", "archived": false});
        assert!(generate_diff(&value, &value).is_none());
    }

    #[test]
    fn test_scalar_values() {
        assert_eq!(generate_diff(&json!(1), &json!(2)).as_deref(), Some("1 -> 2"));
        assert!(generate_diff(&json!(null), &json!(null)).is_none());
    }

    #[test]
    fn test_long_string_truncation() {
        let before = json!({"memo": "é".repeat(80)});
        let after = json!({"memo": "short"});

        let diff = generate_diff(&before, &after).unwrap();
        assert!(diff.contains("...\" -> \"short\""));
    }
}
