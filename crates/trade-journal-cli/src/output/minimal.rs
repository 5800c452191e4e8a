use serde_json::Value;

use super::cell;

/// Fields worth printing on their own, in priority order.
const PRIORITY_KEYS: [&str; 4] = ["path", "pnl", "count", "id"];

/// Print just the key answer: the saved path, the PnL, or a count.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(value));
}

fn minimal_line(value: &Value) -> String {
    // Unwrap the computation envelope
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Object(map) => {
            for key in PRIORITY_KEYS {
                if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
                    return cell(val);
                }
            }
            map.iter()
                .next()
                .map(|(key, val)| format!("{}: {}", key, cell(val)))
                .unwrap_or_default()
        }
        // One id per line for journal listings
        Value::Array(items) => items
            .iter()
            .map(|item| item.get("id").map(cell).unwrap_or_else(|| cell(item)))
            .collect::<Vec<_>>()
            .join("\n"),
        other => cell(other),
    }
}
