use serde_json::Value;
use std::io::{self, Write};

use super::cell;

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    if let Err(e) = write_csv(stdout.lock(), value) {
        eprintln!("CSV output error: {}", e);
    }
}

/// Arrays of objects become one row per object with the first object's keys as
/// header; objects become `field,value` pairs.
fn write_csv<W: Write>(out: W, value: &Value) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(out);

    match value {
        Value::Array(arr) => match arr.first() {
            Some(Value::Object(first)) => {
                let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
                wtr.write_record(&headers)?;
                for item in arr.iter().filter_map(Value::as_object) {
                    let row: Vec<String> = headers
                        .iter()
                        .map(|h| item.get(*h).map(cell).unwrap_or_default())
                        .collect();
                    wtr.write_record(&row)?;
                }
            }
            _ => {
                for item in arr {
                    wtr.write_record([cell(item)])?;
                }
            }
        },
        Value::Object(map) => {
            let fields = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => map,
            };
            wtr.write_record(["field", "value"])?;
            for (key, val) in fields {
                wtr.write_record([key.as_str(), &cell(val)])?;
            }
        }
        _ => wtr.write_record([cell(value)])?,
    }

    wtr.flush()?;
    Ok(())
}
