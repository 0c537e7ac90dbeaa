use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::Result;

/// Print `data` in the requested format
///
/// `Jsonl` prints arrays one element per line and anything else as a single
/// compact line.
pub fn print_output<T: Serialize>(data: T, format: OutputFormat) -> Result<()> {
    let json_value = serde_json::to_value(data)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json_value)?);
        }
        OutputFormat::Jsonl => match &json_value {
            Value::Array(items) => {
                for item in items {
                    print_line(item)?;
                }
            }
            other => print_line(other)?,
        },
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(&json_value)?);
        }
    }

    Ok(())
}

/// Print one value as a compact JSON line
pub fn print_line(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
