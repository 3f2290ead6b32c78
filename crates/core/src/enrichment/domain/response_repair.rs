//! Recovers a JSON object from free-form model output.

use serde_json::Value;

/// Strips markdown code fences and parses the text between the first `{`
/// and the last `}`. Returns `None` when no object can be recovered.
pub fn repair(raw: &str) -> Option<Value> {
    let unfenced = strip_fences(raw);
    let start = unfenced.find('{')?;
    let end = unfenced.rfind('}')?;
    if end < start {
        return None;
    }
    let value: Value = serde_json::from_str(&unfenced[start..=end]).ok()?;
    value.is_object().then_some(value)
}

fn strip_fences(raw: &str) -> String {
    raw.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}
