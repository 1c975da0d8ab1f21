use anyhow::{anyhow, Result};
use serde_json::Value;

/// Truncate a string to at most `max_bytes` bytes at a character boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &s[..end]
}

/// Strip markdown code fences some models wrap around JSON replies.
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Parse a model reply as a JSON object.
pub fn parse_json_object(response: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(strip_code_blocks(response))
        .map_err(|e| anyhow!("Failed to parse model reply as JSON: {}", e))?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(anyhow!("Model reply is JSON but not an object"))
    }
}
