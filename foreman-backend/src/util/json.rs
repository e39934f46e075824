use serde_json::Value;

/// Extract the first balanced top-level JSON object embedded in free text.
///
/// Agent replies often wrap JSON in prose or code fences. This scans for
/// the first '{', tracks brace depth while respecting string literals and
/// escapes, and parses the balanced slice. Returns None when no parseable
/// object exists.
pub fn extract_json(text: &str) -> Option<Value> {
    let bytes = text.as_bytes();
    let start = text.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    let candidate = &text[start..start + offset + 1];
                    return serde_json::from_str(candidate).ok();
                }
            }
            _ => {}
        }
    }

    None
}
