//! Sanitization of server-supplied profile strings

/// Placeholder for values that sanitize to nothing
pub const INVALID_PLACEHOLDER: &str = "<Invalid Characters>";

/// Elements whose content is dropped along with the tags
const DROPPED_ELEMENTS: [&str; 4] = ["script", "style", "iframe", "noscript"];

/// Strip markup from a profile field.
///
/// Tags are removed, and the content of script-like elements is removed with
/// them. Text content survives. A value that ends up empty becomes
/// [`INVALID_PLACEHOLDER`].
pub fn sanitize(value: &str) -> String {
    let mut text = value.to_string();
    for element in DROPPED_ELEMENTS {
        text = drop_element(&text, element);
    }

    let mut result = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }

    let trimmed = result.trim();
    if trimmed.is_empty() {
        INVALID_PLACEHOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Remove `<element ...>...</element>` blocks, case-insensitively.
/// An unclosed block swallows the rest of the input.
fn drop_element(input: &str, element: &str) -> String {
    let lower = input.to_ascii_lowercase();
    let open = format!("<{}", element);
    let close = format!("</{}>", element);

    let mut out = String::with_capacity(input.len());
    let mut pos = 0;
    while let Some(start) = lower[pos..].find(&open).map(|i| i + pos) {
        out.push_str(&input[pos..start]);
        match lower[start..].find(&close) {
            Some(end) => pos = start + end + close.len(),
            None => return out,
        }
    }
    out.push_str(&input[pos..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_passes_through() {
        assert_eq!(sanitize("neo@matrix.io"), "neo@matrix.io");
        assert_eq!(sanitize("  trinity "), "trinity");
    }

    #[test]
    fn test_tags_are_stripped() {
        assert_eq!(sanitize("<b>morpheus</b>"), "morpheus");
        assert_eq!(sanitize("<img src=x onerror=alert(1)>tank"), "tank");
    }

    #[test]
    fn test_script_content_is_dropped() {
        assert_eq!(sanitize("smith<script>alert('x')</script>"), "smith");
        assert_eq!(sanitize("a<SCRIPT>evil()</SCRIPT>b"), "ab");
    }

    #[test]
    fn test_empty_result_uses_placeholder() {
        assert_eq!(sanitize(""), INVALID_PLACEHOLDER);
        assert_eq!(sanitize("<script>alert(1)</script>"), INVALID_PLACEHOLDER);
        assert_eq!(sanitize("<script>unterminated"), INVALID_PLACEHOLDER);
    }
}
