use serde_json::Value;

/// Parse a stringified sequence or mapping as written by the upstream decoder.
///
/// Accepts JSON as well as Python literal syntax (single-quoted strings,
/// `None`, `True`, `False`). Returns `None` for anything unparsable.
pub fn parse_literal(input: &str) -> Option<Value> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    serde_json::from_str(&python_to_json(trimmed)?).ok()
}

/// Rewrite Python literal syntax into JSON text.
fn python_to_json(input: &str) -> Option<String> {
    let mut out = String::with_capacity(input.len() + 8);
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                out.push('"');
                loop {
                    let inner = chars.next()?;
                    match inner {
                        '\\' => {
                            let escaped = chars.next()?;
                            match escaped {
                                '\'' => out.push('\''),
                                other => {
                                    out.push('\\');
                                    out.push(other);
                                }
                            }
                        }
                        '"' if c == '\'' => out.push_str("\\\""),
                        q if q == c => break,
                        other => out.push(other),
                    }
                }
                out.push('"');
            }
            c if c.is_ascii_alphabetic() => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        word.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match word.as_str() {
                    "None" | "nan" | "NaN" => out.push_str("null"),
                    "True" => out.push_str("true"),
                    "False" => out.push_str("false"),
                    _ => return None,
                }
            }
            '(' => out.push('['),
            ')' => out.push(']'),
            other => out.push(other),
        }
    }

    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_json() {
        assert_eq!(parse_literal("[1, 2]"), Some(json!([1, 2])));
    }

    #[test]
    fn test_parse_python_literal() {
        let parsed = parse_literal("[{'repr': '-RA', 'value': 'Light Rain', 'extra': None}]");
        assert_eq!(
            parsed,
            Some(json!([{"repr": "-RA", "value": "Light Rain", "extra": null}]))
        );
    }

    #[test]
    fn test_embedded_quotes() {
        assert_eq!(parse_literal(r#"['say "hi"']"#), Some(json!([r#"say "hi""#])));
        assert_eq!(parse_literal(r"['it\'s']"), Some(json!(["it's"])));
    }

    #[test]
    fn test_unparsable() {
        assert_eq!(parse_literal(""), None);
        assert_eq!(parse_literal("[{'value': 'Rain'"), None);
        assert_eq!(parse_literal("not a list"), None);
    }
}
