//! Locating a JSON object inside free-form model output.
//!
//! Models wrap their answer in prose or markdown fences. The scanner walks
//! the text once, tracking brace depth outside of string literals, and
//! yields each balanced top-level `{...}` span in order.

use serde_json::Value;

/// Balanced top-level object spans, in order of appearance.
pub fn object_spans(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if depth == 0 {
            if c == '{' {
                depth = 1;
                start = i;
                in_string = false;
                escaped = false;
            }
            continue;
        }

        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    spans.push(&text[start..=i]);
                }
            }
            _ => {}
        }
    }

    spans
}

/// First balanced span that parses as a JSON object.
pub fn parse_first_object(text: &str) -> Result<Value, String> {
    let spans = object_spans(text);
    if spans.is_empty() {
        return Err("no JSON object found in response".to_string());
    }

    let mut last_error = String::new();
    for span in spans {
        match serde_json::from_str::<Value>(span) {
            Ok(value @ Value::Object(_)) => return Ok(value),
            Ok(_) => last_error = "span is not an object".to_string(),
            Err(e) => last_error = e.to_string(),
        }
    }
    Err(format!("no parseable JSON object in response: {}", last_error))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_inside_markdown_fence() {
        let text = "Aquí está el resultado:\n```json\n{\"lote\": \"7\", \"manzana\": null}\n```\nSaludos.";
        let value = parse_first_object(text).unwrap();
        assert_eq!(value["lote"], "7");
    }

    #[test]
    fn test_braces_inside_strings_are_ignored() {
        let text = r#"{"norte": "10 m con {lote} 3 \"}\"", "sur": "5 m"} trailing }"#;
        let spans = object_spans(text);
        assert_eq!(spans.len(), 1);

        let value = parse_first_object(text).unwrap();
        assert_eq!(value["sur"], "5 m");
    }

    #[test]
    fn test_nested_object_is_one_span() {
        let text = r#"{"titulares": {"vendedor_nombre": "ANA"}} {"otro": 1}"#;
        let spans = object_spans(text);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0], r#"{"titulares": {"vendedor_nombre": "ANA"}}"#);
    }

    #[test]
    fn test_skips_prose_braces_before_json() {
        let text = r#"Formato {DD/MM/AAAA} respetado: {"fecha_escritura": "15/03/2023"}"#;
        let value = parse_first_object(text).unwrap();
        assert_eq!(value["fecha_escritura"], "15/03/2023");
    }

    #[test]
    fn test_unbalanced_or_missing() {
        assert!(parse_first_object("no hay datos").is_err());
        assert!(parse_first_object("{\"lote\": \"7\"").is_err());
    }

    #[test]
    fn test_multibyte_text_around_object() {
        let text = "Señor: {\"colonia\": \"Peñitas\"} ¡listo!";
        assert_eq!(parse_first_object(text).unwrap()["colonia"], "Peñitas");
    }
}
