/// Escapes text for safe interpolation into HTML element content or quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// `<li>` items for a list of untrusted messages.
pub fn list_items<'a>(messages: impl IntoIterator<Item = &'a String>) -> String {
    messages
        .into_iter()
        .map(|message| format!("<li>{}</li>", escape_html(message)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_script_tag() {
        assert_eq!(
            escape_html("<script>alert(1)</script>"),
            "&lt;script&gt;alert(1)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_escape_all_special_characters() {
        assert_eq!(escape_html(r#"& < > " '"#), "&amp; &lt; &gt; &quot; &#039;");
    }

    #[test]
    fn test_ampersand_escaped_once() {
        assert_eq!(escape_html("&lt;"), "&amp;lt;");
    }

    #[test]
    fn test_preserves_normal_text() {
        assert_eq!(escape_html("Fila 2: cédula inválida"), "Fila 2: cédula inválida");
    }

    #[test]
    fn test_list_items() {
        let messages = vec!["a".to_string(), "<b>".to_string()];
        assert_eq!(list_items(&messages), "<li>a</li><li>&lt;b&gt;</li>");
    }
}
