//! MIME part headers and quoted-string escaping for `Content-Disposition`.

/// Escape a value for use inside a double-quoted header parameter.
///
/// Only `\` and `"` are escaped; every other character passes through.
pub fn escape_quotes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if matches!(ch, '\\' | '"') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Ordered header block of a single multipart part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartHeaders {
    entries: Vec<(String, String)>,
}

impl PartHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, replacing any existing one with the same name
    /// (case-insensitive). New headers are appended in insertion order.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Look up a header value by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Headers for a `form-data` part: `Content-Disposition` then `Content-Type`.
///
/// `filename` is escaped with [`escape_quotes`] before quoting.
pub fn form_data_headers(field: &str, filename: Option<&str>, content_type: &str) -> PartHeaders {
    let disposition = match filename {
        Some(name) => format!(
            "form-data; name=\"{}\"; filename=\"{}\"",
            escape_quotes(field),
            escape_quotes(name)
        ),
        None => format!("form-data; name=\"{}\"", escape_quotes(field)),
    };

    let mut headers = PartHeaders::new();
    headers.set("Content-Disposition", disposition);
    headers.set("Content-Type", content_type);
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_quotes() {
        assert_eq!(escape_quotes("cat.png"), "cat.png");
        assert_eq!(escape_quotes("a\"b.png"), "a\\\"b.png");
        assert_eq!(escape_quotes("dir\\file.txt"), "dir\\\\file.txt");
        assert_eq!(escape_quotes("\\\""), "\\\\\\\"");
    }

    #[test]
    fn test_escape_leaves_other_characters() {
        assert_eq!(escape_quotes("naïve; 'x' =y.png"), "naïve; 'x' =y.png");
    }

    #[test]
    fn test_set_replaces_case_insensitively() {
        let mut headers = PartHeaders::new();
        headers.set("Content-Type", "text/plain");
        headers.set("content-type", "image/png");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("CONTENT-TYPE"), Some("image/png"));
    }

    #[test]
    fn test_form_data_headers_order() {
        let headers = form_data_headers("file0", Some("a\"b.png"), "image/png");
        let collected: Vec<_> = headers.iter().collect();
        assert_eq!(
            collected,
            vec![
                (
                    "Content-Disposition",
                    "form-data; name=\"file0\"; filename=\"a\\\"b.png\""
                ),
                ("Content-Type", "image/png"),
            ]
        );
    }

    #[test]
    fn test_form_data_headers_without_filename() {
        let headers = form_data_headers("payload_json", None, "application/json");
        assert_eq!(
            headers.get("Content-Disposition"),
            Some("form-data; name=\"payload_json\"")
        );
    }
}
