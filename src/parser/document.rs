use std::path::{Path, PathBuf};

use serde_yaml::Value;

use crate::error::LinkError;

const DELIMITER: &str = "---";

#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    /// Metadata block including both `---` lines, exactly as read.
    pub header: Option<String>,
    pub body: String,
}

impl Document {
    pub fn parse(path: &Path, raw: String) -> Result<Self, LinkError> {
        let (header, body) = split(&raw);
        if let Some(h) = header {
            validate_header(h).map_err(|reason| LinkError::malformed(path, reason))?;
        }
        Ok(Document {
            path: path.to_path_buf(),
            header: header.map(str::to_string),
            body: body.to_string(),
        })
    }

    pub fn to_raw(&self) -> String {
        join(self.header.as_deref(), &self.body)
    }
}

/// Split off a leading `---` … `---` metadata block. Lossless:
/// `join(split(raw)) == raw`.
pub fn split(raw: &str) -> (Option<&str>, &str) {
    let mut lines = raw.split_inclusive('\n');
    match lines.next() {
        Some(first) if is_delimiter(first) => {}
        _ => return (None, raw),
    }

    let mut offset = 0;
    for line in raw.split_inclusive('\n') {
        if offset > 0 && is_delimiter(line) {
            let end = offset + DELIMITER.len();
            return (Some(&raw[..end]), &raw[end..]);
        }
        offset += line.len();
    }
    (None, raw)
}

pub fn join(header: Option<&str>, body: &str) -> String {
    let mut out = String::with_capacity(header.map_or(0, str::len) + body.len());
    out.push_str(header.unwrap_or_default());
    out.push_str(body);
    out
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end_matches('\n').trim_end_matches('\r') == DELIMITER
}

/// The block between the delimiters must be empty or a YAML mapping.
fn validate_header(header: &str) -> Result<(), String> {
    let inner = header
        .strip_prefix(DELIMITER)
        .and_then(|h| h.strip_suffix(DELIMITER))
        .unwrap_or(header);
    match serde_yaml::from_str::<Value>(inner) {
        Ok(Value::Mapping(_) | Value::Null) => Ok(()),
        Ok(other) => Err(format!("metadata block is not a key/value mapping: {:?}", other)),
        Err(e) => Err(format!("corrupt metadata block: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_header() {
        let raw = "---\ntitle: 占病\ndate: 2024-05-01\n---\n## 斷語\n用神旬空\n";
        let (h, b) = split(raw);
        assert_eq!(h, Some("---\ntitle: 占病\ndate: 2024-05-01\n---"));
        assert_eq!(b, "\n## 斷語\n用神旬空\n");
        assert_eq!(join(h, b), raw);
    }

    #[test]
    fn no_header_when_not_at_start() {
        let raw = "intro\n---\nkey: v\n---\nbody";
        assert_eq!(split(raw), (None, raw));
    }

    #[test]
    fn single_delimiter_is_all_body() {
        let raw = "---\nkey: v\nno closing line";
        assert_eq!(split(raw), (None, raw));
        assert_eq!(split(""), (None, ""));
    }

    #[test]
    fn crlf_header() {
        let raw = "---\r\nkey: v\r\n---\r\nbody";
        let (h, b) = split(raw);
        assert_eq!(h, Some("---\r\nkey: v\r\n---"));
        assert_eq!(join(h, b), raw);
    }

    #[test]
    fn empty_header_is_valid() {
        let doc = Document::parse(Path::new("a.md"), "---\n---\nbody".into()).unwrap();
        assert_eq!(doc.header.as_deref(), Some("---\n---"));
        assert_eq!(doc.to_raw(), "---\n---\nbody");
    }

    #[test]
    fn corrupt_header_is_malformed() {
        let err = Document::parse(Path::new("bad.md"), "---\nkey: [unclosed\n---\nbody".into()).unwrap_err();
        assert!(matches!(err, LinkError::MalformedDocument { .. }));

        let err = Document::parse(Path::new("list.md"), "---\n- a\n- b\n---\nbody".into()).unwrap_err();
        assert!(err.to_string().contains("list.md"));
    }

    #[test]
    fn fixture_round_trips() {
        let raw = std::fs::read_to_string("tests/fixtures/case_basic.md").unwrap();
        let doc = Document::parse(Path::new("case_basic.md"), raw.clone()).unwrap();
        assert!(doc.header.is_some());
        assert_eq!(doc.to_raw(), raw);
    }
}
