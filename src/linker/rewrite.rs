use std::ops::Range;

use super::annotate::Annotation;
use crate::parser::Document;

/// New content for one section of a document body.
#[derive(Debug, Clone)]
pub struct SectionChange {
    pub title: String,
    /// Byte range of the original section in the body.
    pub range: Range<usize>,
    pub annotation: Annotation,
}

#[derive(Debug, Clone)]
pub struct Rewrite {
    pub document: Document,
    pub changed: bool,
}

/// Splice section changes into the body in place. The header and every byte
/// outside the changed ranges are kept verbatim. Nothing is written.
pub fn rewrite(original: &Document, changes: &[SectionChange]) -> Rewrite {
    let mut ordered: Vec<&SectionChange> = changes.iter().collect();
    // back to front keeps earlier ranges valid
    ordered.sort_by(|a, b| b.range.start.cmp(&a.range.start));

    let mut body = original.body.clone();
    for change in ordered {
        body.replace_range(change.range.clone(), &change.annotation.text);
    }

    let changed = body != original.body;
    Rewrite {
        document: Document {
            path: original.path.clone(),
            header: original.header.clone(),
            body,
        },
        changed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn change(title: &str, range: Range<usize>, text: &str) -> SectionChange {
        SectionChange {
            title: title.into(),
            range,
            annotation: Annotation {
                text: text.into(),
                linked: vec![],
            },
        }
    }

    #[test]
    fn splices_in_place() {
        let doc = Document::parse(Path::new("a.md"), "---\nk: v\n---\nAA|BB|CC".into()).unwrap();
        // body is "\nAA|BB|CC"
        let out = rewrite(
            &doc,
            &[change("first", 1..3, "[[AA]]"), change("last", 7..9, "[[CC]]")],
        );
        assert!(out.changed);
        assert_eq!(out.document.body, "\n[[AA]]|BB|[[CC]]");
        assert_eq!(out.document.to_raw(), "---\nk: v\n---\n[[AA]]|BB|[[CC]]");
    }

    #[test]
    fn identical_text_is_unchanged() {
        let doc = Document::parse(Path::new("a.md"), "## 斷語\n無".into()).unwrap();
        let body = doc.body.clone();
        let out = rewrite(&doc, &[change("斷語", 0..body.len(), &body)]);
        assert!(!out.changed);
        assert_eq!(out.document.to_raw(), "## 斷語\n無");
    }

    #[test]
    fn no_changes() {
        let doc = Document::parse(Path::new("a.md"), "text".into()).unwrap();
        assert!(!rewrite(&doc, &[]).changed);
    }
}
