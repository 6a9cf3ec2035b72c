use std::ops::Range;

const HEADING_PREFIX: &str = "## ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    /// Byte range in the body of the lines under the heading. The heading
    /// line itself is never part of it.
    pub range: Range<usize>,
}

impl Section {
    pub fn content<'a>(&self, body: &'a str) -> &'a str {
        &body[self.range.clone()]
    }
}

/// Split the body at depth-2 headings and keep the sections whose title is
/// allow-listed, in document order.
pub fn extract_sections<S: AsRef<str>>(body: &str, allow_list: &[S]) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Option<(String, usize)> = None;
    let mut offset = 0;

    for line in body.split('\n') {
        if let Some(rest) = line.strip_prefix(HEADING_PREFIX) {
            if let Some((title, start)) = current.take() {
                // content stops before the newline preceding this heading
                sections.push(Section {
                    title,
                    range: start..(offset - 1).max(start),
                });
            }
            let content_start = (offset + line.len() + 1).min(body.len());
            current = Some((rest.trim().to_string(), content_start));
        }
        offset += line.len() + 1;
    }

    if let Some((title, start)) = current {
        sections.push(Section {
            title,
            range: start..body.len(),
        });
    }

    sections.retain(|s| allow_list.iter().any(|a| a.as_ref() == s.title));
    sections
}
