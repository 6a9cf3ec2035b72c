//! Masking of spans the linker must never touch: existing `[[...]]` links and
//! fenced code blocks.
//!
//! Instead of substituting placeholder strings into the text, the input is cut
//! into a segment list. Protected spans are opaque segments, so term matching
//! only ever sees plain text and a placeholder can never collide with content.

use std::collections::HashSet;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

// Single line, no brackets inside: `[[[a]]` is `[` + `[[a]]`, and an unclosed
// `[[` never swallows a later link.
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\[[^\[\]\n]+?\]\]").unwrap());

const FENCE: &str = "```";
const LINK_OPEN: &str = "[[";
const LINK_CLOSE: &str = "]]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Link,
    CodeBlock,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedSpan {
    pub kind: SpanKind,
    pub original: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Plain(String),
    /// Index into `Shielded::spans`.
    Protected(usize),
    /// Link inserted during this pass.
    Linked(String),
}

#[derive(Debug, Clone)]
pub struct Shielded {
    segments: Vec<Segment>,
    spans: Vec<ProtectedSpan>,
    link_targets: HashSet<String>,
}

/// Mask links first, then code fences. A fence absorbs the links inside it.
pub fn shield(text: &str) -> Shielded {
    let links: Vec<Range<usize>> = LINK_RE.find_iter(text).map(|m| m.range()).collect();
    let fences = fence_ranges(text, &links);

    let mut masked: Vec<(Range<usize>, SpanKind)> = fences
        .iter()
        .cloned()
        .map(|r| (r, SpanKind::CodeBlock))
        .collect();
    masked.extend(
        links
            .into_iter()
            .filter(|l| !fences.iter().any(|f| f.start <= l.start && l.end <= f.end))
            .map(|r| (r, SpanKind::Link)),
    );
    masked.sort_by_key(|(r, _)| r.start);

    let mut segments = Vec::with_capacity(masked.len() * 2 + 1);
    let mut spans = Vec::with_capacity(masked.len());
    let mut link_targets = HashSet::new();
    let mut pos = 0;

    for (range, kind) in masked {
        if range.start > pos {
            segments.push(Segment::Plain(text[pos..range.start].to_string()));
        }
        let original = &text[range.clone()];
        if kind == SpanKind::Link {
            link_targets.insert(link_target(original).to_string());
        }
        segments.push(Segment::Protected(spans.len()));
        spans.push(ProtectedSpan {
            kind,
            original: original.to_string(),
        });
        pos = range.end;
    }
    if pos < text.len() {
        segments.push(Segment::Plain(text[pos..].to_string()));
    }

    Shielded {
        segments,
        spans,
        link_targets,
    }
}

/// Pair fence delimiters that are not part of a link, in order. An unpaired
/// trailing delimiter stays plain text.
fn fence_ranges(text: &str, links: &[Range<usize>]) -> Vec<Range<usize>> {
    let delimiters: Vec<usize> = text
        .match_indices(FENCE)
        .map(|(i, _)| i)
        .filter(|i| !links.iter().any(|l| l.contains(i)))
        .collect();
    delimiters
        .chunks_exact(2)
        .map(|pair| pair[0]..pair[1] + FENCE.len())
        .collect()
}

/// `[[target|alias]]` → `target`.
fn link_target(link: &str) -> &str {
    let inner = &link[LINK_OPEN.len()..link.len() - LINK_CLOSE.len()];
    inner.split_once('|').map_or(inner, |(target, _)| target).trim()
}

impl Shielded {
    pub fn spans(&self) -> &[ProtectedSpan] {
        &self.spans
    }

    /// Whether a pre-existing link points at `target`.
    pub fn links_to(&self, target: &str) -> bool {
        self.link_targets.contains(target)
    }

    /// Whether `needle` occurs in unmasked, unlinked text.
    pub fn plain_contains(&self, needle: &str) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Plain(t) if t.contains(needle)))
    }

    /// Wrap the first plain occurrence of `term` that is not directly inside
    /// `[[` `]]`. Returns false when there is none.
    pub fn link_first(&mut self, term: &str) -> bool {
        let found = self.segments.iter().enumerate().find_map(|(i, s)| match s {
            Segment::Plain(t) => first_unbracketed(t, term).map(|pos| (i, pos)),
            _ => None,
        });
        let Some((idx, pos)) = found else {
            return false;
        };

        let Segment::Plain(text) = &self.segments[idx] else {
            return false;
        };
        let before = &text[..pos];
        let after = &text[pos + term.len()..];
        let mut replacement = Vec::with_capacity(3);
        if !before.is_empty() {
            replacement.push(Segment::Plain(before.to_string()));
        }
        replacement.push(Segment::Linked(term.to_string()));
        if !after.is_empty() {
            replacement.push(Segment::Plain(after.to_string()));
        }
        self.segments.splice(idx..=idx, replacement);
        true
    }

    /// Reassemble the text, restoring every masked span byte for byte.
    pub fn restore(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Plain(t) => out.push_str(t),
                Segment::Protected(i) => out.push_str(&self.spans[*i].original),
                Segment::Linked(term) => {
                    out.push_str(LINK_OPEN);
                    out.push_str(term);
                    out.push_str(LINK_CLOSE);
                }
            }
        }
        out
    }
}

fn first_unbracketed(text: &str, term: &str) -> Option<usize> {
    let step = term.chars().next().map_or(1, char::len_utf8);
    let mut from = 0;
    while let Some(i) = text[from..].find(term) {
        let pos = from + i;
        let wrapped =
            text[..pos].ends_with(LINK_OPEN) || text[pos + term.len()..].starts_with(LINK_CLOSE);
        if !wrapped {
            return Some(pos);
        }
        from = pos + step;
    }
    None
}
