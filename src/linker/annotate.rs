use std::collections::HashSet;

use tracing::trace;

use super::shield::shield;
use crate::catalog::TermCatalog;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    pub text: String,
    /// Terms that received a new link, in catalog order.
    pub linked: Vec<String>,
}

impl Annotation {
    pub fn links_inserted(&self) -> usize {
        self.linked.len()
    }
}

/// Link the first unprotected occurrence of every catalog term in `section`.
///
/// Terms are tried longest first. A term already linked anywhere in the
/// section counts as done, which makes a second pass a no-op. The set of
/// consumed terms lives only for this call, so each section gets its own
/// first occurrence.
pub fn annotate(section: &str, catalog: &TermCatalog) -> Annotation {
    let mut shielded = shield(section);
    trace!(protected = shielded.spans().len(), "Shielded section");
    let mut consumed: HashSet<&str> = HashSet::new();
    let mut linked = Vec::new();

    for term in catalog.iter() {
        let name = term.name.as_str();
        if consumed.contains(name) || !shielded.plain_contains(name) {
            continue;
        }
        if shielded.links_to(name) {
            consumed.insert(name);
            continue;
        }
        if shielded.link_first(name) {
            trace!(term = name, "Linked term");
            linked.push(term.name.clone());
        }
        consumed.insert(name);
    }

    Annotation {
        text: shielded.restore(),
        linked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(names: &[&str]) -> TermCatalog {
        TermCatalog::from_names(names.iter().copied())
    }

    fn run(text: &str, names: &[&str]) -> String {
        annotate(text, &catalog(names)).text
    }

    #[test]
    fn scenario_longest_first() {
        let terms = ["化進神", "進神", "用神", "原神", "旬空"];
        let out = annotate("用神旬空，原神化進神", &catalog(&terms));
        assert_eq!(out.text, "[[用神]][[旬空]]，[[原神]][[化進神]]");
        assert_eq!(out.linked, vec!["化進神", "用神", "原神", "旬空"]);
        assert_eq!(out.links_inserted(), 4);
    }

    #[test]
    fn compound_is_not_split() {
        assert_eq!(run("世爻化進神", &["進神", "化進神"]), "世爻[[化進神]]");
    }

    #[test]
    fn shorter_term_links_elsewhere() {
        assert_eq!(run("化進神，又見進神", &["進神", "化進神"]), "[[化進神]]，又見[[進神]]");
    }

    #[test]
    fn first_occurrence_only() {
        assert_eq!(run("用神、用神、用神", &["用神"]), "[[用神]]、用神、用神");
    }

    #[test]
    fn idempotent() {
        let terms = ["化進神", "進神", "用神", "原神", "旬空", "世爻"];
        let inputs = [
            "用神旬空，原神化進神",
            "用神持世，[[用神]]又見",
            "```\n用神\n```\n用神在後，世爻動",
            "[[原神|元神]]生用神，原神再現",
            "[用神](glossary/用神.md)，用神旺",
            "[[草稿 用神 又 用神",
        ];
        let c = catalog(&terms);
        for input in inputs {
            let once = annotate(input, &c).text;
            let twice = annotate(&once, &c);
            assert_eq!(twice.text, once, "input: {input}");
            assert!(twice.linked.is_empty());
        }
    }

    #[test]
    fn markdown_link_text_keeps_its_url() {
        let c = catalog(&["用神"]);
        let once = annotate("[用神](glossary/用神.md)，用神旺", &c);
        assert_eq!(once.text, "[[[用神]]](glossary/用神.md)，用神旺");
        assert_eq!(annotate(&once.text, &c).text, once.text);
    }

    #[test]
    fn unclosed_opener_does_not_hide_link() {
        let c = catalog(&["用神"]);
        let once = annotate("[[草稿 用神 又 用神", &c);
        assert_eq!(once.text, "[[草稿 [[用神]] 又 用神");
        assert_eq!(annotate(&once.text, &c).text, once.text);
    }

    #[test]
    fn existing_link_consumes_term() {
        assert_eq!(run("[[用神]]旺，用神又動", &["用神"]), "[[用神]]旺，用神又動");
        assert_eq!(run("用神旺，[[用神|主爻]]", &["用神"]), "用神旺，[[用神|主爻]]");
    }

    #[test]
    fn protected_spans_untouched() {
        let text = "[[原神化進神]]\n```\n用神 旬空\n```";
        assert_eq!(run(text, &["用神", "旬空", "進神", "原神"]), text);
    }

    #[test]
    fn code_then_plain_links_plain() {
        let out = run("```\n用神\n```\n用神", &["用神"]);
        assert_eq!(out, "```\n用神\n```\n[[用神]]");
    }

    #[test]
    fn substring_of_unrelated_word_is_linked() {
        // plain substring matching, no word boundaries
        assert_eq!(run("用神章", &["用神"]), "[[用神]]章");
        assert_eq!(run("prefixed", &["fix"]), "pre[[fix]]ed");
    }

    #[test]
    fn empty_catalog_or_text() {
        assert_eq!(run("用神", &[]), "用神");
        assert_eq!(run("", &["用神"]), "");
    }

    #[test]
    fn no_terms_present_is_identity() {
        let text = "## 斷語\n此卦無關\n";
        let out = annotate(text, &catalog(&["用神", "旬空"]));
        assert_eq!(out.text, text);
        assert!(out.linked.is_empty());
    }
}
