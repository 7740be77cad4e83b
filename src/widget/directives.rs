use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CHOICE_TAG: Regex = Regex::new(r"\{\{choice:([^}]*)\}\}").unwrap();
    static ref LINK_TAG: Regex = Regex::new(r"\{\{link:([^|}]*)\|([^}]*)\}\}").unwrap();
    static ref EXTRA_BLANK_LINES: Regex = Regex::new(r"\n{3,}").unwrap();
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
    pub url: String,
    pub label: String,
}

/// Result of scanning assistant text for inline directive tags.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Extracted {
    /// The input with every matched tag removed, blank-line runs collapsed,
    /// and surrounding whitespace trimmed.
    pub text: String,
    pub choices: Vec<Choice>,
    pub links: Vec<Link>,
}

/// Pull `{{choice:label}}` and `{{link:url|label}}` tags out of assistant
/// text. Pure and idempotent: matching never advances shared state, so
/// repeated passes over the same input yield the same result. Malformed
/// tags never match and stay verbatim in the cleaned text.
pub fn extract_directives(text: &str) -> Extracted {
    let choices = CHOICE_TAG.captures_iter(text)
        .map(|caps| Choice {
            label: caps[1].trim().to_string(),
        })
        .collect();

    let links = LINK_TAG.captures_iter(text)
        .map(|caps| Link {
            url: caps[1].trim().to_string(),
            label: caps[2].trim().to_string(),
        })
        .collect();

    let stripped = CHOICE_TAG.replace_all(text, "");
    let stripped = LINK_TAG.replace_all(&stripped, "");
    let collapsed = EXTRA_BLANK_LINES.replace_all(&stripped, "\n\n");

    Extracted {
        text: collapsed.trim().to_string(),
        choices,
        links,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_trimmed_with_no_directives() {
        let out = extract_directives("  hello world \n");
        assert_eq!(out.text, "hello world");
        assert!(out.choices.is_empty());
        assert!(out.links.is_empty());
    }

    #[test]
    fn collects_choices_in_order_and_strips_the_tags() {
        let out = extract_directives("Pick one {{choice:A}} {{choice:B}}");
        assert_eq!(out.text, "Pick one");
        assert_eq!(out.choices, vec![
            Choice { label: "A".to_string() },
            Choice { label: "B".to_string() },
        ]);
        assert!(out.links.is_empty());
    }

    #[test]
    fn collects_links_with_url_and_label() {
        let out = extract_directives("Pick one {{choice:A}} {{choice:B}} or {{link:https://x.com|Visit}}");
        assert_eq!(out.text, "Pick one   or");
        assert_eq!(out.choices.len(), 2);
        assert_eq!(out.links, vec![Link {
            url: "https://x.com".to_string(),
            label: "Visit".to_string(),
        }]);
    }

    #[test]
    fn blank_line_runs_collapse_to_one_blank_line() {
        let out = extract_directives("plain text\n\n\n\nmore");
        assert_eq!(out.text, "plain text\n\nmore");
        assert!(out.choices.is_empty());
        assert!(out.links.is_empty());
    }

    #[test]
    fn unterminated_tags_stay_verbatim() {
        let out = extract_directives("unterminated {{choice:Oops");
        assert_eq!(out.text, "unterminated {{choice:Oops");
        assert!(out.choices.is_empty());
    }

    #[test]
    fn link_without_separator_never_matches() {
        let out = extract_directives("{{link:https://x.com}}");
        assert_eq!(out.text, "{{link:https://x.com}}");
        assert!(out.links.is_empty());
    }

    #[test]
    fn labels_and_urls_are_trimmed() {
        let out = extract_directives("{{choice: Yes please }}{{link: https://x.com | Docs }}");
        assert_eq!(out.choices[0].label, "Yes please");
        assert_eq!(out.links[0].url, "https://x.com");
        assert_eq!(out.links[0].label, "Docs");
    }

    #[test]
    fn order_is_preserved_within_each_kind() {
        let out = extract_directives(
            "{{link:https://a.com|First}} {{choice:One}} {{link:https://b.com|Second}} {{choice:Two}}"
        );
        assert_eq!(out.choices[0].label, "One");
        assert_eq!(out.choices[1].label, "Two");
        assert_eq!(out.links[0].label, "First");
        assert_eq!(out.links[1].label, "Second");
    }

    #[test]
    fn extraction_is_idempotent() {
        let first = extract_directives("A {{choice:B}}\n\n\n\nC");
        let second = extract_directives(&first.text);
        assert_eq!(second.text, first.text);
        assert!(second.choices.is_empty());
    }

    #[test]
    fn a_broken_link_cannot_absorb_a_later_tag() {
        let out = extract_directives("{{link:broken}} and {{link:https://u.com|v}}");
        assert_eq!(out.links, vec![Link {
            url: "https://u.com".to_string(),
            label: "v".to_string(),
        }]);
        assert!(out.text.contains("{{link:broken}}"));
    }
}
