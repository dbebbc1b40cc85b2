//! Visible-text extraction from page trees.
//!
//! Detection samples come from the same attributes the writer later
//! translates: a `value` on geometry cells or a `label` on data wrappers,
//! preferred in that order. Label text may carry HTML entities that survived
//! XML unescaping, so it is run through `htmlize` before use.

use crate::document::{XmlElement, XmlNode};

pub const DEFAULT_SAMPLE_LIMIT: usize = 100;

/// The first label-bearing attribute of `el`, raw as stored. `value` wins
/// over `label`; blank values are ignored.
pub fn raw_visible_text(el: &XmlElement) -> Option<(&'static str, &str)> {
    for key in ["value", "label"] {
        if let Some(raw) = el.attr(key) {
            if !raw.trim().is_empty() {
                return Some((key, raw));
            }
        }
    }
    None
}

/// Unescape HTML entities and trim surrounding whitespace.
pub fn decode_label_text(raw: &str) -> String {
    htmlize::unescape(raw).trim().to_string()
}

/// Lazy document-order iterator over the decoded visible text of a subtree.
/// Decorative elements (no text) are skipped; the tree is not mutated.
pub struct VisibleTexts<'a> {
    stack: Vec<&'a XmlElement>,
}

impl<'a> Iterator for VisibleTexts<'a> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while let Some(el) = self.stack.pop() {
            for child in el.children.iter().rev() {
                if let XmlNode::Element(e) = child {
                    self.stack.push(e);
                }
            }
            if let Some((_, raw)) = raw_visible_text(el) {
                let text = decode_label_text(raw);
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
        None
    }
}

pub fn visible_texts(root: &XmlElement) -> VisibleTexts<'_> {
    VisibleTexts { stack: vec![root] }
}

/// Up to `max_count` visible-text strings in document order, bounding the
/// cost of language detection on large pages.
pub fn sample(root: &XmlElement, max_count: usize) -> Vec<String> {
    visible_texts(root).take(max_count).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse;

    #[test]
    fn test_sample_in_document_order() {
        let tree = parse(
            r#"<mxGraphModel><root>
                 <mxCell id="0" />
                 <mxCell id="1" value="first" />
                 <UserObject id="2" label="second"><mxCell /></UserObject>
                 <mxCell id="3" value="third" />
               </root></mxGraphModel>"#,
        )
        .unwrap();
        assert_eq!(sample(&tree, 100), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_sample_respects_limit() {
        let tree = parse(
            r#"<root><a value="one" /><b value="two" /><c value="three" /></root>"#,
        )
        .unwrap();
        assert_eq!(sample(&tree, 2), vec!["one", "two"]);
    }

    #[test]
    fn test_value_preferred_over_label() {
        let tree = parse(r#"<mxCell value="v" label="l" />"#).unwrap();
        assert_eq!(raw_visible_text(&tree), Some(("value", "v")));
    }

    #[test]
    fn test_blank_value_falls_back_to_label() {
        let tree = parse(r#"<mxCell value="  " label="l" />"#).unwrap();
        assert_eq!(raw_visible_text(&tree), Some(("label", "l")));
    }

    #[test]
    fn test_decode_label_text_unescapes_entities() {
        assert_eq!(decode_label_text("  Tom &amp; Jerry "), "Tom & Jerry");
        assert_eq!(decode_label_text("caf&eacute;"), "café");
    }

    #[test]
    fn test_empty_nodes_skipped() {
        let tree = parse(r#"<root><mxCell id="0" /><mxCell value="x" /></root>"#).unwrap();
        assert_eq!(sample(&tree, 10), vec!["x"]);
    }
}
