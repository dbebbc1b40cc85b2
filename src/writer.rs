//! Translation-attribute emission for wrapped nodes.
//!
//! The decision protocol is evaluated once per wrapped node:
//!
//! 1. If English is targeted and the page source is not English, the visible
//!    `label` is replaced by its English translation and the original text is
//!    preserved under the source-language pair (`label_<src>` / `label-<src>`).
//! 2. Every other target (excluding English and the source language itself)
//!    gets a translation of the original text under its pair.
//! 3. No `label_en` / `label-en` keys are ever written: English, when
//!    targeted, lives in the visible base label.
//!
//! Planning is pure and never touches the network; the backend is only called
//! for pairs the overwrite policy allows, so `overwrite = false` avoids
//! pointless remote calls entirely.

use crate::document::XmlElement;
use crate::extract::decode_label_text;
use crate::translate::TranslationBackend;

/// The designated lingua-franca code. When targeted it replaces the visible
/// base text instead of being stored under a suffixed attribute.
pub const LINGUA_FRANCA: &str = "en";

/// Lowercase, deduplicate and order-preserve a configured language list.
pub fn normalize_languages(languages: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for lang in languages {
        let code = lang.trim().to_lowercase();
        if !code.is_empty() && !out.contains(&code) {
            out.push(code);
        }
    }
    out
}

/// Both spellings written for each language-specific key.
pub fn attribute_pair(lang: &str) -> [String; 2] {
    [format!("label_{lang}"), format!("label-{lang}")]
}

/// One planned backend call and the attributes it feeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedWrite {
    /// Replace the visible base label with its lingua-franca translation and
    /// keep the original text under the source-language pair.
    PromoteBase { source: String },
    /// Write the pair for `target` with a translation of the base text.
    Translate { target: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePlan {
    pub writes: Vec<PlannedWrite>,
    /// Languages skipped without a backend call because their pair already
    /// exists and overwriting is disabled.
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NodeOutcome {
    pub attributes_written: usize,
    pub attributes_skipped: usize,
    /// (language, error) per failed backend call.
    pub failures: Vec<(String, String)>,
}

fn pair_exists(node: &XmlElement, lang: &str) -> bool {
    attribute_pair(lang).iter().all(|key| node.attr(key).is_some())
}

/// Pure decision step: which backend calls to make for this node. Testable
/// without any network access.
pub fn plan_node(
    node: &XmlElement,
    source_lang: &str,
    languages: &[String],
    overwrite: bool,
) -> NodePlan {
    let mut plan = NodePlan::default();
    let base = node.attr("label").map(decode_label_text).unwrap_or_default();
    if base.is_empty() {
        return plan;
    }

    let english_requested = languages.iter().any(|l| l == LINGUA_FRANCA);
    if english_requested && source_lang != LINGUA_FRANCA {
        plan.writes.push(PlannedWrite::PromoteBase {
            source: source_lang.to_string(),
        });
    }

    for lang in languages {
        if lang == LINGUA_FRANCA || lang == source_lang {
            continue;
        }
        if !overwrite && pair_exists(node, lang) {
            plan.skipped.push(lang.clone());
        } else {
            plan.writes.push(PlannedWrite::Translate {
                target: lang.clone(),
            });
        }
    }
    plan
}

fn write_pair(
    node: &mut XmlElement,
    lang: &str,
    value: &str,
    overwrite: bool,
    outcome: &mut NodeOutcome,
) {
    for key in attribute_pair(lang) {
        if overwrite || node.attr(&key).is_none() {
            node.set_attr(&key, value);
            outcome.attributes_written += 1;
        } else {
            outcome.attributes_skipped += 1;
        }
    }
}

/// Execute a plan against the backend and apply the results to the node.
/// A failed call affects only its own attribute pair.
pub async fn apply_plan(
    node: &mut XmlElement,
    plan: &NodePlan,
    source_lang: &str,
    overwrite: bool,
    backend: &dyn TranslationBackend,
) -> NodeOutcome {
    let mut outcome = NodeOutcome::default();
    outcome.attributes_skipped += plan.skipped.len() * 2;

    let base = node.attr("label").map(decode_label_text).unwrap_or_default();
    if base.is_empty() {
        return outcome;
    }

    for write in &plan.writes {
        match write {
            PlannedWrite::PromoteBase { source } => {
                match backend.translate(&base, source, LINGUA_FRANCA).await {
                    Ok(english) => {
                        if node.attr("label") != Some(english.as_str()) {
                            node.set_attr("label", &english);
                            outcome.attributes_written += 1;
                        }
                        write_pair(node, source, &base, overwrite, &mut outcome);
                    }
                    Err(e) => outcome
                        .failures
                        .push((LINGUA_FRANCA.to_string(), e.to_string())),
                }
            }
            PlannedWrite::Translate { target } => {
                match backend.translate(&base, source_lang, target).await {
                    Ok(translated) => {
                        write_pair(node, target, &translated, overwrite, &mut outcome)
                    }
                    Err(e) => outcome.failures.push((target.clone(), e.to_string())),
                }
            }
        }
    }
    outcome
}

/// Plan and apply in one step; the pipeline's per-node entry point.
pub async fn translate_node(
    node: &mut XmlElement,
    source_lang: &str,
    languages: &[String],
    overwrite: bool,
    backend: &dyn TranslationBackend,
) -> NodeOutcome {
    let plan = plan_node(node, source_lang, languages, overwrite);
    apply_plan(node, &plan, source_lang, overwrite, backend).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse;
    use crate::error::{DiaglotError, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic stub: `[target]text`, with call counting.
    struct StubBackend {
        calls: AtomicUsize,
        fail_for: Option<&'static str>,
    }

    impl StubBackend {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_for: None,
            }
        }

        fn failing_for(lang: &'static str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_for: Some(lang),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl crate::translate::TranslationBackend for StubBackend {
        async fn translate(&self, text: &str, _source: &str, target: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_for == Some(target) {
                return Err(DiaglotError::Backend("stub outage".to_string()));
            }
            Ok(format!("[{target}]{text}"))
        }
    }

    fn langs(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_german_page_with_english_targeted() {
        // Scenario: page detected as de, languages = [en, de, fr, it].
        let mut node = parse(r#"<UserObject id="n1" label="Hallo Welt"><mxCell /></UserObject>"#)
            .unwrap();
        let backend = StubBackend::new();
        let outcome =
            translate_node(&mut node, "de", &langs(&["en", "de", "fr", "it"]), true, &backend)
                .await;

        assert_eq!(node.attr("label"), Some("[en]Hallo Welt"));
        assert_eq!(node.attr("label_de"), Some("Hallo Welt"));
        assert_eq!(node.attr("label-de"), Some("Hallo Welt"));
        assert_eq!(node.attr("label_fr"), Some("[fr]Hallo Welt"));
        assert_eq!(node.attr("label-fr"), Some("[fr]Hallo Welt"));
        assert_eq!(node.attr("label_it"), Some("[it]Hallo Welt"));
        assert!(node.attr("label_en").is_none());
        assert!(node.attr("label-en").is_none());
        assert!(outcome.failures.is_empty());
        // en promotion + fr + it, never de->de.
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn test_english_page_keeps_base_untouched() {
        // Scenario: page detected as en, languages = [en, fr].
        let mut node =
            parse(r#"<UserObject id="n1" label="Hello"><mxCell /></UserObject>"#).unwrap();
        let backend = StubBackend::new();
        translate_node(&mut node, "en", &langs(&["en", "fr"]), true, &backend).await;

        assert_eq!(node.attr("label"), Some("Hello"));
        assert_eq!(node.attr("label_fr"), Some("[fr]Hello"));
        assert_eq!(node.attr("label-fr"), Some("[fr]Hello"));
        assert!(node.attr("label_en").is_none());
        assert!(node.attr("label-en").is_none());
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_no_overwrite_preserves_existing_and_skips_call() {
        // Scenario: existing label_de/label-de with overwrite off.
        let mut node = parse(
            r#"<UserObject id="n1" label="Hello" label_de="Alt" label-de="Alt"><mxCell /></UserObject>"#,
        )
        .unwrap();
        let backend = StubBackend::new();
        let outcome =
            translate_node(&mut node, "en", &langs(&["de"]), false, &backend).await;

        assert_eq!(node.attr("label_de"), Some("Alt"));
        assert_eq!(node.attr("label-de"), Some("Alt"));
        assert_eq!(backend.call_count(), 0);
        assert_eq!(outcome.attributes_skipped, 2);
        assert_eq!(outcome.attributes_written, 0);
    }

    #[tokio::test]
    async fn test_overwrite_refreshes_existing() {
        let mut node = parse(
            r#"<UserObject id="n1" label="Hello" label_de="Alt" label-de="Alt"><mxCell /></UserObject>"#,
        )
        .unwrap();
        let backend = StubBackend::new();
        translate_node(&mut node, "en", &langs(&["de"]), true, &backend).await;

        assert_eq!(node.attr("label_de"), Some("[de]Hello"));
        assert_eq!(node.attr("label-de"), Some("[de]Hello"));
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_partial_pair_completed_without_overwrite() {
        // Only the underscore spelling exists: the hyphen one is filled in,
        // the existing key is left alone.
        let mut node = parse(
            r#"<UserObject id="n1" label="Hello" label_de="Alt"><mxCell /></UserObject>"#,
        )
        .unwrap();
        let backend = StubBackend::new();
        translate_node(&mut node, "en", &langs(&["de"]), false, &backend).await;

        assert_eq!(node.attr("label_de"), Some("Alt"));
        assert_eq!(node.attr("label-de"), Some("[de]Hello"));
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_backend_failure_contained_per_language() {
        let mut node =
            parse(r#"<UserObject id="n1" label="Hello"><mxCell /></UserObject>"#).unwrap();
        let backend = StubBackend::failing_for("fr");
        let outcome =
            translate_node(&mut node, "en", &langs(&["fr", "it"]), true, &backend).await;

        assert!(node.attr("label_fr").is_none());
        assert_eq!(node.attr("label_it"), Some("[it]Hello"));
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].0, "fr");
    }

    #[tokio::test]
    async fn test_promote_base_failure_leaves_node_untouched() {
        let mut node =
            parse(r#"<UserObject id="n1" label="Hallo"><mxCell /></UserObject>"#).unwrap();
        let backend = StubBackend::failing_for("en");
        let outcome =
            translate_node(&mut node, "de", &langs(&["en"]), true, &backend).await;

        assert_eq!(node.attr("label"), Some("Hallo"));
        assert!(node.attr("label_de").is_none());
        assert_eq!(outcome.failures.len(), 1);
    }

    #[tokio::test]
    async fn test_node_without_label_is_ignored() {
        let mut node = parse(r#"<UserObject id="n1"><mxCell /></UserObject>"#).unwrap();
        let backend = StubBackend::new();
        let outcome = translate_node(&mut node, "en", &langs(&["de"]), true, &backend).await;
        assert_eq!(backend.call_count(), 0);
        assert_eq!(outcome.attributes_written, 0);
    }

    #[test]
    fn test_plan_excludes_source_and_lingua_franca() {
        let node = parse(r#"<UserObject id="n1" label="Hallo" />"#).unwrap();
        let plan = plan_node(&node, "de", &langs(&["en", "de", "fr"]), true);
        assert_eq!(
            plan.writes,
            vec![
                PlannedWrite::PromoteBase {
                    source: "de".to_string()
                },
                PlannedWrite::Translate {
                    target: "fr".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_normalize_languages() {
        let input = langs(&["EN", "de", " de ", "fr", "en", ""]);
        assert_eq!(normalize_languages(&input), langs(&["en", "de", "fr"]));
    }
}
