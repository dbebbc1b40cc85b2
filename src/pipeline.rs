//! Per-page processing: decode, detect, normalize, translate, re-encode.
//!
//! Each page moves through the stages strictly in order. A payload that
//! cannot be decoded marks the page as failed and is passed through to the
//! output byte-unchanged so the file as a whole still round-trips; every
//! later stage is best-effort and contains its own failures.

use tracing::{debug, info, warn};

use crate::codec::{self, PageEncoding};
use crate::detect::{DetectionResult, LanguageDetector};
use crate::document::{self, XmlElement, XmlNode};
use crate::error::Result;
use crate::extract;
use crate::normalize::{self, WRAPPER_TAGS};
use crate::report::{NodeFailure, PageReport};
use crate::translate::TranslationBackend;
use crate::writer;

/// Immutable run settings threaded through the pipeline. Built by the
/// workflow from config plus per-run overrides; no global state.
pub struct PipelineContext<'a> {
    /// Normalized target codes (lowercase, deduplicated, order kept)
    pub languages: Vec<String>,
    /// Source language substituted when detection fails
    pub source_fallback: String,
    pub overwrite: bool,
    /// Encode every page as plain text regardless of its original form
    pub force_uncompressed: bool,
    pub sample_limit: usize,
    pub detector: &'a dyn LanguageDetector,
    pub backend: &'a dyn TranslationBackend,
}

/// Process a whole container document. Fails only when the container itself
/// cannot be parsed; page-level problems are reported, not raised.
pub async fn process_container(
    xml: &str,
    ctx: &PipelineContext<'_>,
) -> Result<(String, Vec<PageReport>)> {
    let mut root = document::parse(xml)?;

    let mut diagrams = Vec::new();
    document::collect_named_mut(&mut root, &["diagram"], &mut diagrams);

    let mut reports = Vec::new();
    for diagram in diagrams {
        let name = diagram.attr("name").unwrap_or("").to_string();
        let report = process_page(diagram, &name, ctx).await;
        info!(
            "page '{}': lang={} written={} skipped={} failures={}",
            report.name,
            report.detected_language.as_deref().unwrap_or("-"),
            report.attributes_written,
            report.attributes_skipped,
            report.failures.len()
        );
        reports.push(report);
    }

    Ok((root.to_document(), reports))
}

async fn process_page(
    diagram: &mut XmlElement,
    name: &str,
    ctx: &PipelineContext<'_>,
) -> PageReport {
    let mut report = PageReport::new(name);

    // Inline pages keep their graph as a nested element instead of an
    // encoded payload; translate the subtree in place, no codec involved.
    if diagram.has_element_children() {
        for child in diagram.children.iter_mut() {
            if let XmlNode::Element(model) = child {
                translate_tree(model, ctx, &mut report).await;
            }
        }
        return report;
    }

    let payload = diagram.text_content();
    if payload.trim().is_empty() {
        return report;
    }

    let encoding = codec::detect_encoding(&payload);
    let mut tree = match codec::decode(&payload, encoding) {
        Ok(tree) => tree,
        Err(e) => {
            warn!(
                "page '{}': payload unreadable, passing through unchanged: {}",
                name, e
            );
            report.decode_failed = true;
            return report;
        }
    };

    translate_tree(&mut tree, ctx, &mut report).await;

    // An untouched page keeps its original payload bytes; re-encoding would
    // change them (compression level, escaping) for no semantic gain.
    let modified = report.nodes_wrapped > 0 || report.attributes_written > 0;
    if !modified && !ctx.force_uncompressed {
        return report;
    }

    let out_encoding = if ctx.force_uncompressed {
        PageEncoding::Plain
    } else {
        encoding
    };
    diagram.set_text(codec::encode(&tree, out_encoding));
    report
}

/// Detect once, normalize, then write translations node by node.
async fn translate_tree(
    tree: &mut XmlElement,
    ctx: &PipelineContext<'_>,
    report: &mut PageReport,
) {
    let sample = extract::sample(tree, ctx.sample_limit);
    let detection = detect_with_fallback(ctx, &sample);
    report.detected_language = Some(detection.language.clone());
    report.detection_fallback = detection.fallback;

    let outcome = normalize::normalize_page(tree);
    report.nodes_wrapped += outcome.wrapped;
    report.nodes_missing_id += outcome.missing_id;

    let mut wrappers = Vec::new();
    document::collect_named_mut(tree, WRAPPER_TAGS, &mut wrappers);
    for node in wrappers {
        let outcome = writer::translate_node(
            node,
            &detection.language,
            &ctx.languages,
            ctx.overwrite,
            ctx.backend,
        )
        .await;
        report.attributes_written += outcome.attributes_written;
        report.attributes_skipped += outcome.attributes_skipped;
        let node_id = node.attr("id").unwrap_or("").to_string();
        for (language, error) in outcome.failures {
            warn!(
                "node '{}': translation to '{}' failed: {}",
                node_id, language, error
            );
            report.failures.push(NodeFailure {
                node_id: node_id.clone(),
                language,
                error,
            });
        }
    }
}

/// Detection failure is substituted with the configured fallback here, once
/// per page; the adapter itself never hides it.
fn detect_with_fallback(ctx: &PipelineContext<'_>, texts: &[String]) -> DetectionResult {
    let sample = texts.join(" ");
    match ctx.detector.detect(&sample) {
        Ok(language) => DetectionResult {
            language,
            fallback: false,
        },
        Err(e) => {
            debug!(
                "detection failed, falling back to '{}': {}",
                ctx.source_fallback, e
            );
            DetectionResult {
                language: ctx.source_fallback.clone(),
                fallback: true,
            }
        }
    }
}
