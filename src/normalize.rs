//! UserObject wrapping for bare text-bearing cells.
//!
//! Translation attributes live on a `UserObject` wrapper so diagrams.net
//! shows them under "Edit Data…". A bare `<mxCell>` carrying visible text is
//! rewrapped in place: the wrapper takes over the cell's `id` (edges and
//! groups reference cells by id, so it must not change) and its visible text
//! as `label`; the demoted cell keeps geometry, style and everything else.

use std::collections::BTreeSet;

use tracing::warn;

use crate::document::{XmlElement, XmlNode};
use crate::error::{DiaglotError, Result};
use crate::extract::raw_visible_text;

pub const WRAPPER_TAG: &str = "UserObject";
/// Both data-wrapper tags diagrams.net emits; `<object>` appears in files
/// authored through the "Edit Data…" dialog.
pub const WRAPPER_TAGS: &[&str] = &[WRAPPER_TAG, "object"];
pub const CELL_TAG: &str = "mxCell";

#[derive(Debug, Default, Clone, PartialEq)]
pub struct NormalizeOutcome {
    pub wrapped: usize,
    pub missing_id: usize,
}

/// Wrap a bare cell in place. `cell` becomes the wrapper; the original
/// element is demoted to its only child, stripped of `id`, `value` and
/// `label`. Sibling position is untouched because the slot itself is reused.
pub fn wrap_cell(cell: &mut XmlElement) -> Result<()> {
    let Some(id) = cell.attr("id").map(str::to_string) else {
        return Err(DiaglotError::MissingIdentity);
    };
    let label = raw_visible_text(cell).map(|(_, raw)| raw.to_string());

    let mut inner = std::mem::take(cell);
    inner.remove_attr("id");
    inner.remove_attr("value");
    inner.remove_attr("label");

    let mut wrapper = XmlElement::new(WRAPPER_TAG);
    wrapper.set_attr("id", &id);
    if let Some(label) = label {
        wrapper.set_attr("label", &label);
    }
    wrapper.children.push(XmlNode::Element(inner));
    *cell = wrapper;
    Ok(())
}

/// Normalize every translatable node in a page tree. Cells without visible
/// text are left alone; cells without an id are skipped and counted, since
/// wrapping them would break referential integrity.
pub fn normalize_page(root: &mut XmlElement) -> NormalizeOutcome {
    let mut outcome = NormalizeOutcome::default();
    walk(root, &mut outcome);
    outcome
}

fn walk(parent: &mut XmlElement, outcome: &mut NormalizeOutcome) {
    let parent_is_wrapper = WRAPPER_TAGS.contains(&parent.local_name());
    for child in parent.children.iter_mut() {
        let XmlNode::Element(el) = child else { continue };
        if !parent_is_wrapper && el.local_name() == CELL_TAG && raw_visible_text(el).is_some() {
            match wrap_cell(el) {
                Ok(()) => outcome.wrapped += 1,
                Err(e) => {
                    warn!("skipping untranslatable cell: {}", e);
                    outcome.missing_id += 1;
                }
            }
        }
        // After a wrap `el` is the wrapper, so this descends into it and
        // leaves the demoted child alone.
        walk(el, outcome);
    }
}

/// All `id` attributes in a subtree. Wrapping must keep this set unchanged.
pub fn collect_ids(root: &XmlElement) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();
    collect(root, &mut ids);
    ids
}

fn collect(el: &XmlElement, ids: &mut BTreeSet<String>) {
    if let Some(id) = el.attr("id") {
        ids.insert(id.to_string());
    }
    for child in el.child_elements() {
        collect(child, ids);
    }
}
