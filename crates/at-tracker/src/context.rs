//! Context extraction: element, interaction and page snapshots.
//!
//! Pure reads of host state. Nothing here buffers or sends.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use at_config::CaptureConfig;
use at_core::records::{CLICK, UNNAMED_ACTION};
use at_core::{ElementSnapshot, InteractionSnapshot, PageSnapshot, TrackedAction};

use crate::element::{Element, ElementRef};

type AttributePredicate = dyn Fn(&str, &str) -> bool + Send + Sync;

/// Which element attributes are copied into [`ElementSnapshot::attributes`].
#[derive(Clone)]
pub struct AttributePolicy {
    predicate: Arc<AttributePredicate>,
}

impl AttributePolicy {
    /// Keep attributes whose name starts with `prefix`.
    #[must_use]
    pub fn prefixed(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self::from_fn(move |name, _| name.starts_with(prefix.as_str()))
    }

    /// Keep attributes for which `predicate(name, value)` holds.
    pub fn from_fn(predicate: impl Fn(&str, &str) -> bool + Send + Sync + 'static) -> Self {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    #[must_use]
    pub fn accepts(&self, name: &str, value: &str) -> bool {
        (self.predicate)(name, value)
    }
}

impl Default for AttributePolicy {
    fn default() -> Self {
        Self::prefixed("data-")
    }
}

impl fmt::Debug for AttributePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributePolicy").finish_non_exhaustive()
    }
}

/// Builds [`TrackedAction`]s from host interactions.
#[derive(Debug, Clone)]
pub struct Extractor {
    action_attribute: String,
    attributes: AttributePolicy,
    text_limit: usize,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::from_config(&CaptureConfig::default())
    }
}

impl Extractor {
    #[must_use]
    pub fn new(action_attribute: impl Into<String>, attributes: AttributePolicy, text_limit: usize) -> Self {
        Self {
            action_attribute: action_attribute.into(),
            attributes,
            text_limit,
        }
    }

    #[must_use]
    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new(
            config.action_attribute.clone(),
            AttributePolicy::prefixed(config.attribute_prefix.clone()),
            config.text_limit,
        )
    }

    /// Nearest element at or above `target`, below the document root, that
    /// carries the marker attribute.
    #[must_use]
    pub fn find_action_element(&self, target: &ElementRef) -> Option<ElementRef> {
        let mut current = Some(Arc::clone(target));
        while let Some(element) = current {
            if element.is_document_root() {
                return None;
            }
            if element.has_attribute(&self.action_attribute) {
                return Some(element);
            }
            current = element.parent();
        }
        None
    }

    /// Marker value, or `"unnamed"` when it is empty.
    #[must_use]
    pub fn action_name(&self, element: &dyn Element) -> String {
        element
            .attribute(&self.action_attribute)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNNAMED_ACTION.to_string())
    }

    #[must_use]
    pub fn element_snapshot(&self, element: &dyn Element) -> ElementSnapshot {
        let attributes: BTreeMap<String, String> = element
            .attributes()
            .into_iter()
            .filter(|(name, value)| self.attributes.accepts(name, value))
            .collect();

        ElementSnapshot {
            tag: element.tag_name().to_lowercase(),
            id: element.id().filter(|id| !id.is_empty()),
            classes: element.class_name().filter(|classes| !classes.is_empty()),
            text: truncate_text(element.text_content().as_deref().unwrap_or_default(), self.text_limit),
            attributes,
        }
    }

    /// Build a click action, or `None` if nothing in the target's ancestor
    /// chain is marked. `page` is only read for trackable clicks.
    pub fn capture_click(
        &self,
        target: &ElementRef,
        x: f64,
        y: f64,
        page: impl FnOnce() -> PageSnapshot,
    ) -> Option<TrackedAction> {
        let element = self.find_action_element(target)?;
        Some(TrackedAction {
            kind: CLICK.to_string(),
            action_name: self.action_name(element.as_ref()),
            element: self.element_snapshot(element.as_ref()),
            event: Some(interaction_snapshot(target.as_ref(), x, y)),
            page: page(),
        })
    }
}

/// Pointer position plus the tag the event was dispatched to (which may be
/// a descendant of the tracked element).
#[must_use]
pub fn interaction_snapshot(target: &dyn Element, x: f64, y: f64) -> InteractionSnapshot {
    InteractionSnapshot {
        x,
        y,
        target: target.tag_name().to_lowercase(),
    }
}

/// Trim, then keep at most `limit` characters.
fn truncate_text(text: &str, limit: usize) -> String {
    text.trim().chars().take(limit).collect()
}
