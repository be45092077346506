//! Observed UI elements.
//!
//! The tracker never owns the host's element tree. It only needs to read an
//! element's tag, attributes and text, and to walk to its parent.

use std::fmt;
use std::sync::Arc;

/// Shared handle to a host element.
pub type ElementRef = Arc<dyn Element>;

/// Read-only view of one element in the host document.
pub trait Element: Send + Sync + fmt::Debug {
    /// Tag name as the host reports it (any case).
    fn tag_name(&self) -> String;

    /// All attributes as name/value pairs.
    fn attributes(&self) -> Vec<(String, String)>;

    /// Text content of the element and its descendants.
    fn text_content(&self) -> Option<String>;

    /// Parent element, `None` at the top of the tree.
    fn parent(&self) -> Option<ElementRef>;

    /// Whether this is the document root (`<html>`), where ancestor walks stop.
    fn is_document_root(&self) -> bool;

    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes()
            .into_iter()
            .find(|(attr, _)| attr == name)
            .map(|(_, value)| value)
    }

    fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    fn id(&self) -> Option<String> {
        self.attribute("id")
    }

    fn class_name(&self) -> Option<String> {
        self.attribute("class")
    }
}

/// Immutable in-memory element. Each node holds its parent, so a chain is
/// built root first.
///
/// ```
/// use at_tracker::{Element, ElementRef, StaticElement};
///
/// let html = StaticElement::document_root();
/// let body: ElementRef = StaticElement::new("body").child_of(&html);
/// let button: ElementRef = StaticElement::new("button")
///     .attr("action-name", "save")
///     .text("Save")
///     .child_of(&body);
/// assert_eq!(button.parent().unwrap().tag_name(), "body");
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticElement {
    tag: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    parent: Option<ElementRef>,
    root: bool,
}

impl StaticElement {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// The `<html>` element.
    #[must_use]
    pub fn document_root() -> ElementRef {
        Arc::new(Self {
            tag: "HTML".to_string(),
            root: true,
            ..Self::default()
        })
    }

    /// Set an attribute, replacing an existing value.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(attr, _)| *attr == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
        self
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Attach under `parent` and freeze.
    #[must_use]
    pub fn child_of(mut self, parent: &ElementRef) -> ElementRef {
        self.parent = Some(Arc::clone(parent));
        Arc::new(self)
    }

    /// Freeze without a parent (a detached element).
    #[must_use]
    pub fn detached(self) -> ElementRef {
        Arc::new(self)
    }
}

impl Element for StaticElement {
    fn tag_name(&self) -> String {
        self.tag.clone()
    }

    fn attributes(&self) -> Vec<(String, String)> {
        self.attributes.clone()
    }

    fn text_content(&self) -> Option<String> {
        self.text.clone()
    }

    fn parent(&self) -> Option<ElementRef> {
        self.parent.clone()
    }

    fn is_document_root(&self) -> bool {
        self.root
    }
}
