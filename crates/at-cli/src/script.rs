//! Replay scripts: one JSON step object per line.
//!
//! ```text
//! {"step":"page","url":"https://shop.test/cart","title":"Cart"}
//! {"step":"click","path":[{"tag":"main"},{"tag":"button","attributes":{"action-name":"checkout"}}],"x":10,"y":20}
//! {"step":"activity","kind":"scroll"}
//! {"step":"wait","ms":250}
//! {"step":"hide"}
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, bail};
use serde::Deserialize;

use at_core::PageSnapshot;
use at_tracker::{ElementRef, HostSignal, StaticElement};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Replace the host page state.
    Page(PageSpec),
    /// Click the last element of `path`. Elements are listed outermost
    /// first; the document root is implied.
    Click {
        path: Vec<ElementSpec>,
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
    },
    Activity {
        kind: ActivityKind,
    },
    /// Report an action directly, without an element.
    Track {
        name: String,
    },
    Wait {
        ms: u64,
    },
    Hide,
    Show,
    Flush,
    Unload,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageSpec {
    pub url: String,
    /// Defaults to the path component of `url`.
    pub path: Option<String>,
    pub referrer: String,
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl PageSpec {
    pub fn snapshot(&self) -> PageSnapshot {
        let path = self.path.clone().unwrap_or_else(|| {
            reqwest::Url::parse(&self.url)
                .map(|url| url.path().to_string())
                .unwrap_or_default()
        });
        PageSnapshot {
            url: self.url.clone(),
            path,
            referrer: self.referrer.clone(),
            title: self.title.clone(),
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ElementSpec {
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Move,
    Scroll,
    Key,
    Touch,
}

impl ActivityKind {
    pub fn signal(self) -> HostSignal {
        match self {
            Self::Move => HostSignal::PointerMove,
            Self::Scroll => HostSignal::Scroll,
            Self::Key => HostSignal::KeyDown,
            Self::Touch => HostSignal::TouchStart,
        }
    }
}

/// Build the element chain under a fresh document root and return the
/// innermost element.
pub fn build_target(path: &[ElementSpec]) -> ElementRef {
    let mut current = StaticElement::document_root();
    for spec in path {
        let mut element = StaticElement::new(spec.tag.clone());
        for (name, value) in &spec.attributes {
            element = element.attr(name.clone(), value.clone());
        }
        if let Some(text) = &spec.text {
            element = element.text(text.clone());
        }
        current = element.child_of(&current);
    }
    current
}

/// Read every step from a script file.
pub fn load(path: &Path) -> anyhow::Result<Vec<Step>> {
    let file = File::open(path).with_context(|| format!("failed to open script {}", path.display()))?;
    parse(BufReader::new(file)).with_context(|| format!("invalid script {}", path.display()))
}

/// Parse steps from JSON lines. Click steps must name at least one element.
pub fn parse(reader: impl BufRead) -> anyhow::Result<Vec<Step>> {
    let mut steps = Vec::new();
    for (index, step) in serde_jsonlines::JsonLinesReader::new(reader)
        .read_all::<Step>()
        .enumerate()
    {
        let line = index + 1;
        let step = step.with_context(|| format!("line {line}"))?;
        if let Step::Click { path, .. } = &step {
            if path.is_empty() {
                bail!("line {line}: click step needs a non-empty path");
            }
        }
        steps.push(step);
    }
    Ok(steps)
}
