use crate::probe::Probe;

/// One strategy for finding a control whose identity is not guaranteed
/// stable across page variants. Strategies are tried in the order a
/// [`FieldSelector`] lists them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Stable element id.
    Id(String),
    /// Elements whose attribute contains a needle, case-insensitive.
    AttrContains {
        tag: String,
        attr: String,
        needle: String,
    },
    /// The nth element of a tag among its siblings, zero-based.
    Nth { tag: String, index: usize },
    /// Elements whose visible text or value attribute contains a needle.
    Text { tag: String, needle: String },
    /// Every element of a tag on the page.
    ScanAll { tag: String },
}

impl Locator {
    pub fn id(id: impl Into<String>) -> Self {
        Locator::Id(id.into())
    }

    pub fn attr_contains(
        tag: impl Into<String>,
        attr: impl Into<String>,
        needle: impl Into<String>,
    ) -> Self {
        Locator::AttrContains {
            tag: tag.into(),
            attr: attr.into(),
            needle: needle.into(),
        }
    }

    pub fn nth(tag: impl Into<String>, index: usize) -> Self {
        Locator::Nth {
            tag: tag.into(),
            index,
        }
    }

    pub fn text(tag: impl Into<String>, needle: impl Into<String>) -> Self {
        Locator::Text {
            tag: tag.into(),
            needle: needle.into(),
        }
    }

    pub fn scan_all(tag: impl Into<String>) -> Self {
        Locator::ScanAll { tag: tag.into() }
    }

    /// The CSS selector this locator lowers to. `Text` has no CSS form; it
    /// enumerates candidates and filters on their content.
    pub fn css(&self) -> Option<String> {
        match self {
            Locator::Id(id) => Some(format!("#{}", id)),
            Locator::AttrContains { tag, attr, needle } => {
                Some(format!("{}[{}*='{}' i]", tag, attr, css_escape(needle)))
            }
            Locator::Nth { tag, index } => Some(format!("{}:nth-of-type({})", tag, index + 1)),
            Locator::Text { .. } => None,
            Locator::ScanAll { tag } => Some(tag.clone()),
        }
    }

    /// Whether this locator is the full-page scan fallback.
    pub fn is_scan(&self) -> bool {
        matches!(self, Locator::ScanAll { .. })
    }
}

fn css_escape(needle: &str) -> String {
    needle.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Ordered candidate strategies for locating one control.
#[derive(Debug, Clone)]
pub struct FieldSelector {
    pub name: String,
    pub locators: Vec<Locator>,
}

impl FieldSelector {
    pub fn new(name: impl Into<String>, locators: Vec<Locator>) -> Self {
        Self {
            name: name.into(),
            locators,
        }
    }
}

/// Resolve a locator to candidate handles, in document order.
///
/// Probe failures count as "no candidates" here; the fallback chain decides
/// what happens next. This is the single resolver every field goes through.
pub async fn resolve<P: Probe>(probe: &P, locator: &Locator) -> Vec<P::Handle> {
    if let Locator::Text { tag, needle } = locator {
        return resolve_by_text(probe, tag, needle).await;
    }

    let Some(css) = locator.css() else {
        return Vec::new();
    };

    match probe.find_all(&css).await {
        Ok(handles) => handles,
        Err(e) => {
            tracing::debug!("Locator {:?} failed to resolve: {}", locator, e);
            Vec::new()
        }
    }
}

async fn resolve_by_text<P: Probe>(probe: &P, tag: &str, needle: &str) -> Vec<P::Handle> {
    let handles = match probe.find_all(tag).await {
        Ok(handles) => handles,
        Err(e) => {
            tracing::debug!("Text locator '{}' failed to enumerate: {}", needle, e);
            return Vec::new();
        }
    };

    let needle = needle.trim().to_lowercase();
    let mut matched = Vec::new();
    for handle in handles {
        let text = probe.text(&handle).await.unwrap_or_default();
        if text.to_lowercase().contains(&needle) {
            matched.push(handle);
            continue;
        }
        if let Ok(Some(value)) = probe.attr(&handle, "value").await
            && value.to_lowercase().contains(&needle)
        {
            matched.push(handle);
        }
    }
    matched
}
