//! Page geometry snapshot types.

use serde::{Deserialize, Serialize};

/// Visible viewport size in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Bounding box relative to the viewport's top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Height of the overlap with the vertical band `top..bottom`.
    pub fn vertical_overlap(&self, top: f64, bottom: f64) -> f64 {
        (self.bottom().min(bottom) - self.top.max(top)).max(0.0)
    }
}

/// CSS positioning scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    #[default]
    Static,
    Relative,
    Absolute,
    Fixed,
    Sticky,
}

impl Position {
    /// Whether the element stays put while the page scrolls.
    pub fn is_pinned(&self) -> bool {
        matches!(self, Self::Fixed | Self::Sticky)
    }
}

fn default_opacity() -> f64 {
    1.0
}

/// One element of the page and its descendants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSnapshot {
    /// Lowercase tag name.
    pub tag: String,
    pub rect: Rect,
    #[serde(default)]
    pub position: Position,
    /// `display: none`, `visibility: hidden` or the `hidden` attribute.
    #[serde(default)]
    pub hidden: bool,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Rendered text of the element including descendants.
    #[serde(default)]
    pub text: String,
    /// Carries a `data-section` style attribute marking it as a content region.
    #[serde(default)]
    pub data_section: bool,
    #[serde(default)]
    pub children: Vec<ElementSnapshot>,
}

impl ElementSnapshot {
    pub fn new(tag: impl Into<String>, rect: Rect) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            rect,
            position: Position::Static,
            hidden: false,
            opacity: default_opacity(),
            text: String::new(),
            data_section: false,
            children: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn data_section(mut self) -> Self {
        self.data_section = true;
        self
    }

    pub fn with_child(mut self, child: ElementSnapshot) -> Self {
        self.children.push(child);
        self
    }

    /// Rendered and not fully transparent.
    pub fn is_visible(&self) -> bool {
        !self.hidden && self.opacity > 0.0
    }

    /// Depth-first iterator over this element and all descendants.
    pub fn descendants(&self) -> Box<dyn Iterator<Item = &ElementSnapshot> + '_> {
        Box::new(std::iter::once(self).chain(self.children.iter().flat_map(|c| c.descendants())))
    }
}

/// Geometry of a page at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub viewport: Viewport,
    /// Full text of the document body.
    #[serde(default)]
    pub body_text: String,
    /// Top-level elements.
    #[serde(default)]
    pub elements: Vec<ElementSnapshot>,
}

impl PageSnapshot {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Default::default()
        }
    }

    pub fn with_body_text(mut self, text: impl Into<String>) -> Self {
        self.body_text = text.into();
        self
    }

    pub fn with_element(mut self, element: ElementSnapshot) -> Self {
        self.elements.push(element);
        self
    }

    /// Every element in document order.
    pub fn all_elements(&self) -> impl Iterator<Item = &ElementSnapshot> {
        self.elements.iter().flat_map(|e| e.descendants())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertical_overlap() {
        let rect = Rect::new(100.0, 0.0, 10.0, 200.0);
        assert_eq!(rect.vertical_overlap(0.0, 800.0), 200.0);
        assert_eq!(rect.vertical_overlap(150.0, 800.0), 150.0);
        assert_eq!(rect.vertical_overlap(400.0, 800.0), 0.0);
    }

    #[test]
    fn test_all_elements_document_order() {
        let snapshot = PageSnapshot::new(Viewport::new(100.0, 100.0))
            .with_element(
                ElementSnapshot::new("SECTION", Rect::default())
                    .with_child(ElementSnapshot::new("h2", Rect::default()))
                    .with_child(ElementSnapshot::new("p", Rect::default())),
            )
            .with_element(ElementSnapshot::new("footer", Rect::default()));

        let tags: Vec<&str> = snapshot.all_elements().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["section", "h2", "p", "footer"]);
    }

    #[test]
    fn test_deserialize_defaults() {
        let element: ElementSnapshot = serde_json::from_str(
            r#"{"tag": "div", "rect": {"top": 0, "left": 0, "width": 10, "height": 10}}"#,
        )
        .unwrap();
        assert_eq!(element.position, Position::Static);
        assert_eq!(element.opacity, 1.0);
        assert!(element.is_visible());

        let pinned: ElementSnapshot = serde_json::from_str(
            r#"{"tag": "nav", "position": "sticky", "rect": {"top": 0, "left": 0, "width": 10, "height": 10}}"#,
        )
        .unwrap();
        assert!(pinned.position.is_pinned());
    }
}
