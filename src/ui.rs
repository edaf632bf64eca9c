//! Presentation payload builders.
//!
//! The agent platform renders the `ui` field of a tool response as a tree of
//! components. Each node is `{ "type": ..., "props": {...}, "children": [...] }`.
//! The builders here only assemble that tree; they don't validate it against
//! whatever renderer ends up consuming it.

use serde_json::{Map, Value, json};

fn node(kind: &str, props: Map<String, Value>, children: Vec<Value>) -> Value {
    json!({
        "type": kind,
        "props": Value::Object(props),
        "children": children,
    })
}

#[derive(Debug, Default)]
pub struct CardBuilder {
    props: Map<String, Value>,
    children: Vec<Value>,
}

impl CardBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders the card as a full page instead of inline.
    pub fn page(mut self) -> Self {
        self.props.insert("renderMode".into(), Value::from("page"));
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.props.insert("title".into(), Value::from(title.into()));
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.props
            .insert("content".into(), Value::from(content.into()));
        self
    }

    pub fn child(mut self, child: Value) -> Self {
        self.children.push(child);
        self
    }

    pub fn build(self) -> Value {
        node("card", self.props, self.children)
    }
}

#[derive(Debug)]
pub struct ImageCardBuilder {
    props: Map<String, Value>,
}

impl ImageCardBuilder {
    pub fn new(image_url: impl Into<String>) -> Self {
        let mut props = Map::new();
        props.insert("imageUrl".into(), Value::from(image_url.into()));
        Self { props }
    }

    pub fn aspect_ratio(mut self, ratio: &str) -> Self {
        self.props.insert("aspectRatio".into(), Value::from(ratio));
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.props.insert("title".into(), Value::from(title.into()));
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.props
            .insert("description".into(), Value::from(description.into()));
        self
    }

    pub fn image_alt(mut self, alt: impl Into<String>) -> Self {
        self.props.insert("imageAlt".into(), Value::from(alt.into()));
        self
    }

    pub fn build(self) -> Value {
        node("imageCard", self.props, Vec::new())
    }
}

#[derive(Debug, Default)]
pub struct ImageGalleryBuilder {
    props: Map<String, Value>,
    images: Vec<Value>,
}

impl ImageGalleryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.props.insert("title".into(), Value::from(title.into()));
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.props
            .insert("description".into(), Value::from(description.into()));
        self
    }

    pub fn images<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.images
            .extend(urls.into_iter().map(|url| json!({ "url": url.into() })));
        self
    }

    pub fn columns(mut self, columns: u32) -> Self {
        self.props.insert("columns".into(), Value::from(columns));
        self
    }

    pub fn build(mut self) -> Value {
        self.props.insert("images".into(), Value::Array(self.images));
        node("imageGallery", self.props, Vec::new())
    }
}

/// Card shown for every failed tool call.
pub fn error_card() -> Value {
    CardBuilder::new()
        .title("Error")
        .content("Unable to fetch spotify data.")
        .build()
}
