use serde::Deserialize;

/// One raw item pulled from a source: a markup dialect tag plus the payload.
///
/// Messages have no identity beyond their position in the stream and are
/// consumed exactly once by the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawMessage {
    #[serde(rename = "type")]
    pub message_type: String,
    pub content: String,
}

impl RawMessage {
    pub fn new(message_type: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            message_type: message_type.into(),
            content: content.into(),
        }
    }
}

/// Inline span inside a paragraph, heading, or list item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Strong(String),
    Emphasis(String),
    Code(String),
    Link { label: String, href: String },
}

impl Inline {
    /// The literal text carried by the span, ignoring its styling.
    pub fn literal(&self) -> &str {
        match self {
            Inline::Text(text)
            | Inline::Strong(text)
            | Inline::Emphasis(text)
            | Inline::Code(text) => text,
            Inline::Link { label, .. } => label,
        }
    }
}

/// One entry of an ordered or unordered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub spans: Vec<Inline>,
}

/// One semantic unit of extracted document structure.
///
/// The sequence order of blocks is the document's reading order and is
/// preserved through transformation into the rendered body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    /// Section heading. Levels outside 1..=6 are rejected by the renderer;
    /// the extractor clamps into that range.
    Heading { level: u8, spans: Vec<Inline> },
    Paragraph { spans: Vec<Inline> },
    List { ordered: bool, items: Vec<ListItem> },
    CodeBlock { language: Option<String>, code: String },
}

impl ContentBlock {
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        ContentBlock::Heading {
            level,
            spans: vec![Inline::Text(text.into())],
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        ContentBlock::Paragraph {
            spans: vec![Inline::Text(text.into())],
        }
    }

    /// Flattened literal text of the block, used for logging previews.
    pub fn literal(&self) -> String {
        match self {
            ContentBlock::Heading { spans, .. } | ContentBlock::Paragraph { spans } => {
                spans.iter().map(Inline::literal).collect()
            }
            ContentBlock::List { items, .. } => items
                .iter()
                .map(|item| item.spans.iter().map(Inline::literal).collect::<String>())
                .collect::<Vec<_>>()
                .join("\n"),
            ContentBlock::CodeBlock { code, .. } => code.clone(),
        }
    }
}

/// Output of extraction; lives only while one message is processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub title: String,
    pub blocks: Vec<ContentBlock>,
}

impl ExtractedDocument {
    pub fn empty() -> Self {
        Self {
            title: String::new(),
            blocks: Vec::new(),
        }
    }
}

/// Output of transformation, handed to the sink and then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub title: String,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn raw_message_deserializes_from_json_line() {
        let msg: RawMessage =
            serde_json::from_str(r#"{"type":"html","content":"<p>hi</p>"}"#).unwrap();
        assert_eq!(msg, RawMessage::new("html", "<p>hi</p>"));
    }

    #[test]
    fn block_literal_flattens_spans() {
        let block = ContentBlock::Paragraph {
            spans: vec![
                Inline::Text("Hello ".into()),
                Inline::Strong("world".into()),
            ],
        };
        assert_eq!(block.literal(), "Hello world");
    }

    #[test]
    fn list_literal_joins_items() {
        let block = ContentBlock::List {
            ordered: false,
            items: vec![
                ListItem {
                    spans: vec![Inline::Text("a".into())],
                },
                ListItem {
                    spans: vec![Inline::Link {
                        label: "b".into(),
                        href: "https://example.com".into(),
                    }],
                },
            ],
        };
        assert_eq!(block.literal(), "a\nb");
    }
}
