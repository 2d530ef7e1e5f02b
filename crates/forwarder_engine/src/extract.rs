use ego_tree::NodeRef;
use forwarder_core::{ContentBlock, ExtractedDocument, Inline, ListItem};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("unsupported message type \"{message_type}\"")]
    UnsupportedType { message_type: String },
}

/// Elements whose content never reaches the document: scripting,
/// presentation-only sections, and navigation chrome.
const SKIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "iframe", "template", "nav", "header", "footer", "aside",
];

/// Parse one raw message into a title and ordered content blocks.
///
/// Empty content yields an empty document for any type tag. Within a
/// supported dialect, parsing is error tolerant: unknown or malformed
/// markup degrades to plain text, never to a hard failure. Block order is
/// the document's reading order.
pub fn extract(message_type: &str, content: &str) -> Result<ExtractedDocument, ExtractError> {
    if content.trim().is_empty() {
        return Ok(ExtractedDocument::empty());
    }
    match message_type {
        "html" | "xhtml" | "text/html" | "application/xhtml+xml" => Ok(extract_html(content)),
        "text" | "plain" | "text/plain" => Ok(extract_plain(content)),
        other => Err(ExtractError::UnsupportedType {
            message_type: other.to_string(),
        }),
    }
}

fn extract_html(content: &str) -> ExtractedDocument {
    let doc = Html::parse_document(content);
    let mut collector = BlockCollector::default();
    for child in content_root(&doc).children() {
        collector.visit(child);
    }
    collector.flush_paragraph();

    let blocks = collector.blocks;
    let title = document_title(&doc, &blocks);
    ExtractedDocument { title, blocks }
}

fn content_root<'a>(doc: &'a Html) -> ElementRef<'a> {
    let body_sel = Selector::parse("body").ok();
    if let Some(sel) = body_sel.as_ref() {
        if let Some(node) = doc.select(sel).next() {
            return node;
        }
    }
    doc.root_element()
}

/// `<title>` text when present, else the first top-level heading.
fn document_title(doc: &Html, blocks: &[ContentBlock]) -> String {
    let title_sel = Selector::parse("title").ok();
    if let Some(sel) = title_sel.as_ref() {
        if let Some(node) = doc.select(sel).next() {
            let title = collapse_ws(&node.text().collect::<String>());
            if !title.is_empty() {
                return title;
            }
        }
    }
    blocks
        .iter()
        .find_map(|block| match block {
            ContentBlock::Heading { level: 1, .. } => Some(block.literal()),
            _ => None,
        })
        .unwrap_or_default()
}

#[derive(Default)]
struct BlockCollector {
    blocks: Vec<ContentBlock>,
    inline: InlineBuilder,
}

impl BlockCollector {
    fn visit(&mut self, node: NodeRef<'_, Node>) {
        match node.value() {
            Node::Text(text) => self.inline.push_text(text),
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(node) {
                    self.visit_element(element);
                }
            }
            _ => {
                for child in node.children() {
                    self.visit(child);
                }
            }
        }
    }

    fn visit_element(&mut self, element: ElementRef<'_>) {
        let tag = element.value().name().to_ascii_lowercase();
        match tag.as_str() {
            t if SKIP_TAGS.contains(&t) => {}
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.flush_paragraph();
                let level = tag.as_bytes()[1] - b'0';
                let spans = collect_inlines(element);
                if !spans.is_empty() {
                    self.blocks.push(ContentBlock::Heading { level, spans });
                }
            }
            "ul" | "ol" => {
                self.flush_paragraph();
                let items: Vec<ListItem> = element
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|el| el.value().name().eq_ignore_ascii_case("li"))
                    .map(|li| ListItem {
                        spans: collect_inlines(li),
                    })
                    .filter(|item| !item.spans.is_empty())
                    .collect();
                if !items.is_empty() {
                    self.blocks.push(ContentBlock::List {
                        ordered: tag == "ol",
                        items,
                    });
                }
            }
            "pre" => {
                self.flush_paragraph();
                let code = element.text().collect::<String>();
                let code = code.trim_matches('\n').to_string();
                if !code.is_empty() {
                    self.blocks.push(ContentBlock::CodeBlock {
                        language: code_language(element),
                        code,
                    });
                }
            }
            // Block containers start a fresh paragraph on both edges. A
            // stray li outside a list is treated the same way.
            "p" | "div" | "section" | "article" | "main" | "blockquote" | "figure"
            | "figcaption" | "table" | "tr" | "td" | "th" | "address" | "li" => {
                self.flush_paragraph();
                for child in element.children() {
                    self.visit(child);
                }
                self.flush_paragraph();
            }
            _ => {
                if !inline_element(element, &mut self.inline) {
                    for child in element.children() {
                        self.visit(child);
                    }
                }
            }
        }
    }

    fn flush_paragraph(&mut self) {
        let spans = std::mem::take(&mut self.inline).finish();
        if !spans.is_empty() {
            self.blocks.push(ContentBlock::Paragraph { spans });
        }
    }
}

/// Handle one inline-level element, pushing a span onto `builder`.
/// Returns false when the tag is not an inline span, leaving the caller to
/// recurse (unknown nested markup contributes its text as plain spans).
fn inline_element(element: ElementRef<'_>, builder: &mut InlineBuilder) -> bool {
    let tag = element.value().name().to_ascii_lowercase();
    match tag.as_str() {
        "b" | "strong" => {
            let text = collapsed_text(element);
            if !text.is_empty() {
                builder.push_span(Inline::Strong(text));
            }
            true
        }
        "i" | "em" => {
            let text = collapsed_text(element);
            if !text.is_empty() {
                builder.push_span(Inline::Emphasis(text));
            }
            true
        }
        "code" => {
            let text = element.text().collect::<String>();
            let text = text.trim().to_string();
            if !text.is_empty() {
                builder.push_span(Inline::Code(text));
            }
            true
        }
        "a" => {
            let href = element
                .value()
                .attr("href")
                .map(str::trim)
                .filter(|href| !href.is_empty());
            match href {
                Some(href) => {
                    let label = collapsed_text(element);
                    if !label.is_empty() {
                        builder.push_span(Inline::Link {
                            label,
                            href: href.to_string(),
                        });
                    }
                    true
                }
                // An anchor without a target is just styled text.
                None => false,
            }
        }
        "br" => {
            builder.push_text("\n");
            true
        }
        "img" => true,
        _ => false,
    }
}

fn collect_inlines(element: ElementRef<'_>) -> Vec<Inline> {
    let mut builder = InlineBuilder::default();
    collect_into(element, &mut builder);
    builder.finish()
}

fn collect_into(element: ElementRef<'_>, builder: &mut InlineBuilder) {
    for node in element.children() {
        match node.value() {
            Node::Text(text) => builder.push_text(text),
            Node::Element(_) => {
                let Some(el) = ElementRef::wrap(node) else {
                    continue;
                };
                let tag = el.value().name().to_ascii_lowercase();
                if SKIP_TAGS.contains(&tag.as_str()) {
                    continue;
                }
                if !inline_element(el, builder) {
                    collect_into(el, builder);
                }
            }
            _ => {}
        }
    }
}

/// Accumulates inline spans for one block, collapsing whitespace runs to a
/// single space as it goes.
#[derive(Default)]
struct InlineBuilder {
    spans: Vec<Inline>,
    text: String,
}

impl InlineBuilder {
    fn push_text(&mut self, raw: &str) {
        for ch in raw.chars() {
            if ch.is_whitespace() {
                if !self.ends_with_space() {
                    self.text.push(' ');
                }
            } else {
                self.text.push(ch);
            }
        }
    }

    fn ends_with_space(&self) -> bool {
        if self.text.is_empty() {
            // Leading whitespace at the start of a block is dropped;
            // whitespace right after a styled span is kept.
            self.spans.is_empty()
        } else {
            self.text.ends_with(' ')
        }
    }

    fn push_span(&mut self, span: Inline) {
        self.flush_text();
        self.spans.push(span);
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            self.spans.push(Inline::Text(std::mem::take(&mut self.text)));
        }
    }

    fn finish(mut self) -> Vec<Inline> {
        self.flush_text();
        if let Some(Inline::Text(first)) = self.spans.first_mut() {
            *first = first.trim_start().to_string();
        }
        if let Some(Inline::Text(last)) = self.spans.last_mut() {
            *last = last.trim_end().to_string();
        }
        self.spans
            .retain(|span| !matches!(span, Inline::Text(text) if text.is_empty()));
        self.spans
    }
}

fn collapsed_text(element: ElementRef<'_>) -> String {
    collapse_ws(&element.text().collect::<String>())
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn code_language(pre: ElementRef<'_>) -> Option<String> {
    pre.children()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name().eq_ignore_ascii_case("code"))
        .and_then(|code| code.value().attr("class"))
        .and_then(|class| {
            class
                .split_whitespace()
                .find_map(|c| c.strip_prefix("language-").map(str::to_string))
        })
}

fn extract_plain(content: &str) -> ExtractedDocument {
    let content = content.replace("\r\n", "\n");
    let chunks: Vec<String> = content
        .split("\n\n")
        .map(collapse_ws)
        .filter(|chunk| !chunk.is_empty())
        .collect();

    // The first chunk doubles as the title when it is a single line
    // followed by more content.
    let title = match content.split_once("\n\n") {
        Some((first, _)) if chunks.len() > 1 && !first.trim().contains('\n') => {
            chunks[0].clone()
        }
        _ => String::new(),
    };

    let blocks = chunks
        .into_iter()
        .map(|text| ContentBlock::Paragraph {
            spans: vec![Inline::Text(text)],
        })
        .collect();
    ExtractedDocument { title, blocks }
}
