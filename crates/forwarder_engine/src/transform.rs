use forwarder_core::{ContentBlock, Inline, ListItem};

/// Code spans up to this length (and without newlines) stay inline;
/// anything longer breaks out into a fence.
const INLINE_CODE_LIMIT: usize = 80;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("heading level {level} is outside 1..=6")]
    HeadingLevel { level: u8 },
}

/// Renders an ordered block sequence into a markdown body.
///
/// Stateless and pure: the same block sequence always yields the same
/// output, and well-formed extractor output never fails here. The only
/// error case is structurally invalid data the extractor cannot produce.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownTransform;

impl MarkdownTransform {
    pub fn new() -> Self {
        Self
    }

    pub fn transform(&self, blocks: &[ContentBlock]) -> Result<String, RenderError> {
        let mut rendered = Vec::with_capacity(blocks.len());
        for block in blocks {
            let text = self.render_block(block)?;
            if !text.is_empty() {
                rendered.push(text);
            }
        }
        if rendered.is_empty() {
            return Ok(String::new());
        }
        Ok(format!("{}\n", rendered.join("\n\n")))
    }

    fn render_block(&self, block: &ContentBlock) -> Result<String, RenderError> {
        match block {
            ContentBlock::Heading { level, spans } => {
                if !(1..=6).contains(level) {
                    return Err(RenderError::HeadingLevel { level: *level });
                }
                Ok(format!(
                    "{} {}",
                    "#".repeat(*level as usize),
                    render_spans(spans)
                ))
            }
            ContentBlock::Paragraph { spans } => Ok(render_spans(spans)),
            ContentBlock::List { ordered, items } => Ok(render_list(*ordered, items)),
            ContentBlock::CodeBlock { language, code } => {
                Ok(render_fence(language.as_deref(), code))
            }
        }
    }
}

fn render_spans(spans: &[Inline]) -> String {
    spans
        .iter()
        .map(|span| match span {
            Inline::Text(text) => escape_text(text),
            Inline::Strong(text) => format!("**{}**", escape_text(text)),
            Inline::Emphasis(text) => format!("*{}*", escape_text(text)),
            Inline::Code(code) => render_code_span(code),
            Inline::Link { label, href } => {
                format!("[{}]({})", escape_text(label), escape_target(href))
            }
        })
        .collect()
}

fn render_list(ordered: bool, items: &[ListItem]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let prefix = if ordered {
                format!("{}. ", index + 1)
            } else {
                "- ".to_string()
            };
            format!("{prefix}{}", render_spans(&item.spans))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_code_span(code: &str) -> String {
    if code.contains('\n') || code.len() > INLINE_CODE_LIMIT {
        return format!("\n{}\n", render_fence(None, code));
    }
    let delim = "`".repeat(longest_backtick_run(code) + 1);
    if code.starts_with('`') || code.ends_with('`') {
        // CommonMark strips one leading/trailing space inside code spans.
        format!("{delim} {code} {delim}")
    } else {
        format!("{delim}{code}{delim}")
    }
}

fn render_fence(language: Option<&str>, code: &str) -> String {
    let fence = "`".repeat((longest_backtick_run(code) + 1).max(3));
    format!("{fence}{}\n{code}\n{fence}", language.unwrap_or(""))
}

fn longest_backtick_run(s: &str) -> usize {
    let mut longest = 0;
    let mut run = 0;
    for ch in s.chars() {
        if ch == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    longest
}

/// Backslash-escape characters that are syntactically significant in
/// markdown wherever they appear in literal text, so re-parsing the
/// rendered body yields the original text back as plain text.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '`' | '*' | '_' | '[' | ']' | '#') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Link targets cannot be backslash-escaped; percent-encode the characters
/// that would close or split the destination.
fn escape_target(href: &str) -> String {
    href.replace(' ', "%20")
        .replace('(', "%28")
        .replace(')', "%29")
}
