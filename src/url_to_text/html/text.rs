//! Visible-text walker: turns a parsed page into ordered text blocks with
//! site chrome already removed.

use scraper::{ElementRef, Html, Node};

/// Text of one block-level element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    /// Lowercase tag of the innermost block element holding the text
    pub tag: String,
    /// For `li` blocks: whether the enclosing list is an `<ol>`
    pub ordered: bool,
    pub text: String,
}

/// Class or id tokens marking page furniture rather than content
const CHROME_TOKENS: &[&str] = &[
    "ad",
    "ads",
    "advert",
    "advertisement",
    "banner",
    "breadcrumb",
    "breadcrumbs",
    "comment",
    "comments",
    "cookie",
    "menu",
    "modal",
    "nav",
    "navbar",
    "newsletter",
    "popup",
    "related",
    "share",
    "sharing",
    "sidebar",
    "social",
    "subscribe",
    "widget",
];

fn should_skip_element(tag_name: &str) -> bool {
    matches!(
        tag_name,
        "head"
            | "script"
            | "style"
            | "noscript"
            | "iframe"
            | "canvas"
            | "svg"
            | "nav"
            | "header"
            | "footer"
            | "aside"
            | "form"
            | "button"
            | "select"
    )
}

fn is_hidden(element: &ElementRef) -> bool {
    let value = element.value();
    value.attr("hidden").is_some()
        || value.attr("aria-hidden") == Some("true")
        || value
            .attr("style")
            .map(|s| {
                let s = s.replace(' ', "");
                s.contains("display:none") || s.contains("visibility:hidden")
            })
            .unwrap_or(false)
}

/// Page-level containers carry theme classes such as `content-sidebar` that
/// describe the layout, not the element itself
fn is_page_container(tag: &str) -> bool {
    matches!(tag, "html" | "body" | "main" | "article")
}

fn is_chrome(tag: &str, element: &ElementRef) -> bool {
    if is_page_container(tag) {
        return false;
    }
    let value = element.value();
    value
        .classes()
        .chain(value.id())
        .flat_map(|name| name.split(['-', '_']))
        .any(|token| CHROME_TOKENS.contains(&token.to_ascii_lowercase().as_str()))
}

fn is_block_element(tag: &str) -> bool {
    matches!(
        tag,
        "address"
            | "article"
            | "blockquote"
            | "dd"
            | "div"
            | "dl"
            | "dt"
            | "fieldset"
            | "figcaption"
            | "figure"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "hr"
            | "li"
            | "main"
            | "ol"
            | "p"
            | "pre"
            | "section"
            | "table"
            | "td"
            | "th"
            | "tr"
            | "ul"
    )
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

struct Walker {
    blocks: Vec<TextBlock>,
    current: Vec<String>,
    /// (tag, ordered) of every open block element
    block_stack: Vec<(String, bool)>,
    /// `true` for each open `<ol>`, `false` for each open `<ul>`
    list_stack: Vec<bool>,
}

impl Walker {
    fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let text = normalize_whitespace(&self.current.join(" "));
        self.current.clear();
        if text.is_empty() {
            return;
        }
        let (tag, ordered) = self
            .block_stack
            .last()
            .cloned()
            .unwrap_or_else(|| ("body".to_string(), false));
        self.blocks.push(TextBlock { tag, ordered, text });
    }

    fn walk(&mut self, element: ElementRef) {
        let tag_name = element.value().name().to_ascii_lowercase();
        if should_skip_element(&tag_name)
            || is_hidden(&element)
            || is_chrome(&tag_name, &element)
        {
            return;
        }

        if tag_name == "br" {
            self.flush();
            return;
        }

        let block = is_block_element(&tag_name);
        if block {
            self.flush();
            let ordered = tag_name == "li" && self.list_stack.last().copied().unwrap_or(false);
            self.block_stack.push((tag_name.clone(), ordered));
        }
        match tag_name.as_str() {
            "ol" => self.list_stack.push(true),
            "ul" => self.list_stack.push(false),
            _ => {}
        }

        for child in element.children() {
            match child.value() {
                Node::Text(text) => {
                    let trimmed = normalize_whitespace(text);
                    if !trimmed.is_empty() {
                        self.current.push(trimmed);
                    }
                }
                Node::Element(_) => {
                    if let Some(child_ref) = ElementRef::wrap(child) {
                        self.walk(child_ref);
                    }
                }
                _ => {}
            }
        }

        if matches!(tag_name.as_str(), "ol" | "ul") {
            self.list_stack.pop();
        }
        if block {
            self.flush();
            self.block_stack.pop();
        }
    }
}

/// Visible text blocks of the document in reading order
pub fn text_blocks(document: &Html) -> Vec<TextBlock> {
    let mut walker = Walker {
        blocks: Vec::new(),
        current: Vec::new(),
        block_stack: Vec::new(),
        list_stack: Vec::new(),
    };
    walker.walk(document.root_element());
    walker.flush();
    walker.blocks
}

/// Cut `text` to at most `max_chars` characters on a char boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
