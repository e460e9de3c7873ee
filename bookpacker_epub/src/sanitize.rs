//! Render titles for the different places they are embedded.
use bookpacker_common::{unescape_html_entities, WORD_JOINER};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TAG_RX: Regex = Regex::new(r"<[^>]+>").unwrap();
    static ref SPACES_RX: Regex = Regex::new(r" {2,}").unwrap();
}

/// Where a title is going to be embedded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleContext {
    /// the value of an xml attribute; quotes are escaped
    Attribute,
    /// the content of an xml element
    Element,
    /// the title as given, markup and all
    Raw,
    /// plain text, with html entities decoded
    Plain,
}

impl Default for TitleContext {
    fn default() -> Self {
        TitleContext::Plain
    }
}

/// remove inline tags and collapse the whitespace they leave behind
fn strip_tags(title: &str) -> String {
    let stripped = TAG_RX.replace_all(title, "");
    let collapsed = SPACES_RX.replace_all(&stripped, " ");
    collapsed.trim().to_string()
}

/// Render `title` for embedding in `context`.
/// The word joiner is removed in every context.
/// ```
/// # use bookpacker_epub::{sanitized_title, TitleContext};
/// assert_eq!(sanitized_title("Tom <em>&amp;</em> Jerry", TitleContext::Plain), "Tom & Jerry");
/// ```
pub fn sanitized_title(title: &str, context: TitleContext) -> String {
    let rendered = match context {
        TitleContext::Attribute => strip_tags(title).replace('"', "&quot;"),
        TitleContext::Element => strip_tags(title),
        TitleContext::Raw => title.to_string(),
        TitleContext::Plain => unescape_html_entities(strip_tags(title)).into_owned(),
    };
    rendered.chars().filter(|c| *c != WORD_JOINER).collect()
}
