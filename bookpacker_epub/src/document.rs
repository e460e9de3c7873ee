//! The document model handed to the packager.
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// The publication as a whole
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// A stable unique identifier; a `urn:uuid:` is generated if this is absent
    pub id: Option<String>,
    /// The language code; `en` if absent
    pub lang: Option<String>,
    /// The title, which may carry inline markup
    pub title: String,
    /// A comma delimited list of author names
    pub authors: Option<String>,
    /// The principal author
    pub author: Option<String>,
    /// Credited as creator when a producer is also given
    pub creator: Option<String>,
    /// The producer, who is also the publisher
    pub producer: Option<String>,
    /// The revision date, written as given
    pub revdate: Option<String>,
    /// A short description
    pub description: Option<String>,
    /// A comma delimited list of keywords
    pub keywords: Option<String>,
    /// A reference to the source of the document
    pub source: Option<String>,
    /// The rights statement
    pub copyright: Option<String>,
    /// The images directory, relative to `docdir`
    pub imagesdir: String,
    /// The directory relative to which document files are resolved
    pub docdir: PathBuf,
    /// The base name of the archive
    pub docname: String,
    /// Either a plain path or an inline image macro, `image:<path>[<alt>,<width>,<height>]`
    pub front_cover_image: Option<String>,
    /// The script set used to select fonts
    pub scripts: String,
}

impl Document {
    /// A document with the given archive name and title, and defaults otherwise
    pub fn new<S: ToString, T: ToString>(docname: S, title: T) -> Self {
        Document {
            id: None,
            lang: None,
            title: title.to_string(),
            authors: None,
            author: None,
            creator: None,
            producer: None,
            revdate: None,
            description: None,
            keywords: None,
            source: None,
            copyright: None,
            imagesdir: String::from("."),
            docdir: PathBuf::from("."),
            docname: docname.to_string(),
            front_cover_image: None,
            scripts: String::from("latin"),
        }
    }

    /// The images directory as a prefix for logical paths:
    /// empty for the current directory, otherwise with a trailing slash
    pub fn imagesdir_prefix(&self) -> String {
        imagesdir_prefix(&self.imagesdir)
    }

    /// The language code, or `en`
    pub fn lang_or_default(&self) -> &str {
        self.lang.as_deref().unwrap_or("en")
    }
}

pub(crate) fn imagesdir_prefix(imagesdir: &str) -> String {
    let trimmed = imagesdir.trim_end_matches('/');
    if trimmed.is_empty() || trimmed == "." {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}

/// An image embedded in a spine item
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Image {
    /// The path of the image relative to its item's images directory
    pub target: String,
}

impl Image {
    /// An image at `target`
    pub fn new<S: ToString>(target: S) -> Self {
        Image {
            target: target.to_string(),
        }
    }
}

/// One chapter or fragment of the document
#[derive(Debug, Clone, PartialEq)]
pub struct SpineItem {
    /// Used to name the item's file, as `<docname>.xhtml`
    pub docname: String,
    /// The title, which may carry inline markup
    pub title: String,
    /// The converted content
    pub content: String,
    /// Overrides the document's images directory for this item's images
    pub imagesdir: Option<String>,
    /// Used to find this item's avatar image
    pub username: Option<String>,
    /// The author of this item alone
    pub author: Option<String>,
    /// manifest properties this item needs, such as `svg`
    pub epub_properties: Vec<String>,
    /// The images this item refers to
    pub images: Vec<Image>,
}

impl SpineItem {
    /// An item with no images, properties or people attached
    pub fn new<S: ToString, T: ToString, C: ToString>(docname: S, title: T, content: C) -> Self {
        SpineItem {
            docname: docname.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            imagesdir: None,
            username: None,
            author: None,
            epub_properties: Vec::new(),
            images: Vec::new(),
        }
    }

    /// The name of this item's file within the container
    pub fn output_path(&self) -> String {
        format!("{}.xhtml", self.docname)
    }

    /// Does this item declare the manifest property `property`?
    pub fn has_property(&self, property: &str) -> bool {
        self.epub_properties.iter().any(|p| p == property)
    }
}

/// The kind of package to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetFormat {
    /// A standard epub 3 package
    Standard,
    /// An epub tuned for the Kindle engine, distilled to mobi
    Legacy,
}

impl Default for TargetFormat {
    fn default() -> Self {
        TargetFormat::Standard
    }
}

impl TargetFormat {
    /// The suffix added to the archive name
    pub const fn archive_suffix(&self) -> &'static str {
        match self {
            TargetFormat::Standard => "",
            TargetFormat::Legacy => "-legacy",
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetFormat::Standard => write!(f, "EPUB3"),
            TargetFormat::Legacy => write!(f, "LEGACY"),
        }
    }
}

impl FromStr for TargetFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" | "epub3" => Ok(TargetFormat::Standard),
            "legacy" | "kf8" => Ok(TargetFormat::Legacy),
            other => Err(format!("unknown target format: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_imagesdir_prefix() {
        assert_eq!(imagesdir_prefix("."), "");
        assert_eq!(imagesdir_prefix("./"), "");
        assert_eq!(imagesdir_prefix(""), "");
        assert_eq!(imagesdir_prefix("images"), "images/");
        assert_eq!(imagesdir_prefix("images/"), "images/");
    }

    #[test]
    fn test_target_format() {
        assert_eq!("standard".parse::<TargetFormat>(), Ok(TargetFormat::Standard));
        assert_eq!("KF8".parse::<TargetFormat>(), Ok(TargetFormat::Legacy));
        assert!("pdf".parse::<TargetFormat>().is_err());
        assert_eq!(TargetFormat::Legacy.to_string(), "LEGACY");
        assert_eq!(TargetFormat::Legacy.archive_suffix(), "-legacy");
    }

    #[test]
    fn test_item_paths() {
        let mut item = SpineItem::new("intro", "Introduction", "<p>Hi</p>");
        item.epub_properties.push("svg".into());
        assert_eq!(item.output_path(), "intro.xhtml");
        assert!(item.has_property("svg"));
        assert!(!item.has_property("mathml"));
    }
}
