//! Bundle xhtml, resources and metadata into standards-compliant epub 3 containers.
//!
//! An [`EpubSource`] is filled with metadata, resources and content documents, and is
//! then bundled into the bytes of a zip container with the `mimetype` entry first and
//! stored uncompressed. Content documents are placed in the spine in the order in which
//! they are held by the source; callers which need a particular document at a particular
//! position should use [`EpubSource::insert_content`], and can give a document an explicit
//! manifest identifier with [`EpubContent::with_id`].
#![deny(dead_code)]
#![deny(unreachable_patterns)]
#![deny(unused_extern_crates)]
#![deny(unused_imports)]
#![deny(unused_qualifications)]
#![deny(clippy::all)]
#![deny(missing_debug_implementations)]
#![deny(variant_size_differences)]

use bookpacker_common::{GuessMimeType, MimeType, MimeTypeHelper};
use epub_metadata::{ItemProperty, MarcRelator};
use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
mod builder;
mod toc;
pub use builder::{EpubBundlingError, ManifestItem, SpineElement};

lazy_static! {
    static ref HREF_REGEX: Regex = Regex::new(r"<a\b[^>]*?>(?P<link_text>.+?)</a>").unwrap();
}

/// A resource of some kind (i.e. something other than textual content,
/// such as an image, css, fonts, etc)
#[derive(Debug, Clone, PartialEq, Hash, Eq)]
pub struct EpubResource {
    /// the path to write the resource to within the epub
    pub output_path: PathBuf,
    pub data: Vec<u8>,
    pub mimetype: MimeType,
    pub properties: Vec<ItemProperty>,
}

impl EpubResource {
    /// Read `source` from disk, to be written to `output_path` within the epub.
    /// The mimetype is guessed from the output path.
    pub fn from_file<P: AsRef<Path>, Q: Into<PathBuf>>(
        source: P,
        output_path: Q,
    ) -> Result<Self, EpubBundlingError> {
        let source = source.as_ref();
        let data = std::fs::read(source).map_err(|e| EpubBundlingError::Io {
            path: source.to_path_buf(),
            source: e,
        })?;
        Self::from_data(output_path, data)
    }

    /// Wrap `data` already in memory, to be written to `output_path` within the epub
    pub fn from_data<Q: Into<PathBuf>>(
        output_path: Q,
        data: Vec<u8>,
    ) -> Result<Self, EpubBundlingError> {
        let output_path = output_path.into();
        match output_path.guess_mime() {
            Some(mimetype) if mimetype.is_epub_supported_resource() => Ok(EpubResource {
                output_path,
                data,
                mimetype,
                properties: Vec::new(),
            }),
            _ => Err(EpubBundlingError::UnsupportedResource(output_path)),
        }
    }

    /// Add a manifest property to this resource
    pub fn with_property(mut self, property: ItemProperty) -> Self {
        if !self.properties.contains(&property) {
            self.properties.push(property);
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Hash)]
pub struct TocEntry {
    /// the relative level of this entry, where lower is higher.
    pub level: usize,
    /// the plain text to display in the toc entry
    pub title: String,
}

/// A single piece of textual content;
#[derive(Debug, Clone)]
pub struct EpubContent {
    /// An xhtml string
    pub data: String,
    /// the path to write the content to within the epub
    pub output_path: PathBuf,
    /// an explicit manifest id; one is generated if this is `None`
    pub id: Option<String>,
    /// how to display in table of contents
    pub toc_entry: Option<TocEntry>,
    /// manifest properties, such as `svg`
    pub properties: Vec<ItemProperty>,
    /// whether this content is part of the default reading order
    pub linear: bool,
}

fn replace_links(text: &str) -> Cow<'_, str> {
    HREF_REGEX.replace_all(text, r"$link_text")
}

impl EpubContent {
    pub fn new<P: Into<PathBuf>, S: ToString>(output_path: P, xhtml: S) -> Self {
        EpubContent {
            data: xhtml.to_string(),
            output_path: output_path.into(),
            id: None,
            toc_entry: None,
            properties: Vec::new(),
            linear: true,
        }
    }

    /// Give this content an explicit manifest identifier
    pub fn with_id<S: ToString>(mut self, id: S) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Mark this content as having an embedded svg image.
    pub fn does_include_svg(&mut self) -> &mut Self {
        self.add_property(ItemProperty::Svg)
    }

    /// Attach a manifest property
    pub fn add_property(&mut self, property: ItemProperty) -> &mut Self {
        if !self.properties.contains(&property) {
            self.properties.push(property);
        }
        self
    }

    /// Take this content out of the default reading order
    pub fn non_linear(&mut self) -> &mut Self {
        self.linear = false;
        self
    }

    /// Display this content in the table of contents with heading `title`
    pub fn set_toc_title<S: AsRef<str>>(
        &mut self,
        title: S,
        header_level: usize,
    ) -> Result<&mut Self, &'static str> {
        match self.toc_entry {
            Some(_) => Err("Toc entry already exists"),
            None => {
                // title cannot contain any <a> elements,
                // since it will itself be a link.
                let title = replace_links(title.as_ref());
                let toc = TocEntry {
                    level: header_level,
                    title: title.into(),
                };
                self.toc_entry = Some(toc);
                Ok(self)
            }
        }
    }
}

/// A person or organisation credited in the metadata
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Contributor {
    pub(crate) name: String,
    pub(crate) role: Option<MarcRelator>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Identifier {
    pub(crate) text: String,
    /// e.g. `uuid`, written as an `identifier-type` refinement
    pub(crate) scheme: Option<String>,
}

/// The source from which an epub is built
#[derive(Default, Debug)]
pub struct EpubSource {
    resources: Vec<EpubResource>,
    contents: Vec<EpubContent>,
    nav: Option<EpubContent>,
    cover_image: Option<EpubResource>,
    title: Option<String>,
    identifier: Option<Identifier>,
    lang: Option<String>,
    creators: Vec<Contributor>,
    contributors: Vec<Contributor>,
    publisher: Option<String>,
    date: Option<String>,
    description: Option<String>,
    subjects: Vec<String>,
    source: Option<String>,
    rights: Option<String>,
    last_modification: Option<time::Tm>,
    backward_compatible: bool,
}

impl EpubSource {
    pub fn new() -> Self {
        EpubSource::default()
    }

    /// Set the main title
    pub fn set_title<S: ToString>(&mut self, title: S) -> Result<&mut Self, &'static str> {
        if self.title.is_some() {
            return Err("Main title already set");
        }
        self.title = Some(title.to_string());
        Ok(self)
    }

    /// Set the unique identifier, with an optional scheme such as `uuid`
    pub fn set_identifier<S: ToString>(
        &mut self,
        identifier: S,
        scheme: Option<&str>,
    ) -> Result<&mut Self, &'static str> {
        let text = identifier.to_string();
        if text.trim().is_empty() {
            return Err("Empty identifier");
        }
        self.identifier = Some(Identifier {
            text,
            scheme: scheme.map(|s| s.to_string()),
        });
        Ok(self)
    }

    /// slightly modified from git version of langtags, which we can't use on Cargo;
    /// only the overall shape of the tag is checked here
    fn parse_lang_tag(lang: &str) -> Result<String, ()> {
        let mut serialization = String::with_capacity(lang.len());
        for (i, subtag) in lang.split('-').enumerate() {
            if subtag.is_empty() || subtag.len() > 8 || !is_alphanumeric(subtag) {
                // All subtags have a maximum length of eight characters.
                return Err(());
            }
            if i == 0 {
                // Primary language
                if subtag.len() < 2 || !is_alphabetic(subtag) {
                    return Err(());
                }
                serialization.push_str(&subtag.to_ascii_lowercase());
            } else {
                serialization.push('-');
                if subtag.len() == 2 && is_alphabetic(subtag) {
                    // Region
                    serialization.push_str(&subtag.to_ascii_uppercase());
                } else if subtag.len() == 4 && is_alphabetic(subtag) {
                    // Script
                    let mut chars = subtag.chars();
                    if let Some(first) = chars.next() {
                        serialization.push(first.to_ascii_uppercase());
                    }
                    serialization.extend(chars.map(|c| c.to_ascii_lowercase()));
                } else {
                    serialization.push_str(&subtag.to_ascii_lowercase());
                }
            }
        }
        Ok(serialization)
    }

    /// set the language of the epub
    pub fn set_language<S: AsRef<str>>(&mut self, lang: S) -> Result<&mut Self, &'static str> {
        match Self::parse_lang_tag(lang.as_ref()) {
            Ok(val) => {
                self.lang = Some(val);
                Ok(self)
            }
            Err(_) => Err("Invalid language"),
        }
    }

    /// add a creator with a marc role
    pub fn add_creator<S: ToString>(
        &mut self,
        name: S,
        role: MarcRelator,
    ) -> Result<&mut Self, &'static str> {
        self.creators.push(Contributor {
            name: name.to_string(),
            role: Some(role),
        });
        Ok(self)
    }

    /// add a contributor without any particular role
    pub fn add_contributor<S: ToString>(&mut self, name: S) -> Result<&mut Self, &'static str> {
        self.contributors.push(Contributor {
            name: name.to_string(),
            role: None,
        });
        Ok(self)
    }

    pub fn set_publisher<S: ToString>(&mut self, publisher: S) -> Result<&mut Self, &'static str> {
        self.publisher = Some(publisher.to_string());
        Ok(self)
    }

    /// set the publication date; this is written as given
    pub fn set_date<S: ToString>(&mut self, date: S) -> Result<&mut Self, &'static str> {
        self.date = Some(date.to_string());
        Ok(self)
    }

    pub fn set_description<S: ToString>(
        &mut self,
        description: S,
    ) -> Result<&mut Self, &'static str> {
        self.description = Some(description.to_string());
        Ok(self)
    }

    pub fn add_subject<S: ToString>(&mut self, subject: S) -> Result<&mut Self, &'static str> {
        self.subjects.push(subject.to_string());
        Ok(self)
    }

    pub fn set_source<S: ToString>(&mut self, source: S) -> Result<&mut Self, &'static str> {
        self.source = Some(source.to_string());
        Ok(self)
    }

    pub fn set_rights<S: ToString>(&mut self, rights: S) -> Result<&mut Self, &'static str> {
        self.rights = Some(rights.to_string());
        Ok(self)
    }

    /// set the modification date; the time of bundling is used otherwise
    pub fn set_modification_date(&mut self, d: time::Tm) -> Result<&mut Self, &'static str> {
        self.last_modification = Some(d);
        Ok(self)
    }

    /// Also write an epub 2 `toc.ncx` and cover `meta`, for older reading systems
    pub fn set_backward_compatible(&mut self, compatible: bool) -> &mut Self {
        self.backward_compatible = compatible;
        self
    }

    /// Add a resource
    pub fn add_resource(&mut self, r: EpubResource) -> Result<&mut Self, &'static str> {
        self.resources.push(r);
        Ok(self)
    }

    /// Add a resource from a filepath
    pub fn add_resource_from_file<P: AsRef<Path>, Q: Into<PathBuf>>(
        &mut self,
        source: P,
        output_path: Q,
    ) -> Result<&mut Self, EpubBundlingError> {
        let r = EpubResource::from_file(source, output_path)?;
        self.resources.push(r);
        Ok(self)
    }

    /// Add a content document at the end of the reading order
    pub fn add_content(&mut self, r: EpubContent) -> Result<&mut Self, &'static str> {
        self.contents.push(r);
        Ok(self)
    }

    /// Add a content document at `index` in the reading order;
    /// an index past the end appends
    pub fn insert_content(
        &mut self,
        index: usize,
        r: EpubContent,
    ) -> Result<&mut Self, &'static str> {
        let index = index.min(self.contents.len());
        self.contents.insert(index, r);
        Ok(self)
    }

    /// Use `nav` as the navigation document instead of generating one
    /// from the toc entries of the contents.
    /// It is placed first in the reading order.
    pub fn set_nav(&mut self, mut nav: EpubContent) -> Result<&mut Self, &'static str> {
        if !nav.output_path.is_xhtml() {
            return Err("Navigation document must be xhtml");
        }
        let _ = nav.add_property(ItemProperty::Nav);
        self.nav = Some(nav);
        Ok(self)
    }

    /// Set the epub cover image
    pub fn set_cover_image(&mut self, image: EpubResource) -> Result<&mut Self, &'static str> {
        if image.mimetype.is_epub_supported_image() {
            self.cover_image = Some(image.with_property(ItemProperty::CoverImage));
            Ok(self)
        } else {
            Err("Invalid mimetype for cover image")
        }
    }

    /// the content documents, in reading order
    pub fn contents(&self) -> &[EpubContent] {
        &self.contents
    }

    /// the non-content resources, in order of addition
    pub fn resources(&self) -> &[EpubResource] {
        &self.resources
    }

    pub fn cover_image(&self) -> Option<&EpubResource> {
        self.cover_image.as_ref()
    }

    pub fn bundle(&self) -> Result<Vec<u8>, EpubBundlingError> {
        builder::EpubBundler::bundle_epub(self)
    }

    /// Bundle and write the epub to `path`
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), EpubBundlingError> {
        let path = path.as_ref();
        let epub = self.bundle()?;
        std::fs::write(path, epub).map_err(|e| EpubBundlingError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// The package document (`package.opf`) this source would be bundled with
    pub fn package_document(&self) -> Result<String, EpubBundlingError> {
        builder::EpubBundler::generate_opf(self)
    }

    /// The manifest entries this source would be bundled with
    pub fn manifest(&self) -> Result<Vec<ManifestItem<'_>>, EpubBundlingError> {
        builder::EpubBundler::get_manifest_items(self)
    }

    /// The spine this source would be bundled with
    pub fn spine(&self) -> Result<Vec<SpineElement<'_>>, EpubBundlingError> {
        let manifest = self.manifest()?;
        builder::EpubBundler::get_spine_items(self, &manifest)
    }
}

fn is_alphabetic(s: &str) -> bool {
    s.chars().all(|x| x.is_ascii_alphabetic())
}

fn is_alphanumeric(s: &str) -> bool {
    s.chars().all(|x| x.is_ascii_alphanumeric())
}
