use crate::sanitize::{sanitized_title, TitleContext};
use crate::{Document, PackagingError, SpineItem};
use epub_bundler::EpubSource;
use epub_metadata::MarcRelator;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use uuid::Uuid;

/// credited as the provider when nobody else is named
pub const FALLBACK_CREATOR: &str = "bookpacker";

lazy_static! {
    static ref CSV_DELIMITER_RX: Regex = Regex::new(r"\s*,\s*").unwrap();
}

/// split a comma delimited list, dropping empty entries
pub(crate) fn split_list(list: &str) -> Vec<&str> {
    CSV_DELIMITER_RX
        .split(list.trim())
        .filter(|s| !s.is_empty())
        .collect()
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// The creator to credit, and the role they are credited with
pub(crate) fn primary_creator(document: &Document) -> (&str, MarcRelator) {
    match (present(&document.producer), present(&document.creator)) {
        (Some(_), Some(creator)) => (creator, MarcRelator::Cre),
        (Some(producer), None) => (producer, MarcRelator::Bkp),
        (None, _) => match present(&document.author) {
            Some(author) => (author, MarcRelator::Aut),
            None => (FALLBACK_CREATOR, MarcRelator::Prv),
        },
    }
}

/// The document's authors followed by the authors of each spine item,
/// each named once, in order of appearance
pub(crate) fn contributors<'a>(document: &'a Document, spine: &'a [SpineItem]) -> Vec<&'a str> {
    let listed = present(&document.authors)
        .map(split_list)
        .unwrap_or_default();
    let per_item = spine.iter().filter_map(|item| present(&item.author));
    let mut seen = HashSet::new();
    listed
        .into_iter()
        .chain(per_item)
        .filter(|name| seen.insert(*name))
        .collect()
}

/// Set metadata from a document on an epub source,
/// returning any warnings
pub(crate) trait MetadataAdder {
    fn add_to_epub_source(
        &self,
        spine: &[SpineItem],
        epub_src: &mut EpubSource,
    ) -> Result<Vec<String>, PackagingError>;
}

impl MetadataAdder for Document {
    fn add_to_epub_source(
        &self,
        spine: &[SpineItem],
        epub_src: &mut EpubSource,
    ) -> Result<Vec<String>, PackagingError> {
        let mut warnings = Vec::new();

        let identifier = match present(&self.id) {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_urn().to_string(),
        };
        epub_src.set_identifier(identifier, Some("uuid"))?;

        let lang = self.lang_or_default();
        if epub_src.set_language(lang).is_err() {
            warnings.push(format!(
                "Invalid language code {}. Falling back to en.",
                lang
            ));
            epub_src.set_language("en")?;
        }

        epub_src.set_title(sanitized_title(&self.title, TitleContext::Plain))?;

        let (creator, role) = primary_creator(self);
        epub_src.add_creator(creator, role)?;
        if let Some(producer) = present(&self.producer) {
            epub_src.set_publisher(producer)?;
        }

        for contributor in contributors(self, spine) {
            epub_src.add_contributor(contributor)?;
        }

        match present(&self.revdate) {
            Some(date) => epub_src.set_date(date)?,
            None => {
                let now = time::strftime("%Y-%m-%dT%H:%M:%SZ", &time::now_utc())
                    .unwrap_or_default();
                epub_src.set_date(now)?
            }
        };

        if let Some(description) = present(&self.description) {
            epub_src.set_description(description)?;
        }
        if let Some(keywords) = present(&self.keywords) {
            for subject in split_list(keywords) {
                epub_src.add_subject(subject)?;
            }
        }
        if let Some(source) = present(&self.source) {
            epub_src.set_source(source)?;
        }
        if let Some(rights) = present(&self.copyright) {
            epub_src.set_rights(rights)?;
        }
        epub_src.set_modification_date(time::now_utc())?;

        Ok(warnings)
    }
}
