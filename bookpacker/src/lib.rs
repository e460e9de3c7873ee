//! Package rendered documents as ebooks.
//!
//! A document is a title, some metadata and a spine of already converted xhtml items.
//! This crate packages such a document either as a standard epub 3 container, or as an
//! epub tuned for the Kindle engine which is then distilled to mobi with `kindlegen`.
//! Images, avatars, the cover and the theme's stylesheets and fonts are gathered along the way;
//! anything missing is replaced by a bundled default or skipped, with a warning.
//!
//! # Installation
//!
//! The legacy format requires `kindlegen`, and validation requires `epubcheck`; each is looked for
//! at the path given by the `KINDLEGEN` or `EPUBCHECK` environment variables, then in the `bin`
//! directory of the data directory, then on `PATH`.
//!
//! The binary reads a json description of a document -- see [`DeserializableDocument`] -- from
//! a file or stdin: `bookpacker book.json -d build -f legacy`.
//!
//! # Basic Example
//!
//! ```no_run
//! use bookpacker::{Document, PackageOptions, Packager, PackagerConfig, SpineItem, TargetFormat};
//!
//! let mut document = Document::new("a-book", "A Book");
//! document.author = Some(String::from("A.N. Author"));
//! let spine = vec![SpineItem::new("chapter-one", "Chapter One", "<p>It was a dark and stormy night.</p>")];
//!
//! let packager = Packager::new(&document, &spine, "build", TargetFormat::Standard, PackagerConfig::from_env());
//! let report = packager.package(PackageOptions::default())
//!     .expect("Error producing epub");
//! for warning in report.warnings.iter() {
//!     eprintln!("{}", warning);
//! }
//! ```
//!
//! # From json
//!
//! ```no_run
//! use bookpacker::{package_from_json, PackageOptions, PackagerConfig, TargetFormat};
//! use std::path::Path;
//!
//! let json = r#"{"title": "A Book", "docname": "a-book", "spine": [{"docname": "one", "title": "One", "content": "one.xhtml"}]}"#;
//! let report = package_from_json(
//!     json,
//!     Path::new("."),
//!     "build",
//!     TargetFormat::Legacy,
//!     PackageOptions::default(),
//!     PackagerConfig::from_env(),
//! )?;
//! println!("{:?}", report.converted);
//! # Ok::<(), bookpacker::BookpackerError>(())
//! ```
#![deny(dead_code)]
#![deny(unreachable_patterns)]
#![deny(unused_extern_crates)]
#![deny(unused_imports)]
#![deny(unused_qualifications)]
#![deny(clippy::all)]
#![deny(missing_debug_implementations)]

pub mod deserialization;

pub use bookpacker_epub::{
	sanitized_title, Converter, Document, EpubSource, Image, PackageOptions, PackageReport,
	Packager, PackagerConfig, PackagingError, PassthroughConverter, SpineItem, TargetFormat,
	TitleContext,
};
pub use deserialization::{DeserializableDocument, DeserializationError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Anything which can go wrong between reading json and writing a package
#[derive(Debug, Error)]
pub enum BookpackerError {
	/// The document could not be read
	#[error(transparent)]
	Deserialization(#[from] DeserializationError),
	/// The document could not be packaged
	#[error(transparent)]
	Packaging(#[from] PackagingError),
}

/// Package a json description of a document into `dest_dir`.
///
/// A relative `docdir` in the json is resolved against `base_dir`.
pub fn package_from_json<P: Into<PathBuf>>(
	json: &str,
	base_dir: &Path,
	dest_dir: P,
	format: TargetFormat,
	options: PackageOptions,
	config: PackagerConfig,
) -> Result<PackageReport, BookpackerError> {
	let (document, spine) = DeserializableDocument::new(json)?.into_document(base_dir)?;
	let packager = Packager::new(&document, &spine, dest_dir, format, config);
	let report = packager.package(options)?;
	Ok(report)
}
