//! This crate packages a rendered document, made of a sequence of already converted
//! spine items, into an epub 3 container; or, in the legacy format, into an epub tuned
//! for the Kindle engine which is then distilled to mobi by `kindlegen`.
//!
//! ```no_run
//! use bookpacker_epub::{Document, PackageOptions, Packager, PackagerConfig, SpineItem, TargetFormat};
//!
//! let document = Document::new("book", "My Book");
//! let spine = vec![SpineItem::new("intro", "Introduction", "<p>Hi</p>")];
//! let packager = Packager::new(&document, &spine, "build", TargetFormat::Standard, PackagerConfig::from_env());
//! let report = packager.package(PackageOptions::default())?;
//! println!("{}", report.epub.display());
//! # Ok::<(), bookpacker_epub::PackagingError>(())
//! ```
#![deny(dead_code)]
#![deny(unreachable_patterns)]
#![deny(unused_extern_crates)]
#![deny(unused_imports)]
#![deny(unused_qualifications)]
#![deny(clippy::all)]
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]

use epub_bundler::EpubBundlingError;
use std::path::PathBuf;
use thiserror::Error;
mod assets;
mod config;
mod content;
mod document;
mod fonts;
mod metadata;
mod packager;
mod postprocess;
mod sanitize;

pub use config::{PackagerConfig, CONVERTER_NAME, VALIDATOR_NAME};
pub use content::{Converter, PassthroughConverter};
pub use document::{Document, Image, SpineItem, TargetFormat};
pub use epub_bundler::EpubSource;
pub use fonts::{select_fonts, select_fonts_from_str, FontSelection};
pub use metadata::FALLBACK_CREATOR;
pub use packager::{PackageOptions, PackageReport, Packager};
pub use postprocess::{postprocess_css, postprocess_xhtml};
pub use sanitize::{sanitized_title, TitleContext};

/// Errors which abort a packaging run
#[derive(Debug, Error)]
pub enum PackagingError {
    /// The container could not be assembled or written
    #[error(transparent)]
    Bundling(#[from] EpubBundlingError),
    /// A file or directory could not be read or written
    #[error("{}: {source}", .path.display())]
    Io {
        /// the path being read or written
        path: PathBuf,
        /// the underlying error
        source: std::io::Error,
    },
    /// The written container could not be read back
    #[error("error reading container: {0}")]
    Zip(#[from] zip::result::ZipError),
    /// No usable external tool could be found
    #[error("could not find {0}; install it on PATH or give its location")]
    MissingTool(&'static str),
    /// The epub source refused a value
    #[error("invalid package: {0}")]
    InvalidPackage(&'static str),
}

impl From<&'static str> for PackagingError {
    fn from(src: &'static str) -> Self {
        PackagingError::InvalidPackage(src)
    }
}
