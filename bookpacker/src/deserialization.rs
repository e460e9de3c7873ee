//! Read a document and its spine from json.
//!
//! ```
//! # use bookpacker::deserialization::DeserializableDocument;
//! let json = r#"{"title": "Hello World", "docname": "hello", "spine": [{"docname": "intro", "title": "Introduction", "content": "<p>Hi</p>"}]}"#;
//! let document: DeserializableDocument = serde_json::from_str(json).unwrap();
//! assert_eq!(document.spine.len(), 1);
//! ```
use bookpacker_epub::{Document, Image, SpineItem};
use serde::Deserialize;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors in reading a json document
#[derive(Debug, Error)]
pub enum DeserializationError {
	/// The json was malformed or did not describe a document
	#[error("invalid document: {0}")]
	Json(#[from] serde_json::Error),
	/// A content file could not be read
	#[error("{}: {source}", .path.display())]
	Io {
		/// the file being read
		path: PathBuf,
		/// the underlying error
		source: std::io::Error,
	},
}

/// The content of a spine item: either a path to an xhtml file, or the xhtml itself.
///
/// A value without markup which ends in `.xhtml`, `.html` or `.htm` is taken to be a path,
/// relative to the document's `docdir`; anything else is content.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(from = "Cow<str>")]
pub enum ContentSource<'a> {
	/// a file to read
	Path(Cow<'a, Path>),
	/// inline content
	Str(Cow<'a, str>),
}

fn names_a_file(s: &str) -> bool {
	let s = s.trim();
	!s.contains('<')
		&& !s.contains('\n')
		&& [".xhtml", ".html", ".htm"]
			.iter()
			.any(|ext| s.to_ascii_lowercase().ends_with(ext))
}

impl<'a> From<Cow<'a, str>> for ContentSource<'a> {
	fn from(src: Cow<'a, str>) -> Self {
		if names_a_file(&src) {
			let p = match src {
				Cow::Borrowed(b) => Cow::Borrowed(Path::new(b.trim())),
				Cow::Owned(p) => Cow::Owned(PathBuf::from(p.trim())),
			};
			ContentSource::Path(p)
		} else {
			ContentSource::Str(src)
		}
	}
}

impl<'a> ContentSource<'a> {
	/// The content, reading it from a file relative to `docdir` if need be
	pub fn load(self, docdir: &Path) -> Result<String, DeserializationError> {
		match self {
			ContentSource::Str(s) => Ok(s.into_owned()),
			ContentSource::Path(p) => {
				let path = docdir.join(p);
				std::fs::read_to_string(&path)
					.map_err(|source| DeserializationError::Io { path, source })
			}
		}
	}
}

/// A spine item, as given in json.
///
/// Only `docname`, `title` and `content` are required.
#[derive(Debug, Deserialize)]
pub struct DeserializableSpineItem<'a> {
	/// names the item's file, `<docname>.xhtml`
	#[serde(borrow)]
	pub docname: Cow<'a, str>,
	/// The title of this item; inline markup is allowed
	#[serde(borrow)]
	pub title: Cow<'a, str>,
	/// Either the converted content, or a path to it
	pub content: ContentSource<'a>,
	#[serde(default)]
	pub imagesdir: Option<Cow<'a, str>>,
	#[serde(default)]
	pub username: Option<Cow<'a, str>>,
	#[serde(default)]
	pub author: Option<Cow<'a, str>>,
	/// e.g. `svg`
	#[serde(default)]
	pub epub_properties: Vec<Cow<'a, str>>,
	/// image paths, relative to the images directory
	#[serde(default)]
	pub images: Vec<Cow<'a, str>>,
}

impl<'a> DeserializableSpineItem<'a> {
	fn into_spine_item(self, docdir: &Path) -> Result<SpineItem, DeserializationError> {
		let content = self.content.load(docdir)?;
		let mut item = SpineItem::new(self.docname, self.title, content);
		item.imagesdir = self.imagesdir.map(Cow::into_owned);
		item.username = self.username.map(Cow::into_owned);
		item.author = self.author.map(Cow::into_owned);
		item.epub_properties = self.epub_properties.into_iter().map(Cow::into_owned).collect();
		item.images = self.images.iter().map(Image::new).collect();
		Ok(item)
	}
}

/// A document and its spine, as given in json.
///
/// The only required values are `title` and `spine`.
#[derive(Debug, Deserialize)]
pub struct DeserializableDocument<'a> {
	/// The title of the document; inline markup is allowed
	#[serde(borrow)]
	pub title: Cow<'a, str>,
	/// the base name of the archive; `book` if not given
	#[serde(default)]
	pub docname: Option<Cow<'a, str>>,
	#[serde(default)]
	pub id: Option<Cow<'a, str>>,
	#[serde(default)]
	pub lang: Option<Cow<'a, str>>,
	/// comma delimited
	#[serde(default)]
	pub authors: Option<Cow<'a, str>>,
	#[serde(default)]
	pub author: Option<Cow<'a, str>>,
	#[serde(default)]
	pub creator: Option<Cow<'a, str>>,
	#[serde(default)]
	pub producer: Option<Cow<'a, str>>,
	#[serde(default)]
	pub revdate: Option<Cow<'a, str>>,
	#[serde(default)]
	pub description: Option<Cow<'a, str>>,
	/// comma delimited
	#[serde(default)]
	pub keywords: Option<Cow<'a, str>>,
	#[serde(default)]
	pub source: Option<Cow<'a, str>>,
	#[serde(default)]
	pub copyright: Option<Cow<'a, str>>,
	#[serde(default)]
	pub imagesdir: Option<Cow<'a, str>>,
	/// relative paths are relative to the directory the json was read from
	#[serde(default)]
	pub docdir: Option<PathBuf>,
	/// A plain path or an inline image macro
	#[serde(default)]
	pub front_cover_image: Option<Cow<'a, str>>,
	#[serde(default)]
	pub scripts: Option<Cow<'a, str>>,
	/// The content of the document, in reading order
	#[serde(borrow)]
	pub spine: Vec<DeserializableSpineItem<'a>>,
}

impl<'a> DeserializableDocument<'a> {
	/// Parse `src`
	pub fn new(src: &'a str) -> Result<Self, DeserializationError> {
		let document: DeserializableDocument = serde_json::from_str(src)?;
		Ok(document)
	}

	/// Build the document and its spine, reading any content files.
	/// A relative `docdir` is resolved against `base_dir`.
	pub fn into_document(
		self,
		base_dir: &Path,
	) -> Result<(Document, Vec<SpineItem>), DeserializationError> {
		let src = self;
		let docname = src.docname.unwrap_or(Cow::Borrowed("book"));
		let mut document = Document::new(docname, src.title);

		document.docdir = match src.docdir {
			Some(dir) => base_dir.join(dir),
			None => base_dir.to_path_buf(),
		};

		macro_rules! ifsomethen {
			($($field:ident),*) => {
				$(
					if let Some(x) = src.$field {
						document.$field = Some(x.into_owned());
					}
				)*
			};
		}

		ifsomethen!(
			id,
			lang,
			authors,
			author,
			creator,
			producer,
			revdate,
			description,
			keywords,
			source,
			copyright,
			front_cover_image
		);

		if let Some(imagesdir) = src.imagesdir {
			document.imagesdir = imagesdir.into_owned();
		}
		if let Some(scripts) = src.scripts {
			document.scripts = scripts.into_owned();
		}

		let docdir = document.docdir.clone();
		let spine = src
			.spine
			.into_iter()
			.map(|item| item.into_spine_item(&docdir))
			.collect::<Result<Vec<_>, _>>()?;
		Ok((document, spine))
	}
}
