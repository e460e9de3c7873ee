use std::path::Path;

/// A mimetype relevant to epub packaging
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub enum MimeType {
	/// A jpeg file
	Jpeg,
	/// A png file
	Png,
	/// A gif file
	Gif,
	/// A svg file
	Svg,
	/// A css file
	Css,
	/// An xhtml file
	Xhtml,
	/// An epub 2 navigation control file
	Ncx,
	/// A truetype font file
	TrueType,
	/// An opentype font file
	OpenType,
	/// A woff font file
	Woff,
	/// A woff2 font file
	Woff2,
	/// An epub file
	Epub,
}

impl MimeType {

	/// Guess a mimetype from an extension
	pub fn new_from_extension(ext: &str) -> Option<Self> {
		use MimeType::*;
		match ext.to_ascii_lowercase().as_str() {
			"jpg" | "jpeg" => Some(Jpeg),
			"png" => Some(Png),
			"gif" => Some(Gif),
			"svg" => Some(Svg),
			"css" => Some(Css),
			"xhtml" | "html" => Some(Xhtml),
			"ncx" => Some(Ncx),
			"ttf" => Some(TrueType),
			"otf" => Some(OpenType),
			"woff" => Some(Woff),
			"woff2" => Some(Woff2),
			"epub" => Some(Epub),
			_ => None
		}
	}

	/// return the canonical str representation of this mimetype
	pub const fn to_str(&self) -> &'static str {
		use MimeType::*;
		match self {
			Jpeg => "image/jpeg",
			Png => "image/png",
			Gif => "image/gif",
			Svg => "image/svg+xml",
			Css => "text/css",
			Xhtml => "application/xhtml+xml",
			Ncx => "application/x-dtbncx+xml",
			// older reading systems (and kindlegen) only recognise the unregistered type
			TrueType => "application/x-font-ttf",
			OpenType => "application/vnd.ms-opentype",
			Woff => "application/font-woff",
			Woff2 => "font/woff2",
			Epub => "application/epub+zip",
		}
	}
}

/// Helper to guess the mimetype of paths
pub trait GuessMimeType {
	/// guess the mimetype of this object
	fn guess_mime(&self) -> Option<MimeType>;
}

impl <T> GuessMimeType for T where T: AsRef<Path> {
	/// guess the mimetype of this path-like object
	fn guess_mime(&self) -> Option<MimeType> {
		self.as_ref()
			.extension()
			.and_then(|ext| ext.to_str())
			.and_then(MimeType::new_from_extension)
	}
}

/// Various helpful functions for analysing filepaths
pub trait MimeTypeHelper {
	/// is this likely to be a jpg file?
	fn is_jpg(&self) -> bool;
	/// is this likely to be a png file?
	fn is_png(&self) -> bool;
	/// is this likely to be a svg file?
	fn is_svg(&self) -> bool;
	/// Is this likely to represent a css file?
	fn is_css(&self) -> bool;
	/// Is this likely to represent xhtml?
	fn is_xhtml(&self) -> bool;
	/// Is this likely to represent a font of any kind?
	fn is_font(&self) -> bool;
	/// Is this an image which epub supports?
	/// These are png, jpg, gif and svg
	fn is_epub_supported_image(&self) -> bool;
	/// Is this likely to represent a file which can be included in an epub?
	/// These are supported image formats, xhtml+xml, fonts or css
	fn is_epub_supported_resource(&self) -> bool;
}

impl MimeTypeHelper for MimeType {
	fn is_jpg(&self) -> bool {
		*self == MimeType::Jpeg
	}
	fn is_png(&self) -> bool {
		*self == MimeType::Png
	}
	fn is_svg(&self) -> bool {
		*self == MimeType::Svg
	}
	fn is_css(&self) -> bool {
		*self == MimeType::Css
	}
	fn is_xhtml(&self) -> bool {
		*self == MimeType::Xhtml
	}
	fn is_font(&self) -> bool {
		matches!(self, MimeType::TrueType | MimeType::OpenType | MimeType::Woff | MimeType::Woff2)
	}
	fn is_epub_supported_image(&self) -> bool {
		matches!(self, MimeType::Png | MimeType::Jpeg | MimeType::Svg | MimeType::Gif)
	}
	fn is_epub_supported_resource(&self) -> bool {
		match self {
			m if m.is_epub_supported_image() || m.is_font() => true,
			MimeType::Xhtml | MimeType::Css | MimeType::Ncx => true,
			_ => false
		}
	}
}

macro_rules! reroute_func {
	($fn_name:ident) => {
		fn $fn_name(&self) -> bool {
			match self.guess_mime() {
				Some(m) => m.$fn_name(),
				None => false
			}
		}
	};
}

impl <T> MimeTypeHelper for T where T: GuessMimeType {
	reroute_func!(is_jpg);
	reroute_func!(is_png);
	reroute_func!(is_svg);
	reroute_func!(is_css);
	reroute_func!(is_xhtml);
	reroute_func!(is_font);
	reroute_func!(is_epub_supported_image);
	reroute_func!(is_epub_supported_resource);
}
