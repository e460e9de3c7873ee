//! Resolve the images, fonts and stylesheets of a package.
//!
//! Bundled assets come from the configured data directory and document assets
//! from the document's `docdir`; paths are always joined onto one of these,
//! never resolved against the process working directory.
//! A missing asset never fails the run: it is replaced by a bundled default
//! or skipped, and a warning is recorded.
use crate::document::imagesdir_prefix;
use crate::fonts::select_fonts;
use crate::packager::PackageBuilder;
use crate::postprocess::postprocess_css;
use crate::PackagingError;
use bookpacker_common::MimeTypeHelper;
use epub_bundler::EpubResource;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;

pub(crate) const DEFAULT_COVER_IMAGE: &str = "images/default-cover.png";
pub(crate) const DEFAULT_AVATAR_IMAGE: &str = "images/default-avatar.png";
pub(crate) const DEFAULT_COVER_WIDTH: u32 = 1050;
pub(crate) const DEFAULT_COVER_HEIGHT: u32 = 1600;

static THEME_STYLESHEETS: [&str; 2] = ["styles/epub3.css", "styles/epub3-css3-only.css"];
static FONT_STYLESHEET: &str = "styles/epub3-fonts.css";

lazy_static! {
    static ref INLINE_IMAGE_MACRO_RX: Regex = Regex::new(r"^image:(.*?)\[(.*?)\]$").unwrap();
}

/// The registered cover image, as the cover page needs it
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CoverImage {
    pub(crate) href: String,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

/// A `front_cover_image` value, resolved
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CoverSpec {
    /// relative to `docdir`
    pub(crate) path: String,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

/// Interpret either a plain path or an inline image macro,
/// `image:<target>[<alt>,<width>,<height>]`, whose target is relative to the images directory
pub(crate) fn parse_cover_attribute(value: &str, imagesdir_prefix: &str) -> CoverSpec {
    match INLINE_IMAGE_MACRO_RX.captures(value.trim()) {
        Some(caps) => {
            let target = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let attrs = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            let mut attrs = attrs.splitn(3, ',').skip(1);
            let mut dimension = |default| {
                attrs
                    .next()
                    .and_then(|d| d.trim().parse::<u32>().ok())
                    .filter(|d| *d > 0)
                    .unwrap_or(default)
            };
            let width = dimension(DEFAULT_COVER_WIDTH);
            let height = dimension(DEFAULT_COVER_HEIGHT);
            CoverSpec {
                path: format!("{}{}", imagesdir_prefix, target),
                width,
                height,
            }
        }
        None => CoverSpec {
            path: value.trim().to_string(),
            width: DEFAULT_COVER_WIDTH,
            height: DEFAULT_COVER_HEIGHT,
        },
    }
}

/// `<imagesdir>jacket/cover<.ext>`, keeping the extension of `source`
pub(crate) fn cover_href(imagesdir_prefix: &str, source: &str) -> String {
    match Path::new(source).extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}jacket/cover.{}", imagesdir_prefix, ext),
        None => format!("{}jacket/cover", imagesdir_prefix),
    }
}

fn load_cover(source: &Path, href: &str) -> Result<EpubResource, String> {
    let resource = EpubResource::from_file(source, href).map_err(|e| e.to_string())?;
    if resource.mimetype.is_epub_supported_image() {
        Ok(resource)
    } else {
        Err(format!("{} is not a supported image", href))
    }
}

fn distinct<'a, I: Iterator<Item = &'a str>>(items: I) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    items.filter(|i| seen.insert(*i)).collect()
}

impl<'a> PackageBuilder<'a> {
    /// Add the bundled stylesheets and the fonts the font stylesheet refers to
    pub(crate) fn add_theme_assets(&mut self) -> Result<(), PackagingError> {
        let config = self.config;
        for stylesheet in THEME_STYLESHEETS.iter() {
            let source = config.data_path(stylesheet);
            match std::fs::read_to_string(&source) {
                Ok(css) => {
                    let css = postprocess_css(&css, self.format);
                    let resource =
                        EpubResource::from_data(*stylesheet, css.into_owned().into_bytes())?;
                    self.epub.add_resource(resource)?;
                }
                Err(e) => self.warn(format!(
                    "Stylesheet {} not readable ({}). Skipping.",
                    source.display(),
                    e
                )),
            }
        }

        let source = config.data_path(FONT_STYLESHEET);
        let selection = match select_fonts(&source, &self.document.scripts) {
            Ok(selection) => selection,
            Err(e) => {
                self.warn(format!(
                    "Font stylesheet {} not readable ({}). Skipping fonts.",
                    source.display(),
                    e
                ));
                return Ok(());
            }
        };
        let resource = EpubResource::from_data(FONT_STYLESHEET, selection.css.into_bytes())?;
        self.epub.add_resource(resource)?;
        for font in selection.fonts.iter() {
            let source = config.data_path(font);
            let added = self
                .epub
                .add_resource_from_file(&source, font.as_str())
                .map(|_| ());
            if let Err(e) = added {
                self.warn(format!("Font {} not usable ({}). Skipping.", font, e));
            }
        }
        Ok(())
    }

    /// Register the cover image at `<imagesdir>jacket/cover.<ext>`,
    /// falling back to the bundled default cover
    pub(crate) fn add_cover_image(&mut self) -> Result<(), PackagingError> {
        let document = self.document;
        let prefix = document.imagesdir_prefix();

        if let Some(ref value) = document.front_cover_image {
            let spec = parse_cover_attribute(value, &prefix);
            let source = document.docdir.join(&spec.path);
            let href = cover_href(&prefix, &spec.path);
            match load_cover(&source, &href) {
                Ok(resource) => return self.set_cover(resource, spec.width, spec.height),
                Err(e) => self.warn(format!(
                    "Cover image {} not usable ({}). Falling back to the default cover.",
                    source.display(),
                    e
                )),
            }
        }

        let source = self.config.data_path(DEFAULT_COVER_IMAGE);
        let href = cover_href(&prefix, DEFAULT_COVER_IMAGE);
        match load_cover(&source, &href) {
            Ok(resource) => self.set_cover(resource, DEFAULT_COVER_WIDTH, DEFAULT_COVER_HEIGHT),
            Err(e) => {
                self.warn(format!(
                    "Default cover image {} not usable ({}). The package will have no cover.",
                    source.display(),
                    e
                ));
                Ok(())
            }
        }
    }

    fn set_cover(
        &mut self,
        resource: EpubResource,
        width: u32,
        height: u32,
    ) -> Result<(), PackagingError> {
        let href = resource.output_path.to_string_lossy().into_owned();
        self.epub.set_cover_image(resource)?;
        self.cover = Some(CoverImage {
            href,
            width,
            height,
        });
        Ok(())
    }

    /// Register the default avatar, then an avatar for each user named in the spine.
    /// Users without a readable avatar get the default avatar at their own path.
    pub(crate) fn add_avatar_images(&mut self) -> Result<(), PackagingError> {
        let document = self.document;
        let spine = self.spine;
        let prefix = document.imagesdir_prefix();

        let default_source = self.config.data_path(DEFAULT_AVATAR_IMAGE);
        let default_avatar = match std::fs::read(&default_source) {
            Ok(data) => Some(data),
            Err(e) => {
                self.warn(format!(
                    "Default avatar {} not readable ({}).",
                    default_source.display(),
                    e
                ));
                None
            }
        };
        if let Some(ref data) = default_avatar {
            let resource =
                EpubResource::from_data(format!("{}avatars/default.png", prefix), data.clone())?;
            self.epub.add_resource(resource)?;
        }

        let usernames = distinct(spine.iter().filter_map(|item| item.username.as_deref()));
        for username in usernames {
            let avatar = format!("{}avatars/{}.png", prefix, username);
            match std::fs::read(document.docdir.join(&avatar)) {
                Ok(data) => {
                    self.epub
                        .add_resource(EpubResource::from_data(avatar.as_str(), data)?)?;
                }
                Err(_) => {
                    self.warn(format!(
                        "Avatar {} not found or not readable. Falling back to default avatar for {}.",
                        avatar, username
                    ));
                    if let Some(ref data) = default_avatar {
                        self.epub
                            .add_resource(EpubResource::from_data(avatar.as_str(), data.clone())?)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Register the images of every spine item, relative to the item's own images directory.
    /// The same image used twice is registered twice; images inlined in content are not found here.
    pub(crate) fn add_content_images(&mut self) -> Result<(), PackagingError> {
        let document = self.document;
        let spine = self.spine;
        let doc_prefix = document.imagesdir_prefix();
        let reserved = format!("{}jacket/cover.", doc_prefix);

        for item in spine.iter() {
            let prefix = match item.imagesdir {
                Some(ref dir) => imagesdir_prefix(dir),
                None => doc_prefix.clone(),
            };
            for image in item.images.iter() {
                let image_path = format!("{}{}", prefix, image.target);
                if image_path.starts_with(&reserved) {
                    self.warn(format!(
                        "The image path {} is reserved for the cover artwork. Ignoring conflicting image from content.",
                        image_path
                    ));
                    continue;
                }
                match std::fs::read(document.docdir.join(&image_path)) {
                    Ok(data) => match EpubResource::from_data(image_path.as_str(), data) {
                        Ok(resource) => {
                            self.epub.add_resource(resource)?;
                        }
                        Err(e) => self.warn(format!("Image {} skipped: {}", image_path, e)),
                    },
                    Err(_) => {
                        self.warn(format!("Image not found or not readable: {}", image_path))
                    }
                }
            }
        }
        Ok(())
    }
}
