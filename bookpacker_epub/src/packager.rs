//! Drive a packaging run: build the package, write the container, then
//! optionally extract it, distill it to mobi or validate it.
use crate::assets::CoverImage;
use crate::content::{Converter, PassthroughConverter};
use crate::metadata::MetadataAdder;
use crate::{Document, PackagerConfig, PackagingError, SpineItem, TargetFormat};
use bookpacker_common::run_streaming;
use epub_bundler::EpubSource;
use log::{debug, info, warn};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

fn io_error<P: AsRef<Path>>(path: P) -> impl FnOnce(io::Error) -> PackagingError {
    let path = path.as_ref().to_path_buf();
    move |source| PackagingError::Io { path, source }
}

/// What to do after the container is written
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PackageOptions {
    /// Unpack the container into a directory beside it
    pub extract: bool,
    /// Run the validator over a standard package
    pub validate: bool,
}

/// The outcome of a packaging run
#[derive(Debug, Clone, PartialEq)]
pub struct PackageReport {
    /// The written container
    pub epub: PathBuf,
    /// The directory the container was extracted to, if requested
    pub extracted: Option<PathBuf>,
    /// The mobi file the converter was asked to write, for the legacy format
    pub converted: Option<PathBuf>,
    /// Whether the converter or validator exited successfully, if one was run
    pub tool_success: Option<bool>,
    /// Every asset problem met along the way
    pub warnings: Vec<String>,
}

/// An epub source under construction, along with what it is being built from
#[derive(Debug)]
pub(crate) struct PackageBuilder<'a> {
    pub(crate) epub: EpubSource,
    pub(crate) document: &'a Document,
    pub(crate) spine: &'a [SpineItem],
    pub(crate) format: TargetFormat,
    pub(crate) config: &'a PackagerConfig,
    pub(crate) cover: Option<CoverImage>,
    pub(crate) warnings: Vec<String>,
}

impl<'a> PackageBuilder<'a> {
    pub(crate) fn new(
        document: &'a Document,
        spine: &'a [SpineItem],
        format: TargetFormat,
        config: &'a PackagerConfig,
    ) -> Self {
        let mut epub = EpubSource::new();
        let _ = epub.set_backward_compatible(format != TargetFormat::Legacy);
        PackageBuilder {
            epub,
            document,
            spine,
            format,
            config,
            cover: None,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }

    pub(crate) fn build(
        mut self,
        converter: &dyn Converter,
    ) -> Result<(EpubSource, Vec<String>), PackagingError> {
        debug!("Adding metadata");
        let warnings = self
            .document
            .add_to_epub_source(self.spine, &mut self.epub)?;
        for w in warnings {
            self.warn(w);
        }

        debug!("Adding assets");
        self.add_theme_assets()?;
        self.add_cover_image()?;
        self.add_avatar_images()?;
        self.add_content_images()?;

        debug!("Adding content");
        self.add_content(converter)?;
        Ok((self.epub, self.warnings))
    }
}

/// Packages a document and its spine into `<dest>/<docname>[-legacy].epub`
#[derive(Debug)]
pub struct Packager<'a> {
    document: &'a Document,
    spine: &'a [SpineItem],
    dest_dir: PathBuf,
    format: TargetFormat,
    config: PackagerConfig,
    converter: Box<dyn Converter + 'a>,
}

impl<'a> Packager<'a> {
    /// Prepare to package `document` into `dest_dir`, converting its items
    /// with a [`PassthroughConverter`]
    pub fn new<P: Into<PathBuf>>(
        document: &'a Document,
        spine: &'a [SpineItem],
        dest_dir: P,
        format: TargetFormat,
        config: PackagerConfig,
    ) -> Self {
        Packager {
            document,
            spine,
            dest_dir: dest_dir.into(),
            format,
            config,
            converter: Box::new(PassthroughConverter),
        }
    }

    /// Use `converter` to produce content and navigation documents
    pub fn with_converter<C: Converter + 'a>(mut self, converter: C) -> Self {
        self.converter = Box::new(converter);
        self
    }

    /// The path the container is written to
    pub fn archive_path(&self) -> PathBuf {
        self.dest_dir.join(format!(
            "{}{}.epub",
            self.document.docname,
            self.format.archive_suffix()
        ))
    }

    /// Build the epub source without writing anything,
    /// returning it along with any warnings
    pub fn build_source(&self) -> Result<(EpubSource, Vec<String>), PackagingError> {
        PackageBuilder::new(self.document, self.spine, self.format, &self.config)
            .build(self.converter.as_ref())
    }

    /// Write the container, then carry out `options`.
    ///
    /// The legacy format is always handed to the converter; otherwise the
    /// validator is run if requested. A tool exiting unsuccessfully is
    /// logged and reported, but is not an error.
    pub fn package(&self, options: PackageOptions) -> Result<PackageReport, PackagingError> {
        debug!("Packaging {} as {}", self.document.docname, self.format);
        let (source, warnings) = self.build_source()?;

        fs::create_dir_all(&self.dest_dir).map_err(io_error(&self.dest_dir))?;
        let epub = self.archive_path();
        source.write_to(&epub)?;
        info!("Wrote {} to {}", self.format, epub.display());

        let mut report = PackageReport {
            epub,
            extracted: None,
            converted: None,
            tool_success: None,
            warnings,
        };

        if options.extract {
            let dir = report.epub.with_extension("");
            extract_epub(&report.epub, &dir, &mut report.warnings)?;
            info!("Extracted {} to {}", self.format, dir.display());
            report.extracted = Some(dir);
        }

        match self.format {
            TargetFormat::Legacy => {
                let (mobi, success) = self.distill_to_mobi(&report.epub)?;
                report.converted = Some(mobi);
                report.tool_success = Some(success);
            }
            TargetFormat::Standard if options.validate => {
                report.tool_success = Some(self.validate(&report.epub)?);
            }
            TargetFormat::Standard => {}
        }
        debug!("Packaging of {} done", self.document.docname);
        Ok(report)
    }

    fn distill_to_mobi(&self, epub: &Path) -> Result<(PathBuf, bool), PackagingError> {
        let converter = self.config.locate_converter()?;
        let mobi_name = format!("{}.mobi", self.document.docname);
        let args = [OsStr::new("-o"), OsStr::new(&mobi_name), epub.as_os_str()];
        let success = run_tool(&converter, &args)?;
        let mobi = epub.with_file_name(&mobi_name);
        info!("Wrote MOBI to {}", mobi.display());
        Ok((mobi, success))
    }

    fn validate(&self, epub: &Path) -> Result<bool, PackagingError> {
        let validator = self.config.locate_validator()?;
        run_tool(&validator, &[epub.as_os_str()])
    }
}

/// Run `tool` to completion, echoing its output
fn run_tool(tool: &Path, args: &[&OsStr]) -> Result<bool, PackagingError> {
    debug!("Running {}", tool.display());
    let status = run_streaming(tool, args, |line| info!("{}", line)).map_err(io_error(tool))?;
    if !status.success() {
        warn!("{} exited unsuccessfully ({})", tool.display(), status);
    }
    Ok(status.success())
}

/// Unpack every file in `epub` into `dir`, replacing anything already there.
/// Entries which would land outside `dir` are skipped with a warning.
pub(crate) fn extract_epub(
    epub: &Path,
    dir: &Path,
    warnings: &mut Vec<String>,
) -> Result<(), PackagingError> {
    if dir.is_dir() {
        fs::remove_dir_all(dir).map_err(io_error(dir))?;
    }
    fs::create_dir_all(dir).map_err(io_error(dir))?;

    let file = File::open(epub).map_err(io_error(epub))?;
    let mut archive = ZipArchive::new(file)?;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let relative = match entry.enclosed_name() {
            Some(p) => p.to_path_buf(),
            None => {
                let message = format!(
                    "Skipping archive entry outside the extraction directory: {}",
                    entry.name()
                );
                warn!("{}", message);
                warnings.push(message);
                continue;
            }
        };
        let out = dir.join(relative);
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        let mut f = File::create(&out).map_err(io_error(&out))?;
        let _ = io::copy(&mut entry, &mut f).map_err(io_error(&out))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    #[test]
    fn test_archive_paths() {
        let document = Document::new("book", "My Book");
        let spine: Vec<SpineItem> = Vec::new();
        let standard = Packager::new(
            &document,
            &spine,
            "/tmp/out",
            TargetFormat::Standard,
            PackagerConfig::default(),
        );
        assert_eq!(standard.archive_path(), PathBuf::from("/tmp/out/book.epub"));
        let legacy = Packager::new(
            &document,
            &spine,
            "/tmp/out",
            TargetFormat::Legacy,
            PackagerConfig::default(),
        );
        assert_eq!(
            legacy.archive_path(),
            PathBuf::from("/tmp/out/book-legacy.epub")
        );
    }

    #[test]
    fn test_extract_skips_escaping_entries() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let archive = dir.path().join("test.epub");
        {
            let mut zip = zip::ZipWriter::new(File::create(&archive)?);
            zip.start_file("mimetype", FileOptions::default())?;
            zip.write_all(b"application/epub+zip")?;
            zip.start_file("OEBPS/text/a.xhtml", FileOptions::default())?;
            zip.write_all(b"<html/>")?;
            zip.start_file("../evil.txt", FileOptions::default())?;
            zip.write_all(b"nope")?;
            let _ = zip.finish()?;
        }
        let out = dir.path().join("test");
        fs::create_dir_all(out.join("stale"))?;

        let mut warnings = Vec::new();
        extract_epub(&archive, &out, &mut warnings)?;
        assert_eq!(fs::read_to_string(out.join("mimetype"))?, "application/epub+zip");
        assert_eq!(fs::read_to_string(out.join("OEBPS/text/a.xhtml"))?, "<html/>");
        assert!(!out.join("stale").exists());
        assert!(!dir.path().join("evil.txt").exists());
        assert_eq!(warnings.len(), 1);
        Ok(())
    }
}
