use bookpacker_epub::*;
use std::error::Error;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

fn entry_names(archive: &Path) -> Result<Vec<String>, Box<dyn Error>> {
    let mut zip = ZipArchive::new(File::open(archive)?)?;
    let mut names = Vec::with_capacity(zip.len());
    for i in 0..zip.len() {
        names.push(zip.by_index(i)?.name().to_string());
    }
    Ok(names)
}

fn read_entry(archive: &Path, name: &str) -> Result<String, Box<dyn Error>> {
    let mut zip = ZipArchive::new(File::open(archive)?)?;
    let mut entry = zip.by_name(name)?;
    let mut s = String::new();
    let _ = entry.read_to_string(&mut s)?;
    Ok(s)
}

fn my_book(docdir: &Path) -> (Document, Vec<SpineItem>) {
    let mut document = Document::new("my-book", "My Book");
    document.docdir = docdir.to_path_buf();
    let spine = vec![SpineItem::new("intro", "Intro", "<p>Hi</p>")];
    (document, spine)
}

fn hrefs(source: &EpubSource) -> Result<Vec<String>, Box<dyn Error>> {
    Ok(source
        .manifest()?
        .iter()
        .map(|i| i.href.to_string())
        .collect())
}

#[test]
fn test_standard_package() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let (document, spine) = my_book(dir.path());
    let dest = dir.path().join("out");
    let packager = Packager::new(
        &document,
        &spine,
        &dest,
        TargetFormat::Standard,
        PackagerConfig::default(),
    );
    let report = packager.package(PackageOptions::default())?;

    assert_eq!(report.epub, dest.join("my-book.epub"));
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    assert_eq!(report.extracted, None);
    assert_eq!(report.tool_success, None);

    let names = entry_names(&report.epub)?;
    assert_eq!(names[0], "mimetype");
    for expected in [
        "META-INF/container.xml",
        "package.opf",
        "nav.xhtml",
        "cover.xhtml",
        "intro.xhtml",
        "jacket/cover.png",
        "avatars/default.png",
        "styles/epub3.css",
        "styles/epub3-css3-only.css",
        "styles/epub3-fonts.css",
        "fonts/dejavuserif-regular-latin.ttf",
        "toc.ncx",
    ]
    .iter()
    {
        assert!(names.iter().any(|n| n == expected), "missing {}", expected);
    }

    let opf = read_entry(&report.epub, "package.opf")?;
    assert!(opf.contains("<dc:language id=\"pub-language\">en</dc:language>"));
    assert!(opf.contains("<dc:title id=\"pub-title\">My Book</dc:title>"));
    assert!(opf.contains("<meta name=\"cover\" content=\"cover-image\"/>"));
    assert!(opf.contains(
        "<spine toc=\"ncx\">\n    <itemref idref=\"nav\"/>\n    <itemref idref=\"cover\"/>\n    <itemref idref=\"contents_1\"/>\n  </spine>"
    ));
    assert!(opf.contains("href=\"cover.xhtml\" properties=\"svg\""));
    assert!(opf.contains("media-type=\"application/x-font-ttf\" href=\"fonts/dejavuserif-regular-latin.ttf\""));

    let cover = read_entry(&report.epub, "cover.xhtml")?;
    assert!(cover.contains("viewBox=\"0 0 1050 1600\""));
    assert!(cover.contains("xlink:href=\"jacket/cover.png\""));
    Ok(())
}

#[test]
fn test_legacy_source() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let (document, mut spine) = my_book(dir.path());
    spine[0].content = String::from(
        "<p>Hi</p>\n<script type=\"text/javascript\">\nalert(1);\n</script>\n<img src=\"a.png\" alt=\"a\" style=\"width: 40%;\"/>",
    );
    let packager = Packager::new(
        &document,
        &spine,
        dir.path(),
        TargetFormat::Legacy,
        PackagerConfig::default(),
    );
    let (source, warnings) = packager.build_source()?;
    assert!(warnings.is_empty(), "{:?}", warnings);

    let paths = source
        .contents()
        .iter()
        .map(|c| c.output_path.to_string_lossy().to_string())
        .collect::<Vec<_>>();
    assert_eq!(paths, vec!["intro.xhtml"]);
    assert!(!hrefs(&source)?.iter().any(|h| h == "cover.xhtml"));
    assert!(!hrefs(&source)?.iter().any(|h| h == "toc.ncx"));

    let intro = &source.contents()[0].data;
    assert!(!intro.contains("<script"));
    assert!(intro.contains("style=\"width: 40%; height: 40%;\""));
    assert!(intro.contains("<meta http-equiv=\"Content-Type\" content=\"application/xml+xhtml; charset=UTF-8\"/>"));

    let css = source
        .resources()
        .iter()
        .find(|r| r.output_path == Path::new("styles/epub3.css"))
        .map(|r| String::from_utf8_lossy(&r.data).to_string())
        .unwrap_or_default();
    assert!(css.contains("font-family"));
    assert!(!css.contains("max-width"));
    assert!(!css.contains("-webkit-column-break"));

    let spine_ids = source
        .spine()?
        .iter()
        .map(|s| s.idref.to_string())
        .collect::<Vec<_>>();
    assert_eq!(spine_ids, vec!["nav", "contents_0"]);
    Ok(())
}

#[test]
fn test_missing_content_image() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let (document, mut spine) = my_book(dir.path());
    fs::create_dir_all(dir.path().join("images"))?;
    fs::write(dir.path().join("images/present.png"), b"png")?;
    spine[0].images.push(Image::new("images/missing.png"));
    spine[0].images.push(Image::new("images/present.png"));

    let packager = Packager::new(
        &document,
        &spine,
        dir.path().join("out"),
        TargetFormat::Standard,
        PackagerConfig::default(),
    );
    let report = packager.package(PackageOptions::default())?;
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("images/missing.png"));

    let names = entry_names(&report.epub)?;
    assert!(!names.iter().any(|n| n == "images/missing.png"));
    assert!(names.iter().any(|n| n == "images/present.png"));
    Ok(())
}

#[test]
fn test_item_imagesdir_and_reserved_cover_path() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let (mut document, mut spine) = my_book(dir.path());
    document.imagesdir = String::from("images");
    fs::create_dir_all(dir.path().join("images/jacket"))?;
    fs::create_dir_all(dir.path().join("figures"))?;
    fs::write(dir.path().join("images/jacket/cover.jpg"), b"jpg")?;
    fs::write(dir.path().join("figures/plot.svg"), b"<svg/>")?;

    spine[0].images.push(Image::new("jacket/cover.jpg"));
    let mut chapter = SpineItem::new("chapter", "Chapter", "<p>Plot</p>");
    chapter.imagesdir = Some(String::from("figures"));
    chapter.images.push(Image::new("plot.svg"));
    chapter.epub_properties.push(String::from("svg"));
    spine.push(chapter);

    let packager = Packager::new(
        &document,
        &spine,
        dir.path(),
        TargetFormat::Standard,
        PackagerConfig::default(),
    );
    let (source, warnings) = packager.build_source()?;
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("reserved for the cover artwork"));

    let registered = hrefs(&source)?;
    let has = |href: &str| registered.iter().any(|h| h == href);
    assert!(has("figures/plot.svg"));
    assert!(!has("images/jacket/cover.jpg"));
    // the default cover, under the document's images directory
    assert!(has("images/jacket/cover.png"));
    assert!(has("images/avatars/default.png"));

    let manifest = source.manifest()?;
    let chapter = manifest
        .iter()
        .find(|i| i.href == "chapter.xhtml")
        .map(|i| i.properties.clone());
    assert_eq!(chapter, Some(vec!["svg"]));
    Ok(())
}

#[test]
fn test_avatars() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let (document, mut spine) = my_book(dir.path());
    fs::create_dir_all(dir.path().join("avatars"))?;
    fs::write(dir.path().join("avatars/ann.png"), b"ann's face")?;

    spine[0].username = Some(String::from("ann"));
    for (i, user) in ["jdoe", "ann", "jdoe"].iter().enumerate() {
        let mut item = SpineItem::new(format!("reply{}", i), "Reply", "<p>Reply</p>");
        item.username = Some(user.to_string());
        spine.push(item);
    }

    let config = PackagerConfig::default();
    let default_avatar = fs::read(config.data_path("images/default-avatar.png"))?;
    let packager = Packager::new(&document, &spine, dir.path(), TargetFormat::Standard, config);
    let (source, warnings) = packager.build_source()?;
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("avatars/jdoe.png"));

    let avatar = |path: &str| {
        source
            .resources()
            .iter()
            .filter(|r| r.output_path == Path::new(path))
            .map(|r| r.data.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(avatar("avatars/default.png"), vec![default_avatar.clone()]);
    assert_eq!(avatar("avatars/jdoe.png"), vec![default_avatar]);
    assert_eq!(avatar("avatars/ann.png"), vec![b"ann's face".to_vec()]);
    Ok(())
}

#[test]
fn test_explicit_cover() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let (mut document, spine) = my_book(dir.path());
    document.imagesdir = String::from("images/");
    document.front_cover_image = Some(String::from("image:front.jpg[Front Cover,800,1200]"));
    fs::create_dir_all(dir.path().join("images"))?;
    fs::write(dir.path().join("images/front.jpg"), b"jpeg")?;

    let packager = Packager::new(
        &document,
        &spine,
        dir.path(),
        TargetFormat::Standard,
        PackagerConfig::default(),
    );
    let (source, warnings) = packager.build_source()?;
    assert!(warnings.is_empty(), "{:?}", warnings);

    let cover = source.cover_image().map(|c| (c.output_path.clone(), c.data.clone()));
    assert_eq!(
        cover,
        Some((Path::new("images/jacket/cover.jpg").to_path_buf(), b"jpeg".to_vec()))
    );
    let page = &source.contents()[0];
    assert_eq!(page.id.as_deref(), Some("cover"));
    assert!(page.data.contains("viewBox=\"0 0 800 1200\""));
    assert!(page.data.contains("xlink:href=\"images/jacket/cover.jpg\""));
    Ok(())
}

#[test]
fn test_unreadable_cover_falls_back() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let (mut document, spine) = my_book(dir.path());
    document.front_cover_image = Some(String::from("no-such-cover.jpg"));

    let packager = Packager::new(
        &document,
        &spine,
        dir.path(),
        TargetFormat::Standard,
        PackagerConfig::default(),
    );
    let (source, warnings) = packager.build_source()?;
    assert_eq!(warnings.len(), 1);
    assert_eq!(
        source.cover_image().map(|c| c.output_path.clone()),
        Some(Path::new("jacket/cover.png").to_path_buf())
    );
    assert!(source.contents()[0].data.contains("viewBox=\"0 0 1050 1600\""));
    Ok(())
}

#[test]
fn test_title_sanitization() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let (mut document, mut spine) = my_book(dir.path());
    document.title = String::from("Tom <em>&amp;</em> Jerry\u{2060}s");
    spine[0].title = String::from("Chase &amp; Run");

    let packager = Packager::new(
        &document,
        &spine,
        dir.path(),
        TargetFormat::Standard,
        PackagerConfig::default(),
    );
    let (source, _) = packager.build_source()?;
    let opf = source.package_document()?;
    assert!(opf.contains("<dc:title id=\"pub-title\">Tom &amp; Jerrys</dc:title>"));
    assert!(!opf.contains('\u{2060}'));

    let intro = &source.contents()[1];
    assert_eq!(
        intro.toc_entry.as_ref().map(|t| t.title.as_str()),
        Some("Chase & Run")
    );
    Ok(())
}

#[test]
fn test_extract() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let (document, spine) = my_book(dir.path());
    let dest = dir.path().join("out");
    fs::create_dir_all(dest.join("my-book/stale"))?;

    let packager = Packager::new(
        &document,
        &spine,
        &dest,
        TargetFormat::Standard,
        PackagerConfig::default(),
    );
    let options = PackageOptions {
        extract: true,
        validate: false,
    };
    let report = packager.package(options)?;
    let extracted = dest.join("my-book");
    assert_eq!(report.extracted, Some(extracted.clone()));
    assert_eq!(
        fs::read_to_string(extracted.join("mimetype"))?,
        "application/epub+zip"
    );
    assert!(extracted.join("META-INF/container.xml").is_file());
    assert!(extracted.join("jacket/cover.png").is_file());
    assert!(extracted.join("styles/epub3.css").is_file());
    assert!(!extracted.join("stale").exists());
    Ok(())
}

#[test]
fn test_repackaging_is_stable() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let (mut document, spine) = my_book(dir.path());
    document.id = Some(String::from("urn:uuid:0d7a3f36-8d38-4c8c-9a43-3c1b5e0f5f15"));
    let packager = Packager::new(
        &document,
        &spine,
        dir.path(),
        TargetFormat::Standard,
        PackagerConfig::default(),
    );
    let first = packager.package(PackageOptions::default())?;
    let second = packager.package(PackageOptions::default())?;
    assert_eq!(first.epub, second.epub);
    assert_eq!(entry_names(&first.epub)?, entry_names(&second.epub)?);
    Ok(())
}

fn copy_dir(from: &Path, to: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            let _ = fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}

#[test]
fn test_missing_theme_font() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let data = dir.path().join("data");
    copy_dir(&PackagerConfig::default().data_dir, &data)?;
    fs::remove_file(data.join("fonts/dejavuserif-bold-latin.ttf"))?;

    let (document, spine) = my_book(dir.path());
    let mut config = PackagerConfig::default();
    let _ = config.data_dir(&data);
    let packager = Packager::new(&document, &spine, dir.path(), TargetFormat::Standard, config);
    let (source, warnings) = packager.build_source()?;
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("fonts/dejavuserif-bold-latin.ttf"));

    let fonts = source
        .manifest()?
        .iter()
        .filter(|i| i.href.starts_with("fonts/"))
        .map(|i| (i.href.to_string(), i.media_type))
        .collect::<Vec<_>>();
    assert_eq!(fonts.len(), 3);
    assert!(!fonts.iter().any(|(href, _)| href.contains("bold")));
    assert!(fonts
        .iter()
        .all(|(_, media_type)| *media_type == "application/x-font-ttf"));
    Ok(())
}

#[derive(Debug)]
struct ShoutingConverter;

impl Converter for ShoutingConverter {
    fn convert(&self, item: &SpineItem) -> String {
        format!("<html><body>{}</body></html>", item.content.to_uppercase())
    }

    fn navigation_document(&self, document: &Document, _spine: &[SpineItem]) -> String {
        format!("<html><body><nav epub:type=\"toc\">{}</nav></body></html>", document.title)
    }
}

#[test]
fn test_custom_converter() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let (document, spine) = my_book(dir.path());
    let packager = Packager::new(
        &document,
        &spine,
        dir.path(),
        TargetFormat::Standard,
        PackagerConfig::default(),
    )
    .with_converter(ShoutingConverter);
    let report = packager.package(PackageOptions::default())?;

    assert_eq!(
        read_entry(&report.epub, "intro.xhtml")?,
        "<html><body><P>HI</P></body></html>"
    );
    assert!(read_entry(&report.epub, "nav.xhtml")?.contains("<nav epub:type=\"toc\">My Book</nav>"));
    Ok(())
}
