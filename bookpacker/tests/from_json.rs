use bookpacker::{package_from_json, BookpackerError, PackageOptions, PackagerConfig, TargetFormat};
use std::error::Error;
use std::fs::{self, File};
use std::io::Read;
use zip::ZipArchive;

static BOOK: &str = r#"{
	"title": "Pride &amp; <em>Prejudice</em>",
	"docname": "pride",
	"id": "urn:uuid:8f4b5b1e-7f57-4c1c-9c38-4d3d0b3c2f01",
	"lang": "en-GB",
	"author": "Jane Austen",
	"keywords": "novel, regency",
	"revdate": "1813-01-28",
	"imagesdir": "images",
	"spine": [
		{"docname": "chapter-1", "title": "Chapter 1", "content": "text/chapter-1.xhtml", "images": ["ball.png"]},
		{"docname": "chapter-2", "title": "Chapter 2", "content": "<p>Mr. Bennet was among the earliest...</p>"}
	]
}"#;

fn read_entry(zip: &mut ZipArchive<File>, name: &str) -> Result<String, Box<dyn Error>> {
	let mut s = String::new();
	let _ = zip.by_name(name)?.read_to_string(&mut s)?;
	Ok(s)
}

#[test]
fn package_book_from_json() -> Result<(), Box<dyn Error>> {
	let dir = tempfile::tempdir()?;
	fs::create_dir_all(dir.path().join("text"))?;
	fs::create_dir_all(dir.path().join("images"))?;
	fs::write(
		dir.path().join("text/chapter-1.xhtml"),
		"<p>It is a truth universally acknowledged...</p>",
	)?;
	fs::write(dir.path().join("images/ball.png"), b"png")?;

	let dest = dir.path().join("build");
	let report = package_from_json(
		BOOK,
		dir.path(),
		&dest,
		TargetFormat::Standard,
		PackageOptions::default(),
		PackagerConfig::default(),
	)?;
	assert_eq!(report.epub, dest.join("pride.epub"));
	assert!(report.warnings.is_empty(), "{:?}", report.warnings);

	let mut zip = ZipArchive::new(File::open(&report.epub)?)?;
	let chapter = read_entry(&mut zip, "chapter-1.xhtml")?;
	assert!(chapter.contains("It is a truth universally acknowledged"));
	assert!(zip.by_name("images/ball.png").is_ok());
	assert!(zip.by_name("images/jacket/cover.png").is_ok());

	let opf = read_entry(&mut zip, "package.opf")?;
	assert!(opf.contains("urn:uuid:8f4b5b1e-7f57-4c1c-9c38-4d3d0b3c2f01"));
	assert!(opf.contains("<dc:language id=\"pub-language\">en-GB</dc:language>"));
	assert!(opf.contains("<dc:title id=\"pub-title\">Pride &amp; Prejudice</dc:title>"));
	assert!(opf.contains("Jane Austen"));
	assert!(opf.contains("1813-01-28"));
	assert!(opf.contains("regency"));
	Ok(())
}

#[test]
fn missing_content_file_is_an_error() -> Result<(), Box<dyn Error>> {
	let dir = tempfile::tempdir()?;
	let result = package_from_json(
		BOOK,
		dir.path(),
		dir.path().join("build"),
		TargetFormat::Standard,
		PackageOptions::default(),
		PackagerConfig::default(),
	);
	assert!(matches!(result, Err(BookpackerError::Deserialization(_))));
	assert!(!dir.path().join("build/pride.epub").exists());
	Ok(())
}
