#![cfg(unix)]
use bookpacker_epub::*;
use std::error::Error;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

fn write_script(dir: &Path, name: &str, body: &str) -> Result<PathBuf, Box<dyn Error>> {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}", body))?;
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
    Ok(path)
}

// Kept to a single test so that no other thread forks while a script is open for writing
#[test]
fn test_external_tools() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let tools = dir.path().join("tools");
    fs::create_dir_all(&tools)?;

    // invoked as `kindlegen -o <name>.mobi <epub>`
    let kindlegen = write_script(
        &tools,
        "fake-kindlegen",
        "echo \"Info: converting $3\"\necho \"Warning: odd markup\" 1>&2\ntouch \"$(dirname \"$3\")/$2\"\n",
    )?;
    let failing = write_script(&tools, "failing-kindlegen", "echo \"Error: bad epub\" 1>&2\nexit 1\n")?;
    let epubcheck = write_script(
        &tools,
        "fake-epubcheck",
        "test -f \"$1\" || exit 2\necho \"No errors or warnings detected.\"\n",
    )?;

    let mut document = Document::new("my-book", "My Book");
    document.docdir = dir.path().to_path_buf();
    let spine = vec![SpineItem::new("intro", "Intro", "<p>Hi</p>")];
    let dest = dir.path().join("out");

    let mut config = PackagerConfig::default();
    let _ = config.converter(&kindlegen);
    let legacy = Packager::new(&document, &spine, &dest, TargetFormat::Legacy, config);
    let report = legacy.package(PackageOptions::default())?;
    assert_eq!(report.epub, dest.join("my-book-legacy.epub"));
    assert_eq!(report.converted, Some(dest.join("my-book.mobi")));
    assert_eq!(report.tool_success, Some(true));
    assert!(dest.join("my-book.mobi").is_file());

    // a failing converter is reported, not raised
    let mut config = PackagerConfig::default();
    let _ = config.converter(&failing);
    let legacy = Packager::new(&document, &spine, &dest, TargetFormat::Legacy, config);
    let report = legacy.package(PackageOptions::default())?;
    assert_eq!(report.tool_success, Some(false));

    let mut config = PackagerConfig::default();
    let _ = config.validator(&epubcheck);
    let standard = Packager::new(&document, &spine, &dest, TargetFormat::Standard, config);
    let report = standard.package(PackageOptions::default())?;
    assert_eq!(report.tool_success, None);
    let report = standard.package(PackageOptions {
        extract: false,
        validate: true,
    })?;
    assert_eq!(report.tool_success, Some(true));
    assert_eq!(report.converted, None);
    Ok(())
}
