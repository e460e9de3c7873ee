#![deny(dead_code)]
#![deny(unreachable_patterns)]
#![deny(unused_extern_crates)]
#![deny(unused_imports)]
#![deny(unused_qualifications)]
#![deny(clippy::all)]
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![deny(unused_results)]
#![deny(variant_size_differences)]

//! A set of utilites used across the packaging crates.
//! Note that the packager calls out to some external commands, which are located
//! and run through this crate:
//! - `kindlegen` (only when producing the legacy Kindle format)
//! - `epubcheck` (only when validation is requested)

use aho_corasick::AhoCorasick;
use lazy_static::lazy_static;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
mod mimetypes;
pub use mimetypes::{GuessMimeType, MimeType, MimeTypeHelper};

/// U+2060 WORD JOINER, used in titles as a formatting hint
pub const WORD_JOINER: char = '\u{2060}';

lazy_static! {
	static ref XML_FINDER: AhoCorasick = AhoCorasick::new(&XML_TARGET_CHARS);
	static ref ENTITY_FINDER: AhoCorasick = AhoCorasick::new(&ENTITY_TARGETS);
}

static XML_TARGET_CHARS: [&str; 4] = [
	"<",
	">",
	"&",
	"\""
];

static XML_REPLACEMENTS: [&str; 4] = [
	"&lt;",
	"&gt;",
	"&amp;",
	"&quot;"
];

static ENTITY_TARGETS: [&str; 6] = [
	"&lt;",
	"&gt;",
	"&amp;",
	"&quot;",
	"&apos;",
	"&#39;"
];

static ENTITY_REPLACEMENTS: [&str; 6] = [
	"<",
	">",
	"&",
	"\"",
	"'",
	"'"
];

/// escape `input` for use as xml text or attribute content
pub fn escape_to_xml<'a, S: Into<Cow<'a, str>>>(input: S) -> Cow<'a, str> {
	let input = input.into();
	if XML_FINDER.is_match(input.as_bytes()) {
		Cow::Owned(XML_FINDER.replace_all(&input, &XML_REPLACEMENTS))
	} else {
		input
	}
}

/// decode the html special character entities in `input` back to literal characters
/// ```
/// # use bookpacker_common::unescape_html_entities;
/// assert_eq!(unescape_html_entities("Tom &amp; Jerry"), "Tom & Jerry");
/// ```
pub fn unescape_html_entities<'a, S: Into<Cow<'a, str>>>(input: S) -> Cow<'a, str> {
	let input = input.into();
	if ENTITY_FINDER.is_match(input.as_bytes()) {
		Cow::Owned(ENTITY_FINDER.replace_all(&input, &ENTITY_REPLACEMENTS))
	} else {
		input
	}
}

#[cfg(unix)]
fn is_executable_file(p: &Path) -> bool {
	use std::os::unix::fs::PermissionsExt;
	match p.metadata() {
		Ok(m) => m.is_file() && m.permissions().mode() & 0o111 != 0,
		Err(_) => false
	}
}

#[cfg(not(unix))]
fn is_executable_file(p: &Path) -> bool {
	p.is_file()
}

/// Is `p` an existing file which we could run?
pub fn is_executable<P: AsRef<Path>>(p: P) -> bool {
	is_executable_file(p.as_ref())
}

/// Find an executable by name on `PATH`;
/// a name containing a path separator is checked directly instead.
pub fn find_executable<S: AsRef<OsStr>>(name: S) -> Option<PathBuf> {
	let name = Path::new(name.as_ref());
	if name.components().count() > 1 {
		return if is_executable(name) {
			Some(name.to_path_buf())
		} else {
			None
		};
	}
	let paths = std::env::var_os("PATH")?;
	std::env::split_paths(&paths)
		.map(|dir| dir.join(name))
		.find(|candidate| is_executable(candidate))
}

fn forward_lines<R: Read + Send + 'static>(src: R, tx: mpsc::Sender<String>) -> thread::JoinHandle<()> {
	thread::spawn(move || {
		let reader = BufReader::new(src);
		for line in reader.lines() {
			match line {
				Ok(line) => {
					if tx.send(line).is_err() {
						break;
					}
				},
				Err(_) => break
			}
		}
	})
}

/// Run `program` with `args` to completion, passing each line of its combined
/// stdout and stderr to `on_line` as it arrives.
///
/// A non-zero exit is not treated as an error here; it is up to the caller
/// to inspect the returned status.
pub fn run_streaming<P, I, A, F>(program: P, args: I, mut on_line: F) -> Result<ExitStatus, std::io::Error>
where
	P: AsRef<OsStr>,
	I: IntoIterator<Item = A>,
	A: AsRef<OsStr>,
	F: FnMut(&str)
{
	let mut child = Command::new(program)
		.args(args)
		.stdin(Stdio::null())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.spawn()?;

	let (tx, rx) = mpsc::channel();
	let mut readers = Vec::with_capacity(2);
	if let Some(stdout) = child.stdout.take() {
		readers.push(forward_lines(stdout, tx.clone()));
	}
	if let Some(stderr) = child.stderr.take() {
		readers.push(forward_lines(stderr, tx.clone()));
	}
	drop(tx);

	// ends once both pipes are closed
	for line in rx {
		on_line(&line);
	}
	for reader in readers {
		let _ = reader.join();
	}
	child.wait()
}
