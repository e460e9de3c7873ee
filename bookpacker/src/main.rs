use bookpacker::{package_from_json, PackageOptions, PackagerConfig, TargetFormat};
use clap::{ArgAction, Parser};
use log::{info, warn};
use std::error::Error;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "bookpacker")]
#[command(version, about = "Package a json document as an epub or a Kindle book", long_about = None)]
#[command(after_help = "EXAMPLES:
    bookpacker book.json -d build                Write build/<docname>.epub
    bookpacker book.json -d build -f legacy      Write an epub for kindlegen, then build/<docname>.mobi
    cat book.json | bookpacker --validate        Write and validate ./<docname>.epub")]
struct Cli {
	/// The json document; read from stdin if not given
	#[arg(value_name = "INPUT")]
	input: Option<PathBuf>,

	/// The directory to write to
	#[arg(short, long, value_name = "DEST", default_value = ".")]
	dest: PathBuf,

	/// standard (epub3) or legacy (kf8)
	#[arg(short, long, default_value = "standard")]
	format: TargetFormat,

	/// Also unpack the container beside it
	#[arg(long)]
	extract: bool,

	/// Run epubcheck over a standard package
	#[arg(long)]
	validate: bool,

	/// Log more; repeat for more still
	#[arg(short, long, action = ArgAction::Count)]
	verbose: u8,
}

fn main() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();

	let filter = match cli.verbose {
		0 => "info",
		1 => "debug",
		_ => "trace",
	};
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

	let (json, base_dir) = match cli.input {
		Some(ref path) => {
			let json = std::fs::read_to_string(path)?;
			let base_dir = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
			(json, base_dir)
		}
		None => {
			let mut json = String::new();
			let _ = io::stdin().read_to_string(&mut json)?;
			(json, PathBuf::from("."))
		}
	};

	let options = PackageOptions {
		extract: cli.extract,
		validate: cli.validate,
	};
	let report = package_from_json(
		&json,
		&base_dir,
		cli.dest,
		cli.format,
		options,
		PackagerConfig::from_env(),
	)?;

	if !report.warnings.is_empty() {
		warn!("{} warning(s) while packaging", report.warnings.len());
	}
	if report.tool_success == Some(false) {
		warn!("The external tool reported problems; see its output above");
	}
	info!("Done: {}", report.epub.display());
	Ok(())
}
