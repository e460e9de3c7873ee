//! Where bundled assets and external tools are found.
use crate::PackagingError;
use bookpacker_common::{find_executable, is_executable};
use log::{debug, warn};
use std::env;
use std::path::{Path, PathBuf};

/// The name of the converter looked for when none is configured
pub const CONVERTER_NAME: &str = "kindlegen";
/// The name of the validator looked for when none is configured
pub const VALIDATOR_NAME: &str = "epubcheck";

/// Where to find bundled assets and external tools.
///
/// This is built once, before packaging, and then only read.
#[derive(Debug, Clone, PartialEq)]
pub struct PackagerConfig {
    /// The directory of bundled styles, fonts and images;
    /// it may also contain helper executables in `bin/`
    pub data_dir: PathBuf,
    /// An explicit path to the converter used for the legacy format
    pub converter: Option<PathBuf>,
    /// An explicit path to the validator
    pub validator: Option<PathBuf>,
}

impl Default for PackagerConfig {
    fn default() -> Self {
        PackagerConfig {
            data_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/data")),
            converter: None,
            validator: None,
        }
    }
}

impl PackagerConfig {
    /// The default configuration, overridden by the environment variables
    /// `BOOKPACKER_DATA_DIR`, `KINDLEGEN` and `EPUBCHECK`
    pub fn from_env() -> Self {
        let mut config = PackagerConfig::default();
        if let Some(dir) = env::var_os("BOOKPACKER_DATA_DIR") {
            let _ = config.data_dir(dir);
        }
        if let Some(converter) = env::var_os("KINDLEGEN") {
            let _ = config.converter(converter);
        }
        if let Some(validator) = env::var_os("EPUBCHECK") {
            let _ = config.validator(validator);
        }
        config
    }

    /// Use a different directory of bundled assets
    pub fn data_dir<P: Into<PathBuf>>(&mut self, dir: P) -> &mut Self {
        self.data_dir = dir.into();
        self
    }

    /// Set the path of the converter
    pub fn converter<P: Into<PathBuf>>(&mut self, converter: P) -> &mut Self {
        self.converter = Some(converter.into());
        self
    }

    /// Set the path of the validator
    pub fn validator<P: Into<PathBuf>>(&mut self, validator: P) -> &mut Self {
        self.validator = Some(validator.into());
        self
    }

    /// The path of a bundled file, relative to the data directory
    pub fn data_path<P: AsRef<Path>>(&self, relative: P) -> PathBuf {
        self.data_dir.join(relative)
    }

    /// Find the converter: the configured path if it is executable,
    /// then a helper bundled in the data directory, then `kindlegen` on `PATH`
    pub fn locate_converter(&self) -> Result<PathBuf, PackagingError> {
        self.locate_tool(self.converter.as_deref(), CONVERTER_NAME)
    }

    /// Find the validator, in the same way as the converter
    pub fn locate_validator(&self) -> Result<PathBuf, PackagingError> {
        self.locate_tool(self.validator.as_deref(), VALIDATOR_NAME)
    }

    fn locate_tool(
        &self,
        configured: Option<&Path>,
        name: &'static str,
    ) -> Result<PathBuf, PackagingError> {
        if let Some(path) = configured {
            if is_executable(path) {
                return Ok(path.to_path_buf());
            }
            warn!(
                "{} is not an executable file; looking for {} elsewhere",
                path.display(),
                name
            );
        }
        let bundled = self.data_path("bin").join(name);
        if is_executable(&bundled) {
            debug!("Using bundled {} at {}", name, bundled.display());
            return Ok(bundled);
        }
        find_executable(name).ok_or(PackagingError::MissingTool(name))
    }
}
