//! Loading of chart configuration files, in JSON5 or YAML format
//! depending on the file name extension.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use serde::de::DeserializeOwned;

use crate::{chart::ChartOptions, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigBackend {
    Json5,
    Yaml,
}

fn json5_error_message(e: &json5::Error) -> String {
    match e {
        json5::Error::Message { msg, location } => match location {
            Some(json5::Location { line, column }) => format!("{msg} at line:column {line}:{column}"),
            None => msg.clone(),
        },
    }
}

impl ConfigBackend {
    pub fn parse_config<T: DeserializeOwned>(self, s: &str) -> Result<T> {
        match self {
            ConfigBackend::Json5 => {
                json5::from_str(s).map_err(|e| anyhow!("decoding JSON5: {}", json5_error_message(&e)))
            }
            ConfigBackend::Yaml => serde_yml::from_str(s).context("decoding YAML"),
        }
    }

    pub fn load_config_file<T: DeserializeOwned>(self, path: &Path) -> Result<T> {
        let s = std::fs::read_to_string(path)
            .with_context(|| anyhow!("loading config file from {path:?}"))?;
        self.parse_config(&s)
            .with_context(|| anyhow!("reading config file {path:?}"))
    }
}

pub const FILE_EXTENSIONS: &[(&str, ConfigBackend)] = &[
    ("json5", ConfigBackend::Json5),
    ("json", ConfigBackend::Json5),
    ("yml", ConfigBackend::Yaml),
    ("yaml", ConfigBackend::Yaml),
];

pub fn backend_from_path(path: &Path) -> Result<ConfigBackend> {
    if let Some(ext) = path.extension() {
        if let Some(ext) = ext.to_str() {
            if let Some((_, backend)) = FILE_EXTENSIONS.iter().find(|(e, _b)| *e == ext) {
                Ok(*backend)
            } else {
                bail!("given file path does have an unknown extension {ext:?}: {path:?}")
            }
        } else {
            bail!("given file path does have an extension that is not unicode: {path:?}")
        }
    } else {
        bail!(
            "given file path does not have an extension \
             for determining the file type: {path:?}"
        )
    }
}

fn add_extension(path: &Path, extension: &str) -> Option<PathBuf> {
    let mut file_name = path.file_name()?.to_owned();
    file_name.push(".");
    file_name.push(extension);
    Some(path.with_file_name(file_name))
}

pub trait LoadConfigFile: DeserializeOwned + Default {
    /// The supported extensions are appended to this path and
    /// checked in turn.
    fn default_config_path_without_suffix() -> Result<Option<PathBuf>>;

    /// If `path` is given, the file must exist or an error is
    /// returned. Otherwise, the default location is checked
    /// (`default_config_path_without_suffix`): if a single file with
    /// one of the supported extensions exists there, it is loaded; if
    /// several exist, that's an error; if none exists, the `Default`
    /// instance is returned.
    fn load_config<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        if let Some(path) = path {
            let path = path.as_ref();
            let backend = backend_from_path(path)?;
            return backend.load_config_file(path);
        }
        let Some(path) = Self::default_config_path_without_suffix()? else {
            return Ok(Self::default());
        };
        let mut found = Vec::new();
        for (extension, backend) in FILE_EXTENSIONS {
            let path = add_extension(&path, extension)
                .ok_or_else(|| anyhow!("path is missing a file name: {path:?}"))?;
            if path.exists() {
                found.push((path, *backend));
            }
        }
        match found.as_slice() {
            [] => Ok(Self::default()),
            [(path, backend)] => {
                info!("using config file {path:?}");
                backend.load_config_file(path)
            }
            _ => {
                let paths: Vec<_> = found.iter().map(|(path, _)| path).collect();
                bail!("multiple config file paths found, leading to ambiguity: {paths:?}")
            }
        }
    }
}

impl LoadConfigFile for ChartOptions {
    fn default_config_path_without_suffix() -> Result<Option<PathBuf>> {
        Ok(Some(PathBuf::from(".pi-durations")))
    }
}
