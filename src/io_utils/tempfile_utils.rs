//! Writing output files so that the target path either keeps its old
//! contents or receives the complete new contents, never a partial
//! file.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use nix::unistd::{getpid, gettid};

use crate::info;

#[derive(Debug, thiserror::Error)]
pub enum TempfileError {
    #[error("path is missing file name part")]
    MissingFileName,
    #[error("IO error while {0} {1:?}: {2:#}")]
    IOError(&'static str, PathBuf, std::io::Error),
}

/// Append a suffix `.tmp~..-..` where the numbers are pid and tid
pub fn temp_path(target_path: impl AsRef<Path>) -> Result<PathBuf, TempfileError> {
    let target_path = target_path.as_ref();
    let file_name = target_path
        .file_name()
        .ok_or(TempfileError::MissingFileName)?;
    let mut file_name: Vec<u8> = file_name.to_string_lossy().to_string().into();
    let pid = getpid();
    let tid = gettid();
    write!(&mut file_name, ".tmp~{pid}-{tid}").expect("nofail: no IO");
    let file_name =
        String::from_utf8(file_name).expect("nofail: was a string, with strings appended");
    Ok(target_path.with_file_name(file_name))
}

#[derive(Debug, Clone)]
pub struct TempfileOpts {
    pub target_path: PathBuf,
    pub retain_tempfile: bool,
}

impl TempfileOpts {
    pub fn tempfile(self) -> Result<Tempfile, TempfileError> {
        Tempfile::try_from(self)
    }
}

/// A temporary path next to `opts.target_path`. Dropping it without
/// calling `finish` deletes the temporary file (unless
/// `retain_tempfile` is set).
#[derive(Debug)]
pub struct Tempfile {
    pub opts: TempfileOpts,
    pub temp_path: PathBuf,
}

impl TryFrom<TempfileOpts> for Tempfile {
    type Error = TempfileError;

    fn try_from(opts: TempfileOpts) -> Result<Self, TempfileError> {
        let temp_path = temp_path(&opts.target_path)?;
        Ok(Tempfile { opts, temp_path })
    }
}

impl Tempfile {
    pub fn write_all(&self, contents: &[u8]) -> Result<(), TempfileError> {
        std::fs::write(&self.temp_path, contents)
            .map_err(|e| TempfileError::IOError("writing", self.temp_path.clone(), e))
    }

    /// Move the temporary file over the target path.
    pub fn finish(mut self) -> Result<(), TempfileError> {
        self.opts.retain_tempfile = true; // tell Drop that it should do nothing
        std::fs::rename(&self.temp_path, &self.opts.target_path).map_err(|e| {
            TempfileError::IOError("renaming to target", self.opts.target_path.clone(), e)
        })
    }
}

impl Drop for Tempfile {
    fn drop(&mut self) {
        let Self {
            opts:
                TempfileOpts {
                    target_path: _,
                    retain_tempfile,
                },
            temp_path,
        } = self;
        if !*retain_tempfile {
            match std::fs::remove_file(&*temp_path) {
                Ok(()) => (),
                Err(e) => match e.kind() {
                    std::io::ErrorKind::NotFound => (),
                    _ => info!("error deleting temporary file {:?}: {e:#}", temp_path),
                },
            }
        }
    }
}

/// Write `contents` to `target_path` via a temporary file in the same
/// directory.
pub fn write_file_atomically(
    target_path: impl AsRef<Path>,
    contents: &[u8],
) -> Result<(), TempfileError> {
    let tempfile = TempfileOpts {
        target_path: target_path.as_ref().to_owned(),
        retain_tempfile: false,
    }
    .tempfile()?;
    tempfile.write_all(contents)?;
    tempfile.finish()
}
