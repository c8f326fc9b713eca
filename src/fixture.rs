use std::{fs, io::Write, path::Path};

use tempfile::NamedTempFile;
use tracing::trace;

use crate::error::CheckError;

/// A temporary upload payload. The file lives exactly as long as this value:
/// dropping it removes the file from disk, on success, on `?` early returns
/// and on unwinding alike.
#[derive(Debug)]
pub struct StagedFile {
    file: NamedTempFile,
    file_name: String,
    mime_type: String,
}

impl StagedFile {
    /// Write `contents` to a fresh `<prefix>*.<extension>` file inside `dir`.
    pub fn stage(
        dir: &Path,
        prefix: &str,
        extension: &str,
        contents: &[u8],
    ) -> Result<Self, CheckError> {
        let suffix = format!(".{extension}");
        let mut file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(&suffix)
            .tempfile_in(dir)
            .map_err(|err| CheckError::fixture(prefix, err))?;
        file.write_all(contents)
            .and_then(|_| file.flush())
            .map_err(|err| CheckError::fixture(prefix, err))?;

        let file_name = file
            .path()
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_owned)
            .unwrap_or_else(|| format!("{prefix}{suffix}"));
        let mime_type = mime_guess::from_path(file.path())
            .first_or_octet_stream()
            .essence_str()
            .to_owned();

        trace!(path = %file.path().display(), bytes = contents.len(), "fixture staged");
        Ok(Self {
            file,
            file_name,
            mime_type,
        })
    }

    /// Stage a minimal PDF document.
    pub fn pdf(dir: &Path, prefix: &str, marker: &str) -> Result<Self, CheckError> {
        let contents = format!("%PDF-1.4 {marker}");
        Self::stage(dir, prefix, "pdf", contents.as_bytes())
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn read(&self) -> Result<Vec<u8>, CheckError> {
        fs::read(self.path()).map_err(|err| CheckError::fixture(&self.file_name, err))
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        // NamedTempFile unlinks the file once this returns.
        trace!(path = %self.file.path().display(), "removing staged fixture");
    }
}
