//! Temporary on-disk staging for outbound documents.

use std::path::Path;

use tempfile::TempDir;

use super::renderer::InvoiceDocument;

/// An invoice written to a private temporary directory.
///
/// The directory and the file inside it are removed when this value is
/// dropped, so the file lives exactly as long as the send that needs it.
pub struct StagedDocument {
    dir: TempDir,
    file_name: String,
}

impl StagedDocument {
    /// Write `doc` to `<tmpdir>/<doc.file_name>`.
    pub async fn stage(doc: &InvoiceDocument) -> std::io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("invoice-bot-").tempdir()?;
        tokio::fs::write(dir.path().join(&doc.file_name), &doc.bytes).await?;
        Ok(Self {
            dir,
            file_name: doc.file_name.clone(),
        })
    }

    pub fn path(&self) -> std::path::PathBuf {
        self.dir.path().join(&self.file_name)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}
