use async_trait::async_trait;

use crate::errors::CoreError;

/// Where CSV text for an import comes from (a picked file, a pasted
/// buffer, a browser `FileReader`...). Reading is the only suspension point
/// of an import; merging afterwards is synchronous.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait CsvSource {
    /// Human-readable name of the source (for logs).
    fn name(&self) -> String;

    /// Read the whole source as UTF-8 text.
    async fn read_text(&self) -> Result<String, CoreError>;
}

/// Outcome of a CSV import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Rows merged into the store
    pub imported: usize,
    /// Data rows dropped by the decoder
    pub skipped: usize,
}

/// In-memory text, e.g. a pasted buffer.
#[derive(Debug, Clone)]
pub struct TextSource {
    label: String,
    text: String,
}

impl TextSource {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl CsvSource for TextSource {
    fn name(&self) -> String {
        self.label.clone()
    }

    async fn read_text(&self) -> Result<String, CoreError> {
        Ok(self.text.clone())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileSource;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};

    use super::CsvSource;
    use crate::errors::CoreError;

    /// A local file read with `tokio::fs`.
    #[derive(Debug, Clone)]
    pub struct FileSource {
        path: PathBuf,
    }

    impl FileSource {
        pub fn new(path: impl AsRef<Path>) -> Self {
            Self {
                path: path.as_ref().to_path_buf(),
            }
        }
    }

    #[async_trait]
    impl CsvSource for FileSource {
        fn name(&self) -> String {
            self.path.display().to_string()
        }

        async fn read_text(&self) -> Result<String, CoreError> {
            Ok(tokio::fs::read_to_string(&self.path).await?)
        }
    }
}
