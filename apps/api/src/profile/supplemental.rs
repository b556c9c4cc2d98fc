use std::path::PathBuf;

use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Supplemental interview text, loaded at most once per holder.
///
/// States: not yet loaded (`is_loaded() == false`) and loaded, where the
/// loaded value may be empty when neither source is readable. There is no
/// invalidation; construct a new holder to start over.
///
/// Sources, in order: the PDF, then the plain-text file, then empty.
pub struct SupplementalText {
    pdf_path: PathBuf,
    text_path: PathBuf,
    cell: OnceCell<String>,
}

impl SupplementalText {
    pub fn new(pdf_path: impl Into<PathBuf>, text_path: impl Into<PathBuf>) -> Self {
        Self {
            pdf_path: pdf_path.into(),
            text_path: text_path.into(),
            cell: OnceCell::new(),
        }
    }

    /// Holder that is already in the loaded state.
    pub fn preloaded(text: impl Into<String>) -> Self {
        Self {
            pdf_path: PathBuf::new(),
            text_path: PathBuf::new(),
            cell: OnceCell::new_with(Some(text.into())),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// Returns the text, loading it on first access. Never fails.
    pub async fn get(&self) -> &str {
        self.cell
            .get_or_init(|| load(self.pdf_path.clone(), self.text_path.clone()))
            .await
            .as_str()
    }
}

async fn load(pdf_path: PathBuf, text_path: PathBuf) -> String {
    // pdf-extract is synchronous and can panic on malformed input; a panic
    // surfaces here as a JoinError.
    let pdf_display = pdf_path.display().to_string();
    match tokio::task::spawn_blocking(move || pdf_extract::extract_text(&pdf_path)).await {
        Ok(Ok(text)) => {
            info!("Loaded supplemental PDF {pdf_display}, length: {}", text.len());
            return text;
        }
        Ok(Err(e)) => warn!("Could not parse supplemental PDF {pdf_display}: {e}"),
        Err(e) => warn!("Supplemental PDF extraction aborted for {pdf_display}: {e}"),
    }

    match tokio::fs::read_to_string(&text_path).await {
        Ok(text) => {
            info!(
                "Loaded supplemental text file {}, length: {}",
                text_path.display(),
                text.len()
            );
            text
        }
        Err(e) => {
            warn!(
                "Could not read supplemental text file {}: {e}. Using CV information only",
                text_path.display()
            );
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_falls_back_to_text_file_when_pdf_missing() {
        let dir = tempfile::tempdir().unwrap();
        let text_path = dir.path().join("supplemental.txt");
        std::fs::File::create(&text_path)
            .unwrap()
            .write_all(b"Favourite project: the clustering service.")
            .unwrap();

        let holder = SupplementalText::new(dir.path().join("missing.pdf"), text_path.clone());
        assert!(!holder.is_loaded());
        assert_eq!(holder.get().await, "Favourite project: the clustering service.");
        assert!(holder.is_loaded());
    }

    #[tokio::test]
    async fn test_empty_when_no_source_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let holder = SupplementalText::new(dir.path().join("a.pdf"), dir.path().join("b.txt"));
        assert_eq!(holder.get().await, "");
        assert!(holder.is_loaded());
    }

    #[tokio::test]
    async fn test_loads_at_most_once() {
        let dir = tempfile::tempdir().unwrap();
        let text_path = dir.path().join("supplemental.txt");
        std::fs::write(&text_path, "first").unwrap();

        let holder = SupplementalText::new(dir.path().join("missing.pdf"), text_path.clone());
        assert_eq!(holder.get().await, "first");

        std::fs::write(&text_path, "second").unwrap();
        assert_eq!(holder.get().await, "first");
    }

    #[tokio::test]
    async fn test_preloaded_holder_is_loaded() {
        let holder = SupplementalText::preloaded("notes");
        assert!(holder.is_loaded());
        assert_eq!(holder.get().await, "notes");
    }
}
