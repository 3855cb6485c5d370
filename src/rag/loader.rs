use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::AppError;
use crate::rag::store::Document;

const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md"];

/// Reads every supported text file directly inside `dir`, sorted by file name.
/// A missing directory is not an error: the store simply starts empty.
pub async fn load_documents(dir: &Path) -> Result<Vec<Document>, AppError> {
    let load_err = |path: &Path, source| AppError::DocumentLoad {
        path: path.display().to_string(),
        source,
    };

    if !tokio::fs::try_exists(dir).await.unwrap_or(false) {
        warn!("Documents directory {} does not exist, starting with an empty store", dir.display());
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| load_err(dir, e))?;
    while let Some(entry) = entries.next_entry().await.map_err(|e| load_err(dir, e))? {
        let path = entry.path();
        let supported = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
        if supported && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let text = tokio::fs::read_to_string(&path).await.map_err(|e| load_err(path.as_path(), e))?;
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!("Loaded document {source} ({} chars)", text.chars().count());
        documents.push(Document::new(source.clone(), text).with_metadata("source", source));
    }
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_directory_yields_no_documents() {
        let dir = std::env::temp_dir().join(format!("rag-chat-missing-{}", uuid::Uuid::new_v4()));
        assert!(load_documents(&dir).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn loads_only_text_files_in_name_order() {
        let dir = std::env::temp_dir().join(format!("rag-chat-docs-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("b.md"), "second").await.unwrap();
        tokio::fs::write(dir.join("a.txt"), "first").await.unwrap();
        tokio::fs::write(dir.join("image.png"), [0u8, 1, 2]).await.unwrap();

        let docs = load_documents(&dir).await.unwrap();
        tokio::fs::remove_dir_all(&dir).await.unwrap();

        let sources: Vec<_> = docs.iter().map(|d| d.metadata["source"].as_str()).collect();
        assert_eq!(sources, vec!["a.txt", "b.md"]);
        assert_eq!(docs[0].text, "first");
    }
}
