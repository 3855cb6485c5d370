use crate::errors::AppError;
use crate::rag::store::Document;

/// Splits text into fixed-length, overlapping character windows. Each window
/// starts `chunk_size - chunk_overlap` after the previous one; splitting stops
/// once a window would no longer advance.
#[derive(Debug, Clone, Copy)]
pub struct LengthTextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl LengthTextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, AppError> {
        if chunk_size == 0 {
            return Err(AppError::invalid_config("RAG_CHUNK_SIZE", "chunk size must be positive"));
        }
        if chunk_overlap >= chunk_size {
            return Err(AppError::invalid_config(
                "RAG_CHUNK_OVERLAP",
                format!("overlap {chunk_overlap} must be smaller than chunk size {chunk_size}"),
            ));
        }
        Ok(Self { chunk_size, chunk_overlap })
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = text.chars().collect();
        if chars.len() <= self.chunk_overlap {
            return vec![text.to_string()];
        }

        let mut chunks = Vec::new();
        let mut position = 0;
        while position < chars.len() {
            let end = (position + self.chunk_size).min(chars.len());
            chunks.push(chars[position..end].iter().collect());
            let next = end - self.chunk_overlap;
            if next <= position {
                break;
            }
            position = next;
        }
        chunks
    }

    /// Splits every document, tagging each chunk with its index under the `chunk` key.
    pub fn split_documents(&self, documents: Vec<Document>) -> Vec<Document> {
        documents
            .into_iter()
            .flat_map(|doc| {
                self.split_text(&doc.text)
                    .into_iter()
                    .enumerate()
                    .map(move |(index, text)| {
                        let mut metadata = doc.metadata.clone();
                        metadata.insert("chunk".to_string(), index.to_string());
                        Document { id: format!("{}#{index}", doc.id), text, metadata }
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_sizes() {
        assert!(LengthTextSplitter::new(0, 0).is_err());
        assert!(LengthTextSplitter::new(10, 10).is_err());
        assert!(LengthTextSplitter::new(10, 9).is_ok());
    }

    #[test]
    fn blank_text_yields_nothing() {
        let splitter = LengthTextSplitter::new(4, 2).unwrap();
        assert!(splitter.split_text("   \n\t").is_empty());
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let splitter = LengthTextSplitter::new(10, 4).unwrap();
        assert_eq!(splitter.split_text("abc"), vec!["abc"]);
    }

    #[test]
    fn windows_overlap_until_they_stop_advancing() {
        let splitter = LengthTextSplitter::new(4, 2).unwrap();
        assert_eq!(splitter.split_text("abcdefgh"), vec!["abcd", "cdef", "efgh", "gh"]);
        assert_eq!(splitter.split_text("abcdefg"), vec!["abcd", "cdef", "efg", "fg"]);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let splitter = LengthTextSplitter::new(2, 1).unwrap();
        assert_eq!(splitter.split_text("안녕하"), vec!["안녕", "녕하", "하"]);
    }

    #[test]
    fn chunks_carry_source_metadata_and_index() {
        let splitter = LengthTextSplitter::new(4, 2).unwrap();
        let doc = Document::new("guide.txt", "abcdef").with_metadata("source", "guide.txt");
        let chunks = splitter.split_documents(vec![doc]);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].id, "guide.txt#1");
        assert_eq!(chunks[1].metadata["source"], "guide.txt");
        assert_eq!(chunks[1].metadata["chunk"], "1");
    }
}
