//! Size-bounded batching of source files

use crate::error::EngineError;
use erdscribe_core::SourceFile;
use erdscribe_oracle::render_batch;

/// A contiguous run of input files sent to the oracle together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Zero-based position in partition order
    pub index: usize,

    /// Member files, in input order
    pub files: &'a [SourceFile],

    /// Total text length of the members in characters
    pub chars: usize,
}

impl Chunk<'_> {
    /// Render the members as one oracle batch
    pub fn render(&self) -> String {
        render_batch(self.files)
    }
}

/// Split `files` into ordered chunks of at most `max_chars` characters
///
/// A file longer than the budget is never split; it forms a chunk of its own.
/// Concatenating the chunks' members reproduces `files` exactly.
pub fn partition(files: &[SourceFile], max_chars: usize) -> Result<Vec<Chunk<'_>>, EngineError> {
    if max_chars == 0 {
        return Err(EngineError::InvalidBudget);
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut chars = 0;

    for (i, file) in files.iter().enumerate() {
        let len = file.char_len();
        if i > start && chars + len > max_chars {
            chunks.push(Chunk {
                index: chunks.len(),
                files: &files[start..i],
                chars,
            });
            start = i;
            chars = 0;
        }
        chars += len;
    }

    if start < files.len() {
        chunks.push(Chunk {
            index: chunks.len(),
            files: &files[start..],
            chars,
        });
    }

    Ok(chunks)
}
