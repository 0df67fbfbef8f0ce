//! Text chunking for embedding.
//!
//! [`RecursiveChunker`] splits hierarchically — paragraphs, then
//! sentences, then words — and only falls back to a hard character cut
//! when no natural boundary exists. Every chunk is a contiguous slice of
//! the input (offsets included), so consecutive chunks overlap by sharing
//! a suffix/prefix and the union of chunk spans covers the whole input
//! with no gaps.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// A chunk of the input text with its byte span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    /// The chunk's text, equal to `input[start..end]`.
    pub text: String,
    /// Position among the produced chunks.
    pub index: usize,
    /// Byte offset of the chunk's start in the input.
    pub start: usize,
    /// Byte offset one past the chunk's end in the input.
    pub end: usize,
}

/// A strategy for splitting text into embeddable chunks.
pub trait Chunker: Send + Sync {
    /// Split text into ordered chunks.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmptyInput`] for empty text — embedding an
    /// empty chunk is meaningless.
    fn chunk(&self, text: &str) -> Result<Vec<TextChunk>>;
}

/// Separator hierarchy tried in order when a piece exceeds the chunk size.
const SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", "? ", " "];

/// Splits text hierarchically with configurable size and overlap.
///
/// Text no longer than `chunk_size` comes back as exactly one chunk equal
/// to the input. Longer text is first atomized at natural boundaries,
/// then the atoms are merged greedily; each new chunk starts inside the
/// previous one by roughly `chunk_overlap` characters.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per chunk
    /// * `chunk_overlap` — approximate overlap between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }

    /// Collect atomic spans no longer than `chunk_size`, splitting at the
    /// given separators (each kept attached to the preceding piece) and
    /// hard-cutting only when no separator applies.
    fn atomize(&self, text: &str, start: usize, end: usize, seps: &[&str], out: &mut Vec<(usize, usize)>) {
        if end - start <= self.chunk_size {
            out.push((start, end));
            return;
        }

        for (i, sep) in seps.iter().enumerate() {
            let pieces = split_keeping_separator(&text[start..end], sep);
            if pieces.len() > 1 {
                let mut piece_start = start;
                for piece in pieces {
                    let piece_end = piece_start + piece.len();
                    self.atomize(text, piece_start, piece_end, &seps[i + 1..], out);
                    piece_start = piece_end;
                }
                return;
            }
        }

        // No natural boundary left: hard cut at character boundaries.
        let mut cut_start = start;
        while cut_start < end {
            let cut_end = snap_to_char_boundary(text, (cut_start + self.chunk_size).min(end));
            out.push((cut_start, cut_end));
            if cut_end == end {
                break;
            }
            let step_back = snap_to_char_boundary(text, cut_end.saturating_sub(self.chunk_overlap));
            cut_start = if step_back > cut_start { step_back } else { cut_end };
        }
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, text: &str) -> Result<Vec<TextChunk>> {
        if text.is_empty() {
            return Err(RagError::EmptyInput);
        }

        if text.len() <= self.chunk_size {
            return Ok(vec![TextChunk {
                text: text.to_string(),
                index: 0,
                start: 0,
                end: text.len(),
            }]);
        }

        let mut atoms = Vec::new();
        self.atomize(text, 0, text.len(), &SEPARATORS, &mut atoms);

        // Greedy merge: extend the current span while the next atom fits,
        // then start the next span inside the finished one by the overlap.
        let mut spans: Vec<(usize, usize)> = Vec::new();
        let mut cur_start = atoms[0].0;
        let mut cur_end = atoms[0].1;

        for &(_, atom_end) in &atoms[1..] {
            if atom_end - cur_start <= self.chunk_size {
                cur_end = atom_end;
                continue;
            }

            spans.push((cur_start, cur_end));

            let with_overlap = snap_up(text, cur_end.saturating_sub(self.chunk_overlap));
            let fits_atom = snap_up(text, atom_end.saturating_sub(self.chunk_size));
            let mut next_start = with_overlap.max(fits_atom);
            if next_start <= cur_start {
                // Overlap would swallow the whole previous chunk; give it up
                // for this boundary to guarantee forward progress.
                next_start = cur_end;
            }
            cur_start = next_start;
            cur_end = atom_end;
        }
        spans.push((cur_start, cur_end));

        Ok(spans
            .into_iter()
            .enumerate()
            .map(|(index, (start, end))| TextChunk {
                text: text[start..end].to_string(),
                index,
                start,
                end,
            })
            .collect())
    }
}

/// Split text at a separator while keeping the separator attached to the
/// preceding piece, so concatenating the pieces reproduces the input.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

/// Snap a byte offset down to the nearest UTF-8 character boundary.
fn snap_to_char_boundary(text: &str, pos: usize) -> usize {
    if pos >= text.len() {
        return text.len();
    }
    let mut p = pos;
    while p > 0 && !text.is_char_boundary(p) {
        p -= 1;
    }
    p
}

/// Snap a byte offset up to the nearest UTF-8 character boundary.
fn snap_up(text: &str, pos: usize) -> usize {
    if pos >= text.len() {
        return text.len();
    }
    let mut p = pos;
    while p < text.len() && !text.is_char_boundary(p) {
        p += 1;
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker() -> RecursiveChunker {
        RecursiveChunker::new(100, 20)
    }

    #[test]
    fn empty_text_is_rejected() {
        let err = chunker().chunk("").unwrap_err();
        assert!(matches!(err, RagError::EmptyInput));
    }

    #[test]
    fn short_text_yields_exactly_one_chunk() {
        let chunks = chunker().chunk("saldo pendiente de la factura 42").unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "saldo pendiente de la factura 42");
        assert_eq!((chunks[0].start, chunks[0].end), (0, 32));
    }

    #[test]
    fn chunks_respect_the_size_limit() {
        let text = "palabra ".repeat(200);
        let chunks = chunker().chunk(&text).unwrap();
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.text.len() <= 100, "chunk of {} bytes", c.text.len());
        }
    }

    #[test]
    fn spans_cover_the_input_without_gaps() {
        let text = "Primer párrafo con datos.\n\nSegundo párrafo con más datos y cifras: 1500, 2300.\n\nTercer párrafo, el cierre del estado de cuenta mensual."
            .repeat(3);
        let chunks = chunker().chunk(&text).unwrap();

        assert_eq!(chunks[0].start, 0);
        assert_eq!(chunks.last().unwrap().end, text.len());
        for pair in chunks.windows(2) {
            assert!(pair[1].start <= pair[0].end, "gap between consecutive chunks");
        }
        for c in &chunks {
            assert_eq!(c.text, &text[c.start..c.end]);
        }
    }

    #[test]
    fn consecutive_chunks_share_an_overlap() {
        let text = "dato ".repeat(300);
        let chunks = RecursiveChunker::new(120, 30).chunk(&text).unwrap();
        assert!(chunks.len() > 2);
        for pair in chunks.windows(2) {
            let shared = pair[0].end.saturating_sub(pair[1].start);
            assert!(shared <= 30, "overlap of {shared} bytes exceeds the configured 30");
        }
    }

    #[test]
    fn unbroken_text_is_hard_cut_on_char_boundaries() {
        let text = "á".repeat(150);
        let chunks = chunker().chunk(&text).unwrap();
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.text.len() <= 100);
            assert!(c.text.chars().all(|ch| ch == 'á'));
        }
        assert_eq!(chunks.last().unwrap().end, text.len());
    }

    #[test]
    fn prefers_paragraph_boundaries() {
        let a = "a".repeat(60);
        let b = "b".repeat(60);
        let text = format!("{a}\n\n{b}");
        let chunks = chunker().chunk(&text).unwrap();
        assert_eq!(chunks.len(), 2);
        // First chunk is the first paragraph (separator attached), second
        // starts inside it by at most the overlap and runs to the end.
        assert!(chunks[0].text.starts_with('a'));
        assert!(chunks[0].text.ends_with("\n\n"));
        assert!(chunks[0].end - chunks[1].start <= 20);
        assert_eq!(chunks[1].end, text.len());
        assert!(chunks[1].text.ends_with('b'));
    }
}
