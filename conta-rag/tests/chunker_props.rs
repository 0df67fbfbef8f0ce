//! Property tests for chunk coverage: every character of the input is
//! covered by some chunk span, chunks respect the size limit, and short
//! inputs come back whole.

use proptest::prelude::*;

use conta_rag::chunking::{Chunker, RecursiveChunker};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Chunk spans are contiguous slices of the input, in order, with no
    /// gaps: the first starts at 0, the last ends at the input's end, and
    /// every chunk begins at or before its predecessor's end.
    #[test]
    fn spans_cover_every_character(
        text in "[a-zA-Záéíóúñ .,\n]{1,600}",
        chunk_size in 40usize..200,
    ) {
        let chunker = RecursiveChunker::new(chunk_size, chunk_size / 5);
        let chunks = chunker.chunk(&text).unwrap();

        prop_assert!(!chunks.is_empty());
        prop_assert_eq!(chunks[0].start, 0);
        prop_assert_eq!(chunks.last().unwrap().end, text.len());

        for c in &chunks {
            prop_assert_eq!(c.text.as_str(), &text[c.start..c.end]);
            prop_assert!(c.text.len() <= chunk_size, "chunk of {} > {}", c.text.len(), chunk_size);
        }
        for pair in chunks.windows(2) {
            prop_assert!(pair[1].start <= pair[0].end, "gap between chunks");
            prop_assert!(pair[1].end > pair[0].end, "chunks must advance");
        }
    }

    /// Inputs at or below the chunk size come back as exactly one chunk
    /// equal to the input.
    #[test]
    // Accented characters are two bytes, so 50 generated characters stay
    // within the 100-byte chunk size.
    fn short_inputs_come_back_whole(text in "[a-zñáé ]{1,50}") {
        let chunker = RecursiveChunker::new(100, 20);
        let chunks = chunker.chunk(&text).unwrap();
        prop_assert_eq!(chunks.len(), 1);
        prop_assert_eq!(chunks[0].text.as_str(), text.as_str());
    }
}
