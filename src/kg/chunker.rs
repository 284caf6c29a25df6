/// Default chunk length, in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 512;

/// Contiguous slice of a source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Position of the chunk inside the document
    pub index: usize,
    /// Raw text of the chunk
    pub text: &'a str,
    /// Character offset of the first character
    pub start: usize,
    /// Character offset after the last character
    pub end: usize,
}

impl Chunk<'_> {
    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }
}

/// Fixed-size character chunker without overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunker {
    size: usize,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl TextChunker {
    /// Create a new chunker. A zero size is clamped to 1.
    pub fn new(size: usize) -> Self {
        Self { size: size.max(1) }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Split text into `ceil(len / size)` chunks, counted in characters.
    pub fn chunk<'a>(&self, text: &'a str) -> Vec<Chunk<'a>> {
        let mut chunks = Vec::new();
        let mut rest = text;
        let mut start = 0;

        while !rest.is_empty() {
            let split_at = rest
                .char_indices()
                .nth(self.size)
                .map(|(byte_idx, _)| byte_idx)
                .unwrap_or(rest.len());
            let (head, tail) = rest.split_at(split_at);
            let len = head.chars().count();

            chunks.push(Chunk {
                index: chunks.len(),
                text: head,
                start,
                end: start + len,
            });

            start += len;
            rest = tail;
        }

        chunks
    }
}
