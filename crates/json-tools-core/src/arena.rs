//! Bump arena for short-lived flatten keys.
//!
//! A flatten pass produces one small key string per leaf. Allocating each on
//! the heap would dominate the pass, so keys at or under
//! [`ARENA_KEY_LIMIT`] bytes are bump-allocated into chunked storage and
//! referenced by offset handles; the whole arena is reset wholesale once the
//! output object has been materialized. Longer keys take the heap fallback
//! at the call site.

/// Keys longer than this bypass the arena and live on the heap.
pub(crate) const ARENA_KEY_LIMIT: usize = 256;

/// Initial chunk capacity; subsequent chunks double up to [`CHUNK_MAX`].
const CHUNK_MIN: usize = 16 * 1024;
const CHUNK_MAX: usize = 1024 * 1024;

/// Offset handle into a [`KeyArena`]. Valid until the next `reset`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ArenaRef {
    chunk: u32,
    start: u32,
    len: u32,
}

/// Chunked bump allocator for key bytes.
///
/// Chunks are never reallocated once created, so an [`ArenaRef`] stays valid
/// across later allocations; `reset` invalidates all handles at once and
/// retains the first chunk for reuse.
#[derive(Debug)]
pub(crate) struct KeyArena {
    chunks: Vec<Vec<u8>>,
    next_capacity: usize,
}

impl KeyArena {
    pub(crate) fn new() -> Self {
        Self {
            chunks: Vec::new(),
            next_capacity: CHUNK_MIN,
        }
    }

    /// Copy `s` into the arena and return its handle.
    pub(crate) fn alloc_str(&mut self, s: &str) -> ArenaRef {
        let needed = s.len();
        let needs_new_chunk = self
            .chunks
            .last()
            .map_or(true, |chunk| chunk.capacity() - chunk.len() < needed);
        if needs_new_chunk {
            let capacity = self.next_capacity.max(needed);
            self.next_capacity = (self.next_capacity * 2).min(CHUNK_MAX);
            self.chunks.push(Vec::with_capacity(capacity));
        }
        let chunk_idx = self.chunks.len() - 1;
        let chunk = &mut self.chunks[chunk_idx];
        let start = chunk.len();
        chunk.extend_from_slice(s.as_bytes());
        ArenaRef {
            chunk: chunk_idx as u32,
            start: start as u32,
            len: needed as u32,
        }
    }

    /// Resolve a handle back to its string.
    pub(crate) fn get(&self, r: ArenaRef) -> &str {
        let bytes = &self.chunks[r.chunk as usize][r.start as usize..(r.start + r.len) as usize];
        // SAFETY: the bytes were copied verbatim from a `&str` in `alloc_str`
        // and chunks are append-only between resets.
        unsafe { std::str::from_utf8_unchecked(bytes) }
    }

    /// Invalidate every handle and reclaim all chunks but the first.
    pub(crate) fn reset(&mut self) {
        self.chunks.truncate(1);
        if let Some(first) = self.chunks.first_mut() {
            first.clear();
        }
    }

    #[cfg(test)]
    fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
