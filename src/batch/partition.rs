//! Splitting the file list into per-worker chunks.

/// A contiguous, read-only slice of the job's file list owned by one worker.
#[derive(Debug, PartialEq, Eq)]
pub struct Chunk<'a, T> {
    /// Position of this chunk in the partition (0-based).
    pub index: usize,
    /// Offset of the first item in the original list.
    pub offset: usize,
    /// The items, in original order.
    pub items: &'a [T],
}

impl<T> Clone for Chunk<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Chunk<'_, T> {}

impl<T> Chunk<'_, T> {
    /// Number of items in the chunk.
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the chunk has no items.
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Number of workers to use when none is configured: the logical CPU count,
/// never less than one.
pub fn detected_parallelism() -> usize {
    num_cpus::get().max(1)
}

/// Size of each chunk for `total` items across `worker_count` workers.
///
/// Rounds up so that at most `worker_count` chunks are produced.
pub const fn chunk_size(total: usize, worker_count: usize) -> usize {
    let workers = if worker_count == 0 { 1 } else { worker_count };
    let size = total.div_ceil(workers);
    if size == 0 { 1 } else { size }
}

/// Split `items` into at most `worker_count` contiguous, order-preserving
/// chunks of `chunk_size(len, worker_count)` items; the last one may be
/// shorter.
///
/// A `worker_count` of zero is treated as one. An empty input gives no
/// chunks.
///
/// # Example
/// ```rust
/// use audio_amplify::partition;
///
/// let files = ["a.mp3", "b.mp3", "c.mp3"];
/// let chunks: Vec<_> = partition(&files, 2).iter().map(|c| c.items.to_vec()).collect();
/// assert_eq!(chunks, vec![vec!["a.mp3", "b.mp3"], vec!["c.mp3"]]);
/// ```
pub fn partition<T>(items: &[T], worker_count: usize) -> Vec<Chunk<'_, T>> {
    if items.is_empty() {
        return Vec::new();
    }

    let size = chunk_size(items.len(), worker_count);
    items
        .chunks(size)
        .enumerate()
        .map(|(index, slice)| Chunk {
            index,
            offset: index * size,
            items: slice,
        })
        .collect()
}
