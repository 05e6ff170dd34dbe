//! core::batch
//!
//! Splitting path lists into bounded request batches.

/// Number of batches needed for `len` paths at `max` per batch.
///
/// A `max` of zero is treated as one.
pub fn batch_count(len: usize, max: usize) -> usize {
    len.div_ceil(max.max(1))
}

/// Split `paths` into consecutive batches of at most `max` entries.
///
/// Concatenating the batches in order yields `paths` exactly.
///
/// # Example
///
/// ```
/// use lockwatch::core::batch::batches;
///
/// let paths: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
/// let out: Vec<&[String]> = batches(&paths, 2).collect();
/// assert_eq!(out.len(), 2);
/// assert_eq!(out[1], &paths[2..]);
/// ```
pub fn batches<T>(paths: &[T], max: usize) -> std::slice::Chunks<'_, T> {
    paths.chunks(max.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_has_no_batches() {
        let paths: Vec<String> = Vec::new();
        assert_eq!(batches(&paths, 15).count(), 0);
        assert_eq!(batch_count(0, 15), 0);
    }

    #[test]
    fn exact_multiple() {
        let paths: Vec<u32> = (0..30).collect();
        let sizes: Vec<usize> = batches(&paths, 15).map(<[u32]>::len).collect();
        assert_eq!(sizes, vec![15, 15]);
    }

    #[test]
    fn remainder_goes_last() {
        let paths: Vec<u32> = (0..16).collect();
        let sizes: Vec<usize> = batches(&paths, 15).map(<[u32]>::len).collect();
        assert_eq!(sizes, vec![15, 1]);
        assert_eq!(batch_count(16, 15), 2);
    }

    #[test]
    fn zero_max_behaves_as_one() {
        let paths = ["a", "b"];
        assert_eq!(batches(&paths, 0).count(), 2);
        assert_eq!(batch_count(2, 0), 2);
    }
}
