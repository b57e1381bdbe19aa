/// Compute byte offsets for the start of each line within the provided contents.
pub fn compute_line_offsets(contents: &str) -> Vec<usize> {
    let mut offsets = vec![0];
    offsets.extend(
        contents
            .char_indices()
            .filter(|(_, ch)| *ch == '\n')
            .map(|(idx, _)| idx + 1),
    );
    offsets
}

/// Convert a byte offset into a 1-based line number using the provided offsets.
pub fn byte_to_line(byte: usize, offsets: &[usize]) -> usize {
    match offsets.binary_search(&byte) {
        Ok(idx) => idx + 1,
        Err(idx) => idx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_offsets_to_lines() {
        let contents = "one\ntwo\n\nfour";
        let offsets = compute_line_offsets(contents);
        assert_eq!(offsets, vec![0, 4, 8, 9]);
        assert_eq!(byte_to_line(0, &offsets), 1);
        assert_eq!(byte_to_line(2, &offsets), 1);
        assert_eq!(byte_to_line(4, &offsets), 2);
        assert_eq!(byte_to_line(8, &offsets), 3);
        assert_eq!(byte_to_line(11, &offsets), 4);
    }
}
