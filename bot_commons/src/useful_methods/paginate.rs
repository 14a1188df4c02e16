/// Folds text `blocks` into chunks, each no longer than `max_len` characters,
/// joining blocks within a chunk with `separator`.
///
/// Packing is greedy: a block is appended to the current chunk if the chunk,
/// separator included, still fits; otherwise the chunk is closed and the block
/// starts a new one. Blocks are never split, so a block that is longer than
/// `max_len` on its own ends up alone in its chunk, unmodified. Order of blocks
/// is preserved.
///
/// Lengths are counted in `char`s, as Telegram's limits are.
#[must_use]
pub fn paginate<S: AsRef<str>>(blocks: &[S], max_len: usize, separator: &str) -> Vec<String> {
    let separator_len = separator.chars().count();

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for block in blocks {
        let block = block.as_ref();
        let block_len = block.chars().count();

        if current.is_empty() {
            current.push_str(block);
            current_len = block_len;
            continue;
        }

        if current_len + separator_len + block_len <= max_len {
            current.push_str(separator);
            current.push_str(block);
            current_len += separator_len + block_len;
        } else {
            chunks.push(std::mem::take(&mut current));
            current.push_str(block);
            current_len = block_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::paginate;

    #[test]
    fn packs_greedily() {
        let a = "a".repeat(50);
        let b = "b".repeat(50);
        let c = "c".repeat(50);
        let chunks = paginate(&[&a, &b, &c], 110, "\n");
        assert_eq!(chunks, vec![format!("{a}\n{b}"), c]);
    }

    #[test]
    fn everything_fits() {
        let chunks = paginate(&["hi", "hello", "hi"], 100, ", ");
        assert_eq!(chunks, vec!["hi, hello, hi".to_string()]);
    }

    #[test]
    fn exact_fit_counts_the_separator() {
        // 5 + 2 + 5 = 12
        assert_eq!(paginate(&["12345", "12345"], 12, "--").len(), 1);
        assert_eq!(paginate(&["12345", "12345"], 11, "--").len(), 2);
    }

    #[test]
    fn oversized_block_is_left_alone() {
        let big = "x".repeat(30);
        let chunks = paginate(&["small", big.as_str(), "tiny"], 10, "\n");
        assert_eq!(chunks, vec!["small".to_string(), big, "tiny".to_string()]);
    }

    #[test]
    fn oversized_first_block() {
        let big = "x".repeat(30);
        let chunks = paginate(&[big.as_str()], 10, "\n");
        assert_eq!(chunks, vec![big]);
    }

    #[test]
    fn counts_chars_not_bytes() {
        // Each of these is 4 chars but 8 bytes.
        let chunks = paginate(&["їжак", "їжак"], 9, "\n");
        assert_eq!(chunks, vec!["їжак\nїжак".to_string()]);
    }

    #[test]
    fn empty_input() {
        let blocks: [&str; 0] = [];
        assert!(paginate(&blocks, 10, "\n").is_empty());
    }

    #[test]
    fn preserves_order() {
        let blocks = ["1", "22", "333", "4444", "55555"];
        let chunks = paginate(&blocks, 6, " ");
        assert_eq!(chunks, vec!["1 22", "333", "4444", "55555"]);
        let rejoined = chunks.join(" ");
        assert_eq!(rejoined, blocks.join(" "));
    }
}
