//! Positional reorder engine.
//!
//! Slides copied into a deck are always appended at the end. Their final
//! position is recorded as a [`PendingMove`] and resolved in one batch pass
//! by [`apply_moves`], which works on any sequence so it can be tested and
//! reused independently of the document format.

/// A deferred relocation: move the item currently at `current` so that it
/// ends up at `target`.
///
/// Both indices are 0-based. `current` refers to the sequence as it was
/// before any move in the batch was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingMove {
    pub current: usize,
    pub target: usize,
}

impl PendingMove {
    pub fn new(current: usize, target: usize) -> Self {
        Self { current, target }
    }
}

/// Apply a batch of pending moves in place.
///
/// Every named item ends at its target index (clamped to the end of the
/// sequence), and items not named by any move keep their relative order.
/// Moves naming an index outside the sequence, or an index already named by
/// an earlier move, are ignored with a warning.
///
/// Returns the number of moves applied.
pub fn apply_moves<T>(items: &mut Vec<T>, moves: &[PendingMove]) -> usize {
    let mut batch: Vec<PendingMove> = Vec::with_capacity(moves.len());
    for mv in moves {
        if mv.current >= items.len() {
            log::warn!(
                "Ignoring move of item {} (sequence has {} items)",
                mv.current,
                items.len()
            );
            continue;
        }
        if batch.iter().any(|m| m.current == mv.current) {
            log::warn!("Ignoring duplicate move of item {}", mv.current);
            continue;
        }
        batch.push(*mv);
    }

    if batch.is_empty() {
        return 0;
    }

    // Highest current index first: removing one item never shifts the
    // still-pending indices, which all lie before it.
    batch.sort_by(|a, b| b.current.cmp(&a.current));
    let mut lifted: Vec<(PendingMove, T)> = batch
        .iter()
        .map(|mv| (*mv, items.remove(mv.current)))
        .collect();

    // Ascending targets: each insert lands after every earlier one, so
    // contiguous targets come out contiguous and in order.
    lifted.sort_by(|(a, _), (b, _)| a.target.cmp(&b.target).then(a.current.cmp(&b.current)));
    for (mv, item) in lifted {
        let position = mv.target.min(items.len());
        log::debug!("Moved item {} to position {}", mv.current, position);
        items.insert(position, item);
    }

    batch.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence(n: usize) -> Vec<usize> {
        (0..n).collect()
    }

    #[test]
    fn test_untouched_items_keep_relative_order() {
        let mut items = sequence(10);
        let moves = [PendingMove::new(7, 1), PendingMove::new(2, 9)];

        assert_eq!(apply_moves(&mut items, &moves), 2);
        assert_eq!(items.len(), 10);
        assert_eq!(items[1], 7);
        assert_eq!(items[9], 2);

        let untouched: Vec<usize> = items.iter().copied().filter(|i| *i != 7 && *i != 2).collect();
        assert_eq!(untouched, vec![0, 1, 3, 4, 5, 6, 8, 9]);
    }

    #[test]
    fn test_empty_move_set_is_noop() {
        let mut items = vec!["a", "b", "c", "d"];
        assert_eq!(apply_moves(&mut items, &[]), 0);
        assert_eq!(items, vec!["a", "b", "c", "d"]);

        let mut empty: Vec<u8> = Vec::new();
        assert_eq!(apply_moves(&mut empty, &[]), 0);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_appended_block_lands_contiguously_in_order() {
        // Five generated slides followed by nine appended copies
        let mut items: Vec<String> = (0..5).map(|i| format!("G{}", i)).collect();
        items.extend((1..=9).map(|i| format!("E{}", i)));

        let moves: Vec<PendingMove> = (0..9).map(|k| PendingMove::new(5 + k, 1 + k)).collect();
        apply_moves(&mut items, &moves);

        let expected: Vec<String> = ["G0", "E1", "E2", "E3", "E4", "E5", "E6", "E7", "E8", "E9", "G1", "G2", "G3", "G4"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(items, expected);
    }

    #[test]
    fn test_block_order_does_not_depend_on_move_order() {
        let mut forward = sequence(12);
        let mut backward = sequence(12);
        let moves: Vec<PendingMove> = (0..4).map(|k| PendingMove::new(8 + k, 2 + k)).collect();
        let reversed: Vec<PendingMove> = moves.iter().rev().copied().collect();

        apply_moves(&mut forward, &moves);
        apply_moves(&mut backward, &reversed);

        assert_eq!(forward, backward);
        assert_eq!(&forward[2..6], &[8, 9, 10, 11]);
    }

    #[test]
    fn test_target_past_end_is_clamped() {
        let mut items = sequence(4);
        apply_moves(&mut items, &[PendingMove::new(0, 100)]);
        assert_eq!(items, vec![1, 2, 3, 0]);
    }

    #[test]
    fn test_invalid_and_duplicate_moves_are_ignored() {
        let mut items = sequence(3);
        let applied = apply_moves(
            &mut items,
            &[
                PendingMove::new(5, 0),
                PendingMove::new(2, 0),
                PendingMove::new(2, 1),
            ],
        );
        assert_eq!(applied, 1);
        assert_eq!(items, vec![2, 0, 1]);
    }

    #[test]
    fn test_settled_sequence_stays_settled() {
        let mut items = sequence(6);
        apply_moves(&mut items, &[PendingMove::new(5, 1)]);
        let settled = items.clone();
        apply_moves(&mut items, &[]);
        assert_eq!(items, settled);
    }
}
