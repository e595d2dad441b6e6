use thiserror::Error;

use crate::corpus::{Corpus, CorpusError};
use crate::grid::{CellList, Grid, GridError, WordDirection};

#[derive(Error, Debug)]
pub enum LookaheadError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Corpus(#[from] CorpusError),
}

/// Count the completions reachable by varying the slots that cross the
/// given cells, recursing to `depth` levels.
///
/// For each `(x, y, direction)` target the slot through that cell in the
/// flipped orientation is extracted; every corpus word matching its
/// current pattern is written in turn, the count recurses through the
/// crossing slot's start cells, and the pattern is restored. A slot with
/// no matches short-circuits the whole call to 0: that configuration is
/// already dead. Depth 0 counts nothing, so the result at depth d only
/// tallies branches below the current grid state.
///
/// Every write is undone before returning, so the grid (and the corpus,
/// which is only queried) come back exactly as they went in.
pub fn count_possible(
    grid: &mut Grid,
    corpus: &Corpus,
    targets: &[(usize, usize, WordDirection)],
    depth: usize,
) -> Result<usize, LookaheadError> {
    if depth == 0 {
        return Ok(0);
    }

    let mut total = 0;
    for &(x, y, direction) in targets {
        let query_direction = direction.flip();
        let slot = grid.slot(x, y, query_direction, false);
        if slot.is_empty() {
            continue;
        }

        // Starts reachable from the crossing slot in the orientation being
        // explored; these seed the next recursion level.
        let mut next_targets: Vec<(usize, usize, WordDirection)> = Vec::new();
        for c in slot.iter() {
            let candidate = (c.x, c.y, query_direction);
            if grid.cell(c.x, c.y).is_start(query_direction) && !next_targets.contains(&candidate)
            {
                next_targets.push(candidate);
            }
        }

        // A fully determined slot contributes no information here.
        if !slot.has_empty_cell() {
            continue;
        }

        let pattern = slot.to_string();
        let candidates: Vec<String> = corpus
            .query(&pattern)?
            .into_iter()
            .map(|w| w.word.clone())
            .collect();
        if candidates.is_empty() {
            return Ok(0);
        }

        let (sx, sy) = slot.start().expect("non-empty slot has a start");
        for word in &candidates {
            grid.set_word(word, sx, sy, query_direction, false)?;
            total += count_possible(grid, corpus, &next_targets, depth - 1)?;
            grid.set_word(&pattern, sx, sy, query_direction, false)?;
        }
        total += candidates.len();
    }

    Ok(total)
}

/// Convenience wrapper: evaluate every cell of a slot, crossing against
/// the slot's own orientation.
pub fn count_possible_slot(
    grid: &mut Grid,
    corpus: &Corpus,
    slot: &CellList,
    depth: usize,
) -> Result<usize, LookaheadError> {
    let targets: Vec<(usize, usize, WordDirection)> = slot
        .iter()
        .map(|c| (c.x, c.y, slot.direction()))
        .collect();
    count_possible(grid, corpus, &targets, depth)
}

/// Score every word that fits a slot's current pattern by the crossing
/// completions it leaves open, best first (stable on ties). Useful for
/// choosing which entry to commit in interactive tooling.
pub fn rank_candidates(
    grid: &mut Grid,
    corpus: &Corpus,
    slot: &CellList,
    depth: usize,
) -> Result<Vec<(String, usize)>, LookaheadError> {
    let Some((sx, sy)) = slot.start() else {
        return Ok(Vec::new());
    };
    let pattern = slot.to_string();
    let candidates: Vec<String> = corpus
        .query(&pattern)?
        .into_iter()
        .map(|w| w.word.clone())
        .collect();

    let mut ranked = Vec::with_capacity(candidates.len());
    for word in candidates {
        grid.set_word(&word, sx, sy, slot.direction(), false)?;
        let n = count_possible_slot(grid, corpus, slot, depth)?;
        grid.set_word(&pattern, sx, sy, slot.direction(), false)?;
        ranked.push((word, n));
    }
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::{count_possible, count_possible_slot, rank_candidates};
    use crate::corpus::{Corpus, WordSource};
    use crate::grid::{CellValue, Grid, WordDirection};

    fn corpus(words: &[&str]) -> Corpus {
        Corpus::from_pairs(words.iter().map(|&w| (w, 0)), WordSource::Custom)
    }

    fn empty_states(grid: &Grid) -> bool {
        (0..grid.rows()).all(|i| (0..grid.cols()).all(|j| grid.cell(i, j).letter().is_none()))
    }

    #[test]
    fn depth_zero_counts_nothing() {
        let lexicon = corpus(&["TAR", "ORE", "WED", "TOW", "ARE", "RED"]);
        let mut grid = Grid::new(3, 3);
        let n = count_possible(&mut grid, &lexicon, &[(0, 0, WordDirection::Horizontal)], 0)
            .unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn depth_one_counts_matches_of_the_crossing_slot() {
        let lexicon = corpus(&["TAR", "ORE", "WED", "TOW", "ARE", "RED"]);
        let mut grid = Grid::new(3, 3);
        // Crossing slot of (0, 0) horizontal is column 0: pattern "---",
        // which all six words match.
        let n = count_possible(&mut grid, &lexicon, &[(0, 0, WordDirection::Horizontal)], 1)
            .unwrap();
        assert_eq!(n, 6);
        assert!(empty_states(&grid));
    }

    #[test]
    fn depth_two_adds_branches_per_candidate() {
        let lexicon = corpus(&["TAR", "ORE", "WED", "TOW", "ARE", "RED"]);
        let mut grid = Grid::new(3, 3);
        // Placing each column-0 candidate pins row 0's first letter:
        // T-- matches TAR and TOW (2 each for TOW and TAR), the other
        // four first letters match exactly one word apiece.
        let n = count_possible(&mut grid, &lexicon, &[(0, 0, WordDirection::Horizontal)], 2)
            .unwrap();
        assert_eq!(n, 6 + 2 + 1 + 1 + 2 + 1 + 1);
        assert!(empty_states(&grid));
    }

    #[test]
    fn infeasible_slot_short_circuits_to_zero() {
        let lexicon = corpus(&["TAR", "ORE", "WED"]);
        let mut grid = Grid::new(3, 3);
        // No corpus word fits Q--, so the crossing column is dead.
        grid.set(0, 0, CellValue::Letter('Q')).unwrap();
        let n = count_possible(&mut grid, &lexicon, &[(1, 0, WordDirection::Horizontal)], 2)
            .unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn filled_slots_are_skipped() {
        let lexicon = corpus(&["TAR", "ORE", "WED", "TOW", "ARE", "RED"]);
        let mut grid = Grid::new(3, 3);
        grid.set_word("TOW", 0, 0, WordDirection::Vertical, false).unwrap();
        // Column 0 has no empty cell left, so evaluating it yields no
        // candidates and no short-circuit.
        let n = count_possible(&mut grid, &lexicon, &[(0, 0, WordDirection::Horizontal)], 1)
            .unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn restores_grid_on_every_return_path() {
        let lexicon = corpus(&["TAR", "ORE", "WED", "TOW", "ARE", "RED"]);
        let mut grid = Grid::new(3, 3);
        grid.set(1, 1, CellValue::Letter('R')).unwrap();
        let before = grid.to_string();

        let slot = grid.slot(1, 1, WordDirection::Horizontal, false);
        count_possible_slot(&mut grid, &lexicon, &slot, 3).unwrap();
        assert_eq!(grid.to_string(), before);
    }

    #[test]
    fn rank_candidates_orders_by_remaining_completions() {
        let lexicon = corpus(&["TAR", "ORE", "WED", "TOW", "ARE", "RED"]);
        let mut grid = Grid::new(3, 3);
        let row0 = grid.slot(0, 0, WordDirection::Horizontal, false);

        let ranked = rank_candidates(&mut grid, &lexicon, &row0, 1).unwrap();
        assert_eq!(ranked.len(), 6);
        // TAR and TOW keep both T words alive for column 0; every other
        // choice dead-ends column 2 with a letter no word starts with.
        assert_eq!(ranked[0], ("TAR".to_string(), 4));
        assert_eq!(ranked[1], ("TOW".to_string(), 4));
        assert!(ranked[2..].iter().all(|(_, n)| *n == 0));
        assert!(empty_states(&grid));
    }

    #[test]
    fn locked_cells_survive_lookahead_writes() {
        let lexicon = corpus(&["TAR", "ORE", "WED", "TOW", "ARE", "RED"]);
        let mut grid = Grid::new(3, 3);
        grid.set(0, 0, CellValue::Letter('T')).unwrap();
        grid.lock(0, 0).unwrap();

        count_possible(&mut grid, &lexicon, &[(0, 0, WordDirection::Horizontal)], 2).unwrap();
        assert_eq!(grid.cell(0, 0).letter(), Some('T'));
        assert!(grid.cell(0, 0).state().is_locked());
    }
}
