use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

use crate::corpus::Corpus;
use crate::grid::{CellState, Grid, MoveDirection, WordDirection};
use crate::trie::Trie;
use crate::MIN_WORD_LEN;

#[derive(Error, Debug, PartialEq)]
pub enum SolveError {
    #[error("No solution exists for this grid")]
    NoSolution,
    #[error("Solve cancelled by caller")]
    Cancelled,
    #[error("Lexicon bookkeeping desynchronised on '{0}'")]
    LexiconConsistency(String),
}

enum Step {
    Advance,
    Retreat,
}

/// Cell-by-cell backtracking fill.
///
/// The solver walks the grid in row-major order, trying letters from each
/// cell's queue and pruning with per-length prefix tries. A completed
/// answer is pulled out of its trie so it cannot appear twice; the removal
/// is charged to the cell that finished the word and undone when the
/// solver backtracks past that cell. Locked and black cells are never
/// touched. On failure (or cancellation) the grid is restored to its
/// pre-solve state.
pub struct Solver<'a> {
    grid: &'a mut Grid,
    tries: Vec<Option<Trie>>,
    cancel: Option<Arc<AtomicBool>>,
    steps: u64,
}

impl<'a> Solver<'a> {
    /// Build a solver over `grid`, with prefix indexes drawn from `corpus`.
    /// The corpus itself is never mutated; the solver works on its own
    /// tries and keeps them balanced.
    pub fn new(grid: &'a mut Grid, corpus: &Corpus) -> Self {
        let kmax = grid.rows().max(grid.cols()) + 1;
        let tries = corpus.to_n_tries(kmax, true);
        Solver {
            grid,
            tries,
            cancel: None,
            steps: 0,
        }
    }

    /// Install a cooperative cancellation flag, polled once per cursor
    /// step. When it goes true the solve aborts with `Cancelled` and the
    /// grid is rolled back.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Cursor steps taken by the last call to [`Solver::solve`].
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Drive the grid to completion. On success every non-black cell holds
    /// a letter and every answer-length run spells a distinct corpus word
    /// (pre-locked entries excepted). On any error the grid comes back in
    /// its pre-solve state.
    pub fn solve(&mut self) -> Result<(), SolveError> {
        let snapshot = self.grid.snapshot_states();
        let result = self.run();
        match &result {
            Ok(()) => debug!("Grid filled in {} steps", self.steps),
            Err(err) => {
                debug!("Solve failed after {} steps: {}", self.steps, err);
                self.grid.restore_states(&snapshot);
            }
        }
        result
    }

    fn run(&mut self) -> Result<(), SolveError> {
        let mut pos = (0, 0);
        if self.grid.cell(0, 0).state().is_black() {
            // Skip a leading black run; on a fully black board this lands
            // on the terminal corner and the loop below finishes at once.
            pos = self.grid.next_cell(0, 0, MoveDirection::ForwardHorizontal);
        }

        loop {
            if let Some(flag) = &self.cancel {
                if flag.load(Ordering::Relaxed) {
                    return Err(SolveError::Cancelled);
                }
            }
            self.steps += 1;

            let step = match self.grid.cell(pos.0, pos.1).state() {
                CellState::Black => Step::Advance,
                CellState::Locked(_) => {
                    if self.locked_is_viable(pos) {
                        Step::Advance
                    } else {
                        Step::Retreat
                    }
                }
                CellState::Empty | CellState::Set(_) => self.try_letters(pos)?,
            };

            match step {
                Step::Advance => {
                    let next = self
                        .grid
                        .next_cell(pos.0, pos.1, MoveDirection::ForwardHorizontal);
                    if next == pos {
                        return Ok(());
                    }
                    pos = next;
                }
                Step::Retreat => {
                    self.reset_cell(pos)?;
                    match self.previous_open_cell(pos) {
                        Some(prev) => pos = prev,
                        None => return Err(SolveError::NoSolution),
                    }
                }
            }
        }
    }

    /// Pop letters off the cell's queue until one fits both crossing
    /// partial words, or the queue runs dry.
    fn try_letters(&mut self, (x, y): (usize, usize)) -> Result<Step, SolveError> {
        // Arriving back at a previously set cell: its old placement may
        // still hold completed words out of the tries. Give them back
        // before trialling replacements.
        self.restore_removed(x, y)?;

        loop {
            let letter = match self.grid.cell_mut(x, y).pop_queue() {
                Some(letter) => letter,
                None => return Ok(Step::Retreat),
            };
            self.grid.cell_mut(x, y).set_trial(letter);

            match self.completed_words(x, y) {
                Some(completed) => {
                    if completed.len() == 2 && completed[0].0 == completed[1].0 {
                        // One letter finishing the same word in both
                        // orientations is still a repeat; reject it.
                        self.grid.cell_mut(x, y).clear_trial();
                        continue;
                    }
                    for (word, direction) in completed {
                        let trie = self.tries[word.len()]
                            .as_mut()
                            .expect("answer length has a trie");
                        if !trie.remove(&word) {
                            return Err(SolveError::LexiconConsistency(word));
                        }
                        self.grid.cell_mut(x, y).record_removed(word, direction);
                    }
                    return Ok(Step::Advance);
                }
                None => self.grid.cell_mut(x, y).clear_trial(),
            }
        }
    }

    /// Validate the placement at (x, y) against both orientations.
    /// `None` means invalid; otherwise the answers this cell just
    /// finished, which the caller must pull from the tries.
    fn completed_words(&self, x: usize, y: usize) -> Option<Vec<(String, WordDirection)>> {
        let mut completed = Vec::new();
        for direction in [WordDirection::Horizontal, WordDirection::Vertical] {
            let cell = self.grid.cell(x, y);
            let len = cell.slot_len(direction);
            if len < MIN_WORD_LEN {
                // Short runs are not answers and carry no constraint.
                continue;
            }
            let trie = self.tries[len].as_ref().expect("answer length has a trie");
            let partial = self.grid.word_up_to(x, y, direction);
            if cell.is_end(direction) {
                if trie.has_exact(&partial) {
                    completed.push((partial, direction));
                } else {
                    return None;
                }
            } else if !trie.has_prefix(&partial) {
                return None;
            }
        }
        Some(completed)
    }

    /// A locked cell's letter is a forced trial: it must extend (or
    /// finish) a word in both orientations, but it never consumes a word
    /// from the tries.
    fn locked_is_viable(&self, (x, y): (usize, usize)) -> bool {
        self.completed_words(x, y).is_some()
    }

    fn restore_removed(&mut self, x: usize, y: usize) -> Result<(), SolveError> {
        let removed = self.grid.cell_mut(x, y).take_removed();
        self.reinsert(removed)
    }

    fn reset_cell(&mut self, (x, y): (usize, usize)) -> Result<(), SolveError> {
        let removed = self.grid.cell_mut(x, y).reset();
        self.reinsert(removed)
    }

    fn reinsert(&mut self, removed: Vec<(String, WordDirection)>) -> Result<(), SolveError> {
        for (word, _) in removed {
            let trie = self.tries[word.len()]
                .as_mut()
                .expect("answer length has a trie");
            if !trie.insert(&word) {
                return Err(SolveError::LexiconConsistency(word));
            }
        }
        Ok(())
    }

    /// The previous revisitable cell in row-major order, skipping locked
    /// and black cells. `None` when the cursor is already at the first
    /// open cell.
    fn previous_open_cell(&self, pos: (usize, usize)) -> Option<(usize, usize)> {
        let mut cur = pos;
        loop {
            let prev = self
                .grid
                .next_cell(cur.0, cur.1, MoveDirection::BackHorizontal);
            if prev == cur {
                return None;
            }
            match self.grid.cell(prev.0, prev.1).state() {
                CellState::Locked(_) | CellState::Black => cur = prev,
                _ => return Some(prev),
            }
        }
    }
}
