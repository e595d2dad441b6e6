use log::{debug, error};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fmt;
use thiserror::Error;

use crate::{ALPHABET, MIN_WORD_LEN};

#[derive(Error, Debug, PartialEq)]
pub enum GridError {
    #[error("Index ({0}, {1}) outside grid bounds ({2}, {3})")]
    OutOfBounds(usize, usize, usize, usize),
    #[error("'{0}' is not a letter")]
    InvalidInput(char),
    #[error("Cell ({0}, {1}) is locked")]
    CellLocked(usize, usize),
    #[error("Cannot lock cell ({0}, {1}): it is not currently set")]
    LockUnset(usize, usize),
    #[error("Cannot unlock cell ({0}, {1}): it is not currently locked")]
    UnlockUnlocked(usize, usize),
    #[error("Cannot fit a {len}-letter word at ({x}, {y}) going {dir:?}")]
    WordTooLong {
        len: usize,
        x: usize,
        y: usize,
        dir: WordDirection,
    },
}

/// Orientation of a slot: horizontal runs read left to right, vertical
/// runs read top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordDirection {
    Horizontal,
    Vertical,
}

impl WordDirection {
    pub fn flip(self) -> Self {
        match self {
            WordDirection::Horizontal => WordDirection::Vertical,
            WordDirection::Vertical => WordDirection::Horizontal,
        }
    }
}

/// Cursor movements understood by [`Grid::next_cell`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    ForwardHorizontal,
    ForwardVertical,
    BackHorizontal,
    BackVertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridSymmetry {
    None,
    Rotational,
    Reflection,
}

/// What a cell currently holds. LOCKED and BLACK cells are immovable as
/// far as the solver is concerned; EMPTY and SET are freely mutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Empty,
    Set(char),
    Locked(char),
    Black,
}

impl CellState {
    pub fn is_black(self) -> bool {
        matches!(self, CellState::Black)
    }

    pub fn is_locked(self) -> bool {
        matches!(self, CellState::Locked(_))
    }

    pub fn letter(self) -> Option<char> {
        match self {
            CellState::Set(c) | CellState::Locked(c) => Some(c),
            _ => None,
        }
    }
}

/// Value accepted by [`Grid::set`]: a letter, empty, or the black sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellValue {
    Empty,
    Letter(char),
    Black,
}

// Traversal directions for walking outward from a cell.
#[derive(Debug, Clone, Copy)]
enum GridDirection {
    Up,
    Down,
    Left,
    Right,
}

/// One square of the board, along with its derived slot geometry and the
/// solver's per-cell bookkeeping.
#[derive(Debug, Clone)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
    state: CellState,
    pub is_h_start: bool,
    pub is_h_end: bool,
    pub is_v_start: bool,
    pub is_v_end: bool,
    pub hlen: usize,
    pub vlen: usize,
    pub answer_number: Option<u32>,
    // Trial order is fixed per cell; the queue is consumed from the front
    // of `order` and refilled whenever the cell is reset.
    order: Vec<char>,
    queue: Vec<char>,
    pub(crate) excluded: Vec<char>,
    pub(crate) removed_words: Vec<(String, WordDirection)>,
}

impl Cell {
    fn new(x: usize, y: usize) -> Self {
        let order: Vec<char> = ALPHABET.to_vec();
        let queue: Vec<char> = order.iter().rev().copied().collect();
        Cell {
            x,
            y,
            state: CellState::Empty,
            is_h_start: false,
            is_h_end: false,
            is_v_start: false,
            is_v_end: false,
            hlen: 0,
            vlen: 0,
            answer_number: None,
            order,
            queue,
            excluded: Vec::new(),
            removed_words: Vec::new(),
        }
    }

    pub fn state(&self) -> CellState {
        self.state
    }

    pub fn letter(&self) -> Option<char> {
        self.state.letter()
    }

    /// A cell is valid when it is black, or when both of its runs are long
    /// enough to be answers.
    pub fn is_valid(&self) -> bool {
        self.state.is_black() || (self.hlen >= MIN_WORD_LEN && self.vlen >= MIN_WORD_LEN)
    }

    pub fn is_start(&self, direction: WordDirection) -> bool {
        match direction {
            WordDirection::Horizontal => self.is_h_start,
            WordDirection::Vertical => self.is_v_start,
        }
    }

    pub fn is_end(&self, direction: WordDirection) -> bool {
        match direction {
            WordDirection::Horizontal => self.is_h_end,
            WordDirection::Vertical => self.is_v_end,
        }
    }

    pub fn slot_len(&self, direction: WordDirection) -> usize {
        match direction {
            WordDirection::Horizontal => self.hlen,
            WordDirection::Vertical => self.vlen,
        }
    }

    /// Letters rejected or surrendered at this cell during its current
    /// solver visit.
    pub fn excluded(&self) -> &[char] {
        &self.excluded
    }

    fn update(&mut self, value: CellValue) -> Result<(), GridError> {
        match value {
            CellValue::Letter(c) if c.is_ascii_alphabetic() => {
                self.state = CellState::Set(c.to_ascii_uppercase());
                Ok(())
            }
            CellValue::Letter(c) => Err(GridError::InvalidInput(c)),
            CellValue::Empty => {
                self.state = CellState::Empty;
                Ok(())
            }
            CellValue::Black => {
                self.state = CellState::Black;
                Ok(())
            }
        }
    }

    fn reset_queue(&mut self) {
        self.queue = self.order.iter().rev().copied().collect();
    }

    pub(crate) fn pop_queue(&mut self) -> Option<char> {
        self.queue.pop()
    }

    fn shuffle_order(&mut self, rng: &mut StdRng) {
        self.order.shuffle(rng);
        self.reset_queue();
    }

    pub(crate) fn set_trial(&mut self, c: char) {
        self.state = CellState::Set(c);
    }

    /// Reject the letter currently on trial: back to empty, letter noted
    /// as excluded. The queue keeps its remaining candidates.
    pub(crate) fn clear_trial(&mut self) {
        if let Some(c) = self.letter() {
            self.excluded.push(c);
        }
        self.state = CellState::Empty;
    }

    /// Full reset when the solver backtracks past this cell. Returns the
    /// words whose removal this cell was responsible for, so the caller
    /// can put them back in the tries. No-op for locked and black cells.
    pub(crate) fn reset(&mut self) -> Vec<(String, WordDirection)> {
        if matches!(self.state, CellState::Locked(_) | CellState::Black) {
            return Vec::new();
        }
        self.excluded.clear();
        if let Some(c) = self.letter() {
            self.excluded.push(c);
        }
        self.state = CellState::Empty;
        self.reset_queue();
        std::mem::take(&mut self.removed_words)
    }

    pub(crate) fn take_removed(&mut self) -> Vec<(String, WordDirection)> {
        std::mem::take(&mut self.removed_words)
    }

    pub(crate) fn record_removed(&mut self, word: String, direction: WordDirection) {
        self.removed_words.push((word, direction));
    }
}

/// A snapshot of one slot: the cells of a maximal run in one orientation,
/// in reading order. Renders with `-` standing in for unfilled cells.
#[derive(Debug, Clone)]
pub struct CellList {
    cells: Vec<SlotCell>,
    direction: WordDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotCell {
    pub x: usize,
    pub y: usize,
    pub letter: Option<char>,
}

impl CellList {
    fn new(cells: Vec<SlotCell>, direction: WordDirection) -> Self {
        CellList { cells, direction }
    }

    pub fn direction(&self) -> WordDirection {
        self.direction
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Coordinates of the slot's first cell.
    pub fn start(&self) -> Option<(usize, usize)> {
        self.cells.first().map(|c| (c.x, c.y))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SlotCell> {
        self.cells.iter()
    }

    pub fn has_empty_cell(&self) -> bool {
        self.cells.iter().any(|c| c.letter.is_none())
    }
}

impl fmt::Display for CellList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.cells {
            write!(f, "{}", c.letter.unwrap_or('-'))?;
        }
        Ok(())
    }
}

/// The board: a rows x cols matrix of cells plus the geometry derived
/// from its black-square pattern. Coordinates are (x, y) = (row, column).
#[derive(Debug, Clone)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Vec<Cell>>,
    pub symmetry: GridSymmetry,
    pub auto_symmetry: bool,
    h_heads: Vec<(usize, usize)>,
    v_heads: Vec<(usize, usize)>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Self {
        assert!(rows >= 3, "grids need at least 3 rows");
        assert!(cols >= 3, "grids need at least 3 columns");
        let cells = (0..rows)
            .map(|i| (0..cols).map(|j| Cell::new(i, j)).collect())
            .collect();
        let mut grid = Grid {
            rows,
            cols,
            cells,
            symmetry: GridSymmetry::Rotational,
            auto_symmetry: false,
            h_heads: Vec::new(),
            v_heads: Vec::new(),
        };
        grid.update_geometry();
        grid
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cell(&self, x: usize, y: usize) -> &Cell {
        &self.cells[x][y]
    }

    pub(crate) fn cell_mut(&mut self, x: usize, y: usize) -> &mut Cell {
        &mut self.cells[x][y]
    }

    fn check_bounds(&self, x: usize, y: usize) -> Result<(), GridError> {
        if x >= self.rows || y >= self.cols {
            return Err(GridError::OutOfBounds(x, y, self.rows, self.cols));
        }
        Ok(())
    }

    /// Reseed and reshuffle every cell's letter trial order.
    pub fn shuffle_queues(&mut self, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        for row in self.cells.iter_mut() {
            for cell in row.iter_mut() {
                cell.shuffle_order(&mut rng);
            }
        }
    }

    /// Write a letter, clear a cell, or place a black square. Locked cells
    /// are never overwritten. With auto-symmetry under rotational mode,
    /// blacking a cell also blacks its 180-degree partner, and writing
    /// anything else clears a black partner.
    pub fn set(&mut self, x: usize, y: usize, value: CellValue) -> Result<(), GridError> {
        self.check_bounds(x, y)?;
        if self.cells[x][y].state().is_locked() {
            error!("Cannot set cell ({}, {}): it is locked", x, y);
            return Err(GridError::CellLocked(x, y));
        }

        let mirrored = self.auto_symmetry && self.symmetry == GridSymmetry::Rotational;
        let (rx, ry) = self.symmetric_index(x, y);
        if mirrored
            && value == CellValue::Black
            && (rx, ry) != (x, y)
            && self.cells[rx][ry].state().is_locked()
        {
            error!(
                "Cannot black out cell ({}, {}): its partner ({}, {}) is locked",
                x, y, rx, ry
            );
            return Err(GridError::CellLocked(rx, ry));
        }

        self.cells[x][y].update(value)?;
        if mirrored && (rx, ry) != (x, y) {
            if value == CellValue::Black {
                self.cells[rx][ry].update(CellValue::Black)?;
            } else if self.cells[rx][ry].state().is_black() {
                self.cells[rx][ry].update(CellValue::Empty)?;
            }
        }

        self.update_geometry();
        Ok(())
    }

    /// The cell's 180-degree or mirror partner under the grid's symmetry
    /// mode; the cell itself under `GridSymmetry::None`.
    pub fn symmetric_index(&self, x: usize, y: usize) -> (usize, usize) {
        match self.symmetry {
            GridSymmetry::Rotational => (self.rows - 1 - x, self.cols - 1 - y),
            GridSymmetry::Reflection => (x, self.cols - 1 - y),
            GridSymmetry::None => (x, y),
        }
    }

    /// Pin a set cell so the solver must treat its letter as fixed.
    pub fn lock(&mut self, x: usize, y: usize) -> Result<(), GridError> {
        self.check_bounds(x, y)?;
        match self.cells[x][y].state() {
            CellState::Set(c) => {
                debug!("Cell ({}, {}) status changed to LOCKED", x, y);
                self.cells[x][y].state = CellState::Locked(c);
                Ok(())
            }
            _ => {
                error!("Cannot lock cell ({}, {}): it is not currently set", x, y);
                Err(GridError::LockUnset(x, y))
            }
        }
    }

    pub fn unlock(&mut self, x: usize, y: usize) -> Result<(), GridError> {
        self.check_bounds(x, y)?;
        match self.cells[x][y].state() {
            CellState::Locked(c) => {
                debug!("Cell ({}, {}) status changed to SET", x, y);
                self.cells[x][y].state = CellState::Set(c);
                Ok(())
            }
            _ => {
                error!(
                    "Cannot unlock cell ({}, {}): it is not currently locked",
                    x, y
                );
                Err(GridError::UnlockUnlocked(x, y))
            }
        }
    }

    pub fn toggle_lock(&mut self, x: usize, y: usize) -> Result<(), GridError> {
        self.check_bounds(x, y)?;
        match self.cells[x][y].state() {
            CellState::Set(_) => self.lock(x, y),
            CellState::Locked(_) => self.unlock(x, y),
            _ => {
                error!(
                    "Cannot toggle lock for cell ({}, {}): it is neither SET nor LOCKED",
                    x, y
                );
                Err(GridError::LockUnset(x, y))
            }
        }
    }

    /// Write a word (or word fragment) into the run starting at (x, y).
    /// `-` and space clear the corresponding cell instead of writing a
    /// letter. Fails when the remaining run is too short for the word;
    /// locked cells keep their letters.
    pub fn set_word(
        &mut self,
        word: &str,
        x: usize,
        y: usize,
        direction: WordDirection,
        lock: bool,
    ) -> Result<(), GridError> {
        self.check_bounds(x, y)?;
        let chars: Vec<char> = word.chars().collect();

        let mut capacity = 0;
        let (mut i, mut j) = (x, y);
        loop {
            if self.cells[i][j].state().is_black() {
                break;
            }
            capacity += 1;
            match direction {
                WordDirection::Horizontal if j + 1 < self.cols => j += 1,
                WordDirection::Vertical if i + 1 < self.rows => i += 1,
                _ => break,
            }
        }
        if chars.len() > capacity {
            return Err(GridError::WordTooLong {
                len: chars.len(),
                x,
                y,
                dir: direction,
            });
        }

        let (mut i, mut j) = (x, y);
        for (idx, &c) in chars.iter().enumerate() {
            let cell = &mut self.cells[i][j];
            if cell.state().is_locked() {
                if cell.letter() != Some(c.to_ascii_uppercase()) {
                    debug!("Keeping locked cell ({}, {}) while writing '{}'", i, j, word);
                }
            } else {
                match c {
                    '-' | ' ' => cell.update(CellValue::Empty)?,
                    _ => {
                        cell.update(CellValue::Letter(c))?;
                        if lock {
                            cell.state = CellState::Locked(c.to_ascii_uppercase());
                        }
                    }
                }
            }
            if idx + 1 < chars.len() {
                match direction {
                    WordDirection::Horizontal => j += 1,
                    WordDirection::Vertical => i += 1,
                }
            }
        }
        Ok(())
    }

    /// Reset every SET cell back to empty; locked and black cells stay.
    pub fn clear(&mut self) {
        for row in self.cells.iter_mut() {
            for cell in row.iter_mut() {
                if matches!(cell.state(), CellState::Set(_)) {
                    cell.reset();
                }
            }
        }
    }

    // Walk outward from (x, y), collecting coordinates until a slot
    // boundary (or, when asked, an empty cell, which is included).
    fn aggregate_cells(
        &self,
        x: usize,
        y: usize,
        which: GridDirection,
        stop_on_empty: bool,
    ) -> Vec<(usize, usize)> {
        if self.cells[x][y].state().is_black() {
            return Vec::new();
        }
        let mut cells = vec![(x, y)];
        loop {
            let &(cx, cy) = cells.last().unwrap();
            let cell = &self.cells[cx][cy];
            let at_boundary = match which {
                GridDirection::Up => cell.is_v_start,
                GridDirection::Down => cell.is_v_end,
                GridDirection::Left => cell.is_h_start,
                GridDirection::Right => cell.is_h_end,
            };
            if at_boundary || (stop_on_empty && cell.state() == CellState::Empty) {
                break;
            }
            cells.push(match which {
                GridDirection::Up => (cx - 1, cy),
                GridDirection::Down => (cx + 1, cy),
                GridDirection::Left => (cx, cy - 1),
                GridDirection::Right => (cx, cy + 1),
            });
        }
        cells
    }

    /// The maximal run through (x, y) in the given orientation, bounded by
    /// black cells and the grid edge. With `stop_on_empty`, the run also
    /// stops at (and includes) the first empty cell on each side. Black
    /// cells yield an empty list.
    pub fn slot(
        &self,
        x: usize,
        y: usize,
        direction: WordDirection,
        stop_on_empty: bool,
    ) -> CellList {
        if self.cells[x][y].state().is_black() {
            return CellList::new(Vec::new(), direction);
        }
        let (pre, post) = match direction {
            WordDirection::Horizontal => (GridDirection::Left, GridDirection::Right),
            WordDirection::Vertical => (GridDirection::Up, GridDirection::Down),
        };

        let mut coords = self.aggregate_cells(x, y, pre, stop_on_empty);
        coords.remove(0);
        coords.reverse();
        coords.push((x, y));
        let mut post_cells = self.aggregate_cells(x, y, post, stop_on_empty);
        post_cells.remove(0);
        coords.extend(post_cells);

        let cells = coords
            .into_iter()
            .map(|(i, j)| SlotCell {
                x: i,
                y: j,
                letter: self.cells[i][j].letter(),
            })
            .collect();
        CellList::new(cells, direction)
    }

    /// The partial word from the slot start through (x, y); unfilled cells
    /// render as `-`. Empty string for black cells.
    pub fn word_up_to(&self, x: usize, y: usize, direction: WordDirection) -> String {
        let pre = match direction {
            WordDirection::Horizontal => GridDirection::Left,
            WordDirection::Vertical => GridDirection::Up,
        };
        let mut coords = self.aggregate_cells(x, y, pre, false);
        coords.reverse();
        coords
            .into_iter()
            .map(|(i, j)| self.cells[i][j].letter().unwrap_or('-'))
            .collect()
    }

    /// The next non-black cell in the given movement order, wrapping within
    /// the grid. Returns (x, y) unchanged at the terminal corner for that
    /// movement.
    pub fn next_cell(&self, x: usize, y: usize, move_dir: MoveDirection) -> (usize, usize) {
        let (mut i, mut j) = (x, y);
        loop {
            let on_left = j == 0;
            let on_right = j == self.cols - 1;
            let on_top = i == 0;
            let on_bottom = i == self.rows - 1;

            match move_dir {
                MoveDirection::ForwardHorizontal => {
                    if on_bottom && on_right {
                        return (i, j);
                    }
                    if !on_right {
                        j += 1;
                    } else {
                        j = 0;
                        i += 1;
                    }
                }
                MoveDirection::ForwardVertical => {
                    if !on_bottom {
                        i += 1;
                    } else if !on_right {
                        i = 0;
                        j += 1;
                    } else {
                        return (i, j);
                    }
                }
                MoveDirection::BackHorizontal => {
                    if !on_left {
                        j -= 1;
                    } else if !on_top {
                        i -= 1;
                        j = self.cols - 1;
                    } else {
                        return (i, j);
                    }
                }
                MoveDirection::BackVertical => {
                    if !on_top {
                        i -= 1;
                    } else if !on_left {
                        // Cannot move up further; restart from the bottom
                        // of the previous column.
                        return (self.rows - 1, j - 1);
                    } else {
                        return (i, j);
                    }
                }
            }

            if !self.cells[i][j].state().is_black() {
                return (i, j);
            }
        }
    }

    // Recompute starts, ends, run lengths, answer numbers, and the head
    // lists from the current black-square pattern.
    fn update_geometry(&mut self) {
        let rows = self.rows;
        let cols = self.cols;
        let black: Vec<Vec<bool>> = self
            .cells
            .iter()
            .map(|row| row.iter().map(|c| c.state().is_black()).collect())
            .collect();

        self.h_heads.clear();
        self.v_heads.clear();
        let mut counter: u32 = 1;
        for i in 0..rows {
            for j in 0..cols {
                let b = black[i][j];
                let is_h_start = !b && (j == 0 || black[i][j - 1]);
                let is_h_end = !b && (j == cols - 1 || black[i][j + 1]);
                let is_v_start = !b && (i == 0 || black[i - 1][j]);
                let is_v_end = !b && (i == rows - 1 || black[i + 1][j]);
                if is_h_start {
                    self.h_heads.push((i, j));
                }
                if is_v_start {
                    self.v_heads.push((i, j));
                }
                let cell = &mut self.cells[i][j];
                cell.is_h_start = is_h_start;
                cell.is_h_end = is_h_end;
                cell.is_v_start = is_v_start;
                cell.is_v_end = is_v_end;
                cell.answer_number = if is_h_start || is_v_start {
                    let n = counter;
                    counter += 1;
                    Some(n)
                } else {
                    None
                };
            }
        }

        for i in 0..rows {
            let mut j = 0;
            while j < cols {
                if black[i][j] {
                    self.cells[i][j].hlen = 0;
                    j += 1;
                    continue;
                }
                let start = j;
                while j < cols && !black[i][j] {
                    j += 1;
                }
                for jj in start..j {
                    self.cells[i][jj].hlen = j - start;
                }
            }
        }
        for j in 0..cols {
            let mut i = 0;
            while i < rows {
                if black[i][j] {
                    self.cells[i][j].vlen = 0;
                    i += 1;
                    continue;
                }
                let start = i;
                while i < rows && !black[i][j] {
                    i += 1;
                }
                for ii in start..i {
                    self.cells[ii][j].vlen = i - start;
                }
            }
        }
    }

    /// The slots of answer length (>= 3) in one orientation, in answer
    /// number order.
    pub fn answers(&self, direction: WordDirection) -> Vec<CellList> {
        let heads = match direction {
            WordDirection::Horizontal => &self.h_heads,
            WordDirection::Vertical => &self.v_heads,
        };
        heads
            .iter()
            .filter(|&&(i, j)| self.cells[i][j].slot_len(direction) >= MIN_WORD_LEN)
            .map(|&(i, j)| self.slot(i, j, direction, false))
            .collect()
    }

    /// Debugging view of the start/end structure: `x`/`X` mark cells that
    /// start/end runs in both orientations, `y`/`Y` the mixed corners,
    /// `h`/`v` lone starts, `H`/`V` lone ends, `-` everything else.
    pub fn boundary_map(&self) -> String {
        let mut out = String::new();
        for i in 0..self.rows {
            if i > 0 {
                out.push('\n');
            }
            for j in 0..self.cols {
                if j > 0 {
                    out.push(' ');
                }
                let cell = &self.cells[i][j];
                let mark = if cell.is_h_start && cell.is_v_start {
                    'x'
                } else if cell.is_h_end && cell.is_v_end {
                    'X'
                } else if cell.is_h_start && cell.is_v_end {
                    'y'
                } else if cell.is_h_end && cell.is_v_start {
                    'Y'
                } else if cell.is_h_start {
                    'h'
                } else if cell.is_v_start {
                    'v'
                } else if cell.is_h_end {
                    'H'
                } else if cell.is_v_end {
                    'V'
                } else {
                    '-'
                };
                out.push(mark);
            }
        }
        out
    }

    pub fn all_answers(&self) -> Vec<CellList> {
        let mut slots = self.answers(WordDirection::Horizontal);
        slots.extend(self.answers(WordDirection::Vertical));
        slots
    }

    /// True when every cell is either black or an answer cell in both
    /// orientations.
    pub fn is_valid(&self) -> bool {
        self.cells.iter().flatten().all(|c| c.is_valid())
    }

    /// True when every non-black cell holds a letter.
    pub fn is_filled(&self) -> bool {
        self.cells
            .iter()
            .flatten()
            .all(|c| c.state().is_black() || c.letter().is_some())
    }

    // Used when repopulating a grid from a stored document; callers must
    // follow up with `rederive_geometry`.
    pub(crate) fn restore_state(&mut self, x: usize, y: usize, state: CellState) {
        self.cells[x][y].state = state;
    }

    pub(crate) fn rederive_geometry(&mut self) {
        self.update_geometry();
    }

    pub(crate) fn snapshot_states(&self) -> Vec<Vec<CellState>> {
        self.cells
            .iter()
            .map(|row| row.iter().map(|c| c.state()).collect())
            .collect()
    }

    pub(crate) fn restore_states(&mut self, states: &[Vec<CellState>]) {
        for (i, row) in states.iter().enumerate() {
            for (j, &state) in row.iter().enumerate() {
                self.cells[i][j].state = state;
            }
        }
        self.update_geometry();
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.cells.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for (j, cell) in row.iter().enumerate() {
                if j > 0 {
                    write!(f, " ")?;
                }
                let c = match cell.state() {
                    CellState::Empty => '-',
                    CellState::Black => '#',
                    CellState::Set(c) | CellState::Locked(c) => c,
                };
                write!(f, "{}", c)?;
            }
        }
        Ok(())
    }
}
