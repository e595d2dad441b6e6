use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use thiserror::Error;

use crate::grid::{CellState, Grid, GridError, GridSymmetry};

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Unable to create the file '{0}'")]
    FileCreate(String),
    #[error("Unable to open the file '{0}'")]
    FileOpen(String),
    #[error("Malformed grid document: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Grid size ({0}, {1}) is too small")]
    GridTooSmall(usize, usize),
    #[error("grid_letters shape does not match grid_size")]
    ShapeMismatch,
    #[error("Unknown status code {0}")]
    BadStatus(u8),
    #[error("Unknown symmetry code {0}")]
    BadSymmetry(u8),
    #[error("Cell ({0}, {1}) has status {2} but value '{3}'")]
    BadValue(usize, usize, u8, String),
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// The grid interchange document shared with the editor. Cell geometry is
/// stored for the editor's benefit but treated as advisory on load; it is
/// re-derived from the black-square pattern.
#[derive(Debug, Serialize, Deserialize)]
pub struct GridFile {
    pub grid_size: (usize, usize),
    pub symmetry: u8,
    pub auto_symmetry: bool,
    pub grid_letters: Vec<Vec<CellRecord>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CellRecord {
    pub status: u8,
    pub value: String,
    pub x: usize,
    pub y: usize,
    pub is_h_start: bool,
    pub is_h_end: bool,
    pub is_v_start: bool,
    pub is_v_end: bool,
    pub hlen: usize,
    pub vlen: usize,
    pub answer_number: Option<u32>,
}

fn status_code(state: CellState) -> u8 {
    match state {
        CellState::Empty => 0,
        CellState::Set(_) => 1,
        CellState::Locked(_) => 2,
        CellState::Black => 3,
    }
}

fn symmetry_code(symmetry: GridSymmetry) -> u8 {
    match symmetry {
        GridSymmetry::None => 0,
        GridSymmetry::Rotational => 1,
        GridSymmetry::Reflection => 2,
    }
}

impl GridFile {
    pub fn from_grid(grid: &Grid) -> Self {
        let grid_letters = (0..grid.rows())
            .map(|i| {
                (0..grid.cols())
                    .map(|j| {
                        let cell = grid.cell(i, j);
                        CellRecord {
                            status: status_code(cell.state()),
                            value: cell.letter().map(String::from).unwrap_or_default(),
                            x: i,
                            y: j,
                            is_h_start: cell.is_h_start,
                            is_h_end: cell.is_h_end,
                            is_v_start: cell.is_v_start,
                            is_v_end: cell.is_v_end,
                            hlen: cell.hlen,
                            vlen: cell.vlen,
                            answer_number: cell.answer_number,
                        }
                    })
                    .collect()
            })
            .collect();
        GridFile {
            grid_size: (grid.rows(), grid.cols()),
            symmetry: symmetry_code(grid.symmetry),
            auto_symmetry: grid.auto_symmetry,
            grid_letters,
        }
    }

    pub fn into_grid(self) -> Result<Grid, FormatError> {
        let (rows, cols) = self.grid_size;
        if rows < 3 || cols < 3 {
            return Err(FormatError::GridTooSmall(rows, cols));
        }
        if self.grid_letters.len() != rows
            || self.grid_letters.iter().any(|row| row.len() != cols)
        {
            return Err(FormatError::ShapeMismatch);
        }

        let mut grid = Grid::new(rows, cols);
        grid.symmetry = match self.symmetry {
            0 => GridSymmetry::None,
            1 => GridSymmetry::Rotational,
            2 => GridSymmetry::Reflection,
            other => return Err(FormatError::BadSymmetry(other)),
        };
        grid.auto_symmetry = self.auto_symmetry;

        for (i, row) in self.grid_letters.iter().enumerate() {
            for (j, record) in row.iter().enumerate() {
                let state = record_state(i, j, record)?;
                grid.restore_state(i, j, state);
            }
        }
        grid.rederive_geometry();
        Ok(grid)
    }
}

fn record_state(x: usize, y: usize, record: &CellRecord) -> Result<CellState, FormatError> {
    let letter = || {
        let mut chars = record.value.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => Ok(c.to_ascii_uppercase()),
            _ => Err(FormatError::BadValue(
                x,
                y,
                record.status,
                record.value.clone(),
            )),
        }
    };
    match record.status {
        0 => Ok(CellState::Empty),
        1 => Ok(CellState::Set(letter()?)),
        2 => Ok(CellState::Locked(letter()?)),
        3 => Ok(CellState::Black),
        other => Err(FormatError::BadStatus(other)),
    }
}

pub fn save(grid: &Grid, path: &Path) -> Result<(), FormatError> {
    let file = File::create(path)
        .map_err(|_| FormatError::FileCreate(path.display().to_string()))?;
    serde_json::to_writer_pretty(file, &GridFile::from_grid(grid))?;
    Ok(())
}

pub fn load(path: &Path) -> Result<Grid, FormatError> {
    let file =
        File::open(path).map_err(|_| FormatError::FileOpen(path.display().to_string()))?;
    let doc: GridFile = serde_json::from_reader(file)?;
    doc.into_grid()
}

#[cfg(test)]
mod tests {
    use super::{FormatError, GridFile};
    use crate::grid::{CellValue, Grid, GridSymmetry, WordDirection};

    fn sample_grid() -> Grid {
        let mut grid = Grid::new(4, 5);
        grid.symmetry = GridSymmetry::Rotational;
        grid.auto_symmetry = false;
        grid.set(1, 2, CellValue::Black).unwrap();
        grid.set_word("CAT", 0, 0, WordDirection::Horizontal, false).unwrap();
        grid.lock(0, 0).unwrap();
        grid
    }

    #[test]
    fn round_trip_preserves_states_and_modes() {
        let grid = sample_grid();
        let json = serde_json::to_string(&GridFile::from_grid(&grid)).unwrap();
        let doc: GridFile = serde_json::from_str(&json).unwrap();
        let loaded = doc.into_grid().unwrap();

        assert_eq!(loaded.rows(), 4);
        assert_eq!(loaded.cols(), 5);
        assert_eq!(loaded.symmetry, GridSymmetry::Rotational);
        assert!(!loaded.auto_symmetry);
        for i in 0..4 {
            for j in 0..5 {
                assert_eq!(loaded.cell(i, j).state(), grid.cell(i, j).state());
            }
        }
    }

    #[test]
    fn stored_geometry_is_advisory() {
        let grid = sample_grid();
        let mut doc = GridFile::from_grid(&grid);
        // Corrupt the cached geometry; loading must recompute it.
        for row in doc.grid_letters.iter_mut() {
            for record in row.iter_mut() {
                record.hlen = 99;
                record.answer_number = Some(77);
            }
        }
        let loaded = doc.into_grid().unwrap();
        assert_eq!(loaded.cell(0, 0).hlen, 5);
        assert_eq!(loaded.cell(0, 0).answer_number, Some(1));
        assert_eq!(loaded.cell(1, 2).answer_number, None);
    }

    #[test]
    fn rejects_bad_codes_and_values() {
        let grid = sample_grid();

        let mut doc = GridFile::from_grid(&grid);
        doc.grid_letters[2][2].status = 9;
        assert!(matches!(doc.into_grid(), Err(FormatError::BadStatus(9))));

        let mut doc = GridFile::from_grid(&grid);
        doc.symmetry = 7;
        assert!(matches!(doc.into_grid(), Err(FormatError::BadSymmetry(7))));

        let mut doc = GridFile::from_grid(&grid);
        doc.grid_letters[0][1].value = String::new();
        assert!(matches!(
            doc.into_grid(),
            Err(FormatError::BadValue(0, 1, _, _))
        ));

        let mut doc = GridFile::from_grid(&grid);
        doc.grid_letters.pop();
        assert!(matches!(doc.into_grid(), Err(FormatError::ShapeMismatch)));
    }

    #[test]
    fn status_codes_match_the_interchange_contract() {
        let grid = sample_grid();
        let doc = GridFile::from_grid(&grid);
        assert_eq!(doc.grid_letters[0][0].status, 2); // locked C
        assert_eq!(doc.grid_letters[0][1].status, 1); // set A
        assert_eq!(doc.grid_letters[1][2].status, 3); // black
        assert_eq!(doc.grid_letters[3][4].status, 0); // empty
        assert_eq!(doc.grid_letters[0][0].value, "C");
        assert_eq!(doc.grid_letters[1][2].value, "");
        assert_eq!(doc.grid_size, (4, 5));
    }

    #[test]
    fn loaded_black_pattern_drives_geometry() {
        let grid = sample_grid();
        let loaded = GridFile::from_grid(&grid).into_grid().unwrap();
        assert_eq!(loaded.cell(1, 1).hlen, 2);
        assert_eq!(loaded.cell(1, 3).is_h_start, true);
        assert_eq!(loaded.cell(2, 2).vlen, 2);
    }
}
