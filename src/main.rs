use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use crosscosmos::corpus::Corpus;
use crosscosmos::format;
use crosscosmos::grid::{CellValue, Grid, GridSymmetry};
use crosscosmos::solver::Solver;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
/// A command line utility for filling crossword grids
struct Cli {
    /// Puzzle name; grids live in puzzles/<name>.json
    name: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new, blank grid.
    New(New),
    /// Display the grid.
    Display(Display),
    /// Set a cell: a letter, '-' to clear, or '#' for a black square.
    Set(SetCell),
    /// Clear every set (but not locked) cell.
    Clear,
    /// Lock a set cell so the solver cannot change it.
    Lock(LockCell),
    /// Fill every open cell from a word list.
    Solve(Solve),
    /// Validate a filled grid against a word list.
    Check(Check),
    /// List words matching a masked pattern ('?', '-' and ' ' are wildcards).
    Query(Query),
}

#[derive(Args)]
struct New {
    #[arg(default_value_t = 5)]
    rows: usize,
    #[arg(default_value_t = 5)]
    cols: usize,
    /// 0 = none, 1 = rotational, 2 = reflection
    #[arg(long, default_value_t = 1)]
    symmetry: u8,
    /// Mirror black squares automatically (rotational symmetry only)
    #[arg(long)]
    auto_symmetry: bool,
}

#[derive(Args)]
struct Display {
    /// Show the start/end boundary structure instead of the letters
    #[arg(long)]
    boundaries: bool,
}

#[derive(Args)]
struct SetCell {
    x: usize,
    y: usize,
    value: String,
}

#[derive(Args)]
struct LockCell {
    x: usize,
    y: usize,
}

#[derive(Args)]
struct Solve {
    /// Word list file with word<DELIM>score rows
    #[arg(long)]
    words: PathBuf,
    #[arg(long, default_value_t = '\t')]
    delimiter: char,
    /// Shuffle each cell's letter order with this seed
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args)]
struct Check {
    #[arg(long)]
    words: PathBuf,
    #[arg(long, default_value_t = '\t')]
    delimiter: char,
}

#[derive(Args)]
struct Query {
    pattern: String,
    #[arg(long)]
    words: PathBuf,
    #[arg(long, default_value_t = '\t')]
    delimiter: char,
    #[arg(long, default_value_t = 10)]
    count: usize,
}

static PUZZLE_DIR: &str = "puzzles";

fn puzzle_path(name: &str) -> PathBuf {
    Path::new(PUZZLE_DIR).join(format!("{}.json", name))
}

fn load_puzzle(name: &str) -> Option<Grid> {
    match format::load(&puzzle_path(name)) {
        Ok(grid) => Some(grid),
        Err(e) => {
            println!("{}", e);
            None
        }
    }
}

fn save_puzzle(grid: &Grid, name: &str) {
    if let Err(e) = format::save(grid, &puzzle_path(name)) {
        println!("Error saving puzzle to file: {}", e);
    }
}

fn load_words(path: &Path, delimiter: char) -> Option<Corpus> {
    match Corpus::from_path(path, delimiter) {
        Ok(corpus) => {
            println!("Loaded {} words from {}", corpus.len(), path.display());
            Some(corpus)
        }
        Err(e) => {
            println!("{}", e);
            None
        }
    }
}

fn main() {
    env_logger::init();
    if let Err(e) = fs::create_dir_all(PUZZLE_DIR) {
        println!("Error creating dir {}: {}", PUZZLE_DIR, e);
        return;
    }
    let cli = Cli::parse();
    let name = cli.name;

    match &cli.command {
        Commands::New(new) => {
            if new.rows < 3 || new.cols < 3 {
                println!("Grids need at least 3 rows and 3 columns");
                return;
            }
            let mut grid = Grid::new(new.rows, new.cols);
            grid.symmetry = match new.symmetry {
                0 => GridSymmetry::None,
                1 => GridSymmetry::Rotational,
                2 => GridSymmetry::Reflection,
                other => {
                    println!("Unknown symmetry code {}", other);
                    return;
                }
            };
            grid.auto_symmetry = new.auto_symmetry;
            println!("{}", grid);
            save_puzzle(&grid, &name);
        }
        Commands::Display(display) => {
            if let Some(grid) = load_puzzle(&name) {
                if display.boundaries {
                    println!("{}", grid.boundary_map());
                } else {
                    println!("{}", grid);
                }
            }
        }
        Commands::Clear => {
            let Some(mut grid) = load_puzzle(&name) else { return };
            grid.clear();
            println!("{}", grid);
            save_puzzle(&grid, &name);
        }
        Commands::Set(set) => {
            let Some(mut grid) = load_puzzle(&name) else { return };
            let value = match set.value.as_str() {
                "#" => CellValue::Black,
                "-" | "" => CellValue::Empty,
                s if s.chars().count() == 1 => CellValue::Letter(s.chars().next().unwrap()),
                s => {
                    println!("Expected a single letter, '-' or '#', got '{}'", s);
                    return;
                }
            };
            match grid.set(set.x, set.y, value) {
                Ok(()) => {
                    println!("{}", grid);
                    save_puzzle(&grid, &name);
                }
                Err(e) => println!("{}", e),
            }
        }
        Commands::Lock(lock) => {
            let Some(mut grid) = load_puzzle(&name) else { return };
            match grid.lock(lock.x, lock.y) {
                Ok(()) => save_puzzle(&grid, &name),
                Err(e) => println!("{}", e),
            }
        }
        Commands::Solve(solve) => {
            let Some(mut grid) = load_puzzle(&name) else { return };
            let Some(corpus) = load_words(&solve.words, solve.delimiter) else { return };
            if let Some(seed) = solve.seed {
                grid.shuffle_queues(seed);
            }
            let mut solver = Solver::new(&mut grid, &corpus);
            match solver.solve() {
                Ok(()) => {
                    let steps = solver.steps();
                    println!("{}", grid);
                    println!("Filled in {} steps", steps);
                    save_puzzle(&grid, &name);
                }
                Err(e) => println!("{}", e),
            }
        }
        Commands::Check(check) => {
            let Some(grid) = load_puzzle(&name) else { return };
            let Some(corpus) = load_words(&check.words, check.delimiter) else { return };
            if !grid.is_filled() {
                println!("Grid is not completely filled");
                return;
            }
            let mut bad = Vec::new();
            for slot in grid.all_answers() {
                let word = slot.to_string();
                if !corpus.contains(&word) {
                    bad.push(word);
                }
            }
            if bad.is_empty() {
                println!("All {} answers are in the word list", grid.all_answers().len());
            } else {
                println!("Not in the word list: {}", bad.join(", "));
            }
        }
        Commands::Query(query) => {
            let Some(corpus) = load_words(&query.words, query.delimiter) else { return };
            match corpus.query(&query.pattern) {
                Ok(matches) => {
                    for word in matches.iter().take(query.count) {
                        println!("{}", word);
                    }
                    println!("{} total matches", matches.len());
                }
                Err(e) => println!("{}", e),
            }
        }
    }
}
