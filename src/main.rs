use std::fs;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use instant::Instant;

use gridfill::{
    solver_by_name_with_config, CrosswordSolver, GinsbergSolver, PuzzleDefinition, ResultKind, SolverConfig,
    SolverError, SolverResult, WordList,
};

/// Fill a crossword grid with words from a word list
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The grid, one row per line: '#' for shaded boxes, '.' for empty ones, letters for
    /// pre-filled ones. Prefix with '@' to read it from a file.
    grid: String,

    /// Path to the word list file (word or word;score per line)
    #[arg(short, long)]
    word_list: PathBuf,

    /// Minimum score filter
    #[arg(short = 'm', long, default_value_t = 0)]
    min_score: i32,

    /// Solver backend
    #[arg(short, long, default_value = GinsbergSolver::NAME)]
    solver: String,

    /// Compare at most this many viable candidates per slot (at least 1)
    #[arg(long)]
    candidate_limit: Option<NonZeroUsize>,

    /// Give up after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Log every assignment and backtrack
    #[arg(long)]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let debug_enabled = cli.debug || std::env::var("GRIDFILL_DEBUG").is_ok();
    gridfill::log::init_logger(debug_enabled);

    match try_main(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Load the inputs, run the solver on a worker thread and print the outcome. The exit code is
/// non-zero when the grid cannot be filled.
fn try_main(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let template = match cli.grid.strip_prefix('@') {
        Some(path) => fs::read_to_string(path)?,
        None => cli.grid.replace("\\n", "\n"),
    };
    let puzzle = PuzzleDefinition::from_template(&template)?;
    let (width, height) = (puzzle.width(), puzzle.height());

    let t_load = Instant::now();
    let words = WordList::load_from_path(&cli.word_list, cli.min_score)?;
    log::info!("Loaded {} words in {:.3}s", words.len(), t_load.elapsed().as_secs_f64());

    let config = SolverConfig {
        candidate_limit: cli.candidate_limit,
    };
    let solver = solver_by_name_with_config(&cli.solver, &config)
        .ok_or_else(|| format!("unknown solver \"{}\"", cli.solver))?;
    log::info!("Using {} solver: {}", solver.name(), solver.description());

    let (abort_tx, abort_rx) = mpsc::channel::<()>();
    let (result_tx, result_rx) = mpsc::channel::<Result<SolverResult, SolverError>>();
    let worker = thread::spawn(move || {
        let result = solver.solve(&puzzle, &words, &abort_rx, &mut ());
        // The receiver only goes away if the main thread has already given up.
        let _ = result_tx.send(result);
    });

    let result = match cli.timeout {
        Some(seconds) => match result_rx.recv_timeout(Duration::from_secs(seconds)) {
            Ok(result) => result,
            Err(_) => {
                let _ = abort_tx.send(());
                result_rx.recv()?
            }
        },
        None => result_rx.recv()?,
    };
    worker.join().map_err(|_| "solver thread panicked")?;

    let result = result?;
    print!("{}", result.render(width, height));
    eprintln!("{}", result.statistics);

    match result.kind {
        ResultKind::Solved => Ok(ExitCode::SUCCESS),
        ResultKind::Impossible => {
            eprintln!(
                "The solver could not fill the grid; stuck at {:?}",
                result.unsolvable_boxes
            );
            Ok(ExitCode::FAILURE)
        }
    }
}
