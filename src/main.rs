use clap::Parser;
use crossfill::render::render_grid;
use crossfill::{find_fill, Crossword, Error, FillFailure, FillOptions, WordList};
use instant::Duration;
use log::info;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

/// crossfill: fill a crossword structure with words from a word list
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the structure file, with _ representing open cells and anything else a block
    structure: PathBuf,

    /// Path to the word list, one word per line
    words: PathBuf,

    /// Also write the filled grid to this path
    output: Option<PathBuf>,

    /// Give up after this many seconds [default: no limit]
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Don't propagate constraints after each choice, just check crossings
    #[arg(long)]
    no_inference: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Error> {
    let word_list = WordList::from_dict_file(&args.words)?;
    let crossword = Crossword::from_structure_file(&args.structure, word_list)?;

    info!(
        "Loaded {}x{} grid with {} slots and {} words",
        crossword.width,
        crossword.height,
        crossword.variable_count(),
        crossword.word_list.len(),
    );

    let mut options = FillOptions::default().with_arc_consistency(!args.no_inference);
    if let Some(timeout_secs) = args.timeout_secs {
        options = options.with_timeout(Duration::from_secs(timeout_secs));
    }

    let result = match find_fill(&crossword, options) {
        Ok(result) => result,
        Err(FillFailure::Unsatisfiable) => {
            println!("No solution.");
            return Ok(());
        }
        Err(FillFailure::Timeout) => {
            println!("No solution found within the time limit.");
            return Ok(());
        }
    };

    info!("{:?}", result.statistics);

    let display_grid = render_grid(&crossword, &result.assignment);
    println!("{display_grid}");

    if let Some(output) = args.output {
        fs::write(&output, display_grid + "\n").map_err(|source| Error::Write {
            path: output.clone(),
            source,
        })?;
        info!("Wrote grid to {}", output.display());
    }

    Ok(())
}
