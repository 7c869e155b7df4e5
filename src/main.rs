use std::{fs, path::Path, path::PathBuf, process::exit};

use clap::Parser;
use diffgiraf::{DiffSettings, diff};

/// Structural diff for HTML and XML documents.
///
/// Prints a single document in which content added between the two versions
/// is wrapped in `<ins>` and removed content in `<del>`.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[deny(missing_docs)]
struct CliArgs {
    /// Path to the file containing the old version
    old: PathBuf,
    /// Path to the file containing the new version
    new: PathBuf,
    /// Similarity threshold in [0, 1] under which the diff is not shown.
    /// Zero disables the check.
    #[arg(short, long, default_value_t = 0.0)]
    cutoff: f64,
    /// Treat the inputs as strict XML instead of lenient HTML
    #[arg(long)]
    xml: bool,
    /// Print the result on a single line instead of indenting it
    #[arg(long)]
    compact: bool,
    /// Verbosity
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = CliArgs::parse();

    stderrlog::new()
        .module(module_path!())
        .verbosity(if args.verbose { 3 } else { 2 })
        .init()
        .unwrap();

    match real_main(&args) {
        Ok(exit_code) => exit(exit_code),
        Err(error) => {
            eprintln!("diffgiraf: {error}");
            exit(-1)
        }
    }
}

fn real_main(args: &CliArgs) -> Result<i32, String> {
    let old = read_file_to_string(&args.old)?;
    let new = read_file_to_string(&args.new)?;

    let settings = DiffSettings {
        cutoff: args.cutoff,
        html: !args.xml,
        pretty: !args.compact,
    };
    let changes = diff(&old, &new, &settings).map_err(|err| err.to_string())?;
    println!("{changes}");
    Ok(0)
}

fn read_file_to_string(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|err| format!("Could not read {}: {err}", path.display()))
}
