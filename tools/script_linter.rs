/// Script Linter: checks dialogue scripts for broken references and
/// suspicious content.
///
/// Usage: script_linter <script.ron | dir> [--quiet]

use dialogue_flow::core::runtime::Severity;
use dialogue_flow::core::script::Script;
use dialogue_flow::schema::config::DialogueConfig;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: script_linter <script.ron | dir> [--quiet]");
        process::exit(0);
    }

    let target = Path::new(&args[1]);
    let quiet = args[2..].iter().any(|a| a == "--quiet");

    let files = if target.is_file() {
        vec![target.to_path_buf()]
    } else if target.is_dir() {
        let mut found = Vec::new();
        collect_scripts(target, &mut found);
        found.sort();
        found
    } else {
        eprintln!("ERROR: Path '{}' does not exist", target.display());
        process::exit(1);
    };

    let mut total_errors = 0;
    let mut total_warnings = 0;

    for path in &files {
        let script = match Script::load_from_ron(path) {
            Ok(script) => script,
            Err(_) if is_dialogue_config(path) => {
                println!("Skipped: {} (dialogue config)", path.display());
                continue;
            }
            Err(e) => {
                println!("ERROR: {}: failed to load: {}", path.display(), e);
                total_errors += 1;
                continue;
            }
        };

        println!("\n=== {} ({} knots) ===", path.display(), script.knots.len());
        if !quiet {
            println!("Entry points: {}", script.entry_knots().join(", "));
        }

        let issues = script.validate();
        if issues.is_empty() {
            println!("All checks passed!");
        }
        for issue in &issues {
            let label = match issue.severity {
                Severity::Error => {
                    total_errors += 1;
                    "ERROR"
                }
                Severity::Warning => {
                    total_warnings += 1;
                    "WARNING"
                }
            };
            if issue.severity == Severity::Error || !quiet {
                println!("{}: [{}] {}", label, issue.knot, issue.message);
            }
        }
    }

    println!(
        "\nSummary: {} files, {} errors, {} warnings",
        files.len(),
        total_errors,
        total_warnings
    );

    if total_errors > 0 {
        process::exit(1);
    }
}

fn is_dialogue_config(path: &Path) -> bool {
    DialogueConfig::load_from_ron(path)
        .map(|config| !config.stories.is_empty() || !config.actors.is_empty())
        .unwrap_or(false)
}

fn collect_scripts(dir: &Path, found: &mut Vec<PathBuf>) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                collect_scripts(&path, found);
            } else if path.extension().and_then(|s| s.to_str()) == Some("ron") {
                found.push(path);
            }
        }
    }
}
