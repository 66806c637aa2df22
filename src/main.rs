//! Prova CLI: paginate a question file headless and print the answer sheets.
//! The main interface is through WASM bindings. Build with `--features cli`.

use anyhow::{Context, Result};
use clap::Parser;
use prova_core::{Exam, ExamConfig, PlacementEntry, Question, TextMetricOracle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Cli {
    /// JSON array of questions
    questions: PathBuf,
    /// JSON exam configuration
    config: Option<PathBuf>,
    /// Number of variants ("tipos") to generate
    #[clap(long, default_value_t = 1)]
    variants: u32,
    /// Seed variants from this user id
    #[clap(long)]
    user: Option<String>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = try_main() {
        eprintln!("Error: {e:#}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();

    let questions: Vec<Question> = read_json(&cli.questions)?;
    let config: ExamConfig = match &cli.config {
        Some(path) => read_json(path)?,
        None => ExamConfig::default(),
    };

    let exam = Exam::with_questions(questions, config);
    let oracle = TextMetricOracle::default();
    let variants = exam.variants(cli.variants, cli.user.as_deref());

    for variant in &variants {
        let result = exam
            .paginate(&oracle, Some(variant))
            .with_context(|| format!("Failed to paginate variant {}", variant.index))?;

        println!("Tipo {}: {} page(s)", variant.index, result.page_count());
        for page in &result.pages {
            for (col_idx, column) in page.columns.iter().enumerate() {
                let entries: Vec<String> = column
                    .entries
                    .iter()
                    .map(|entry| {
                        let id = &result.units[entry.unit()].id;
                        match entry {
                            PlacementEntry::Full { .. } => id.to_string(),
                            PlacementEntry::Frag { from, to, .. } => {
                                format!("{id}[{from}..={to}]")
                            }
                        }
                    })
                    .collect();
                let marker = if column.overflowed { " (overflow)" } else { "" };
                println!(
                    "  page {} col {}: {:.0}/{:.0}px{} {}",
                    page.index + 1,
                    col_idx + 1,
                    column.used,
                    column.capacity,
                    marker,
                    entries.join(" ")
                );
            }
        }

        let sheet = exam
            .answer_sheet(variant)
            .with_context(|| format!("Failed to build answer key of variant {}", variant.index))?;
        println!("{sheet}");
    }

    Ok(())
}
