use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Comma-separated foods with optional grams, e.g. "chicken breast:200, black beans:50"
    #[arg(short, long, conflicts_with = "ingredients_file")]
    pub foods: Option<String>,

    /// CSV file with `name` and `grams` columns
    #[arg(short, long)]
    pub ingredients_file: Option<String>,

    /// Weight of semantic similarity versus fuzzy token matching (0.0 - 1.0)
    #[arg(short, long)]
    pub alpha: Option<f32>,

    /// Prefer branded catalog records
    #[arg(short, long)]
    pub branded: bool,

    /// Also print each matched food scaled per kcal
    #[arg(long)]
    pub per_kcal: bool,

    /// Rank on fuzzy matching only, without loading the embedding model
    #[arg(long)]
    pub lexical_only: bool,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
