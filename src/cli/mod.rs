//! Top-level CLI parsing and command execution.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::entities::analysis;
use crate::entities::article::{
    self, ArticleSearchFilters, RARE_METABOLIC_DEFAULT_TERMS, build_query,
};
use crate::entities::organization::TOP_PHARMA;

pub mod health;

#[derive(Parser, Debug)]
#[command(
    name = "litscout",
    about = "Search PubMed by pharma affiliation and disease area, export results, and run LLM opportunity analysis",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON instead of Markdown
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Affiliation term for the [ad] clause (repeatable)
    #[arg(short = 'a', long = "affiliation")]
    pub affiliations: Vec<String>,

    /// Disease phrase for the [tiab] clause (repeatable)
    #[arg(short = 'd', long = "disease")]
    pub diseases: Vec<String>,

    /// Extra comma-separated title/abstract terms
    #[arg(short = 't', long, default_value = "")]
    pub terms: String,

    /// Add the curated top-pharma affiliation list
    #[arg(long)]
    pub default_pharma: bool,

    /// Add the rare-metabolic default disease terms
    #[arg(long)]
    pub default_diseases: bool,

    /// Maximum results (default: 100)
    #[arg(short, long, default_value = "100")]
    pub limit: usize,

    /// Minimum publication year (default: 2005)
    #[arg(long, default_value = "2005")]
    pub min_year: i32,
}

impl SearchArgs {
    fn to_filters(&self) -> ArticleSearchFilters {
        let mut affiliations = self.affiliations.clone();
        if self.default_pharma {
            affiliations.extend(TOP_PHARMA.iter().map(|s| s.to_string()));
        }
        let mut disease_terms = self.diseases.clone();
        if self.default_diseases {
            disease_terms.extend(RARE_METABOLIC_DEFAULT_TERMS.iter().map(|s| s.to_string()));
        }
        ArticleSearchFilters {
            affiliations,
            disease_terms,
            custom_terms: self.terms.clone(),
            limit: self.limit,
            min_year: self.min_year,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search articles by affiliation and disease terms
    #[command(after_help = "\
EXAMPLES:
  litscout search -a Pfizer -d \"Gaucher disease\"
  litscout search --default-pharma --default-diseases --limit 25")]
    Search {
        #[command(flatten)]
        args: SearchArgs,
    },
    /// Search and write the results to a plain-text export file
    #[command(after_help = "\
EXAMPLES:
  litscout export -a Roche -d \"lysosomal storage disease\" -o results.txt")]
    Export {
        #[command(flatten)]
        args: SearchArgs,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Search and send the export text to the completion endpoint for analysis
    #[command(after_help = "\
EXAMPLES:
  litscout analyze --default-pharma -d \"Fabry disease\" --model gpt-4o")]
    Analyze {
        #[command(flatten)]
        args: SearchArgs,

        /// Model identifier (gpt-4o-mini or gpt-4o)
        #[arg(short, long, default_value = analysis::DEFAULT_MODEL)]
        model: String,
    },
    /// Check external API connectivity
    Health,
    /// Show version
    Version,
}

fn version_output() -> String {
    format!("litscout {}", env!("CARGO_PKG_VERSION"))
}

/// Executes one parsed CLI command and returns rendered output.
///
/// # Errors
///
/// Returns an error if argument validation fails, the literature source
/// rejects a request, or rendering fails. The analyze path only fails before
/// the analysis call itself; the analysis outcome is always a value.
pub async fn run(cli: Cli) -> anyhow::Result<String> {
    match cli.command {
        Commands::Search { args } => {
            let filters = args.to_filters();
            let query = build_query(
                &filters.affiliations,
                &filters.disease_terms,
                &filters.custom_terms,
            );
            let articles = article::search(&filters).await?;
            if cli.json {
                #[derive(serde::Serialize)]
                struct SearchResponse {
                    query: String,
                    count: usize,
                    results: Vec<article::Article>,
                }
                Ok(crate::render::json::to_pretty(&SearchResponse {
                    query,
                    count: articles.len(),
                    results: articles,
                })?)
            } else {
                Ok(crate::render::markdown::article_search_markdown(
                    &query, &articles,
                ))
            }
        }
        Commands::Export { args, output } => {
            let filters = args.to_filters();
            let articles = article::search(&filters).await?;
            let text = crate::render::export::to_txt(&articles);
            tokio::fs::write(&output, &text)
                .await
                .map_err(crate::error::LitScoutError::Io)?;
            info!(path = %output.display(), count = articles.len(), "Wrote export file");
            if cli.json {
                #[derive(serde::Serialize)]
                struct ExportResponse {
                    path: PathBuf,
                    count: usize,
                }
                Ok(crate::render::json::to_pretty(&ExportResponse {
                    path: output,
                    count: articles.len(),
                })?)
            } else {
                Ok(format!(
                    "Exported {} records to {}",
                    articles.len(),
                    output.display()
                ))
            }
        }
        Commands::Analyze { args, model } => {
            let model = analysis::validate_model(&model)?;
            let filters = args.to_filters();
            let articles = article::search(&filters).await?;
            let text = crate::render::export::to_txt(&articles);
            let outcome = analysis::analyze(&text, &model).await;
            if cli.json {
                #[derive(serde::Serialize)]
                struct AnalyzeResponse {
                    model: String,
                    kind: &'static str,
                    text: String,
                }
                Ok(crate::render::json::to_pretty(&AnalyzeResponse {
                    model,
                    kind: outcome.kind(),
                    text: outcome.to_string(),
                })?)
            } else {
                Ok(crate::render::markdown::analysis_markdown(&model, &outcome))
            }
        }
        Commands::Health => {
            let report = health::check().await?;
            if cli.json {
                Ok(crate::render::json::to_pretty(&report)?)
            } else {
                Ok(report.to_markdown())
            }
        }
        Commands::Version => Ok(version_output()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn search_flags_parse() {
        let cli = Cli::try_parse_from([
            "litscout", "search", "-a", "Pfizer", "-d", "Gaucher disease", "--limit", "25",
        ])
        .expect("search should parse");
        match cli.command {
            Commands::Search { args } => {
                assert_eq!(args.affiliations, vec!["Pfizer".to_string()]);
                assert_eq!(args.diseases, vec!["Gaucher disease".to_string()]);
                assert_eq!(args.limit, 25);
                assert_eq!(args.min_year, 2005);
            }
            other => panic!("expected search, got {other:?}"),
        }
    }

    #[test]
    fn default_lists_merge_into_filters() {
        let cli = Cli::try_parse_from([
            "litscout",
            "search",
            "--default-pharma",
            "--default-diseases",
            "-a",
            "Ionis",
        ])
        .expect("search should parse");
        let Commands::Search { args } = cli.command else {
            panic!("expected search");
        };
        let filters = args.to_filters();
        assert!(filters.affiliations.contains(&"Ionis".to_string()));
        assert!(filters.affiliations.contains(&"Roche".to_string()));
        assert!(
            filters
                .disease_terms
                .contains(&"lysosomal storage disease".to_string())
        );
    }

    #[test]
    fn analyze_defaults_to_the_small_model() {
        let cli = Cli::try_parse_from(["litscout", "analyze", "-a", "Amgen"])
            .expect("analyze should parse");
        match cli.command {
            Commands::Analyze { model, .. } => assert_eq!(model, analysis::DEFAULT_MODEL),
            other => panic!("expected analyze, got {other:?}"),
        }
    }

    #[test]
    fn export_requires_an_output_path() {
        assert!(Cli::try_parse_from(["litscout", "export", "-a", "Bayer"]).is_err());
        let cli = Cli::try_parse_from(["litscout", "export", "-a", "Bayer", "-o", "out.txt"])
            .expect("export should parse");
        match cli.command {
            Commands::Export { output, .. } => assert_eq!(output, PathBuf::from("out.txt")),
            other => panic!("expected export, got {other:?}"),
        }
    }

    #[test]
    fn json_flag_is_global() {
        let cli = Cli::try_parse_from(["litscout", "search", "-a", "GSK", "--json"])
            .expect("global json should parse");
        assert!(cli.json);
    }

    #[tokio::test]
    async fn analyze_rejects_unknown_model_before_any_network() {
        let cli = Cli::try_parse_from([
            "litscout",
            "analyze",
            "-a",
            "Pfizer",
            "--model",
            "not-a-model",
        ])
        .expect("analyze should parse");
        let err = run(cli).await.expect_err("unknown model should fail");
        assert!(err.to_string().contains("Invalid argument"));
    }

    #[test]
    fn version_output_names_the_binary() {
        assert!(version_output().starts_with("litscout "));
    }
}
