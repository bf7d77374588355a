use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use valorize::config::Config;
use valorize::db::{Database, KeyValueStore, LibSqlBackend};
use valorize::models::{Analysis, ResearchItem};
use valorize::processing::{filter_analyses, group_by_day, ResultFilters, SortBy, SortOrder};
use valorize::scoring::ScoringApiClient;
use valorize::{AnalysisService, RequestOutcome};

#[derive(Parser)]
#[command(name = "valorize")]
#[command(about = "Score research abstracts for novelty against patents and publications")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score a new title and abstract and store the result
    Submit {
        #[arg(long)]
        title: String,
        #[arg(long = "abstract")]
        abstract_text: String,
    },
    /// List stored analyses, newest first, grouped by day
    List {
        /// Only show analyses whose title contains this text
        #[arg(long)]
        filter: Option<String>,
    },
    /// Show one analysis with its prior art
    Show {
        id: String,
        #[arg(long)]
        keyword: Option<String>,
        #[arg(long)]
        from_year: Option<i32>,
        #[arg(long)]
        to_year: Option<i32>,
        #[arg(long, default_value_t = 0)]
        min_similarity: u8,
        #[arg(long, value_enum, default_value_t = SortArg::Similarity)]
        sort: SortArg,
        #[arg(long, value_enum, default_value_t = OrderArg::Desc)]
        order: OrderArg,
        /// Only items similar enough to be a licensing risk
        #[arg(long)]
        license_risk: bool,
        /// Print the stored analysis as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change the title of a stored analysis without rescoring it
    Rename {
        id: String,
        title: String,
    },
    /// Copy an analysis under a new id at the top of the list
    Duplicate {
        id: String,
    },
    /// Remove an analysis and its display settings
    Delete {
        id: String,
    },
    /// Rescore an analysis in place with edited text
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long = "abstract")]
        abstract_text: Option<String>,
    },
    /// Score edited text as a new analysis, leaving the source untouched
    SaveAsNew {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long = "abstract")]
        abstract_text: Option<String>,
    },
    /// Toggle the collapsed sidebar flag
    ToggleSidebar,
    /// Check that the scoring service is reachable
    Health,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Similarity,
    Date,
}

#[derive(Clone, Copy, ValueEnum)]
enum OrderArg {
    Asc,
    Desc,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "valorize=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();
    let scorer = Arc::new(ScoringApiClient::new(config.scoring.clone())?);

    tracing::debug!("Initializing database...");
    let raw_db = Database::new(&config.storage).await?;
    let kv: Arc<dyn KeyValueStore> = Arc::new(LibSqlBackend::new(raw_db));
    kv.sync().await?;

    let service = AnalysisService::open(kv, &config.storage, scorer.clone()).await;

    match args.command {
        Command::Submit {
            title,
            abstract_text,
        } => {
            let outcome = service.submit(&title, &abstract_text).await?;
            report(outcome)?;
        }
        Command::List { filter } => {
            let analyses = service.analyses().await;
            let matched = filter_analyses(&analyses, filter.as_deref().unwrap_or_default());
            let groups = group_by_day(&matched, Utc::now().date_naive());

            for (label, entries) in [
                ("Today", &groups.today),
                ("Yesterday", &groups.yesterday),
                ("Earlier", &groups.earlier),
            ] {
                if entries.is_empty() {
                    continue;
                }
                println!("{label}");
                for analysis in entries.iter() {
                    println!(
                        "  {}  {:>3}%  {}",
                        analysis.id(),
                        analysis.result.novelty_percent,
                        analysis.input.title
                    );
                }
            }
        }
        Command::Show {
            id,
            keyword,
            from_year,
            to_year,
            min_similarity,
            sort,
            order,
            license_risk,
            json,
        } => {
            let analysis = service
                .get(&id)
                .await
                .ok_or_else(|| anyhow::anyhow!("No analysis with id {id}"))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
                return Ok(());
            }

            let mut filters = if license_risk {
                ResultFilters::license_risk_only()
            } else {
                ResultFilters::default()
            };
            filters.keyword = keyword.unwrap_or_default();
            filters.similarity_threshold = filters.similarity_threshold.max(min_similarity);
            filters.year_range = match (from_year, to_year) {
                (None, None) => None,
                (from, to) => Some((from.unwrap_or(i32::MIN), to.unwrap_or(i32::MAX))),
            };
            filters.sort_by = match sort {
                SortArg::Similarity => SortBy::Similarity,
                SortArg::Date => SortBy::Date,
            };
            filters.sort_order = match order {
                OrderArg::Asc => SortOrder::Asc,
                OrderArg::Desc => SortOrder::Desc,
            };

            print_analysis(&analysis, &filters);
        }
        Command::Rename { id, title } => {
            if !service.rename(&id, &title).await {
                anyhow::bail!("No analysis with id {id}");
            }
            println!("Renamed {id}");
        }
        Command::Duplicate { id } => {
            let copy = service
                .duplicate(&id)
                .await
                .ok_or_else(|| anyhow::anyhow!("No analysis with id {id}"))?;
            println!("Created {} \"{}\"", copy.id(), copy.input.title);
        }
        Command::Delete { id } => {
            if !service.delete(&id).await {
                anyhow::bail!("No analysis with id {id}");
            }
            println!("Deleted {id}");
        }
        Command::Update {
            id,
            title,
            abstract_text,
        } => {
            let (title, abstract_text) = edited_text(&service, &id, title, abstract_text).await?;
            let outcome = service.recompute(&id, &title, &abstract_text).await?;
            report(outcome)?;
        }
        Command::SaveAsNew {
            id,
            title,
            abstract_text,
        } => {
            let (title, abstract_text) = edited_text(&service, &id, title, abstract_text).await?;
            let outcome = service.save_as_new(&title, &abstract_text).await?;
            report(outcome)?;
        }
        Command::ToggleSidebar => {
            let collapsed = service.toggle_sidebar().await;
            println!("Sidebar {}", if collapsed { "collapsed" } else { "expanded" });
        }
        Command::Health => {
            scorer.health().await?;
            println!("Scoring service at {} is healthy", config.scoring.base_url);
        }
    }

    Ok(())
}

/// Stored text of `id` with any edits from the command line applied.
async fn edited_text(
    service: &AnalysisService,
    id: &str,
    title: Option<String>,
    abstract_text: Option<String>,
) -> anyhow::Result<(String, String)> {
    let analysis = service
        .get(id)
        .await
        .ok_or_else(|| anyhow::anyhow!("No analysis with id {id}"))?;
    Ok((
        title.unwrap_or(analysis.input.title),
        abstract_text.unwrap_or(analysis.input.abstract_text),
    ))
}

fn report(outcome: RequestOutcome) -> anyhow::Result<()> {
    match outcome {
        RequestOutcome::Applied(analysis) => {
            print_analysis(&analysis, &ResultFilters::default());
            Ok(())
        }
        RequestOutcome::Superseded => {
            println!("Request was replaced by a newer one");
            Ok(())
        }
        RequestOutcome::Failed(e) => {
            let message = e.user_message();
            if e.is_retryable() {
                // Only transient failures carry their cause.
                return Err(anyhow::Error::new(e).context(message));
            }
            anyhow::bail!(message)
        }
        RequestOutcome::Missing => anyhow::bail!("Analysis no longer exists"),
    }
}

fn print_analysis(analysis: &Analysis, filters: &ResultFilters) {
    let result = &analysis.result;
    println!("{}  {}", analysis.id(), analysis.input.title);
    println!(
        "Novelty {}% ({}), max similarity {}%",
        result.novelty_percent,
        result.novelty_level(),
        result.max_similarity
    );

    if !result.top_authors.is_empty() {
        let authors: Vec<String> = result
            .top_authors
            .iter()
            .map(|a| format!("{} ({})", a.name, a.score))
            .collect();
        println!("Top authors: {}", authors.join(", "));
    }

    let filtered = filters.is_active();
    print_items("Patents", &filters.apply(&result.patents), result.patents.len(), filtered);
    print_items(
        "Publications",
        &filters.apply(&result.publications),
        result.publications.len(),
        filtered,
    );
}

fn print_items(heading: &str, items: &[&ResearchItem], total: usize, filtered: bool) {
    if filtered {
        println!("{heading} ({} of {total})", items.len());
    } else {
        println!("{heading} ({})", items.len());
    }
    for item in items {
        let warning = if item.license_warning == Some(true) {
            "  [license risk]"
        } else {
            ""
        };
        println!(
            "  {:>3}%  {}  {}{}",
            item.similarity, item.date, item.title, warning
        );
    }
}
