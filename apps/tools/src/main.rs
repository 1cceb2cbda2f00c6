use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use shared::domain::{Tour, TourId};
use storage::{prepare_database_url, StoredTour, Storage, DEFAULT_DATABASE_URL};
use tracing_subscriber::EnvFilter;

mod checks;

#[derive(Parser, Debug)]
#[command(about = "Inspect the tour database directly")]
struct Cli {
    #[arg(long, default_value = DEFAULT_DATABASE_URL)]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    List,
    /// Print a tour document as JSON.
    Show { tour_id: i64 },
    /// Report dangling hotspots and unreachable images, for one tour or all.
    CheckLinks { tour_id: Option<i64> },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let database_url = prepare_database_url(&cli.database_url)?;
    let storage = Storage::new(&database_url).await?;

    match cli.command {
        Command::List => {
            for tour in storage.list_tours().await? {
                println!(
                    "{:>4}  {}  created {}  ({} images)",
                    tour.tour_id.0,
                    tour.name,
                    tour.created_at.format("%Y-%m-%d %H:%M"),
                    tour.images.len()
                );
            }
        }
        Command::Show { tour_id } => {
            let tour = load(&storage, tour_id).await?;
            println!("{}", serde_json::to_string_pretty(&tour)?);
        }
        Command::CheckLinks { tour_id } => {
            let tours = match tour_id {
                Some(tour_id) => vec![load(&storage, tour_id).await?],
                None => storage
                    .list_tours()
                    .await?
                    .into_iter()
                    .map(StoredTour::into_tour)
                    .collect(),
            };

            let mut problems = 0;
            for report in tours.iter().map(checks::check_tour) {
                if report.is_clean() {
                    println!("#{} {}: ok", report.tour_id.0, report.name);
                    continue;
                }
                println!("#{} {}:", report.tour_id.0, report.name);
                for problem in &report.problems {
                    println!("  {problem}");
                }
                problems += report.problems.len();
            }
            if problems > 0 {
                bail!("{problems} link problem(s) found");
            }
        }
    }

    Ok(())
}

async fn load(storage: &Storage, tour_id: i64) -> Result<Tour> {
    storage
        .load_tour(TourId(tour_id))
        .await?
        .map(StoredTour::into_tour)
        .with_context(|| format!("tour {tour_id} not found"))
}
