use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{TourClient, TourSession};
use navigation::{NavigationGraph, Viewer};
use shared::domain::TourId;
use tracing_subscriber::EnvFilter;

mod browse;
mod renderer;
mod upload;

use renderer::{describe_hotspot, TextRenderer};

#[derive(Parser, Debug)]
#[command(about = "Browse and upload virtual tours")]
struct Cli {
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    server_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every tour on the server.
    List,
    /// Print a tour's images and hotspots.
    Show { tour_id: i64 },
    /// Upload image files as a new tour.
    Upload {
        #[arg(long)]
        name: String,
        /// JSON file mapping image file names to hotspot lists.
        #[arg(long)]
        hotspots: Option<PathBuf>,
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Walk a tour interactively, reading commands from stdin.
    Browse { tour_id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let client = TourClient::new(&cli.server_url)?;

    match cli.command {
        Command::List => {
            let tours = client.list_tours().await?;
            if tours.is_empty() {
                println!("no tours yet");
            }
            for tour in tours {
                println!(
                    "{:>4}  {}  ({} images, {} hotspots)",
                    tour.id.0,
                    tour.name,
                    tour.images.len(),
                    tour.hotspot_count()
                );
            }
        }
        Command::Show { tour_id } => {
            let tour = client.get_tour(TourId(tour_id)).await?;
            println!("{} (#{})", tour.name, tour.id.0);
            let graph = NavigationGraph::load(&tour).context("tour failed to load")?;
            for image in graph.images() {
                println!("{}  {}", image.name, client.image_url(&image.url));
                for (index, hotspot) in graph.hotspots_for(&image.name).iter().enumerate() {
                    println!("   {}", describe_hotspot(index, hotspot));
                }
            }
            for link in graph.dangling_links() {
                println!("warning: {link}");
            }
        }
        Command::Upload {
            name,
            hotspots,
            images,
        } => {
            let draft = upload::build_draft(&name, &images, hotspots.as_deref()).await?;
            let created = client.create_tour(&draft).await?;
            println!(
                "{} id={} ({} images, {} hotspots)",
                created.message, created.id.0, created.image_count, created.hotspot_count
            );
        }
        Command::Browse { tour_id } => {
            let mut session = TourSession::new();
            let ticket = session.begin_load();
            let result = client.load_graph(TourId(tour_id)).await;
            session.finish_load(ticket, result)?;
            let graph = session
                .take_graph()
                .context("tour load was superseded")?;

            let mut viewer = Viewer::open(graph, TextRenderer::new(std::io::stdout()))?;
            browse::run(&mut viewer, std::io::stdin().lock(), std::io::stdout())?;
        }
    }

    Ok(())
}
