use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use jobwire_client::{JobClient, JobStatus};
use jobwire_core::codec::{self, raster, Value};
use jobwire_core::types::JobId;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line client for the jobwire API.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Base URL of the API server.
    #[arg(long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a request body read from a JSON file (`-` for stdin).
    Submit { file: PathBuf },
    /// Print the current status of a job.
    Status { id: String },
    /// Poll a job until it finishes.
    Wait {
        id: String,
        #[command(flatten)]
        poll: PollArgs,
        #[command(flatten)]
        save: SaveArgs,
    },
    /// Submit a request and wait for the result.
    Run {
        file: PathBuf,
        #[command(flatten)]
        poll: PollArgs,
        #[command(flatten)]
        save: SaveArgs,
    },
    /// Print the tagged `image_bytes` argument for an image file.
    EncodeImage { path: PathBuf },
}

#[derive(Args)]
struct PollArgs {
    /// Delay between status polls, in milliseconds.
    #[arg(long, default_value_t = 500)]
    interval_ms: u64,

    /// Give up after this many seconds.
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,
}

impl PollArgs {
    fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Args)]
struct SaveArgs {
    /// Write an image result to this path instead of printing its bytes.
    #[arg(long)]
    save: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobwire_client=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let client = JobClient::new(cli.url);

    match cli.command {
        Command::Submit { file } => {
            let body = read_request(&file)?;
            let id = client.submit_raw(&body).await?;
            println!("{id}");
        }
        Command::Status { id } => {
            let status = client.status(&JobId::from(id)).await?;
            print_status(&status, None)?;
        }
        Command::Wait { id, poll, save } => {
            let status = client
                .wait(&JobId::from(id), poll.interval(), poll.timeout())
                .await?;
            finish(&status, save.save.as_deref())?;
        }
        Command::Run { file, poll, save } => {
            let body = read_request(&file)?;
            let id = client.submit_raw(&body).await?;
            tracing::info!(job_id = %id, "Waiting for job");
            let status = client.wait(&id, poll.interval(), poll.timeout()).await?;
            finish(&status, save.save.as_deref())?;
        }
        Command::EncodeImage { path } => {
            let bytes = std::fs::read(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let image = raster::decode_rgb(&bytes)?;
            let tagged = codec::encode(&Value::Image(image))?;
            println!("{}", serde_json::to_string(&tagged)?);
        }
    }

    Ok(())
}

fn read_request(file: &Path) -> anyhow::Result<serde_json::Value> {
    let text = if file == Path::new("-") {
        std::io::read_to_string(std::io::stdin()).context("failed to read stdin")?
    } else {
        std::fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))?
    };
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", file.display()))
}

/// Print a terminal status; a failed job makes the process exit non-zero.
fn finish(status: &JobStatus, save: Option<&Path>) -> anyhow::Result<()> {
    print_status(status, save)?;
    if status.state == jobwire_core::job::STATE_FAILURE {
        bail!(
            "job failed: {}",
            status.error.as_deref().unwrap_or("no error message")
        );
    }
    Ok(())
}

fn print_status(status: &JobStatus, save: Option<&Path>) -> anyhow::Result<()> {
    let Some(path) = save else {
        println!("{}", serde_json::to_string_pretty(status)?);
        return Ok(());
    };
    match status.output().transpose()? {
        Some(Value::Image(img)) => {
            let format = image::ImageFormat::from_path(path)
                .with_context(|| format!("unsupported image extension: {}", path.display()))?;
            img.save_with_format(path, format)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("saved {}x{} image to {}", img.width(), img.height(), path.display());
        }
        Some(other) => bail!("result is {}, not an image", other.type_name()),
        None => println!("{}", serde_json::to_string_pretty(status)?),
    }
    Ok(())
}
