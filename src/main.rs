//! CLI entry point for `mailembed`.

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};

use mailembed::config::Config;
use mailembed::embed::{CidGenerator, Classification, EmbeddingResolver};
use mailembed::fetch::BlobFetcher;
use mailembed::model::attachment::AttachmentMetadata;
use mailembed::parser::mime::load_message_file;

/// Tell inline (cid-referenced) email attachments apart from regular ones.
#[derive(Parser)]
#[command(name = "mailembed", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify the attachments of an .eml file against its HTML body
    Inspect {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Generate a content identifier for a new inline image
    GenerateCid {
        /// Sender address; its domain becomes the identifier's domain
        #[arg(short, long)]
        email: String,
        /// Unique input, e.g. "<timestamp>-<filename>"
        input: Option<String>,
        /// Hash the contents of this file instead of INPUT
        #[arg(short, long, conflicts_with = "input")]
        file: Option<PathBuf>,
    },
    /// Download a blob (exits with an error unless the server answers 200)
    Fetch {
        url: String,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = mailembed::config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Inspect { path, json } => cmd_inspect(&path, json, &config),
        Commands::GenerateCid { email, input, file } => {
            cmd_generate_cid(&email, input.as_deref(), file.as_deref(), &config)
        }
        Commands::Fetch { url, output } => cmd_fetch(&url, &output, &config),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = mailembed::config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "mailembed.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "mailembed", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

/// Load a message and classify each attachment.
fn cmd_inspect(path: &Path, json: bool, config: &Config) -> anyhow::Result<()> {
    let message = load_message_file(path)?;
    let resolver = EmbeddingResolver::from_config(config);

    let body = message.html.as_deref().unwrap_or("");
    let fragment = resolver.materialize(body);
    let classified: Vec<(&AttachmentMetadata, Classification)> = message
        .attachments
        .iter()
        .map(|att| (att, resolver.classify(att, &fragment)))
        .collect();

    let known: Vec<&str> = message.attachments.iter().map(|a| a.cid()).collect();
    let dangling: Vec<String> = resolver
        .matcher()
        .referenced_cids(&fragment)
        .into_iter()
        .filter(|cid| !known.contains(&cid.as_str()))
        .collect();

    if json {
        print_inspect_json(path, message.html.is_some(), &classified, &dangling)
    } else {
        print_inspect_table(path, message.html.is_some(), &classified, &dangling);
        Ok(())
    }
}

/// Print inspection results as a human-readable table.
fn print_inspect_table(
    path: &Path,
    has_html: bool,
    classified: &[(&AttachmentMetadata, Classification)],
    dangling: &[String],
) {
    use humansize::{format_size, BINARY};

    println!();
    println!("  {:<20} {}", "File", path.display());
    println!("  {:<20} {}", "HTML body", if has_html { "yes" } else { "no" });
    println!("  {:<20} {}", "Attachments", classified.len());
    println!();

    if !classified.is_empty() {
        println!(
            "  {:<4} {:<28} {:<22} {:>9} {:<30} {:<10}",
            "#", "Name", "MIME type", "Size", "Content-ID", "Class"
        );
        println!("  {}", "-".repeat(108));

        for (i, (att, class)) in classified.iter().enumerate() {
            let name: String = att.display_name().chars().take(27).collect();
            let mime: String = att.mime_type.chars().take(21).collect();
            let cid: String = att.cid().chars().take(29).collect();
            println!(
                "  {:<4} {:<28} {:<22} {:>9} {:<30} {:<10}",
                i + 1,
                name,
                mime,
                format_size(att.size, BINARY),
                cid,
                class_label(*class)
            );
        }
        println!();
    }

    if !dangling.is_empty() {
        println!("  References without a matching attachment:");
        for cid in dangling {
            println!("    {cid}");
        }
        println!();
    }
}

/// Print inspection results as JSON.
fn print_inspect_json(
    path: &Path,
    has_html: bool,
    classified: &[(&AttachmentMetadata, Classification)],
    dangling: &[String],
) -> anyhow::Result<()> {
    let items: Vec<serde_json::Value> = classified
        .iter()
        .map(|(att, class)| {
            serde_json::json!({
                "name": att.name(),
                "decoded_name": att.decoded_name,
                "mime_type": att.mime_type,
                "size": att.size,
                "cid": att.cid(),
                "classification": class,
                "listed": class.listed(),
            })
        })
        .collect();

    let output = serde_json::json!({
        "file": path.to_string_lossy(),
        "has_html": has_html,
        "attachments": items,
        "dangling_references": dangling,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn class_label(class: Classification) -> &'static str {
    match class {
        Classification::Embedded => "embedded",
        Classification::Referenced => "referenced",
        Classification::Regular => "regular",
    }
}

/// Print a fresh content identifier.
fn cmd_generate_cid(
    email: &str,
    input: Option<&str>,
    file: Option<&Path>,
    config: &Config,
) -> anyhow::Result<()> {
    let bytes = match (input, file) {
        (_, Some(path)) => std::fs::read(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?,
        (Some(text), None) => text.as_bytes().to_vec(),
        (None, None) => anyhow::bail!("Provide INPUT or --file"),
    };

    if !email.contains('@') {
        tracing::warn!(email, "Address has no domain part");
    }

    let generator = CidGenerator::from_config(&config.cid);
    println!("{}", generator.generate(&bytes, email));
    Ok(())
}

/// Fetch a blob and write it to disk.
fn cmd_fetch(url: &str, output: &Path, config: &Config) -> anyhow::Result<()> {
    let fetcher = BlobFetcher::from_config(&config.fetch)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let data = runtime.block_on(fetcher.fetch_as_blob(url))?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, &data)?;

    use humansize::{format_size, BINARY};
    println!(
        "  Saved {} to {}",
        format_size(data.len() as u64, BINARY),
        output.display()
    );
    Ok(())
}
