use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use clinidoc_core::config::{resolve_template_dir, strict_from_env_value};
use clinidoc_core::constants::{DEFAULT_CLINIC_NAME, DEFAULT_NOT_RECORDED_TEXT};
use clinidoc_core::{DocumentAssembler, RenderConfig, RenderRequest, RenderRequestWire, Section};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "clinidoc")]
#[command(about = "Render veterinary medical records into printable HTML")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a medical record (JSON or YAML) to HTML
    Render {
        /// Request file; `.yaml`/`.yml` is read as YAML, anything else as JSON. `-` reads JSON
        /// from stdin
        input: PathBuf,
        /// Write the HTML here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// List the placeholders used by each template
    Tokens {
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Print a fully populated example request as JSON
    Sample,
}

#[derive(Args, Clone, Debug)]
struct EngineArgs {
    /// Directory with template overrides
    #[arg(long, env = "CLINIDOC_TEMPLATE_DIR")]
    template_dir: Option<String>,
    /// Clinic name shown in the document header
    #[arg(long, env = "CLINIDOC_CLINIC_NAME", default_value = DEFAULT_CLINIC_NAME)]
    clinic_name: String,
    /// Text shown for fields without a value
    #[arg(long, env = "CLINIDOC_NOT_RECORDED", default_value = DEFAULT_NOT_RECORDED_TEXT)]
    not_recorded: String,
    /// Leave markers for unresolved placeholders instead of failing
    #[arg(long)]
    lenient: bool,
}

impl EngineArgs {
    fn config(&self) -> anyhow::Result<RenderConfig> {
        let strict = if self.lenient {
            false
        } else {
            strict_from_env_value(std::env::var("CLINIDOC_STRICT").ok())?
        };
        let template_dir = resolve_template_dir(self.template_dir.clone())?;
        Ok(RenderConfig::new(
            &self.clinic_name,
            &self.not_recorded,
            template_dir,
            strict,
        )?)
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // HTML may go to stdout, so logs always go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinidoc=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Render {
            input,
            output,
            engine,
        }) => {
            let assembler = DocumentAssembler::from_config(engine.config()?)?;
            let request = read_request(&input)?;
            let html = assembler
                .render(&request)
                .with_context(|| format!("failed to render {}", input.display()))?;
            write_output(output.as_deref(), &html)?;
        }
        Some(Commands::Tokens { engine }) => {
            let assembler = DocumentAssembler::from_config(engine.config()?)?;
            print!("{}", token_listing(&assembler));
        }
        Some(Commands::Sample) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&RenderRequestWire::sample())?
            );
        }
        None => {
            println!("Use 'clinidoc --help' for commands");
        }
    }

    Ok(())
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    )
}

fn read_request(input: &Path) -> anyhow::Result<RenderRequest> {
    if input == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read request from stdin")?;
        return Ok(RenderRequest::from_json(&buffer)?);
    }

    let contents = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let request = if is_yaml(input) {
        RenderRequest::from_yaml(&contents)?
    } else {
        RenderRequest::from_json(&contents)?
    };
    Ok(request)
}

fn write_output(output: Option<&Path>, html: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, html)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!("wrote {} ({} bytes)", path.display(), html.len());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(html.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn token_listing(assembler: &DocumentAssembler) -> String {
    let store = assembler.store();
    let mut listing = String::new();
    let templates = std::iter::once(store.document())
        .chain(Section::ALL.into_iter().map(|section| store.section(section)));
    for template in templates {
        let tokens: Vec<&str> = template.tokens().iter().map(String::as_str).collect();
        listing.push_str(&format!("{}: {}\n", template.name(), tokens.join(", ")));
    }
    listing
}
