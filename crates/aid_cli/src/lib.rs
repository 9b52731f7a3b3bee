mod error;
mod printer;
mod prompt;
mod render;

use std::{fmt, io::Write as _, process::ExitCode, time::Duration};

use aid_agent::{Conversation, YamlSnapshot};
use aid_config::{AppConfig, ProviderKind, SamplingConfig};
use aid_llm::{
    Provider, Sampling,
    provider::{
        anthropic::Anthropic,
        google::{Auth, Google},
        openai::Openai,
    },
};
use camino::Utf8PathBuf;
use clap::{ArgAction, Parser};
use error::Result;
use printer::Printer;
use render::Renderer;
use tokio_stream::StreamExt as _;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, level_filters::LevelFilter, trace, warn};

/// A sarcastic command-line assistant that uses tools.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The first message. Without one, you are asked what you want.
    prompt: Vec<String>,

    /// Load configuration from this file instead of the default location.
    #[arg(short, long, value_name = "PATH")]
    config: Option<Utf8PathBuf>,

    /// Increase verbosity of logging.
    ///
    /// Can be specified multiple times to increase verbosity.
    ///
    /// Defaults to printing "error" messages. For each increase in verbosity,
    /// the log level is set to "warn", "info", "debug", and "trace"
    /// respectively.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Suppress all logging, including errors.
    #[arg(short, long)]
    quiet: bool,

    /// Disable color in the output.
    #[arg(long = "no-color", alias = "no-colors")]
    no_color: bool,
}

impl fmt::Display for Cli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entry(&"config", &self.config)
            .entry(&"verbose", &self.verbose)
            .entry(&"quiet", &self.quiet)
            .finish()
    }
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    configure_logging(cli.verbose, cli.quiet);
    trace!(arguments = %cli, "Starting CLI run.");

    match run_inner(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let mut stderr = std::io::stderr();
            drop(writeln!(stderr, "{error}"));
            ExitCode::FAILURE
        }
    }
}

async fn run_inner(cli: Cli) -> Result<()> {
    let config = aid_config::load(cli.config.as_deref())?;
    let api_key = config.api_key()?;
    let model = config.model().to_owned();

    info!(provider = ?config.provider, model = %model, "Using model.");

    match config.provider {
        ProviderKind::Openai => {
            let provider = Openai::new(api_key, model).with_base_url(&config.openai.base_url);
            chat(provider, &config, &cli).await
        }
        ProviderKind::Google => {
            let auth = if config.google.bearer {
                Auth::Bearer(api_key)
            } else {
                Auth::ApiKey(api_key)
            };

            let provider = Google::new(auth, model)
                .with_base_url(&config.google.base_url)
                .with_sampling(sampling(&config.google.sampling));
            chat(provider, &config, &cli).await
        }
        ProviderKind::Anthropic => {
            let provider = Anthropic::new(api_key, model)
                .with_base_url(&config.anthropic.base_url)
                .with_sampling(sampling(&config.anthropic.sampling));
            chat(provider, &config, &cli).await
        }
    }
}

/// Talk to the user until they leave.
async fn chat<P: Provider + 'static>(provider: P, config: &AppConfig, cli: &Cli) -> Result<()> {
    let toolbox = aid_tools::toolbox(Duration::from_secs(config.shell_deadline_secs));

    let mut conversation = Conversation::new(provider, toolbox)
        .with_system_prompt(prompt::system_prompt)
        .with_update_capacity(config.update_capacity);

    if let Some(path) = &config.debug_snapshot {
        debug!(path = %path, "Writing step snapshots.");
        conversation = conversation.with_snapshot(YamlSnapshot::new(path.as_str()));
    }

    let color = !cli.no_color;
    let mut input = if cli.prompt.is_empty() {
        say("Yes?")?;
        ask().await?
    } else {
        let input = cli.prompt.join(" ");
        say(&input)?;
        Some(input)
    };

    while let Some(content) = input {
        turn(&conversation, content, color).await?;
        input = ask().await?;
    }

    let provider = conversation.provider();
    say(&format!(
        "{} thanks you for the ${:.2}. Bye!",
        provider.company(),
        conversation.total_cost()
    ))?;

    Ok(())
}

/// Run one turn, printing its updates. Ctrl-C cancels the turn.
async fn turn<P: Provider + 'static>(
    conversation: &Conversation<P>,
    content: String,
    color: bool,
) -> Result<()> {
    let cancel = CancellationToken::new();
    let mut updates = conversation.submit(content, cancel.clone());
    let mut renderer = Renderer::new(Printer::terminal(), color);

    loop {
        tokio::select! {
            update = updates.next() => match update {
                Some(update) => renderer.render(&update)?,
                None => break,
            },
            result = tokio::signal::ctrl_c(), if !cancel.is_cancelled() => {
                if let Err(error) = result {
                    warn!(%error, "Failed to listen for Ctrl-C.");
                }

                info!("Cancelling turn.");
                cancel.cancel();
            }
        }
    }

    renderer.finish()?.finish();

    let usage = conversation.usage();
    debug!(
        input_tokens = usage.input_tokens,
        output_tokens = usage.output_tokens,
        cost = conversation.total_cost(),
        "Turn over."
    );

    Ok(())
}

/// Read the next message. `None` once the user wants to leave.
async fn ask() -> Result<Option<String>> {
    let answer = tokio::task::spawn_blocking(|| inquire::Text::new("").prompt()).await?;

    match answer {
        Ok(input) if input.trim().is_empty() || input.trim() == "exit" => Ok(None),
        Ok(input) => Ok(Some(input)),
        Err(
            inquire::InquireError::OperationCanceled | inquire::InquireError::OperationInterrupted,
        ) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

fn say(text: &str) -> Result<()> {
    let mut printer = Printer::terminal();
    writeln!(printer, "{text}")?;
    printer.finish();

    Ok(())
}

fn sampling(config: &SamplingConfig) -> Sampling {
    Sampling {
        max_output_tokens: config.max_output_tokens,
        temperature: config.temperature,
        top_p: config.top_p,
    }
}

fn configure_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let level = log_level(verbose, quiet);
    let layer = fmt::layer()
        .with_ansi(true)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact();

    // Timestamps only matter when following debug output.
    let layer = if level < LevelFilter::DEBUG {
        layer.without_time().boxed()
    } else {
        layer.boxed()
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(EnvFilter::new(log_filter(level)))
        .init();
}

fn log_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::OFF;
    }

    match verbose {
        0 => LevelFilter::ERROR,
        1 => LevelFilter::WARN,
        2 => LevelFilter::INFO,
        3 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Only our own crates log, at `level`.
fn log_filter(level: LevelFilter) -> String {
    let mut filter = vec!["off".to_owned()];
    for krate in [
        "agent",
        "cli",
        "config",
        "conversation",
        "llm",
        "syncbuffer",
        "tool",
        "tools",
    ] {
        filter.push(format!("aid_{krate}={level}"));
    }

    filter.join(",")
}
