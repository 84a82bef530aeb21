//! Inspect the preload hints a render pass would emit for an asset snapshot.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use h2push::{
  AssetSnapshot, HeaderList, PushConfig, PushEmitter, PushHooks, PushSettings, collect,
  format_link_header, format_link_tag, logging,
};

#[derive(Debug, Parser)]
#[command(name = "h2push", version, about = "Preload hints for page scripts and styles")]
struct Cli {
  /// Log skipped assets and emission decisions to stderr.
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
  /// Print one `Link` header line per eligible asset.
  Headers(Inputs),
  /// Print one `<link rel='preload'>` tag per eligible asset.
  Tags(Inputs),
  /// Run a full render pass: headers on stdout first, then the head markup.
  Render {
    #[command(flatten)]
    inputs: Inputs,
    /// Captured head markup to emit after the hints.
    #[arg(long)]
    head: Option<PathBuf>,
    /// Pretend response bytes were already committed.
    #[arg(long)]
    headers_sent: bool,
  },
}

#[derive(Debug, Args)]
struct Inputs {
  /// Asset snapshot JSON describing the enqueued styles and scripts.
  #[arg(long)]
  assets: PathBuf,
  /// Configuration file; `h2push.config.json` in the current directory when omitted.
  #[arg(long)]
  config: Option<PathBuf>,
}

impl Inputs {
  fn load(&self) -> Result<(PushSettings, AssetSnapshot)> {
    let config = match &self.config {
      Some(path) => PushConfig::load_from_path(path)?,
      None => PushConfig::discover(Path::new(".")),
    };
    let settings = config.settings().context("invalid push configuration")?;
    let snapshot = AssetSnapshot::load_from_path(&self.assets)?;
    Ok((settings, snapshot))
  }
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  logging::init_logging(cli.verbose);

  let stdout = io::stdout();
  let mut out = stdout.lock();

  match cli.command {
    Command::Headers(inputs) => {
      let (settings, snapshot) = inputs.load()?;
      for resource in collect(&snapshot, &settings.normalizer(&settings.allow_list)) {
        writeln!(out, "{}", format_link_header(&resource))?;
      }
    }
    Command::Tags(inputs) => {
      let (settings, snapshot) = inputs.load()?;
      for resource in collect(&snapshot, &settings.normalizer(&settings.allow_list)) {
        write!(out, "{}", format_link_tag(&resource))?;
      }
    }
    Command::Render {
      inputs,
      head,
      headers_sent,
    } => {
      let (settings, snapshot) = inputs.load()?;
      let head = match head {
        Some(path) => fs::read_to_string(&path)
          .with_context(|| format!("failed to read {}", path.display()))?,
        None => String::new(),
      };

      let mut transport = if headers_sent {
        HeaderList::committed()
      } else {
        HeaderList::default()
      };

      let mut markup = Vec::new();
      let mut emitter = PushEmitter::new(&settings, PushHooks::default());
      emitter.start_buffering(&mut markup);
      emitter.capture(&head);
      emitter.collect(&snapshot, &transport);
      let report = emitter.emit(&mut transport);
      drop(emitter);

      tracing::info!(headers = report.headers, tags = report.tags, "render pass finished");
      for line in transport.lines() {
        writeln!(out, "{line}")?;
      }
      if !transport.lines().is_empty() {
        writeln!(out)?;
      }
      out.write_all(&markup)?;
    }
  }

  out.flush()?;
  Ok(())
}
