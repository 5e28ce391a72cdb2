use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Builder;
use log::{info, LevelFilter};
use std::path::{Path, PathBuf};

use mediasteg::carrier::default_output_path;
use mediasteg::{CarrierKind, Codec, TerminatorPolicy};

/// Hide text in the least significant bits of images, WAV audio and Y4M video.
#[derive(Parser, Debug)]
#[command(name = "mediasteg", version, about, long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG still overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Hide a message in a carrier file
    Encode {
        /// Carrier to hide the message in
        #[arg(short, long)]
        input: PathBuf,

        /// Text to hide, one byte per character
        #[arg(short, long)]
        message: String,

        /// Where to write the result (defaults to encoded_<input name>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Carrier kind: image, audio or video (guessed from the extension otherwise)
        #[arg(short, long)]
        kind: Option<CarrierKind>,
    },

    /// Recover a hidden message
    Decode {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        kind: Option<CarrierKind>,

        /// Print whatever bits were read when no end marker is found
        #[arg(long)]
        lenient: bool,
    },

    /// Show how many characters a carrier can hold
    Capacity {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        kind: Option<CarrierKind>,
    },
}

fn init_logger(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    Builder::new().filter_level(level).parse_default_env().init();
}

fn resolve_kind(input: &Path, kind: Option<CarrierKind>) -> Result<CarrierKind> {
    match kind {
        Some(kind) if kind.accepts(input) => Ok(kind),
        Some(kind) => bail!(
            "invalid file type for {}: expected one of {}",
            kind,
            kind.extensions().join(", ")
        ),
        None => CarrierKind::from_path(input).with_context(|| {
            format!(
                "cannot tell the carrier kind of {}, pass --kind",
                input.display()
            )
        }),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match cli.command {
        Command::Encode {
            input,
            message,
            output,
            kind,
        } => {
            let kind = resolve_kind(&input, kind)?;
            let output = output.unwrap_or_else(|| default_output_path(&input));
            let written = kind
                .codec(TerminatorPolicy::Strict)
                .encode(&input, &message, &output)
                .with_context(|| format!("{} encoding failed", kind))?;

            info!("encoded {} into {}", input.display(), written.display());
            println!("{}", written.display());
        }
        Command::Decode {
            input,
            kind,
            lenient,
        } => {
            let kind = resolve_kind(&input, kind)?;
            let policy = if lenient {
                TerminatorPolicy::Lenient
            } else {
                TerminatorPolicy::Strict
            };
            let message = kind
                .codec(policy)
                .decode(&input)
                .with_context(|| format!("{} decoding failed", kind))?;

            println!("{}", message);
        }
        Command::Capacity { input, kind } => {
            let kind = resolve_kind(&input, kind)?;
            let capacity = kind
                .codec(TerminatorPolicy::Strict)
                .capacity(&input)
                .with_context(|| format!("could not inspect {}", input.display()))?;

            println!(
                "{} positions, up to {} characters",
                capacity.positions,
                capacity.max_message_len()
            );
        }
    }

    Ok(())
}
