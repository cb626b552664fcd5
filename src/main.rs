mod acquire;
mod cli;
mod colorizer;
mod error;
mod logging;
mod model;
mod orchestrator;
mod preview;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;
mod workflow;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let one_shot = args.input.is_some();

    match cli::run(args).await {
        Ok(()) => {
            // Exit explicitly so pooled HTTP connections don't hold the process open.
            if one_shot {
                std::process::exit(0);
            }
            Ok(())
        }
        Err(e) => Err(e),
    }
}
