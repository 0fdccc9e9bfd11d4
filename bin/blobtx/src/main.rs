//! The binary for building and sending blob transactions

use blobtx_cli::cli::Cli;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let _guards = blobtx_tracing::init_logging()?;

    Cli::run().await?;

    Ok(())
}
