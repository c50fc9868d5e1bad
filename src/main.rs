use anyhow::Result;
use tracing::info;

use cesso_uci::UciEngine;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    info!("cesso starting");
    UciEngine::new().run()?;
    Ok(())
}
