use anyhow::Result;
use tracing::{error, info};

use xbot::{logger, Launcher};

#[tokio::main]
async fn main() -> Result<()> {
    logger::init();

    info!("XBot v{}", xbot::VERSION);
    let launcher = match Launcher::from_env() {
        Ok(launcher) => launcher,
        Err(e) => {
            error!("❌ {:#}", e);
            error!("Create a .env file with ASI_ONE_API_KEY and AGENTVERSE_API_KEY, then restart.");
            return Err(e);
        }
    };

    launcher.launch().await
}
