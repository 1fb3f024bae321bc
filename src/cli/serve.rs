use anyhow::Result;

use crate::config::Settings;
use crate::server;

pub async fn run_serve(bind: Option<String>) -> Result<()> {
    let mut settings = Settings::from_env();
    if let Some(bind) = bind {
        settings.bind = bind;
    }
    server::serve(settings).await
}
