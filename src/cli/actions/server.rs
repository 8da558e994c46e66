use crate::cli::{actions::Action, globals::GlobalArgs};
use crate::sesio::new;
use anyhow::Result;

/// Handle the server action
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            store_url,
            config,
        } => {
            new(port, dsn, store_url, globals, config).await?;
        }
    }

    Ok(())
}
