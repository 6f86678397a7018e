use tracing::info;

use crate::App;

pub async fn run(app: App) -> anyhow::Result<()> {
    let count = app.store.purge_expired().await?;
    info!("deleted {count} expired pastes");
    Ok(())
}
