use crate::error::DocuploadError;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

const MAX_CONNECTIONS: u32 = 10;

pub async fn create_pool(url: &str) -> Result<PgPool, DocuploadError> {
    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(url)
        .await?;
    Ok(pool)
}

pub async fn migrate(pool: &PgPool) -> Result<(), DocuploadError> {
    sqlx::migrate!().run(pool).await?;
    info!("Migrations applied");
    Ok(())
}
