use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use crate::{
    config::{Config, StartArgs},
    describe::DescriptionGenerators,
    document::DocumentDb,
    file::{FileTypeInfo, FileValidator},
    state::Documents,
};

pub mod config;
pub mod db;
pub mod describe;
pub mod document;
pub mod error;
pub mod file;
pub mod pagination;
pub mod router;
pub mod state;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let StartArgs {
        config_path,
        address: host,
        port,
        log_level: level,
    } = StartArgs::parse();

    tracing_subscriber::fmt().with_max_level(level).init();

    let config = Config::read(&config_path).expect("invalid config file");

    let Some(db_url) = config.database_url() else {
        error!("No database url in {config_path} and DATABASE_URL not set");
        std::process::exit(1);
    };

    let db_pool = db::create_pool(&db_url)
        .await
        .expect("error while connecting to db");

    db::migrate(&db_pool).await.expect("error in migrations");

    let generators = Arc::new(DescriptionGenerators::new(config.text_description_length));
    let document_db = DocumentDb::new(db_pool, generators);

    let state = Documents::new(
        document_db,
        FileValidator::from(&config.upload),
        FileTypeInfo::default(),
    );

    let addr = format!("{host}:{port}");

    info!("Now listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("error while starting TCP listener");

    axum::serve(listener, router::router(state))
        .await
        .expect("error while starting server");
}
