use clap::Parser;
use lodgekey::cli::{Args, build_config, init_logging, load_secrets, open_database};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let Some((access_secret, refresh_secret)) = load_secrets(&args) else {
        std::process::exit(1);
    };

    let Some(db) = open_database(&args.database).await else {
        std::process::exit(1);
    };

    lodgekey::init_cleanup(&db).await;

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    let local_addr = listener.local_addr().expect("listener has a local address");

    let config = build_config(args, db, access_secret, refresh_secret);

    info!(address = %local_addr, "Listening");

    if let Err(e) = lodgekey::run_server(config, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
