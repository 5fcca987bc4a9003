use clap::Parser;
use scholarstream::cli::{
    Args, build_config, handle_seed_admin, init_logging, load_jwt_secret, load_provider_secret,
    open_database,
};
use scholarstream::{init_cleanup, run_server};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let Some(jwt_secret) = load_jwt_secret(args.jwt_secret_file.as_deref()) else {
        std::process::exit(1);
    };

    let Some(provider_secret) = load_provider_secret(args.provider_secret_file.as_deref()) else {
        std::process::exit(1);
    };

    if jwt_secret == provider_secret {
        error!("JWT_SECRET and PROVIDER_SECRET must differ");
        std::process::exit(1);
    }

    let Some(db) = open_database(&args.database).await else {
        std::process::exit(1);
    };

    if let Some(email) = &args.seed_admin {
        handle_seed_admin(&db, email).await;
    }

    init_cleanup(&db).await;

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    let local_addr = listener.local_addr().unwrap();
    info!(address = %local_addr, "Listening");

    let config = build_config(db, jwt_secret, provider_secret);
    if let Err(e) = run_server(config, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
