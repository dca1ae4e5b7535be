// src/main.rs

use rvc_bootstrap::{cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("rvc-bootstrap error: {err}");
        std::process::exit(1);
    }
}

async fn run_main() -> rvc_bootstrap::errors::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
