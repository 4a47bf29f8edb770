// src/main.rs

use tagdriver::{cli, exit_code, logging, run};

/// Exit code for configuration, filter and I/O errors.
const SETUP_ERROR_EXIT_CODE: i32 = 255;

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(failed) => std::process::exit(exit_code(failed)),
        Err(err) => {
            eprintln!("tagdriver error: {err:?}");
            std::process::exit(SETUP_ERROR_EXIT_CODE);
        }
    }
}

async fn run_main() -> anyhow::Result<usize> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
