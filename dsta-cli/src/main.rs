use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    dsta_cli::run().await
}
