use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    aid_cli::run().await
}
