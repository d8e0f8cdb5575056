use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> eyre::Result<ExitCode> {
    deploy_hook::main().await
}
