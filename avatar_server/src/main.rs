#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Delegate to the server framework entry point.
    avatar_server::run_with_config().await
}
