#[tokio::main]
async fn main() {
    if let Err(e) = slidegist_backend::run().await {
        eprintln!("slidegist failed: {}", e);
        std::process::exit(1);
    }
}
