#[tokio::main]
async fn main() {
    if let Err(error) = demystifier_api::run().await {
        eprintln!("demystifier-api failed: {error}");
        std::process::exit(1);
    }
}
