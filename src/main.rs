use tracing::error;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    if let Err(error) = paws::observability::init_observability("paws") {
        eprintln!("Failed to initialize tracing: {}", error);
        std::process::exit(1);
    }

    if let Err(error) = paws::run().await {
        error!("paws exited with error: {:#}", error);
        std::process::exit(1);
    }
}
