//! Interior Studio Backend - binary entry point
//! Delegates to the library for all app logic.

#[tokio::main]
async fn main() {
    if let Err(e) = interior_studio_backend::run().await {
        eprintln!("interior-studio-backend: {}", e);
        std::process::exit(1);
    }
}
