mod config;
mod remote;
mod run;

#[tokio::main]
async fn main() {
    if let Err(error) = run::run().await {
        eprintln!("framepay-server failed: {error}");
        std::process::exit(1);
    }
}
