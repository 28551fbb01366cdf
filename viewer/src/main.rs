use overlay_server::telemetry::{get_subscriber, init_subscriber};
use viewer::run;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Init logger
    let subscriber = get_subscriber("viewer", "info", std::io::stdout);
    init_subscriber(subscriber);

    run().await?;

    Ok(())
}
