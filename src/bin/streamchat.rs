use anyhow::Result;
use streamchat::app::App;
use streamchat::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    streamchat::logging::init()?;

    let config = Config::load()?;
    config.validate()?;
    tracing::info!(url = %config.chat_url(), "starting chat client");

    let mut app = App::new(config)?;
    app.run().await?;

    Ok(())
}
