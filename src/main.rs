use website_mailer::configuration::get_configuration;
use website_mailer::startup::Application;
use website_mailer::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {

    // Initializing the subscriber
    let subscriber = get_subscriber("website_mailer".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    // Panic if we can't read the configuration file
    let configuration = get_configuration().expect("Failed to read configuration");

    // Bubble up the error if we failed to bind the address or to build
    // the SMTP transport, or else just .await on Server
    let application = Application::build(configuration).await?;
    application.run_until_stopped().await?;

    Ok(())
}
