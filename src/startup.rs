use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use secrecy::ExposeSecret;
use tracing_actix_web::TracingLogger;

use crate::configuration::{MailSettings, Settings};
use crate::mail::{MailTransport, SmtpMailTransport};
use crate::routes::{form_script, health_check, reject_non_post, submit_form};

/// A built, not-yet-running application, holding the bound port so tests
/// can bind to port 0 and discover the one the OS picked.
pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(configuration: Settings) -> anyhow::Result<Self> {
        let mailer: Arc<dyn MailTransport> = Arc::new(SmtpMailTransport::new(
            configuration.mail.smtp_url.expose_secret(),
        )?);
        Self::build_with_transport(configuration, mailer)
    }

    /// Same as [`Application::build`], with the mail transport injected.
    /// The test suite uses this to swap in a recording double.
    pub fn build_with_transport(
        configuration: Settings,
        mailer: Arc<dyn MailTransport>,
    ) -> anyhow::Result<Self> {
        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();
        let server = run(listener, mailer, configuration.mail)?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(
    listener: TcpListener,
    mailer: Arc<dyn MailTransport>,
    mail_settings: MailSettings,
) -> Result<Server, std::io::Error> {

    // using web::Data to wrap the shared state in a smart pointer(Arc)
    // as App requires the app_data to implement Clone trait for "T"
    // and in Arc<T> T is clonable, no matter what T is
    let mailer = web::Data::from(mailer);
    let mail_settings = web::Data::new(mail_settings);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/assets/ajax-form.js", web::get().to(form_script))
            .service(
                web::resource("/submit")
                    .route(web::post().to(submit_form))
                    // anything other than POST gets the 403 retry message
                    .route(web::route().to(reject_non_post)),
            )
            .app_data(mailer.clone())
            .app_data(mail_settings.clone())
    })
        .listen(listener)?
        .run();
    // No .await here
    Ok(server)
}
