use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use website_mailer::configuration::{get_configuration, Settings};
use website_mailer::mail::{MailTransport, OutgoingEmail};
use website_mailer::startup::Application;
use website_mailer::telemetry::{get_subscriber, init_subscriber};

// Ensure that the `tracing` stack is only initialized once rather than for each test case
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_lvl = "info".into();
    let subscriber_name = "test".into();

    // Cannot assign the output of `get_subscriber` to a variable based on the value of `TEST_LOG`
    // because the sink is part of the type returned by `get_subscriber`, therefore they are not the
    // same type. To work around it, but this is the most straight-forward way of moving forward.
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_lvl, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_lvl, std::io::sink);
        init_subscriber(subscriber);
    }
});

/// A mail transport double that records every message instead of delivering
/// it, and can be flipped into a failing mode.
#[derive(Default)]
pub struct RecordingMailTransport {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail_sends: AtomicBool,
}

impl RecordingMailTransport {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_sends(&self) {
        self.fail_sends.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl MailTransport for RecordingMailTransport {
    async fn send(&self, email: &OutgoingEmail) -> anyhow::Result<bool> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(true)
    }
}

pub struct TestApp {
    pub address: String,
    pub mailer: Arc<RecordingMailTransport>,
    pub configuration: Settings,
}

/// Spin up the application in the background against a recording mail
/// transport. Return the address of the application i.e localhost:XXXX
pub async fn spawn_app() -> TestApp {

    // The first time `initialize` is invoked the code in `TRACING` is executed.
    // Next invocations get skipped
    Lazy::force(&TRACING);

    // Bind to a random port provided by the OS to keep tests isolated
    let configuration = {
        let mut c = get_configuration().expect("Failed to get Configuration in spawn_app");
        c.application.port = 0;
        c
    };

    let mailer = Arc::new(RecordingMailTransport::default());

    let application = Application::build_with_transport(
        configuration.clone(), // utilizing .clone() to avoid moving the configuration
        mailer.clone(),
    )
    .expect("Failed to build server");

    let address = format!("http://127.0.0.1:{}", application.port());

    // Here we dont .await the call, instead run the process in the background using tokio::spawn
    let _ = tokio::spawn(application.run_until_stopped());

    TestApp {
        address,
        mailer,
        configuration,
    }
}

impl TestApp {
    /// POST an already urlencoded body to the submit endpoint.
    pub async fn post_form(&self, body: String) -> reqwest::Response {
        reqwest::Client::new()
            .post(&format!("{}/submit", &self.address))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// POST urlencoded field pairs (lets reqwest handle the escaping).
    pub async fn post_form_fields(&self, fields: &[(&str, &str)]) -> reqwest::Response {
        reqwest::Client::new()
            .post(&format!("{}/submit", &self.address))
            .form(fields)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_multipart(&self, form: reqwest::multipart::Form) -> reqwest::Response {
        reqwest::Client::new()
            .post(&format!("{}/submit", &self.address))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// A complete, valid job application form, parameterized over the CV.
pub fn job_application_form(cv_filename: &str, cv_bytes: Vec<u8>) -> reqwest::multipart::Form {
    reqwest::multipart::Form::new()
        .text("name", "Ana")
        .text("email", "ana@example.com")
        .text("phone", "+1 555 0100")
        .text("cover_letter", "Dear team, I would like to apply.")
        .text("position", "Engineer")
        .part(
            "cv",
            reqwest::multipart::Part::bytes(cv_bytes).file_name(cv_filename.to_string()),
        )
}

/// A small but genuine-looking PDF payload.
pub fn pdf_bytes() -> Vec<u8> {
    b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\ntrailer\n<< /Root 1 0 R >>\n%%EOF\n".to_vec()
}
