use crate::helpers::spawn_app;

#[tokio::test]
async fn test_health_check() {

    //No .await and no .expect required here
    let address = spawn_app().await.address;

    let client = reqwest::Client::new();
    let response = client.get(&format!("{}/health_check", &address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert_eq!(Some(0), response.content_length());
}

#[tokio::test]
async fn test_form_script_is_served() {
    let address = spawn_app().await.address;

    let client = reqwest::Client::new();
    let response = client.get(&format!("{}/assets/ajax-form.js", &address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert_eq!(
        response.headers()["content-type"],
        "application/javascript; charset=utf-8"
    );
    let body = response.text().await.expect("Failed to read body");
    assert!(body.contains("Sending…"));
}
