use crate::helpers::spawn_app;

#[tokio::test]
async fn test_non_post_methods_are_rejected_with_403() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let url = format!("{}/submit", &app.address);

    let requests = vec![
        client.get(&url),
        client.put(&url),
        client.delete(&url),
        client.patch(&url),
    ];

    for request in requests {
        let response = request.send().await.expect("Failed to execute request");
        assert_eq!(403, response.status().as_u16());
        assert_eq!(
            "There was a problem with your submission, please try again.",
            response.text().await.unwrap()
        );
    }

    assert!(app.mailer.sent().is_empty());
}
