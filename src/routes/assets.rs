use actix_web::HttpResponse;

pub async fn form_script() -> HttpResponse {
    // include_str!() operates at compile time, i.e. the read file content is
    // stored as part of the application's binary and the pointer to its
    // content remains valid indefinitely as a 'static string slice
    HttpResponse::Ok()
        .content_type("application/javascript; charset=utf-8")
        .body(include_str!("../../static/ajax-form.js"))
}
