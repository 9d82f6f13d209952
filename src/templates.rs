use actix_web::HttpResponse;
use askama::Template;

/// Renders an askama template into an HTML response, logging render
/// failures instead of bubbling template internals to the client.
pub fn render<T: Template>(template: T) -> HttpResponse {
    match template.render() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(err) => {
            log::error!("Failed to render template: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
