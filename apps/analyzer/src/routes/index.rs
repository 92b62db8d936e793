use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// GET /
/// Single-page form driving the upload, analysis and feedback endpoints.
pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}
