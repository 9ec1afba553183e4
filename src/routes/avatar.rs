use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::IntoResponse,
};

const FALLBACK_COLOR: &str = "6b7280";

/// Deterministic SVG avatar for a wallet-style address
///
/// The fill comes from characters 2..8 of the address (the part after a
/// `0x` prefix) and the first two characters are drawn on top.
pub async fn avatar(Path(address): Path<String>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/svg+xml"),
            (header::CACHE_CONTROL, "public, max-age=86400"),
        ],
        render_avatar(&address),
    )
}

fn render_avatar(address: &str) -> String {
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">"#,
            r##"<rect width="100" height="100" fill="#{}" />"##,
            r#"<text x="50" y="50" font-family="Arial" font-size="40" fill="white" text-anchor="middle" dy=".3em">{}</text>"#,
            "</svg>"
        ),
        avatar_color(address),
        escape_xml(&address.chars().take(2).collect::<String>())
    )
}

/// Six hex digits for the fill, or the fallback when the address is short
/// or not hex there
fn avatar_color(address: &str) -> &str {
    match address.get(2..8) {
        Some(color) if color.chars().all(|c| c.is_ascii_hexdigit()) => color,
        _ => FALLBACK_COLOR,
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
