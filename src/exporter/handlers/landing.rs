use axum::{extract::Extension, response::Html};

/// Landing page rendered once at startup, pointing at the telemetry path.
#[derive(Clone)]
pub struct LandingPage(String);

impl LandingPage {
    #[must_use]
    pub fn render(telemetry_path: &str) -> Self {
        Self(format!(
            "<html>\n<head><title>Docker exporter</title></head>\n<body>\n\
             <h1>Docker exporter</h1>\n\
             <p><a href=\"{telemetry_path}\">Metrics</a></p>\n\
             </body>\n</html>\n"
        ))
    }
}

pub async fn landing(Extension(page): Extension<LandingPage>) -> Html<String> {
    Html(page.0.clone())
}
