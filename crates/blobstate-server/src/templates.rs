use handlebars::Handlebars;
use serde::Serialize;

use crate::error::{ServerError, ServerResult};

const INDEX_TEMPLATE: &str = "index";

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
    <head>
        <meta charset="UTF-8">
        <title>{{title}}</title>
    </head>
    <body>
        <h1 style="color: {{color}}">Hello World, again!</h1>
        <p>Version: {{version}}</p>
    </body>
</html>
"#;

#[derive(Debug, Serialize)]
struct IndexData<'a> {
    title: &'a str,
    version: &'a str,
    color: &'a str,
}

/// Compiled page templates, built once per router.
pub struct Templates {
    registry: Handlebars<'static>,
}

impl Templates {
    pub fn new() -> ServerResult<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry
            .register_template_string(INDEX_TEMPLATE, INDEX_HTML)
            .map_err(|e| ServerError::Template(e.to_string()))?;
        Ok(Self { registry })
    }

    /// Render the index page with the heading in `color`.
    pub fn index(&self, color: &str) -> ServerResult<String> {
        let data = IndexData {
            title: "blobstate",
            version: env!("CARGO_PKG_VERSION"),
            color,
        };
        self.registry
            .render(INDEX_TEMPLATE, &data)
            .map_err(|e| ServerError::Template(e.to_string()))
    }
}
