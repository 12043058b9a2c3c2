use serde::Serialize;
use tera::{Context, Error as TeraError, Tera};

/// Template wrapping search context around the user's question
pub const WEB_SEARCH_TEMPLATE: &str = include_str!("prompts/web_search.md");

/// Render an inline template. Values are inserted verbatim: no autoescaping.
pub fn load_prompt<T: Serialize>(template: &str, context_data: &T) -> Result<String, TeraError> {
    let mut tera = Tera::default();
    tera.add_raw_template("inline_template", template)?;
    let context = Context::from_serialize(context_data)?;
    let rendered = tera.render("inline_template", &context)?;
    Ok(rendered)
}
