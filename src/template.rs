//! Template rendering contract.
//!
//! Routes that produce a model and a view name instead of a body are wrapped
//! with a [`TemplateEngine`]; the engine output becomes the body verbatim.
//! No engine ships with the crate.

use serde::Serialize;
use serde_json::Value;

/// A model plus the name of the view that should render it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelAndView {
    model: Value,
    view_name: String,
}

impl ModelAndView {
    pub fn new(model: impl Into<Value>, view_name: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            view_name: view_name.into(),
        }
    }

    /// Build from any serializable model. Fails if the model cannot be
    /// represented as JSON.
    pub fn from_serialize<M: Serialize>(
        model: &M,
        view_name: impl Into<String>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::to_value(model)?, view_name))
    }

    pub fn model(&self) -> &Value {
        &self.model
    }

    pub fn view_name(&self) -> &str {
        &self.view_name
    }
}

/// Renders a [`ModelAndView`] into a response body.
pub trait TemplateEngine: Send + Sync {
    fn render(&self, model_and_view: &ModelAndView) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FromView;

    impl TemplateEngine for FromView {
        fn render(&self, mv: &ModelAndView) -> String {
            let model = match mv.model() {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!("{} from {}", model, mv.view_name())
        }
    }

    #[derive(Serialize)]
    struct User {
        name: &'static str,
    }

    #[test]
    fn test_render_string_model() {
        let mv = ModelAndView::new("Hello", "my view");
        assert_eq!(FromView.render(&mv), "Hello from my view");
    }

    #[test]
    fn test_serializable_model() {
        let mv = ModelAndView::from_serialize(&User { name: "dude" }, "user").unwrap();
        assert_eq!(mv.model()["name"], "dude");
        assert_eq!(FromView.render(&mv), r#"{"name":"dude"} from user"#);
    }
}
