//! Model (note type) types.

use serde::{Deserialize, Serialize};

/// A card template as returned by `modelTemplates`.
///
/// The template name is the map key in the response, not a field here.
#[derive(Debug, Clone, Deserialize)]
pub struct CardTemplate {
    /// Front template HTML.
    #[serde(rename = "Front")]
    pub front: String,
    /// Back template HTML.
    #[serde(rename = "Back")]
    pub back: String,
}

/// A card template for creating a model (includes the name).
#[derive(Debug, Clone, Serialize)]
pub struct CreateCardTemplate {
    /// Template name.
    #[serde(rename = "Name")]
    pub name: String,
    /// Front template HTML.
    #[serde(rename = "Front")]
    pub front: String,
    /// Back template HTML.
    #[serde(rename = "Back")]
    pub back: String,
}

/// Parameters for creating a new model.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateModelParams {
    /// Model name.
    pub model_name: String,
    /// Field names for the model, in order.
    pub in_order_fields: Vec<String>,
    /// CSS styling for the model.
    pub css: String,
    /// Card templates.
    pub card_templates: Vec<CreateCardTemplate>,
}

impl CreateModelParams {
    /// Create new model parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            model_name: name.into(),
            in_order_fields: Vec::new(),
            css: String::new(),
            card_templates: Vec::new(),
        }
    }

    /// Add a field to the model.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.in_order_fields.push(name.into());
        self
    }

    /// Set the CSS styling.
    pub fn css(mut self, css: impl Into<String>) -> Self {
        self.css = css.into();
        self
    }

    /// Add a card template.
    pub fn template(
        mut self,
        name: impl Into<String>,
        front: impl Into<String>,
        back: impl Into<String>,
    ) -> Self {
        self.card_templates.push(CreateCardTemplate {
            name: name.into(),
            front: front.into(),
            back: back.into(),
        });
        self
    }
}

/// Model styling information.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelStyling {
    /// CSS styling.
    pub css: String,
}
