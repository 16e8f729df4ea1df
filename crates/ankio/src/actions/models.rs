//! Model (note type) AnkiConnect actions.

use std::collections::HashMap;

use serde::Serialize;

use crate::client::AnkiClient;
use crate::error::Result;
use crate::types::{CardTemplate, CreateModelParams, ModelStyling};

/// Provides access to model-related AnkiConnect operations.
///
/// Obtained via [`AnkiClient::models()`].
#[derive(Debug)]
pub struct ModelActions<'a> {
    pub(crate) client: &'a AnkiClient,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ModelNameParams<'a> {
    model_name: &'a str,
}

impl<'a> ModelActions<'a> {
    /// Get all model (note type) names.
    pub async fn names(&self) -> Result<Vec<String>> {
        self.client.invoke_without_params("modelNames").await
    }

    /// Get the field names for a model, in template order.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use ankio::AnkiClient;
    /// # async fn example() -> ankio::Result<()> {
    /// let client = AnkiClient::new();
    /// let fields = client.models().field_names("Basic").await?;
    /// assert!(fields.contains(&"Front".to_string()));
    /// # Ok(())
    /// # }
    /// ```
    pub async fn field_names(&self, model_name: &str) -> Result<Vec<String>> {
        self.client
            .invoke("modelFieldNames", ModelNameParams { model_name })
            .await
    }

    /// Get the card templates for a model, keyed by template name.
    pub async fn templates(&self, model_name: &str) -> Result<HashMap<String, CardTemplate>> {
        self.client
            .invoke("modelTemplates", ModelNameParams { model_name })
            .await
    }

    /// Get the CSS styling for a model.
    pub async fn styling(&self, model_name: &str) -> Result<ModelStyling> {
        self.client
            .invoke("modelStyling", ModelNameParams { model_name })
            .await
    }

    /// Create a new model.
    ///
    /// Returns the raw model definition created by Anki.
    pub async fn create(&self, params: CreateModelParams) -> Result<serde_json::Value> {
        self.client.invoke("createModel", params).await
    }
}
