//! Deck-related AnkiConnect actions.

use serde::Serialize;

use crate::client::AnkiClient;
use crate::error::Result;

/// Provides access to deck-related AnkiConnect operations.
///
/// Obtained via [`AnkiClient::decks()`].
#[derive(Debug)]
pub struct DeckActions<'a> {
    pub(crate) client: &'a AnkiClient,
}

#[derive(Serialize)]
struct CreateDeckParams<'a> {
    deck: &'a str,
}

impl<'a> DeckActions<'a> {
    /// Get all deck names.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use ankio::AnkiClient;
    /// # async fn example() -> ankio::Result<()> {
    /// let client = AnkiClient::new();
    /// for name in client.decks().names().await? {
    ///     println!("{}", name);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn names(&self) -> Result<Vec<String>> {
        self.client.invoke_without_params("deckNames").await
    }

    /// Create a new deck.
    ///
    /// Returns the deck ID. Nested decks are created with `::` separators
    /// (e.g. `"Japanese::Vocabulary"`). Creating a deck that already exists
    /// is not an error.
    pub async fn create(&self, name: &str) -> Result<i64> {
        self.client
            .invoke("createDeck", CreateDeckParams { deck: name })
            .await
    }
}
