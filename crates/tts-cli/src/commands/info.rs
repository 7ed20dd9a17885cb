//! Metadata commands: `info`, `health`, `models`.

use anyhow::Result;

use super::client::ApiClient;

/// Server metadata endpoint to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Root,
    Health,
    Models,
}

impl Endpoint {
    fn path(self) -> &'static str {
        match self {
            Self::Root => "/",
            Self::Health => "/health",
            Self::Models => "/models",
        }
    }
}

/// Fetch the endpoint and return it pretty-printed.
pub async fn fetch(client: &ApiClient, endpoint: Endpoint) -> Result<String> {
    let value = client.get_json(endpoint.path()).await?;
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Run a metadata command.
pub async fn run(client: &ApiClient, endpoint: Endpoint) -> Result<()> {
    println!("{}", fetch(client, endpoint).await?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_server;

    #[tokio::test]
    async fn test_fetch_health_and_models() {
        let server = test_server::spawn(None).await;
        let client = ApiClient::new(&server.url);

        let health: serde_json::Value =
            serde_json::from_str(&fetch(&client, Endpoint::Health).await.unwrap()).unwrap();
        assert_eq!(health["status"], "healthy");

        let models = fetch(&client, Endpoint::Models).await.unwrap();
        assert!(models.contains("multilingual"));

        let root = fetch(&client, Endpoint::Root).await.unwrap();
        assert!(root.contains("Chatterbox TTS API"));
    }
}
