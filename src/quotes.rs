use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub text: String,
    pub author: String,
}

/// Seam for the third-party quote upstream.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn random(&self) -> anyhow::Result<Quote>;
}

/// ZenQuotes wire format: an array with one `{q, a}` object.
#[derive(Debug, Deserialize)]
struct ZenQuoteItem {
    q: String,
    a: String,
}

pub struct ZenQuotes {
    http: reqwest::Client,
    url: String,
}

impl ZenQuotes {
    pub fn new(url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl QuoteSource for ZenQuotes {
    async fn random(&self) -> anyhow::Result<Quote> {
        let response = self.http.get(&self.url).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("quote upstream returned {}", response.status());
        }
        let items: Vec<ZenQuoteItem> = response.json().await?;
        let item = items
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("quote upstream returned an empty payload"))?;
        Ok(Quote {
            text: item.q,
            author: item.a,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zen_quote_payload_deserializes() {
        let payload = r#"[{"q":"Fall seven times and stand up eight.","a":"Japanese Proverb","h":"<blockquote>...</blockquote>"}]"#;
        let items: Vec<ZenQuoteItem> = serde_json::from_str(payload).unwrap();
        assert_eq!(items[0].q, "Fall seven times and stand up eight.");
        assert_eq!(items[0].a, "Japanese Proverb");
    }
}
