use anyhow::{Context, Result};
use async_trait::async_trait;
use civic_etl::fetch::{HttpClient, fetch_json};
use civic_etl::services::soql::{OpenDataApi, SoqlQuery};
use reqwest::Url;
use serde_json::Value;
use tracing::debug;

/// [`OpenDataApi`] over a Socrata resource endpoint.
pub struct SocrataClient<C> {
    client: C,
    endpoint: Url,
}

impl<C: HttpClient> SocrataClient<C> {
    pub fn new(client: C, endpoint: &str) -> Result<Self> {
        let endpoint = endpoint
            .parse()
            .with_context(|| format!("invalid endpoint {endpoint}"))?;
        Ok(Self { client, endpoint })
    }

    fn url_for(&self, query: &SoqlQuery) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().extend_pairs(query.params());
        url
    }
}

#[async_trait]
impl<C: HttpClient> OpenDataApi for SocrataClient<C> {
    async fn query(&self, query: &SoqlQuery) -> Result<Vec<Value>> {
        let url = self.url_for(query);
        debug!(url = %url, "SoQL query");
        fetch_json(&self.client, url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civic_etl::fetch::BasicClient;

    #[test]
    fn test_query_is_url_encoded() {
        let client = SocrataClient::new(
            BasicClient::new().unwrap(),
            "https://data.nola.gov/resource/2jgv-pqrq.json",
        )
        .unwrap();

        let url = client.url_for(&SoqlQuery::select("count(*) as total").limit(5));

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("$select".to_string(), "count(*) as total".to_string()),
                ("$limit".to_string(), "5".to_string()),
            ]
        );
        assert_eq!(url.path(), "/resource/2jgv-pqrq.json");
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(SocrataClient::new(BasicClient::new().unwrap(), "not a url").is_err());
    }
}
