use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::{Config, Credential};
use crate::topscore::model::TokenResponse;

pub mod model;

/// Runs REST-style query fragments (`products?per_page=1`) against the API.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Execute `query` and parse the response body as JSON.
    async fn run_query(&self, query: &str) -> Result<Value>;

    /// Execute `query` and stream the raw response body into `destination`,
    /// replacing any previous contents.
    async fn save_query(&self, query: &str, destination: &Path) -> Result<()>;
}

pub struct TopScoreClient {
    http: Client,
    api_base: Url,
    credential: Credential,
    token: Mutex<Option<String>>,
}

impl fmt::Debug for TopScoreClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopScoreClient")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

/// `https://site.usetopscore.com/api/oauth/server` -> `https://site.usetopscore.com/api/`
pub fn derive_api_base(auth_url: &str) -> Result<Url> {
    let auth = Url::parse(auth_url).context("invalid auth URL")?;
    auth.join("/api/").context("cannot derive API base from auth URL")
}

impl TopScoreClient {
    pub fn new(credential: Credential, api_base: Url) -> Result<Self> {
        let http = Client::builder()
            .user_agent("topscore-export/0.1")
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            api_base,
            credential,
            token: Mutex::new(None),
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let api_base = match &cfg.topscore.api_base {
            Some(base) => {
                // Url::join drops the last segment unless the base ends with '/'.
                let base = if base.ends_with('/') {
                    base.clone()
                } else {
                    format!("{}/", base)
                };
                Url::parse(&base).context("invalid topscore.api_base")?
            }
            None => derive_api_base(&cfg.topscore.credential.auth_url)?,
        };
        Self::new(cfg.topscore.credential.clone(), api_base)
    }

    pub fn build_token_request(&self) -> Result<reqwest::Request> {
        let c = &self.credential;
        self.http
            .post(c.auth_url.as_str())
            .form(&[
                ("grant_type", "password"),
                ("client_id", c.client_id.as_str()),
                ("client_secret", c.client_secret.as_str()),
                ("username", c.username.as_str()),
                ("password", c.password.as_str()),
            ])
            .build()
            .context("failed to build token request")
    }

    pub fn build_query_request(&self, query: &str, token: &str) -> Result<reqwest::Request> {
        let url = self
            .api_base
            .join(query)
            .with_context(|| format!("invalid query: {}", query))?;
        self.http
            .get(url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Accept", "application/json")
            .build()
            .context("failed to build query request")
    }

    /// Token for this run; requested on first use and reused afterwards.
    async fn access_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            return Ok(token.clone());
        }

        let request = self.build_token_request()?;
        info!(url=%request.url(), "requesting TopScore access token");
        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach TopScore auth endpoint")?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("token request failed {}: {}", status, body));
        }
        let payload: TokenResponse = res.json().await.context("invalid token response")?;
        if let Some(kind) = payload.token_type.as_deref() {
            debug!(token_type = kind, "received access token");
        }
        *guard = Some(payload.access_token.clone());
        Ok(payload.access_token)
    }

    async fn execute_query(&self, query: &str) -> Result<Response> {
        let token = self.access_token().await?;
        let request = self.build_query_request(query, &token)?;
        debug!(url=%request.url(), "sending topscore query");
        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach TopScore")?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("topscore error {} for {}: {}", status, query, body));
        }
        Ok(res)
    }
}

#[async_trait]
impl QueryExecutor for TopScoreClient {
    async fn run_query(&self, query: &str) -> Result<Value> {
        let res = self.execute_query(query).await?;
        res.json::<Value>()
            .await
            .with_context(|| format!("invalid JSON in response to {}", query))
    }

    async fn save_query(&self, query: &str, destination: &Path) -> Result<()> {
        let mut res = self.execute_query(query).await?;
        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let mut file = fs::File::create(destination)
            .await
            .with_context(|| format!("failed to create {}", destination.display()))?;
        let mut written = 0usize;
        while let Some(chunk) = res.chunk().await.context("failed to read response body")? {
            file.write_all(&chunk).await?;
            written += chunk.len();
        }
        file.flush().await?;
        debug!(path=%destination.display(), bytes = written, "saved query response");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_credential() -> Credential {
        Credential {
            auth_url: "https://league.usetopscore.com/api/oauth/server".into(),
            client_id: "cid".into(),
            client_secret: "csecret".into(),
            username: "user".into(),
            password: "pw".into(),
        }
    }

    fn sample_client() -> TopScoreClient {
        let base = derive_api_base(&sample_credential().auth_url).unwrap();
        TopScoreClient::new(sample_credential(), base).unwrap()
    }

    #[test]
    fn api_base_derived_from_auth_origin() {
        let base = derive_api_base("https://league.usetopscore.com/api/oauth/server").unwrap();
        assert_eq!(base.as_str(), "https://league.usetopscore.com/api/");
        assert!(derive_api_base("not a url").is_err());
    }

    #[test]
    fn build_query_request_sets_headers() {
        let client = sample_client();
        let request = client
            .build_query_request("products?site_list_scope=network&per_page=1", "tok")
            .unwrap();
        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(request.url().path(), "/api/products");
        assert_eq!(
            request.url().query(),
            Some("site_list_scope=network&per_page=1")
        );
        assert_eq!(
            request
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .unwrap(),
            "Bearer tok"
        );
    }

    #[test]
    fn build_token_request_posts_password_grant() {
        let client = sample_client();
        let request = client.build_token_request().unwrap();
        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().path(), "/api/oauth/server");
        let body = request
            .body()
            .and_then(|b| b.as_bytes())
            .map(|b| String::from_utf8_lossy(b).to_string())
            .unwrap();
        assert!(body.contains("grant_type=password"));
        assert!(body.contains("client_id=cid"));
        assert!(body.contains("username=user"));
    }

    #[test]
    fn explicit_api_base_gets_trailing_slash() {
        let mut cfg: Config = serde_yaml::from_str(crate::config::example()).unwrap();
        cfg.topscore.api_base = Some("https://other.example.com/api".into());
        let client = TopScoreClient::from_config(&cfg).unwrap();
        let request = client.build_query_request("persons?per_page=1", "t").unwrap();
        assert_eq!(request.url().path(), "/api/persons");
    }

    #[test]
    fn debug_hides_credential() {
        let shown = format!("{:?}", sample_client());
        assert!(!shown.contains("csecret"));
    }
}
