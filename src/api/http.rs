//! Implements the `Ledger` and `Accounts` traits over HTTP using `reqwest`.

use crate::api::{Accounts, ApiError, Ledger, AUTH, LOGIN, REGISTER, TRANSACTIONS};
use crate::model::{NewTransaction, TransactionId, Transactions};
use crate::session::{AccessToken, Credentials};
use crate::Result;
use anyhow::{anyhow, Context};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

const TIMEOUT: Duration = Duration::from_secs(30);

/// Talks to the transactions endpoints on behalf of a signed-in user.
pub(super) struct HttpLedger {
    client: Client,
    base: Url,
    token: AccessToken,
}

impl HttpLedger {
    pub(super) fn new(base: Url, token: AccessToken) -> Result<Self> {
        Ok(Self {
            client: client()?,
            base,
            token,
        })
    }
}

#[async_trait::async_trait]
impl Ledger for HttpLedger {
    async fn list_transactions(&mut self) -> Result<Transactions> {
        let url = endpoint(&self.base, &[TRANSACTIONS])?;
        debug!("GET {url}");
        let response = self
            .client
            .get(url.clone())
            .bearer_auth(self.token.secret())
            .send()
            .await
            .with_context(|| format!("Unable to reach {url}"))?;
        let body = ensure_success(response)
            .await?
            .text()
            .await
            .context("Unable to read the transaction list")?;
        trace!("Transaction list: {body}");
        Transactions::from_json(&body).context("The API sent a transaction list that is unreadable")
    }

    async fn add_transaction(&mut self, transaction: &NewTransaction) -> Result<()> {
        let url = endpoint(&self.base, &[TRANSACTIONS])?;
        debug!("POST {url}");
        let response = self
            .client
            .post(url.clone())
            .bearer_auth(self.token.secret())
            .json(transaction)
            .send()
            .await
            .with_context(|| format!("Unable to reach {url}"))?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn delete_transaction(&mut self, id: &TransactionId) -> Result<()> {
        let url = endpoint(&self.base, &[TRANSACTIONS, id.as_str()])?;
        debug!("DELETE {url}");
        let response = self
            .client
            .delete(url.clone())
            .bearer_auth(self.token.secret())
            .send()
            .await
            .with_context(|| format!("Unable to reach {url}"))?;
        ensure_success(response).await?;
        Ok(())
    }
}

/// Talks to the registration and login endpoints.
pub(super) struct HttpAccounts {
    client: Client,
    base: Url,
}

impl HttpAccounts {
    pub(super) fn new(base: Url) -> Result<Self> {
        Ok(Self {
            client: client()?,
            base,
        })
    }
}

/// The body of a successful login response.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[async_trait::async_trait]
impl Accounts for HttpAccounts {
    async fn register(&mut self, credentials: &Credentials) -> Result<()> {
        let url = endpoint(&self.base, &[AUTH, REGISTER])?;
        debug!("POST {url}");
        let response = self
            .client
            .post(url.clone())
            .json(credentials)
            .send()
            .await
            .with_context(|| format!("Unable to reach {url}"))?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn login(&mut self, credentials: &Credentials) -> Result<AccessToken> {
        let url = endpoint(&self.base, &[AUTH, LOGIN])?;
        debug!("POST {url}");
        // The login endpoint takes an OAuth2 password form, not JSON.
        let response = self
            .client
            .post(url.clone())
            .form(&[
                ("username", credentials.email()),
                ("password", credentials.password()),
            ])
            .send()
            .await
            .with_context(|| format!("Unable to reach {url}"))?;
        let token: TokenResponse = ensure_success(response)
            .await?
            .json()
            .await
            .context("The login response did not contain an access token")?;
        Ok(AccessToken::new(token.access_token))
    }
}

fn client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .timeout(TIMEOUT)
        .build()
        .context("Unable to create the HTTP client")
}

/// Appends `segments` to the path of `base`, keeping any path prefix it already has.
pub(super) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| anyhow!("The API URL '{base}' cannot be used as a base URL"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Turns a non-success response into an `ApiError`.
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    debug!("{status}: {body}");
    Err(ApiError::from_response(status.as_u16(), status.canonical_reason(), &body).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_endpoint_on_bare_host() {
        let base = url("https://esnaf.example.test");
        assert_eq!(
            endpoint(&base, &[TRANSACTIONS]).unwrap().as_str(),
            "https://esnaf.example.test/transactions"
        );
        assert_eq!(
            endpoint(&base, &[AUTH, LOGIN]).unwrap().as_str(),
            "https://esnaf.example.test/auth/login"
        );
    }

    #[test]
    fn test_endpoint_keeps_path_prefix() {
        let with_slash = url("http://localhost:8000/api/");
        let without_slash = url("http://localhost:8000/api");
        for base in [with_slash, without_slash] {
            assert_eq!(
                endpoint(&base, &[TRANSACTIONS, "42"]).unwrap().as_str(),
                "http://localhost:8000/api/transactions/42"
            );
        }
    }

    #[test]
    fn test_endpoint_escapes_ids() {
        let base = url("https://esnaf.example.test/");
        assert_eq!(
            endpoint(&base, &[TRANSACTIONS, "a/b c"]).unwrap().as_str(),
            "https://esnaf.example.test/transactions/a%2Fb%20c"
        );
    }

    #[test]
    fn test_token_response() {
        let body = r#"{"access_token": "eyJ.abc", "token_type": "bearer"}"#;
        let token: TokenResponse = serde_json::from_str(body).unwrap();
        assert_eq!(token.access_token, "eyJ.abc");
    }
}
