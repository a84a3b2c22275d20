//! HTTP adapters implementing the `AttributeLookup` port.
//!
//! One generic client, `HttpLookup<R>`, is parameterised by the response body
//! type of the endpoint it talks to. The body type knows which attribute it
//! carries and when a structurally valid answer is semantically empty.

mod responses;

pub use responses::{AgeResponse, CountryProbability, GenderResponse, NationalityResponse};

use std::marker::PhantomData;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{instrument, warn};
use url::Url;

use crate::domain::error::{Attribute, LookupError};
use crate::domain::ports::AttributeLookup;

pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Body of a lookup endpoint response.
pub trait LookupResponse: DeserializeOwned + Send + 'static {
    type Value: Send + 'static;
    const ATTRIBUTE: Attribute;

    /// Extract the resolved value, rejecting semantically empty answers.
    fn into_value(self, name: &str) -> Result<Self::Value, LookupError>;
}

pub type AgeLookup = HttpLookup<AgeResponse>;
pub type GenderLookup = HttpLookup<GenderResponse>;
pub type NationalityLookup = HttpLookup<NationalityResponse>;

/// Stateless client for one enrichment endpoint.
/// Requests go to `<base>?name=<name>`; any query already on `base` is replaced.
pub struct HttpLookup<R> {
    client: reqwest::Client,
    base: Url,
    _response: PhantomData<fn() -> R>,
}

impl<R: LookupResponse> HttpLookup<R> {
    /// Build a client with its own connection pool and a fixed per-call timeout.
    pub fn new(base: Url, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .with_context(|| format!("failed to build {} lookup client", R::ATTRIBUTE))?;
        Ok(Self::with_client(client, base))
    }

    pub fn with_client(client: reqwest::Client, base: Url) -> Self {
        Self {
            client,
            base,
            _response: PhantomData,
        }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn request_url(&self, name: &str) -> Result<Url, LookupError> {
        if self.base.cannot_be_a_base() {
            return Err(LookupError::invalid_url(
                R::ATTRIBUTE,
                format!("'{}' cannot be a base URL", self.base),
            ));
        }
        let mut url = self.base.clone();
        url.query_pairs_mut().clear().append_pair("name", name);
        Ok(url)
    }
}

fn transport_error(attribute: Attribute, e: reqwest::Error) -> LookupError {
    if e.is_timeout() {
        LookupError::timeout(attribute)
    } else {
        LookupError::transport(attribute, e.to_string())
    }
}

#[async_trait]
impl<R: LookupResponse> AttributeLookup<R::Value> for HttpLookup<R> {
    #[instrument(
        name = "fn_enricher.http.lookup",
        skip_all,
        fields(attribute = %R::ATTRIBUTE, base = %self.base, name = %name)
    )]
    async fn resolve(&self, name: &str) -> Result<R::Value, LookupError> {
        let attribute = R::ATTRIBUTE;
        let url = self.request_url(name)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(attribute, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("unexpected status code {}", status.as_u16());
            return Err(LookupError::status(attribute, status.as_u16()));
        }

        let body: R = response.json().await.map_err(|e| {
            if e.is_timeout() {
                LookupError::timeout(attribute)
            } else {
                LookupError::decode(attribute, e.to_string())
            }
        })?;

        body.into_value(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(base: &str) -> AgeLookup {
        AgeLookup::new(Url::parse(base).unwrap(), DEFAULT_LOOKUP_TIMEOUT).unwrap()
    }

    #[test]
    fn name_is_the_only_query_parameter() {
        let url = lookup("https://api.agify.io/?name=&country_id=US")
            .request_url("Rivka")
            .unwrap();
        assert_eq!(url.as_str(), "https://api.agify.io/?name=Rivka");
    }

    #[test]
    fn name_is_percent_encoded() {
        let url = lookup("http://age.local/api").request_url("Ann Marie").unwrap();
        assert_eq!(url.as_str(), "http://age.local/api?name=Ann+Marie");
    }

    #[test]
    fn rejects_non_base_urls() {
        let err = lookup("mailto:age@example.com")
            .request_url("Rivka")
            .unwrap_err();
        assert!(matches!(err, LookupError::InvalidUrl { .. }));
        assert_eq!(err.attribute(), Attribute::Age);
    }
}
