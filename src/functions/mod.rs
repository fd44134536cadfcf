//! Serverless function invocation
//!
//! Order and stock processing live in hosted functions; this wrapper only
//! calls them.

use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::error::Error;
use crate::fetch::Fetch;

/// Client for hosted serverless functions
pub struct FunctionsClient {
    /// The base URL for the project
    url: String,

    /// The anonymous API key for the project
    key: String,

    /// HTTP client
    client: Client,
}

/// Response from a function invocation
#[derive(Debug, Clone)]
pub struct FunctionResponse<T> {
    /// Response data
    pub data: T,

    /// Response status
    pub status: u16,
}

impl FunctionsClient {
    /// Create a new FunctionsClient
    pub(crate) fn new(url: &str, key: &str, client: Client) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            client,
        }
    }

    /// Get the base URL for function operations
    fn get_url(&self, function_name: &str) -> String {
        format!("{}/functions/v1/{}", self.url, function_name)
    }

    /// Invoke a function by name
    pub async fn invoke<T: Serialize, R: DeserializeOwned>(
        &self,
        function_name: &str,
        invoke_options: &FunctionInvokeOptions<T>,
    ) -> Result<FunctionResponse<R>, Error> {
        let url = self.get_url(function_name);

        let mut fetch = Fetch::post(&self.client, &url).apikey(&self.key);

        if let Some(headers) = &invoke_options.headers {
            for (key, value) in headers {
                fetch = fetch.header(key, value);
            }
        }

        if let Some(token) = &invoke_options.authorization {
            fetch = fetch.bearer_auth(token);
        }

        let fetch = if let Some(body) = &invoke_options.body {
            fetch.json(body)?
        } else {
            fetch
        };

        debug!(function = function_name, "invoking function");
        let response = fetch.execute_raw().await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::function(format!(
                "function {} failed with status {}: {}",
                function_name, status, text
            )));
        }

        let data = response.json::<R>().await?;

        Ok(FunctionResponse { data, status })
    }
}

/// Options for invoking a function
#[derive(Debug, Clone)]
pub struct FunctionInvokeOptions<T> {
    /// Request body
    pub body: Option<T>,

    /// Request headers
    pub headers: Option<HashMap<String, String>>,

    /// Authorization token
    pub authorization: Option<String>,
}

impl<T> Default for FunctionInvokeOptions<T> {
    fn default() -> Self {
        Self {
            body: None,
            headers: None,
            authorization: None,
        }
    }
}

impl<T> FunctionInvokeOptions<T> {
    /// Create new empty invoke options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request body
    pub fn with_body(mut self, body: T) -> Self {
        self.body = Some(body);
        self
    }

    /// Set a request header
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        let headers = self.headers.get_or_insert_with(HashMap::new);
        headers.insert(key.to_string(), value.to_string());
        self
    }

    /// Set the authorization token
    pub fn with_auth(mut self, token: &str) -> Self {
        self.authorization = Some(token.to_string());
        self
    }
}
