//! Query builders for the relational data service

use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;

use crate::data::filter::FilterOperator;
use crate::error::Error;
use crate::fetch::{Fetch, FetchBuilder};

/// Base query parameter collection
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    /// Query parameters
    params: HashMap<String, String>,
}

impl QueryBuilder {
    /// Create a new QueryBuilder
    pub fn new() -> Self {
        Self {
            params: HashMap::new(),
        }
    }

    /// Add a parameter to the query
    pub fn add_param(&mut self, key: &str, value: &str) {
        self.params.insert(key.to_string(), value.to_string());
    }

    /// Add a filter expression on a column
    pub fn add_filter<T: ToString>(&mut self, column: &str, op: FilterOperator, value: T) {
        self.add_param(column, &format!("{}.{}", op.as_str(), value.to_string()));
    }

    /// Get the query parameters
    pub fn get_params(&self) -> &HashMap<String, String> {
        &self.params
    }
}

fn authed<'a>(fetch: FetchBuilder<'a>, key: &str, auth: &Option<String>) -> FetchBuilder<'a> {
    let fetch = fetch.apikey(key);
    match auth {
        Some(token) => fetch.bearer_auth(token),
        None => fetch,
    }
}

/// Builder for SELECT queries
pub struct SelectBuilder {
    /// The base URL for the request
    url: String,

    /// The API key
    key: String,

    /// Bearer token for authenticated reads
    auth: Option<String>,

    /// HTTP client
    client: Client,

    /// Query builder
    query: QueryBuilder,
}

impl SelectBuilder {
    /// Create a new SelectBuilder
    pub fn new(
        url: String,
        key: String,
        auth: Option<String>,
        columns: &str,
        client: Client,
    ) -> Self {
        let mut query = QueryBuilder::new();
        query.add_param("select", columns);

        Self {
            url,
            key,
            auth,
            client,
            query,
        }
    }

    /// Filter rows with an explicit operator
    pub fn filter<T: ToString>(mut self, column: &str, op: FilterOperator, value: T) -> Self {
        self.query.add_filter(column, op, value);
        self
    }

    /// Filter rows where column equals a value
    pub fn eq<T: ToString>(self, column: &str, value: T) -> Self {
        self.filter(column, FilterOperator::Eq, value)
    }

    /// Filter rows where column does not equal a value
    pub fn neq<T: ToString>(self, column: &str, value: T) -> Self {
        self.filter(column, FilterOperator::Neq, value)
    }

    /// Filter rows where column is greater than a value
    pub fn gt<T: ToString>(self, column: &str, value: T) -> Self {
        self.filter(column, FilterOperator::Gt, value)
    }

    /// Filter rows where column is greater than or equal to a value
    pub fn gte<T: ToString>(self, column: &str, value: T) -> Self {
        self.filter(column, FilterOperator::Gte, value)
    }

    /// Filter rows where column is less than a value
    pub fn lt<T: ToString>(self, column: &str, value: T) -> Self {
        self.filter(column, FilterOperator::Lt, value)
    }

    /// Filter rows where column is less than or equal to a value
    pub fn lte<T: ToString>(self, column: &str, value: T) -> Self {
        self.filter(column, FilterOperator::Lte, value)
    }

    /// Filter rows where column matches a pattern (case sensitive)
    pub fn like(self, column: &str, pattern: &str) -> Self {
        self.filter(column, FilterOperator::Like, pattern)
    }

    /// Filter rows where column matches a pattern (case insensitive)
    pub fn ilike(self, column: &str, pattern: &str) -> Self {
        self.filter(column, FilterOperator::ILike, pattern)
    }

    /// Filter rows where column is in a list of values
    pub fn in_list<T: ToString>(mut self, column: &str, values: &[T]) -> Self {
        let values_str: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        self.query
            .add_param(column, &format!("in.({})", values_str.join(",")));
        self
    }

    /// Limit the number of rows returned
    pub fn limit(mut self, count: i32) -> Self {
        self.query.add_param("limit", &count.to_string());
        self
    }

    /// Skip a number of rows
    pub fn offset(mut self, count: i32) -> Self {
        self.query.add_param("offset", &count.to_string());
        self
    }

    /// Order the results by a column
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.query
            .add_param("order", &format!("{}.{}", column, direction));
        self
    }

    /// Execute the query and return the results
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<Vec<T>, Error> {
        let fetch = authed(Fetch::get(&self.client, &self.url), &self.key, &self.auth)
            .query(self.query.get_params().clone());

        let result = fetch.execute::<Vec<T>>().await?;
        Ok(result)
    }

    /// Execute the query and return the first row
    pub async fn execute_one<T: DeserializeOwned>(self) -> Result<Option<T>, Error> {
        let results = self.limit(1).execute::<T>().await?;
        Ok(results.into_iter().next())
    }
}

/// Builder for INSERT queries
pub struct InsertBuilder<T: Serialize> {
    /// The base URL for the request
    url: String,

    /// The API key
    key: String,

    /// Bearer token for authenticated writes
    auth: Option<String>,

    /// The values to insert
    values: T,

    /// HTTP client
    client: Client,
}

impl<T: Serialize> InsertBuilder<T> {
    /// Create a new InsertBuilder
    pub fn new(url: String, key: String, auth: Option<String>, values: T, client: Client) -> Self {
        Self {
            url,
            key,
            auth,
            values,
            client,
        }
    }

    /// Execute the query and return the inserted rows
    pub async fn execute<R: DeserializeOwned>(&self) -> Result<Vec<R>, Error> {
        let fetch = authed(Fetch::post(&self.client, &self.url), &self.key, &self.auth)
            .header("Prefer", "return=representation")
            .json(&self.values)?;

        let result = fetch.execute::<Vec<R>>().await?;
        Ok(result)
    }

    /// Execute the query without returning the inserted data
    pub async fn execute_no_return(&self) -> Result<(), Error> {
        let fetch = authed(Fetch::post(&self.client, &self.url), &self.key, &self.auth)
            .header("Prefer", "return=minimal")
            .json(&self.values)?;

        let response = fetch.execute_raw().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::data(format!(
                "insert failed with status {}: {}",
                status, text
            )));
        }
        Ok(())
    }
}

/// Builder for UPDATE queries
pub struct UpdateBuilder<T: Serialize> {
    /// The base URL for the request
    url: String,

    /// The API key
    key: String,

    /// Bearer token for authenticated writes
    auth: Option<String>,

    /// The values to update
    values: T,

    /// HTTP client
    client: Client,

    /// Query builder
    query: QueryBuilder,
}

impl<T: Serialize> UpdateBuilder<T> {
    /// Create a new UpdateBuilder
    pub fn new(url: String, key: String, auth: Option<String>, values: T, client: Client) -> Self {
        Self {
            url,
            key,
            auth,
            values,
            client,
            query: QueryBuilder::new(),
        }
    }

    /// Filter rows where column equals a value
    pub fn eq<V: ToString>(mut self, column: &str, value: V) -> Self {
        self.query.add_filter(column, FilterOperator::Eq, value);
        self
    }

    /// Execute the query and return the updated rows
    pub async fn execute<R: DeserializeOwned>(&self) -> Result<Vec<R>, Error> {
        let fetch = authed(Fetch::patch(&self.client, &self.url), &self.key, &self.auth)
            .header("Prefer", "return=representation")
            .query(self.query.get_params().clone())
            .json(&self.values)?;

        let result = fetch.execute::<Vec<R>>().await?;
        Ok(result)
    }
}

/// Builder for UPSERT queries
pub struct UpsertBuilder<T: Serialize> {
    /// The base URL for the request
    url: String,

    /// The API key
    key: String,

    /// Bearer token for authenticated writes
    auth: Option<String>,

    /// The values to upsert
    values: T,

    /// HTTP client
    client: Client,

    /// On conflict columns
    on_conflict: Option<String>,
}

impl<T: Serialize> UpsertBuilder<T> {
    /// Create a new UpsertBuilder
    pub fn new(url: String, key: String, auth: Option<String>, values: T, client: Client) -> Self {
        Self {
            url,
            key,
            auth,
            values,
            client,
            on_conflict: None,
        }
    }

    /// Specify the column(s) to check for conflicts
    pub fn on_conflict(mut self, column: &str) -> Self {
        self.on_conflict = Some(column.to_string());
        self
    }

    /// Execute the query and return the upserted rows
    pub async fn execute<R: DeserializeOwned>(&self) -> Result<Vec<R>, Error> {
        let prefer = match &self.on_conflict {
            Some(conflict) => format!(
                "return=representation,resolution=merge-duplicates,on_conflict={}",
                conflict
            ),
            None => "return=representation,resolution=merge-duplicates".to_string(),
        };

        let fetch = authed(Fetch::post(&self.client, &self.url), &self.key, &self.auth)
            .header("Prefer", &prefer)
            .json(&self.values)?;

        let result = fetch.execute::<Vec<R>>().await?;
        Ok(result)
    }
}

/// Builder for DELETE queries
pub struct DeleteBuilder {
    /// The base URL for the request
    url: String,

    /// The API key
    key: String,

    /// Bearer token for authenticated writes
    auth: Option<String>,

    /// HTTP client
    client: Client,

    /// Query builder
    query: QueryBuilder,
}

impl DeleteBuilder {
    /// Create a new DeleteBuilder
    pub fn new(url: String, key: String, auth: Option<String>, client: Client) -> Self {
        Self {
            url,
            key,
            auth,
            client,
            query: QueryBuilder::new(),
        }
    }

    /// Filter rows where column equals a value
    pub fn eq<V: ToString>(mut self, column: &str, value: V) -> Self {
        self.query.add_filter(column, FilterOperator::Eq, value);
        self
    }

    /// Execute the delete without returning the deleted data
    pub async fn execute(&self) -> Result<(), Error> {
        let fetch = authed(Fetch::delete(&self.client, &self.url), &self.key, &self.auth)
            .header("Prefer", "return=minimal")
            .query(self.query.get_params().clone());

        let response = fetch.execute_raw().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::data(format!(
                "delete failed with status {}: {}",
                status, text
            )));
        }
        Ok(())
    }
}
