//! Table access over the PostgREST-style database proxy.
//!
//! Filtering, ordering and pagination are expressed entirely through
//! [`Params`] and evaluated by the server. The client never filters
//! locally.

use crate::error::{ClientError, ClientResult};
use crate::transport::{encode_body, Transport};
use kliv_types::{Params, ROW_ID};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

const DATABASE_PATH: &str = "/v2/database";

/// Client for the database service.
#[derive(Debug, Clone)]
pub struct DatabaseClient {
    transport: Transport,
}

impl DatabaseClient {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    async fn request(
        &self,
        method: Method,
        table: Option<&str>,
        params: &Params,
        body: Option<Vec<u8>>,
    ) -> ClientResult<Value> {
        let url = self.transport.endpoint(DATABASE_PATH, table);
        let fallback = format!("{method} request failed");
        let response = self
            .transport
            .send_json(method, &url, Some(params), body)
            .await?;

        if !response.is_success() {
            return Err(response.request_error(&fallback));
        }
        response.json()
    }

    /// Lists the table names visible to the current session.
    pub async fn list_tables(&self) -> ClientResult<Vec<String>> {
        let data = self.request(Method::GET, None, &Params::new(), None).await?;
        Ok(data
            .get("tables")
            .and_then(Value::as_array)
            .map(|tables| {
                tables
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Selects rows. `params` is forwarded verbatim and the server response
    /// is returned unchanged.
    pub async fn query(&self, table: &str, params: &Params) -> ClientResult<Value> {
        require_table(table)?;
        self.request(Method::GET, Some(table), params, None).await
    }

    /// [`DatabaseClient::query`] followed by typed deserialization.
    pub async fn query_as<T: DeserializeOwned>(&self, table: &str, params: &Params) -> ClientResult<T> {
        let value = self.query(table, params).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Fetches a single row by `_row_id`. Zero matches is `Ok(None)`.
    pub async fn get(&self, table: &str, id: impl fmt::Display) -> ClientResult<Option<Value>> {
        let params = Params::new().eq(ROW_ID, id);
        let rows = self.query(table, &params).await?;
        Ok(match rows {
            Value::Array(rows) => rows.into_iter().next(),
            _ => None,
        })
    }

    /// Inserts a row (or an array of rows) and returns the server echo.
    pub async fn insert<T: Serialize + ?Sized>(&self, table: &str, data: &T) -> ClientResult<Value> {
        require_table(table)?;
        let body = encode_body(data)?;
        self.request(Method::POST, Some(table), &Params::new(), Some(body))
            .await
    }

    /// Updates every row matching `params`. The filter is not narrowed
    /// client-side.
    pub async fn update<T: Serialize + ?Sized>(
        &self,
        table: &str,
        params: &Params,
        data: &T,
    ) -> ClientResult<Value> {
        require_table(table)?;
        let body = encode_body(data)?;
        self.request(Method::PUT, Some(table), params, Some(body))
            .await
    }

    /// Deletes rows matching `params`. At least one present filter is
    /// required; an unfiltered delete is refused before any request.
    pub async fn delete(&self, table: &str, params: &Params) -> ClientResult<Value> {
        require_table(table)?;
        if !params.has_values() {
            return Err(ClientError::Argument(
                "filters required for delete".to_string(),
            ));
        }
        self.request(Method::DELETE, Some(table), params, None)
            .await
    }

    /// Counts rows matching `params` via `select=count`.
    pub async fn count(&self, table: &str, params: &Params) -> ClientResult<u64> {
        let params = params.clone().select("count");
        let result = self.query(table, &params).await?;
        Ok(count_field(&result))
    }
}

fn require_table(table: &str) -> ClientResult<()> {
    if table.trim().is_empty() {
        return Err(ClientError::Argument("table name is required".to_string()));
    }
    Ok(())
}

/// Reads `count` from an object, or from the first row of a one-row array.
fn count_field(result: &Value) -> u64 {
    let value = match result {
        Value::Array(rows) => rows.first().and_then(|row| row.get("count")),
        other => other.get("count"),
    };
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}
