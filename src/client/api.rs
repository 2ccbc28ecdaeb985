use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::admin::model::{CollectionEntity, DatabaseEntity, MutationResult};
use crate::api::envelope::Envelope;

#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub message: String,
    pub payload: Value,
}

impl ApiError {
    pub fn transport(message: impl Into<String>) -> Self {
        let message = message.into();
        Self { payload: json!({ "error": message }), message }
    }

    pub fn from_payload(payload: Value) -> Self {
        let message = payload
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("request failed")
            .to_string();
        Self { message, payload }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ApiError {}

pub trait EntityApi<E> {
    fn fetch_list(&self) -> Result<Vec<E>, ApiError>;
    fn fetch_item(&self, name: &str) -> Result<E, ApiError>;
    fn create(&self, name: &str) -> Result<E, ApiError>;
    fn delete(&self, names: &[String]) -> Result<Vec<MutationResult>, ApiError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

pub trait Exchange {
    fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, String>;
}

fn call<T: DeserializeOwned>(
    exchange: &impl Exchange,
    method: Method,
    path: &str,
    body: Option<Value>,
    key: &str,
) -> Result<T, ApiError> {
    let raw = exchange.send(method, path, body).map_err(ApiError::transport)?;
    let envelope: Envelope = serde_json::from_value(raw)
        .map_err(|err| ApiError::transport(format!("malformed response: {err}")))?;

    if !envelope.success {
        return Err(ApiError::from_payload(envelope.errors.unwrap_or(Value::Null)));
    }

    let field = envelope
        .data
        .and_then(|mut data| data.get_mut(key).map(Value::take))
        .ok_or_else(|| ApiError::transport(format!("response is missing `{key}`")))?;
    serde_json::from_value(field)
        .map_err(|err| ApiError::transport(format!("unexpected `{key}` payload: {err}")))
}

fn encode(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

#[derive(Debug, Clone)]
pub struct DatabaseApi<X> {
    exchange: X,
}

impl<X: Exchange> DatabaseApi<X> {
    pub fn new(exchange: X) -> Self {
        Self { exchange }
    }
}

impl<X: Exchange> EntityApi<DatabaseEntity> for DatabaseApi<X> {
    fn fetch_list(&self) -> Result<Vec<DatabaseEntity>, ApiError> {
        call(&self.exchange, Method::Get, "/databases", None, "databases")
    }

    fn fetch_item(&self, name: &str) -> Result<DatabaseEntity, ApiError> {
        let path = format!("/databases/{}", encode(name));
        call(&self.exchange, Method::Get, &path, None, "database")
    }

    fn create(&self, name: &str) -> Result<DatabaseEntity, ApiError> {
        let body = json!({ "database": name });
        call(&self.exchange, Method::Post, "/databases/create", Some(body), "database")
    }

    fn delete(&self, names: &[String]) -> Result<Vec<MutationResult>, ApiError> {
        let body = json!({ "names": names });
        call(&self.exchange, Method::Post, "/databases/delete", Some(body), "status")
    }
}

#[derive(Debug, Clone)]
pub struct CollectionApi<X> {
    exchange: X,
    database: String,
}

impl<X: Exchange> CollectionApi<X> {
    pub fn new(exchange: X, database: impl Into<String>) -> Self {
        Self { exchange, database: database.into() }
    }
}

impl<X: Exchange> EntityApi<CollectionEntity> for CollectionApi<X> {
    fn fetch_list(&self) -> Result<Vec<CollectionEntity>, ApiError> {
        let path = format!("/collections?database={}", encode(&self.database));
        call(&self.exchange, Method::Get, &path, None, "collections")
    }

    fn fetch_item(&self, name: &str) -> Result<CollectionEntity, ApiError> {
        let path = format!("/collections/{}?database={}", encode(name), encode(&self.database));
        call(&self.exchange, Method::Get, &path, None, "collection")
    }

    fn create(&self, name: &str) -> Result<CollectionEntity, ApiError> {
        let body = json!({ "database": self.database, "collection": name });
        call(&self.exchange, Method::Post, "/collections/create", Some(body), "collection")
    }

    fn delete(&self, names: &[String]) -> Result<Vec<MutationResult>, ApiError> {
        let body = json!({ "database": self.database, "names": names });
        call(&self.exchange, Method::Post, "/collections/delete", Some(body), "status")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::model::Outcome;
    use std::cell::RefCell;

    struct Canned {
        reply: Result<Value, String>,
        seen: RefCell<Vec<(Method, String, Option<Value>)>>,
    }

    impl Canned {
        fn new(reply: Result<Value, String>) -> Self {
            Self { reply, seen: RefCell::new(Vec::new()) }
        }
    }

    impl Exchange for &Canned {
        fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, String> {
            self.seen.borrow_mut().push((method, path.to_string(), body));
            self.reply.clone()
        }
    }

    #[test]
    fn success_envelope_is_unwrapped() {
        let canned = Canned::new(Ok(json!({
            "success": true,
            "data": { "databases": [{ "id": 0, "name": "admin", "stats": {}, "collections": [] }] }
        })));
        let databases = DatabaseApi::new(&canned).fetch_list().expect("list");
        assert_eq!(databases, vec![DatabaseEntity::new(Some(0), "admin")]);
    }

    #[test]
    fn failure_envelope_keeps_error_payload() {
        let canned = Canned::new(Ok(json!({
            "success": false,
            "errors": { "error": "no servers", "code": 13 }
        })));
        let error = DatabaseApi::new(&canned).fetch_list().expect_err("failure");
        assert_eq!(error.message, "no servers");
        assert_eq!(error.payload, json!({ "error": "no servers", "code": 13 }));
    }

    #[test]
    fn transport_failure_is_an_api_error() {
        let canned = Canned::new(Err("connection refused".to_string()));
        let error = DatabaseApi::new(&canned).fetch_item("shop").expect_err("transport");
        assert_eq!(error, ApiError::transport("connection refused"));
    }

    #[test]
    fn missing_data_key_is_reported() {
        let canned = Canned::new(Ok(json!({ "success": true, "data": {} })));
        let error = DatabaseApi::new(&canned).create("shop").expect_err("missing key");
        assert!(error.message.contains("database"));
    }

    #[test]
    fn collection_paths_are_scoped_and_encoded() {
        let canned = Canned::new(Ok(json!({ "success": true, "data": { "status": [{ "a": "success" }] } })));
        let api = CollectionApi::new(&canned, "my shop");

        let results = api.delete(&["a".to_string()]).expect("delete");
        assert_eq!(results, vec![MutationResult::new("a", Outcome::Success)]);
        let _ = api.fetch_item("a/b");

        let seen = canned.seen.borrow();
        assert_eq!(seen[0].0, Method::Post);
        assert_eq!(seen[0].2, Some(json!({ "database": "my shop", "names": ["a"] })));
        assert_eq!(seen[1].1, "/collections/a%2Fb?database=my%20shop");
    }
}
