use std::sync::Arc;

use axum::http::StatusCode;
use log::{error, info};
use serde::Deserialize;
use serde_json::json;

use crate::admin::aggregate::{aggregate_all, aggregate_one, collection_detail, collection_summaries};
use crate::admin::mutation::{self, MutationError};
use crate::api::envelope::Reply;
use crate::mongo::connection::DatabaseFilters;
use crate::mongo::driver::{AdminDriver, DriverFactory};
use crate::settings::AppSettings;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDatabaseRequest {
    #[serde(default)]
    pub database: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteDatabasesRequest {
    #[serde(default)]
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionQuery {
    #[serde(default)]
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCollectionRequest {
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub collection: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteCollectionsRequest {
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub names: Vec<String>,
}

pub struct AdminService {
    factory: Arc<dyn DriverFactory>,
    filters: DatabaseFilters,
    bootstrap_collection: String,
}

impl AdminService {
    pub fn new(
        factory: Arc<dyn DriverFactory>,
        filters: DatabaseFilters,
        bootstrap_collection: impl Into<String>,
    ) -> Self {
        Self { factory, filters, bootstrap_collection: bootstrap_collection.into() }
    }

    pub fn from_settings(factory: Arc<dyn DriverFactory>, settings: &AppSettings) -> Self {
        Self::new(
            factory,
            DatabaseFilters::from_settings(settings),
            settings.bootstrap_collection.trim(),
        )
    }

    fn with_driver(&self, f: impl FnOnce(&dyn AdminDriver) -> Reply) -> Reply {
        match self.factory.connect() {
            Ok(driver) => f(driver.as_ref()),
            Err(err) => {
                error!("could not connect to MongoDB: {err}");
                Reply::error(StatusCode::INTERNAL_SERVER_ERROR, err)
            }
        }
    }

    pub fn list_databases(&self) -> Reply {
        self.with_driver(|driver| {
            let listing = aggregate_all(driver, &self.filters);
            match listing.error {
                Some(message) => Reply::error(StatusCode::INTERNAL_SERVER_ERROR, message),
                None => Reply::ok(json!({ "databases": listing.databases })),
            }
        })
    }

    pub fn get_database(&self, name: &str) -> Reply {
        if name.trim().is_empty() {
            return Reply::error(StatusCode::BAD_REQUEST, "database name is required");
        }
        self.with_driver(|driver| Reply::ok(json!({ "database": aggregate_one(driver, name) })))
    }

    pub fn create_database(&self, request: CreateDatabaseRequest) -> Reply {
        self.with_driver(|driver| {
            match mutation::create_database(driver, &request.database, &self.bootstrap_collection) {
                Ok(database) => Reply::ok(json!({ "database": database })),
                Err(err) => mutation_error(err),
            }
        })
    }

    pub fn delete_databases(&self, request: DeleteDatabasesRequest) -> Reply {
        self.with_driver(|driver| {
            let status = mutation::drop_databases(driver, &request.names);
            info!("processed {} database drop(s)", status.len());
            Reply::ok(json!({ "status": status }))
        })
    }

    pub fn list_collections(&self, query: CollectionQuery) -> Reply {
        if query.database.trim().is_empty() {
            return Reply::error(StatusCode::BAD_REQUEST, "database name is required");
        }
        self.with_driver(|driver| {
            Reply::ok(json!({ "collections": collection_summaries(driver, &query.database) }))
        })
    }

    pub fn get_collection(&self, query: CollectionQuery, name: &str) -> Reply {
        if query.database.trim().is_empty() {
            return Reply::error(StatusCode::BAD_REQUEST, "database name is required");
        }
        self.with_driver(|driver| match collection_detail(driver, &query.database, name) {
            Some(collection) => Reply::ok(json!({ "collection": collection })),
            None => Reply::error(
                StatusCode::NOT_FOUND,
                format!("collection {}.{} not found", query.database, name),
            ),
        })
    }

    pub fn create_collection(&self, request: CreateCollectionRequest) -> Reply {
        self.with_driver(|driver| {
            match mutation::create_collection(driver, &request.database, &request.collection) {
                Ok(collection) => Reply::ok(json!({ "collection": collection })),
                Err(err) => mutation_error(err),
            }
        })
    }

    pub fn delete_collections(&self, request: DeleteCollectionsRequest) -> Reply {
        if request.database.trim().is_empty() {
            return Reply::error(StatusCode::BAD_REQUEST, "database name is required");
        }
        self.with_driver(|driver| {
            let status = mutation::drop_collections(driver, &request.database, &request.names);
            Reply::ok(json!({ "status": status }))
        })
    }
}

fn mutation_error(err: MutationError) -> Reply {
    match err {
        MutationError::InvalidName(message) => Reply::error(StatusCode::BAD_REQUEST, message),
        MutationError::Driver(driver_error) => {
            error!("mutation failed: {driver_error}");
            Reply::error(StatusCode::INTERNAL_SERVER_ERROR, driver_error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mongo::fake::{FakeDatabase, FakeDriver, FakeFactory};
    use mongodb::bson::doc;
    use serde_json::Value;

    fn service(factory: FakeFactory) -> AdminService {
        AdminService::new(Arc::new(factory), DatabaseFilters::default(), "foo")
    }

    fn data(reply: &Reply) -> &Value {
        reply.envelope.data.as_ref().expect("success reply carries data")
    }

    #[test]
    fn listing_survives_one_unreadable_database() {
        let driver = FakeDriver::new(vec![
            FakeDatabase::new("admin"),
            FakeDatabase::new("logs").with_failing_stats(),
        ]);
        let reply = service(FakeFactory::new(driver)).list_databases();

        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.envelope.success);
        let databases = data(&reply)["databases"].as_array().expect("array");
        assert_eq!(databases.len(), 2);
        assert_eq!(databases[0]["name"], "admin");
        assert!(databases[0]["stats"].as_object().is_some_and(|stats| !stats.is_empty()));
        assert_eq!(databases[1]["name"], "logs");
        assert_eq!(databases[1]["stats"], json!({}));
    }

    #[test]
    fn unreachable_server_is_a_single_error() {
        let reply = service(FakeFactory::unreachable()).list_databases();
        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!reply.envelope.success);
        assert!(reply.envelope.data.is_none());
        assert_eq!(
            reply.envelope.errors,
            Some(json!({ "error": "connection error: server selection timeout" }))
        );
    }

    #[test]
    fn listing_error_is_not_merged_into_data() {
        let reply = service(FakeFactory::new(FakeDriver::failing_listing("auth failed"))).list_databases();
        assert!(!reply.envelope.success);
        assert_eq!(reply.envelope.errors, Some(json!({ "error": "auth failed" })));
    }

    #[test]
    fn delete_reports_each_outcome() {
        let driver = FakeDriver::new(vec![
            FakeDatabase::new("temp1"),
            FakeDatabase::new("temp2").with_drop_ack(Ok(doc! { "dropped": "temp2", "ok": 0 })),
        ]);
        let reply = service(FakeFactory::new(driver)).delete_databases(DeleteDatabasesRequest {
            names: vec!["temp1".to_string(), "temp2".to_string()],
        });
        assert_eq!(data(&reply)["status"], json!([{ "temp1": "success" }, { "temp2": "failed" }]));
    }

    #[test]
    fn blank_create_is_a_bad_request() {
        let reply = service(FakeFactory::new(FakeDriver::default()))
            .create_database(CreateDatabaseRequest { database: String::new() });
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_collection_is_not_found() {
        let driver = FakeDriver::new(vec![FakeDatabase::new("shop")]);
        let reply = service(FakeFactory::new(driver))
            .get_collection(CollectionQuery { database: "shop".to_string() }, "orders");
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
    }
}
