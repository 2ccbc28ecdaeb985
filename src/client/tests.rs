#![cfg(test)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use http_body_util::BodyExt;
use mongodb::bson::doc;
use serde_json::Value;
use tokio::runtime::Runtime;
use tower::ServiceExt;

use crate::api::routes::build_router;
use crate::api::service::AdminService;
use crate::client::api::{Exchange, Method};
use crate::client::console::{Console, ConsoleMessage};
use crate::client::status::LoadStatus;
use crate::client::store::Message;
use crate::mongo::connection::DatabaseFilters;
use crate::mongo::fake::{FakeDatabase, FakeDriver, FakeFactory};

struct RouterExchange {
    runtime: Runtime,
    router: Router,
}

impl RouterExchange {
    fn new(factory: FakeFactory, filters: DatabaseFilters) -> Self {
        let service = AdminService::new(Arc::new(factory), filters, "foo");
        Self {
            runtime: Runtime::new().expect("test runtime"),
            router: build_router(Arc::new(service)),
        }
    }

    fn serving(driver: FakeDriver) -> Self {
        Self::new(FakeFactory::new(driver), DatabaseFilters::default())
    }
}

impl Exchange for &RouterExchange {
    fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, String> {
        let builder = Request::builder()
            .method(match method {
                Method::Get => "GET",
                Method::Post => "POST",
            })
            .uri(path);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .map_err(|err| err.to_string())?;

        self.runtime.block_on(async {
            let response = self.router.clone().oneshot(request).await.map_err(|err| err.to_string())?;
            let bytes = response.into_body().collect().await.map_err(|err| err.to_string())?;
            serde_json::from_slice(&bytes.to_bytes()).map_err(|err| err.to_string())
        })
    }
}

fn database_names(console: &Console) -> Vec<&str> {
    console.databases.items().iter().map(|database| database.name.as_str()).collect()
}

#[test]
fn browse_databases_and_collections() {
    let driver = FakeDriver::new(vec![
        FakeDatabase::new("admin"),
        FakeDatabase::new("shop")
            .with_collection("orders", vec![doc! { "sku": "a-1" }, doc! { "sku": "b-2" }])
            .with_collection("users", Vec::new()),
    ]);
    let exchange = RouterExchange::serving(driver);
    let mut console = Console::new();

    console.dispatch(&&exchange, ConsoleMessage::Database(Message::LoadList));
    assert_eq!(console.databases.list_status(), LoadStatus::Loaded);
    assert_eq!(database_names(&console), vec!["admin", "shop"]);
    assert_eq!(console.databases.items()[1].id, Some(1));

    console.dispatch(&&exchange, ConsoleMessage::Database(Message::LoadItem("shop".into())));
    assert_eq!(console.databases.item_status(), LoadStatus::Loaded);
    let collections: Vec<&str> =
        console.collections.items().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(collections, vec!["orders", "users"]);

    console.dispatch(&&exchange, ConsoleMessage::Collection(Message::LoadItem("orders".into())));
    let orders = console.collections.active_item().expect("orders loaded");
    assert_eq!(orders.count, Some(2));
    assert_eq!(orders.objects.as_ref().map(Vec::len), Some(2));
}

#[test]
fn created_database_is_appended_with_next_id() {
    let driver = FakeDriver::new(vec![FakeDatabase::new("admin"), FakeDatabase::new("local")]);
    let exchange = RouterExchange::serving(driver.clone());
    let mut console = Console::new();

    console.dispatch(&&exchange, ConsoleMessage::Database(Message::LoadList));
    console.dispatch(&&exchange, ConsoleMessage::Database(Message::Create("shop".into())));

    assert_eq!(console.databases.create_status(), LoadStatus::Loaded);
    assert_eq!(database_names(&console), vec!["admin", "local", "shop"]);
    let created = &console.databases.items()[2];
    assert_eq!(created.id, Some(4));
    assert_eq!(created.collections[0].name, "foo");
    assert!(driver.database_names().contains(&"shop".to_string()));
}

#[test]
fn partial_delete_keeps_the_database_that_failed() {
    let driver = FakeDriver::new(vec![
        FakeDatabase::new("admin"),
        FakeDatabase::new("temp1"),
        FakeDatabase::new("temp2").with_drop_ack(Ok(doc! { "dropped": "temp2", "ok": 0 })),
    ]);
    let exchange = RouterExchange::serving(driver);
    let mut console = Console::new();

    console.dispatch(&&exchange, ConsoleMessage::Database(Message::LoadList));
    let names = vec!["temp1".to_string(), "temp2".to_string()];
    console.dispatch(&&exchange, ConsoleMessage::Database(Message::Delete(names)));

    assert_eq!(console.databases.delete_status(), LoadStatus::Loaded);
    assert_eq!(database_names(&console), vec!["admin", "temp2"]);
}

#[test]
fn blank_create_reports_failure_and_keeps_list() {
    let exchange = RouterExchange::serving(FakeDriver::new(vec![FakeDatabase::new("admin")]));
    let mut console = Console::new();

    console.dispatch(&&exchange, ConsoleMessage::Database(Message::LoadList));
    console.dispatch(&&exchange, ConsoleMessage::Database(Message::Create("   ".into())));

    assert_eq!(console.databases.create_status(), LoadStatus::Failed);
    assert_eq!(console.databases.list_status(), LoadStatus::Loaded);
    assert_eq!(database_names(&console), vec!["admin"]);
    assert!(console.databases.last_error().is_some());
}

#[test]
fn unreachable_server_fails_the_list_and_notifies() {
    let exchange = RouterExchange::new(FakeFactory::unreachable(), DatabaseFilters::default());
    let mut console = Console::new();

    console.dispatch(&&exchange, ConsoleMessage::Database(Message::LoadList));

    assert_eq!(console.databases.list_status(), LoadStatus::Failed);
    assert!(console.databases.items().is_empty());
    let error = console.databases.last_error().expect("error recorded");
    assert!(error.message.contains("server selection timeout"));
    let notifications = console.take_notifications();
    assert_eq!(
        notifications[0].message,
        "No databases were returned from the api - please try again later"
    );
}

#[test]
fn collections_created_in_a_database_show_up_in_its_view() {
    let driver = FakeDriver::new(vec![FakeDatabase::new("shop").with_collection("orders", Vec::new())]);
    let exchange = RouterExchange::serving(driver);
    let mut console = Console::new();

    console.dispatch(&&exchange, ConsoleMessage::Database(Message::LoadItem("shop".into())));
    console.dispatch(&&exchange, ConsoleMessage::Collection(Message::Create("carts".into())));

    assert_eq!(console.collections.create_status(), LoadStatus::Loaded);
    let database = console.databases.active_item().expect("shop loaded");
    let names: Vec<&str> = database.collections.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["orders", "carts"]);
}
