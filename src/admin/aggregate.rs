use log::{debug, warn};

use crate::admin::model::{CollectionEntity, DatabaseEntity, document_to_json};
use crate::admin::stats::fetch_stats;
use crate::mongo::connection::DatabaseFilters;
use crate::mongo::driver::AdminDriver;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatabaseListing {
    pub databases: Vec<DatabaseEntity>,
    pub error: Option<String>,
}

pub fn aggregate_all(driver: &dyn AdminDriver, filters: &DatabaseFilters) -> DatabaseListing {
    let names = match driver.list_databases() {
        Ok(names) => filters.apply(names),
        Err(error) => {
            warn!("listDatabases failed: {error}");
            return DatabaseListing { databases: Vec::new(), error: Some(error.to_string()) };
        }
    };

    let mut databases = Vec::with_capacity(names.len());
    let mut index = 0;
    for name in names {
        let entity = DatabaseEntity {
            id: Some(index),
            stats: fetch_stats(driver, &name),
            collections: collection_summaries(driver, &name),
            name,
        };
        databases.push(entity);
        index += 1;
    }

    debug!("listed {} databases", databases.len());
    DatabaseListing { databases, error: None }
}

pub fn aggregate_one(driver: &dyn AdminDriver, database: &str) -> DatabaseEntity {
    DatabaseEntity {
        id: None,
        name: database.to_string(),
        stats: fetch_stats(driver, database),
        collections: collection_details(driver, database),
    }
}

pub fn collection_summaries(driver: &dyn AdminDriver, database: &str) -> Vec<CollectionEntity> {
    list_collection_names(driver, database)
        .into_iter()
        .enumerate()
        .map(|(id, name)| CollectionEntity::summary(id, name))
        .collect()
}

pub fn collection_details(driver: &dyn AdminDriver, database: &str) -> Vec<CollectionEntity> {
    list_collection_names(driver, database)
        .into_iter()
        .enumerate()
        .map(|(id, name)| load_detail(driver, database, id, name))
        .collect()
}

pub fn collection_detail(
    driver: &dyn AdminDriver,
    database: &str,
    collection: &str,
) -> Option<CollectionEntity> {
    list_collection_names(driver, database)
        .into_iter()
        .position(|name| name == collection)
        .map(|id| load_detail(driver, database, id, collection.to_string()))
}

fn list_collection_names(driver: &dyn AdminDriver, database: &str) -> Vec<String> {
    driver.list_collections(database).unwrap_or_else(|error| {
        warn!("listCollections failed for {database}: {error}");
        Vec::new()
    })
}

fn load_detail(
    driver: &dyn AdminDriver,
    database: &str,
    id: usize,
    name: String,
) -> CollectionEntity {
    let objects = match driver.find_documents(database, &name) {
        Ok(documents) => documents.into_iter().map(document_to_json).collect(),
        Err(error) => {
            warn!("find failed for {database}.{name}: {error}");
            Vec::new()
        }
    };
    CollectionEntity::detail(id, name, objects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mongo::fake::{FakeDatabase, FakeDriver};
    use mongodb::bson::doc;
    use serde_json::json;

    fn no_filters() -> DatabaseFilters {
        DatabaseFilters::default()
    }

    #[test]
    fn one_failing_stats_does_not_shrink_listing() {
        let driver = FakeDriver::new(vec![
            FakeDatabase::new("a"),
            FakeDatabase::new("b").with_failing_stats(),
            FakeDatabase::new("c"),
        ]);

        let listing = aggregate_all(&driver, &no_filters());

        assert!(listing.error.is_none());
        assert_eq!(listing.databases.len(), 3);
        assert!(listing.databases[1].stats.is_empty());
        assert!(!listing.databases[0].stats.is_empty());
        assert!(!listing.databases[2].stats.is_empty());
    }

    #[test]
    fn ids_follow_enumeration_even_across_failures() {
        let driver = FakeDriver::new(vec![
            FakeDatabase::new("admin"),
            FakeDatabase::new("logs").with_failing_stats().with_failing_collections(),
            FakeDatabase::new("shop"),
        ]);

        let listing = aggregate_all(&driver, &no_filters());
        let ids: Vec<_> = listing.databases.iter().map(|db| db.id).collect();
        assert_eq!(ids, vec![Some(0), Some(1), Some(2)]);
        assert!(listing.databases[1].collections.is_empty());
    }

    #[test]
    fn summary_mode_omits_documents() {
        let driver = FakeDriver::new(vec![
            FakeDatabase::new("shop")
                .with_collection("orders", vec![doc! { "total": 5 }])
                .with_collection("users", vec![]),
        ]);

        let listing = aggregate_all(&driver, &no_filters());
        let collections = &listing.databases[0].collections;
        assert_eq!(
            collections,
            &vec![CollectionEntity::summary(0, "orders"), CollectionEntity::summary(1, "users")]
        );
        assert!(!driver.calls().iter().any(|call| call.starts_with("find")));
    }

    #[test]
    fn listing_error_is_reported_separately() {
        let driver = FakeDriver::failing_listing("not authorized on admin");
        let listing = aggregate_all(&driver, &no_filters());
        assert!(listing.databases.is_empty());
        assert_eq!(listing.error.as_deref(), Some("not authorized on admin"));

        let empty = aggregate_all(&FakeDriver::new(Vec::new()), &no_filters());
        assert!(empty.databases.is_empty());
        assert!(empty.error.is_none());
    }

    #[test]
    fn filters_are_applied_before_ids_are_assigned() {
        let driver = FakeDriver::new(vec![
            FakeDatabase::new("admin"),
            FakeDatabase::new("local"),
            FakeDatabase::new("shop"),
        ]);

        let listing = aggregate_all(&driver, &DatabaseFilters::new("", "local"));
        let names: Vec<_> = listing.databases.iter().map(|db| (db.id, db.name.as_str())).collect();
        assert_eq!(names, vec![(Some(0), "admin"), (Some(1), "shop")]);
    }

    #[test]
    fn detail_mode_carries_documents_and_counts() {
        let driver = FakeDriver::new(vec![
            FakeDatabase::new("shop")
                .with_collection("orders", vec![doc! { "total": 5 }, doc! { "total": 7 }])
                .with_broken_collection("audit"),
        ]);

        let database = aggregate_one(&driver, "shop");
        assert_eq!(database.id, None);
        assert_eq!(database.name, "shop");
        assert_eq!(database.collections.len(), 2);

        let orders = &database.collections[0];
        assert_eq!(orders.count, Some(2));
        assert_eq!(orders.objects.as_ref().map(Vec::len), Some(2));
        assert_eq!(orders.objects.as_ref().unwrap()[1], json!({ "total": 7 }));

        let audit = &database.collections[1];
        assert_eq!((audit.id, audit.count), (1, Some(0)));
    }

    #[test]
    fn single_collection_lookup_uses_listing_position() {
        let driver = FakeDriver::new(vec![
            FakeDatabase::new("shop")
                .with_collection("orders", vec![])
                .with_collection("users", vec![doc! { "name": "ann" }]),
        ]);

        let users = collection_detail(&driver, "shop", "users").expect("users exists");
        assert_eq!(users.id, 1);
        assert_eq!(users.count, Some(1));
        assert!(collection_detail(&driver, "shop", "missing").is_none());
    }
}
