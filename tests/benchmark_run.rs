//! Benchmark files assembled and run end to end against in-memory storage.

use docload::{assemble, BenchmarkConfig, ConfigError};
use docload_core::{CollectionName, Value};
use docload_generator::{BenchmarkPhase, InMemoryStorage, Query, Storage};
use docload_runner::Operation;
use std::path::Path;
use std::sync::Arc;

const SMALL_SHOP: &str = r#"
name: small-shop
pools:
  document: 16
  refill: 4
  load: 8
collections:
  - name: customers
    fields:
      - {name: email, generator: {type: pattern, pattern: "c{id}@example.com"}}
  - name: products
    mode: compute
    fields:
      - {name: sku, generator: {type: pattern, pattern: "SKU-{id}"}}
      - {name: price, generator: {type: int_range, min: 1, max: 100}}
  - name: orders
    fields:
      - {name: customer, generator: {type: reference_id, collection: customers}}
      - {name: lines, generator: {type: embed, collection: products}}
      - {name: status, generator: {type: one_of, values: [open, paid]}}
    references:
      - collection: customers
        count: {type: constant, value: 1}
        ids: {type: uniform_id, max: 40}
        selection: buffered
        buffer: {capacity: 20, batch_size: 10, retry_attempts: 50, retry_delay_ms: 20}
      - collection: products
        count: {type: uniform, lower: 1, upper: 4}
        ids: {type: uniform_id, max: 100}
        selection: compute
indexes:
  - {collection: orders, fields: [status]}
load:
  targets:
    - {collection: customers, count: 20}
    - {collection: orders, count: 50}
operations:
  - {name: new_order, type: write, collection: orders, id_offset: 1000}
  - {name: open_orders, type: read_field_equals, collection: orders, field: status, values: [open]}
transaction:
  mode: power_test
  sequence: [new_order, open_orders]
  repeat: 5
"#;

fn collection(name: &str) -> CollectionName {
    CollectionName::new(name).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_small_shop_end_to_end() {
    let config = BenchmarkConfig::from_yaml(SMALL_SHOP).unwrap();
    let storage = Arc::new(InMemoryStorage::new());
    let assembled = assemble(&config, storage.clone()).unwrap();

    let report = tokio_test::assert_ok!(assembled.benchmark.run().await);
    assert!(assembled.context.phases().has_ended());
    assert_eq!(report.name, "small-shop");
    assert_eq!(report.total_failures(), 0);
    assert_eq!(report.phases.len(), 3);

    let load = report.phase(BenchmarkPhase::Load).unwrap();
    assert_eq!(load.succeeded, 70);
    let transaction = report.phase(BenchmarkPhase::Transaction).unwrap();
    assert_eq!(transaction.submitted, 10);
    assert_eq!(transaction.succeeded, 10);

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["name"], "small-shop");
    assert_eq!(json["phases"][1]["phase"], "load");

    let orders = collection("orders");
    let customers = collection("customers");
    assert_eq!(storage.count(&orders), 55);
    assert_eq!(storage.count(&collection("products")), 0);
    assert_eq!(storage.indexes().len(), 1);

    let all_orders = storage
        .execute_query(&Query {
            collection: orders.clone(),
            filter: docload_generator::QueryFilter::All,
            limit: None,
        })
        .await
        .unwrap();
    for order in &all_orders {
        let customer = *order.get("customer").unwrap().as_object_id().unwrap();
        assert!(
            storage.read(&customers, customer).await.unwrap().is_some(),
            "order {} references a missing customer",
            order.id()
        );
        let lines = order.get("lines").unwrap().as_array().unwrap();
        assert!((1..4).contains(&lines.len()));
        for line in lines {
            let product = line.as_document().unwrap();
            assert!(product.get("sku").and_then(Value::as_str).unwrap().starts_with("SKU-"));
        }
    }
}

#[test]
fn test_shipped_benchmarks_are_valid() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("benchmarks");
    let path = dir.join("shop.yaml");
    let config = BenchmarkConfig::from_file(&path).unwrap();
    assert_eq!(config.name, "shop");

    let assembled = assemble(&config, Arc::new(InMemoryStorage::new())).unwrap();
    assert_eq!(assembled.context.registered_collections().len(), 4);
    assert_eq!(assembled.operations.len(), 3);
}

#[test]
fn test_invalid_benchmark_is_rejected_before_running() {
    let broken = SMALL_SHOP.replace("sequence: [new_order, open_orders]", "sequence: [refund]");
    assert!(matches!(
        BenchmarkConfig::from_yaml(&broken),
        Err(ConfigError::UnknownOperation(name)) if name == "refund"
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_field_equals_matches_generated_integers() {
    let yaml = r#"
name: stock
collections:
  - name: items
    fields:
      - {name: qty, generator: {type: int_range, min: 5, max: 5}}
load:
  targets:
    - {collection: items, count: 10}
operations:
  - {name: five_in_stock, type: read_field_equals, collection: items, field: qty, values: [5]}
  - {name: six_in_stock, type: read_field_equals, collection: items, field: qty, values: [6]}
"#;
    let config = BenchmarkConfig::from_yaml(yaml).unwrap();
    let assembled = assemble(&config, Arc::new(InMemoryStorage::new())).unwrap();
    assembled.benchmark.run().await.unwrap();

    let five = assembled.operations.get("five_in_stock").unwrap();
    assert_eq!(five.execute().await.unwrap(), 10);
    let six = assembled.operations.get("six_in_stock").unwrap();
    assert_eq!(six.execute().await.unwrap(), 0);
}
