// tests/table_mutations.rs
//! Inserts, updates, appends and deletes keep the cache in step with the service.

mod common;

use common::*;
use indexmap::IndexMap;
use notion_table::{AppError, Condition};
use pretty_assertions::assert_eq;
use reqwest::Method;
use serde_json::json;

fn values(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
    pairs
        .iter()
        .map(|(column, value)| (column.to_string(), value.to_string()))
        .collect()
}

fn task_database() -> ScriptedTransport {
    let transport = ScriptedTransport::new();
    transport.reply(Method::POST, DATABASE_PATH, 200, listing(task_rows(), None));
    transport
}

#[tokio::test]
async fn successful_update_is_mirrored() {
    let transport = task_database();
    transport.reply(Method::PATCH, "pages/", 200, json!({ "object": "page" }));
    let mut table = table(database_config(), &transport);

    let outcomes = table
        .update(&values(&[("Status", "blocked")]), &Condition::new().eq("Status", "todo"))
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.is_success()));
    assert_eq!(outcomes[0].target_id, uuid(1));

    let patches = transport.calls_to(Method::PATCH, "pages/");
    assert_eq!(patches[0].endpoint, format!("pages/{}", uuid(1)));
    assert_eq!(
        patches[0].body.as_ref().unwrap(),
        &json!({
            "properties": {
                "Status": {
                    "type": "rich_text",
                    "rich_text": [{"type": "text", "text": {"content": "blocked"}, "plain_text": "blocked"}]
                }
            }
        })
    );

    let blocked = table
        .query(&["id"], &Condition::new().eq("Status", "blocked"))
        .await
        .unwrap();
    assert_eq!(blocked.texts(), vec![uuid(1), uuid(3)]);
    assert_eq!(transport.calls_to(Method::POST, DATABASE_PATH).len(), 1);
}

#[tokio::test]
async fn rejected_update_leaves_row_untouched() {
    let transport = task_database();
    transport
        .reply(Method::PATCH, &format!("pages/{}", uuid(1)), 200, json!({}))
        .reply(
            Method::PATCH,
            &format!("pages/{}", uuid(3)),
            400,
            error_body(400, "validation_error"),
        );
    let mut table = table(database_config(), &transport);

    let outcomes = table
        .update(&values(&[("Name", "Renamed")]), &Condition::new().eq("Status", "todo"))
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].is_success());
    assert_eq!(outcomes[1].status, 400);
    assert!(outcomes[1].body.contains("validation_error"));

    let loaded = table.get_table().await.unwrap();
    assert_eq!(loaded.row(&uuid(1)).unwrap().text("Name"), "Renamed");
    assert_eq!(loaded.row(&uuid(3)).unwrap().text("Name"), "Plan sprint");
}

#[tokio::test]
async fn unknown_columns_are_rejected_before_any_call() {
    let transport = task_database();
    let mut table = table(database_config(), &transport);

    let err = table
        .update(&values(&[("Owner", "me")]), &Condition::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::UnknownColumn(ref column) if column == "Owner"));
    assert!(transport.calls_to(Method::PATCH, "pages/").is_empty());
}

#[tokio::test]
async fn emptied_url_reads_back_as_space() {
    let transport = ScriptedTransport::new();
    transport
        .reply(
            Method::POST,
            DATABASE_PATH,
            200,
            listing(
                vec![database_row(&uuid(1), json!({ "Name": title("A"), "Link": url(Some("https://a.example")) }))],
                None,
            ),
        )
        .reply(Method::PATCH, "pages/", 200, json!({}));
    let mut table = table(database_config(), &transport);

    table
        .update(&values(&[("Link", "")]), &Condition::new())
        .await
        .unwrap();

    let patch = &transport.calls_to(Method::PATCH, "pages/")[0];
    assert_eq!(patch.body.as_ref().unwrap()["properties"]["Link"]["url"], " ");
    assert_eq!(table.get_table().await.unwrap().rows[0].text("Link"), " ");
}

#[tokio::test]
async fn append_concatenates_current_values() {
    let transport = task_database();
    transport.reply(Method::PATCH, "pages/", 200, json!({}));
    let mut table = table(database_config(), &transport);

    let outcomes = table
        .append(&values(&[("Name", " (late)")]), &Condition::new().eq("Status", "todo"))
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 2);

    let patches = transport.calls_to(Method::PATCH, "pages/");
    assert_eq!(
        patches[1].body.as_ref().unwrap()["properties"]["Name"]["title"][0]["plain_text"],
        "Plan sprint (late)"
    );

    let names = table.query(&["Name"], &Condition::new()).await.unwrap();
    assert_eq!(
        names.texts(),
        vec!["Write report (late)", "Ship release", "Plan sprint (late)"]
    );
}

#[tokio::test]
async fn delete_removes_only_accepted_rows() {
    let transport = task_database();
    transport
        .reply(Method::DELETE, &format!("blocks/{}", uuid(1)), 200, json!({}))
        .reply(
            Method::DELETE,
            &format!("blocks/{}", uuid(3)),
            403,
            error_body(403, "restricted_resource"),
        );
    let mut table = table(database_config(), &transport);

    let outcomes = table
        .delete(&Condition::new().eq("Status", "todo"))
        .await
        .unwrap();

    assert_eq!(
        outcomes.iter().map(|o| o.status).collect::<Vec<_>>(),
        vec![200, 403]
    );
    let remaining = table.query(&["id"], &Condition::new()).await.unwrap();
    assert_eq!(remaining.texts(), vec![uuid(2), uuid(3)]);
}

#[tokio::test]
async fn insert_fills_every_writable_column() {
    let transport = task_database();
    transport.reply(
        Method::POST,
        "pages",
        200,
        database_row(&uuid(4), json!({ "Name": title("New task"), "Status": rich_text("") })),
    );
    let mut table = table(database_config(), &transport);

    let outcome = table
        .insert(&values(&[("Name", "New task")]))
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(outcome.target_id, uuid(4));

    let create = &transport.calls_to(Method::POST, "pages")[0];
    let body = create.body.as_ref().unwrap();
    assert_eq!(
        body["parent"],
        json!({ "database_id": "01234567-89ab-cdef-0123-456789abcdef" })
    );
    assert_eq!(body["properties"]["Name"]["title"][0]["plain_text"], "New task");
    assert_eq!(body["properties"]["Status"]["rich_text"][0]["plain_text"], "");

    let loaded = table.get_table().await.unwrap();
    assert_eq!(loaded.len(), 4);
    assert_eq!(loaded.rows[3].text("Name"), "New task");
}

#[tokio::test]
async fn rejected_insert_changes_nothing() {
    let transport = task_database();
    transport.reply(Method::POST, "pages", 429, error_body(429, "rate_limited"));
    let mut table = table(database_config(), &transport);

    let outcome = table
        .insert(&values(&[("Name", "Never stored")]))
        .await
        .unwrap();

    assert_eq!(outcome.status, 429);
    assert_eq!(table.row_count().await.unwrap(), 3);
}

#[tokio::test]
async fn transport_failure_stops_update_batch() {
    let transport = task_database();
    transport
        .reply(Method::PATCH, &format!("pages/{}", uuid(1)), 200, json!({}))
        .time_out(Method::PATCH, &format!("pages/{}", uuid(3)));
    let mut table = table(database_config(), &transport);

    let err = table
        .update(&values(&[("Status", "blocked")]), &Condition::new().eq("Status", "todo"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Timeout { .. }));

    let statuses = table.query(&["Status"], &Condition::new()).await.unwrap();
    assert_eq!(statuses.texts(), vec!["blocked", "done", "todo"]);
    assert_eq!(transport.calls_to(Method::PATCH, "pages/").len(), 2);
}

#[tokio::test]
async fn transport_failure_stops_delete_batch() {
    let transport = task_database();
    transport
        .reply(Method::DELETE, &format!("blocks/{}", uuid(1)), 200, json!({}))
        .time_out(Method::DELETE, &format!("blocks/{}", uuid(3)));
    let mut table = table(database_config(), &transport);

    let err = table
        .delete(&Condition::new().eq("Status", "todo"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Timeout { .. }));

    let remaining = table.query(&["id"], &Condition::new()).await.unwrap();
    assert_eq!(remaining.texts(), vec![uuid(2), uuid(3)]);
}

#[tokio::test]
async fn update_of_read_only_columns_sends_nothing() {
    let transport = ScriptedTransport::new();
    transport.reply(
        Method::POST,
        DATABASE_PATH,
        200,
        listing(
            vec![database_row(
                &uuid(1),
                json!({ "Name": title("Write report"), "ID": unique_id(Some("TASK"), 1) }),
            )],
            None,
        ),
    );
    let mut table = table(database_config(), &transport);

    let outcomes = table
        .update(&values(&[("ID", "TASK-9")]), &Condition::new())
        .await
        .unwrap();

    assert!(outcomes.is_empty());
    assert!(transport.calls_to(Method::PATCH, "pages/").is_empty());
    let ids = table.query(&["ID"], &Condition::new()).await.unwrap();
    assert_eq!(ids.texts(), vec!["TASK-1"]);
}

#[tokio::test]
async fn insert_succeeds_when_new_row_cannot_be_mirrored() {
    let transport = ScriptedTransport::new();
    transport
        .reply(Method::POST, DATABASE_PATH, 200, listing(task_rows()[..1].to_vec(), None))
        .reply(Method::GET, &children_path(&uuid(1)), 200, listing(Vec::new(), None))
        .reply(
            Method::POST,
            "pages",
            200,
            database_row(&uuid(9), json!({ "Name": title("Nine") })),
        )
        .reply(
            Method::GET,
            &children_path(&uuid(9)),
            503,
            error_body(503, "service_unavailable"),
        );
    let mut table = table(database_config().with_recursion(true), &transport);

    let outcome = table.insert(&values(&[("Name", "Nine")])).await.unwrap();

    assert!(outcome.is_success());
    assert_eq!(outcome.target_id, uuid(9));
    assert_eq!(transport.calls_to(Method::POST, "pages").len(), 1);

    // The cache was dropped, so the next read goes back to the service.
    assert_eq!(table.row_count().await.unwrap(), 1);
    assert_eq!(transport.calls_to(Method::POST, DATABASE_PATH).len(), 2);
}
