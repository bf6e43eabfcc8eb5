mod common;

use anyhow::Result;
use reqwest::StatusCode;
use sanqa_suq_api::auth::{ROLE_ADMIN, ROLE_CUSTOMER};
use serde_json::{json, Value};
use uuid::Uuid;

#[tokio::test]
async fn tree_respects_depth() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let pool = common::pool().await?;
    let fixture = common::seed_catalog(&pool).await?;
    let client = reqwest::Client::new();

    let url = server.url(&format!("/api/categories/{}", fixture.root));
    let bare: Value = client.get(&url).send().await?.json().await?;
    assert_eq!(bare["data"]["category_id"], fixture.root);
    assert!(bare["data"].get("children").is_none());

    let res = client.get(format!("{}?depth=1", url)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let one: Value = res.json().await?;
    let children: Vec<i64> = one["data"]["children"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["category_id"].as_i64().unwrap())
        .collect();
    assert_eq!(
        children,
        vec![fixture.cpus as i64, fixture.boards as i64, fixture.memory as i64]
    );

    let res = client.get(format!("{}?depth=-1", url)).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn admin_manages_categories() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = reqwest::Client::new();
    let admin = common::bearer(Uuid::new_v4(), ROLE_ADMIN);
    let customer = common::bearer(Uuid::new_v4(), ROLE_CUSTOMER);

    let res = client
        .post(server.url("/api/categories"))
        .header("authorization", &customer)
        .json(&json!({ "name": "Nope" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let parent: Value = client
        .post(server.url("/api/categories"))
        .header("authorization", &admin)
        .json(&json!({ "name": format!("Peripherals {}", Uuid::new_v4()) }))
        .send()
        .await?
        .json()
        .await?;
    let parent_id = parent["data"]["category_id"].as_i64().unwrap();

    let res = client
        .post(server.url("/api/categories"))
        .header("authorization", &admin)
        .json(&json!({ "name": "Keyboards", "parent_category_id": parent_id }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let child_id = res.json::<Value>().await?["data"]["category_id"].as_i64().unwrap();

    // Moving the parent under its own child would close a loop
    let res = client
        .put(server.url(&format!("/api/categories/{}", parent_id)))
        .header("authorization", &admin)
        .json(&json!({ "parent_category_id": child_id }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let ancestors: Value = client
        .get(server.url(&format!("/api/categories/{}/ancestors", child_id)))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(ancestors["data"].as_array().unwrap().len(), 2);

    let res = client
        .delete(server.url(&format!("/api/categories/{}", parent_id)))
        .header("authorization", &admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    for id in [child_id, parent_id] {
        let res = client
            .delete(server.url(&format!("/api/categories/{}", id)))
            .header("authorization", &admin)
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
    }

    let res = client.get(server.url(&format!("/api/categories/{}", parent_id))).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
