mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn health_endpoint_reports_database() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };

    let res = reqwest::get(server.url("/health")).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["database"], "ok");
    Ok(())
}

#[tokio::test]
async fn root_describes_the_service() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };

    let body = reqwest::get(server.url("/")).await?.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["name"], "Sanqa Suq API");
    Ok(())
}
