#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use sanqa_suq_api::auth::{generate_jwt, Claims};
use sanqa_suq_api::config::SecurityConfig;
use sqlx::PgPool;
use uuid::Uuid;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub const JWT_SECRET: &str = "integration-secret";
pub const JWT_ISSUER: &str = "sanqa-suq-integration";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_sanqa-suq-api"));
        cmd.env("SANQA_API_PORT", port.to_string())
            .env("APP_ENV", "development")
            .env("DATABASE_RUN_MIGRATIONS", "true")
            .env("JWT_SECRET", JWT_SECRET)
            .env("JWT_ISSUER", JWT_ISSUER)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;
        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// The shared server, or `None` when no database is configured and the
/// suite should be skipped.
pub async fn ensure_server() -> Result<Option<&'static TestServer>> {
    let _ = dotenvy::dotenv();
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set; skipping integration test");
        return Ok(None);
    }

    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(20)).await?;
    Ok(Some(server))
}

pub async fn pool() -> Result<PgPool> {
    let url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    Ok(PgPool::connect(&url).await?)
}

pub fn bearer(user_id: Uuid, role: &str) -> String {
    let security = SecurityConfig {
        enable_cors: false,
        cors_origins: Vec::new(),
        jwt_secret: JWT_SECRET.to_string(),
        jwt_issuer: JWT_ISSUER.to_string(),
        jwt_expiry_hours: 1,
    };
    let claims = Claims::new(user_id, role, "integration@example.com", &security);
    format!("Bearer {}", generate_jwt(&claims, &security).expect("token"))
}

/// Products seeded under a fresh category subtree:
///
/// Integration <uuid>
/// ├── CPUs: cpu (AM5)
/// ├── Motherboards: board_am5, board_lga
/// └── Memory: ram (DDR5)
pub struct Fixture {
    pub root: i32,
    pub cpus: i32,
    pub boards: i32,
    pub memory: i32,
    pub cpu: i32,
    pub board_am5: i32,
    pub board_lga: i32,
    pub ram: i32,
}

async fn category(pool: &PgPool, name: &str, parent: Option<i32>) -> Result<i32> {
    Ok(sqlx::query_scalar(
        "INSERT INTO categories (name, parent_category_id) VALUES ($1, $2) RETURNING category_id",
    )
    .bind(name)
    .bind(parent)
    .fetch_one(pool)
    .await?)
}

async fn product(
    pool: &PgPool,
    category_id: i32,
    brand_id: i32,
    name: &str,
    price: &str,
    specs: &[(&str, &str)],
) -> Result<i32> {
    let id: i32 = sqlx::query_scalar(
        "INSERT INTO products (category_id, brand_id, name, price, stock_quantity)
         VALUES ($1, $2, $3, $4::numeric, 10)
         RETURNING product_id",
    )
    .bind(category_id)
    .bind(brand_id)
    .bind(name)
    .bind(price)
    .fetch_one(pool)
    .await?;

    for (spec_name, spec_value) in specs {
        sqlx::query("INSERT INTO product_specs (product_id, spec_name, spec_value) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(spec_name)
            .bind(spec_value)
            .execute(pool)
            .await?;
    }
    Ok(id)
}

pub async fn seed_catalog(pool: &PgPool) -> Result<Fixture> {
    let tag = Uuid::new_v4().simple().to_string();
    let brand: i32 = sqlx::query_scalar("INSERT INTO brands (name) VALUES ($1) RETURNING brand_id")
        .bind(format!("Brand {}", tag))
        .fetch_one(pool)
        .await?;

    let root = category(pool, &format!("Integration {}", tag), None).await?;
    let cpus = category(pool, "CPUs", Some(root)).await?;
    let boards = category(pool, "Motherboards", Some(root)).await?;
    let memory = category(pool, "Memory", Some(root)).await?;

    let cpu = product(pool, cpus, brand, "Ryzen 7 7700X", "299.00", &[
        ("socket", "AM5"),
        ("memory_type", "DDR5"),
        ("tdp", "105W"),
    ])
    .await?;
    let board_am5 = product(pool, boards, brand, "B650 Tomahawk", "189.99", &[
        ("socket", "AM5"),
        ("memory_type", "DDR5"),
    ])
    .await?;
    let board_lga = product(pool, boards, brand, "Z790 Prime", "209.99", &[
        ("socket", "LGA1700"),
        ("memory_type", "DDR4/DDR5"),
    ])
    .await?;
    let ram = product(pool, memory, brand, "Vengeance 16GB", "45.50", &[("memory_type", "DDR5")]).await?;

    Ok(Fixture {
        root,
        cpus,
        boards,
        memory,
        cpu,
        board_am5,
        board_lga,
        ram,
    })
}
