use clap::Args;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims, ROLE_CUSTOMER};
use crate::cli::{utils::output_success, OutputFormat};
use crate::config;

#[derive(Debug, Args)]
pub struct TokenArgs {
    #[arg(long, help = "User id (random when omitted)")]
    pub user_id: Option<Uuid>,

    #[arg(long, default_value = ROLE_CUSTOMER, help = "Role claim: customer or admin")]
    pub role: String,

    #[arg(long, default_value = "dev@sanqa.local", help = "Email claim")]
    pub email: String,
}

pub fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let security = &config::config().security;
    let user_id = args.user_id.unwrap_or_else(Uuid::new_v4);

    let claims = Claims::new(user_id, &args.role, &args.email, security);
    let token = generate_jwt(&claims, security)?;

    match output_format {
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
        OutputFormat::Json => output_success(
            output_format,
            "Token issued",
            Some(json!({
                "token": token,
                "user_id": user_id,
                "role": claims.role,
                "expires_at": claims.exp,
            })),
        ),
    }
}
