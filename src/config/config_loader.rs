use anyhow::{Context, Result, bail};

use super::{
    config_model::{Auth, Database, DotEnvyConfig, Server},
    stage::Stage,
};

const DEFAULT_COOKIE_NAME: &str = "auth_token";
const DEFAULT_TOKEN_TTL_SECONDS: i64 = 60 * 60 * 24 * 7;
const MIN_JWT_SECRET_LENGTH: usize = 32;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let server = Server {
        port: required("SERVER_PORT")?
            .parse()
            .context("SERVER_PORT is invalid")?,
        body_limit: required("SERVER_BODY_LIMIT")?
            .parse()
            .context("SERVER_BODY_LIMIT is invalid")?,
        timeout: required("SERVER_TIMEOUT")?
            .parse()
            .context("SERVER_TIMEOUT is invalid")?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
    };

    let jwt_secret = required("JWT_SECRET")?;
    if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
        bail!(
            "JWT_SECRET must be at least {} bytes long",
            MIN_JWT_SECRET_LENGTH
        );
    }

    let token_ttl_seconds = match std::env::var("AUTH_TOKEN_TTL_SECONDS") {
        Ok(raw) => raw
            .parse()
            .context("AUTH_TOKEN_TTL_SECONDS is invalid")?,
        Err(_) => DEFAULT_TOKEN_TTL_SECONDS,
    };

    let auth = Auth {
        jwt_secret,
        cookie_name: std::env::var("AUTH_COOKIE_NAME")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_string()),
        token_ttl_seconds,
    };

    Ok(DotEnvyConfig {
        server,
        database,
        auth,
        stage: get_stage(),
    })
}

pub fn get_stage() -> Stage {
    dotenvy::dotenv().ok();

    let stage_str = std::env::var("STAGE").unwrap_or("".to_string());
    Stage::try_from(&stage_str).unwrap_or_default()
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("{} is invalid", key))
}
