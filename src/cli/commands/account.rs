use std::path::Path;

use super::{App, prompt, stdin_lines};
use crate::config::Config;

async fn password_or_prompt(password: Option<String>) -> anyhow::Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    let mut lines = stdin_lines();
    let entered = prompt(&mut lines, "Password: ").await?.unwrap_or_default();
    if entered.is_empty() {
        anyhow::bail!("A password is required");
    }
    Ok(entered)
}

pub async fn cmd_login(app: &App, username: &str, password: Option<String>) -> anyhow::Result<()> {
    let password = password_or_prompt(password).await?;
    let result = app.store.login(username, &password).await;
    app.flush_events();
    result?;
    Ok(())
}

pub async fn cmd_register(
    app: &App,
    username: &str,
    email: &str,
    password: Option<String>,
) -> anyhow::Result<()> {
    let password = password_or_prompt(password).await?;
    let account = app.store.register(username, email, &password).await?;
    println!("✓ Account '{}' created (id {})", account.username, account.id);
    println!("Log in with: anitinder login {}", account.username);
    Ok(())
}

pub async fn cmd_logout(app: &App) -> anyhow::Result<()> {
    app.store.logout().await;
    app.flush_events();
    Ok(())
}

pub async fn cmd_whoami(app: &App) -> anyhow::Result<()> {
    let user = app.require_login().await?;
    println!("{} (id {})", user.username, user.id);
    println!("API: {}", app.api().base_url());
    Ok(())
}

pub fn cmd_init(path: Option<&Path>) -> anyhow::Result<()> {
    let path = path.map_or_else(Config::default_config_path, Path::to_path_buf);
    if Config::create_default_if_missing(&path)? {
        println!("✓ Created {}", path.display());
    } else {
        println!("Config file already exists: {}", path.display());
    }
    Ok(())
}
