//! API user management commands.

use anyhow::Result;
use console::style;
use dialoguer::Password;
use secrecy::SecretString;

use crate::state::AppState;

/// Add a user to the password backend's store.
///
/// Prompts for the password (hidden, with confirmation) when not given.
pub async fn add_user(
    state: &AppState,
    username: &str,
    password: Option<String>,
    json: bool,
) -> Result<()> {
    if username.is_empty() {
        anyhow::bail!("username must not be empty");
    }

    let password = match password {
        Some(p) => p,
        None => Password::new()
            .with_prompt(format!("Password for '{username}'"))
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()?,
    };
    if password.is_empty() {
        anyhow::bail!("password must not be empty");
    }

    state
        .users
        .add_user(username, &SecretString::from(password))
        .await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "username": username, "added": true }))?
        );
    } else {
        println!(
            "\n  {} Added API user {}\n",
            style("✓").green().bold(),
            style(username).cyan()
        );
    }
    Ok(())
}

/// List usernames in the store.
pub async fn list_users(state: &AppState, json: bool) -> Result<()> {
    let users = state.users.list_users().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&users)?);
        return Ok(());
    }

    if users.is_empty() {
        println!(
            "\n  No API users. Add one with {}\n",
            style("dagctl users add <username>").cyan()
        );
        return Ok(());
    }

    println!();
    for user in &users {
        println!("  {}", style(user).bold());
    }
    println!();
    Ok(())
}
