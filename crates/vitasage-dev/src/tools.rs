//! Session utilities built on the core API client.
//!
//! These let a developer log in against a running backend, inspect the
//! stored session and manage staff accounts without the web UI.

use std::io::{self, BufRead};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::broadcast::error::TryRecvError;
use vitasage_core::models::{HospitalCreate, Role, UserCreate, UserOut};
use vitasage_core::{
    ApiClient, AuthEvent, BaseUrlPolicy, ClientConfig, CredentialStore, FileStore, KeyringStore,
    NoopNavigator,
};

/// Where the CLI keeps its credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    File,
    Keyring,
}

/// Build the client used by every session command.
pub fn build_client(store: StoreKind, allow_fallback_url: bool) -> Result<ApiClient> {
    let policy = if allow_fallback_url {
        BaseUrlPolicy::Fallback
    } else {
        BaseUrlPolicy::Strict
    };
    let config = ClientConfig::from_env(policy);

    let store: Arc<dyn CredentialStore> = match store {
        StoreKind::File => Arc::new(FileStore::new(ClientConfig::storage_dir()?)),
        StoreKind::Keyring => Arc::new(KeyringStore::new()),
    };

    ApiClient::new(config, store, Arc::new(NoopNavigator))
}

/// Read a password from stdin or prompt for it without echo.
pub fn read_password(from_stdin: bool, prompt: &str) -> Result<String> {
    if from_stdin {
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read password from stdin")?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    } else {
        rpassword::prompt_password(prompt).context("Failed to read password")
    }
}

pub async fn login(client: &ApiClient, hospital_id: &str, username: &str, password: &str) -> Result<()> {
    let user = client.login(hospital_id, username, password).await?;
    println!(
        "Logged in as {} ({}) at hospital {}",
        user.display_name(),
        user.role,
        user.hospital_id
    );
    Ok(())
}

pub fn logout(client: &ApiClient) -> Result<()> {
    client.logout()?;
    println!("Logged out");
    Ok(())
}

pub async fn whoami(client: &ApiClient) -> Result<()> {
    if !client.session().is_authenticated() {
        println!("Not logged in");
        return Ok(());
    }
    let me = client.me().await?;
    println!("{}", format_user(&me));
    if let Some(cached) = client.session().user() {
        println!("Session started {}", cached.logged_in_at.format("%Y-%m-%d %H:%M UTC"));
    }
    Ok(())
}

pub async fn list_users(client: &ApiClient, json: bool) -> Result<()> {
    let users = client.list_users().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&users)?);
    } else {
        for user in &users {
            println!("{}", format_user(user));
        }
        println!("{} users", users.len());
    }
    Ok(())
}

pub async fn create_user(
    client: &ApiClient,
    username: &str,
    role: &str,
    full_name: Option<String>,
    email: Option<String>,
    password: String,
) -> Result<()> {
    let role = Role::parse(role)
        .ok_or_else(|| anyhow::anyhow!("Invalid role '{}': expected admin, doctor or staff", role))?;
    let payload = UserCreate {
        username: username.trim().to_lowercase(),
        email,
        password,
        role,
        full_name,
    };
    let user = client.create_user(&payload).await?;
    println!("Created {}", format_user(&user));
    Ok(())
}

pub async fn toggle_user(client: &ApiClient, user_id: i64) -> Result<()> {
    let user = client.toggle_user_status(user_id).await?;
    println!("{}", format_user(&user));
    Ok(())
}

pub async fn register_hospital(client: &ApiClient, payload: HospitalCreate) -> Result<()> {
    let response = client.register_hospital(&payload).await?;
    println!("{}", response.message);
    Ok(())
}

/// Print a hint when the last command cleared the session.
pub fn report_auth_events(events: &mut tokio::sync::broadcast::Receiver<AuthEvent>) {
    loop {
        match events.try_recv() {
            Ok(AuthEvent::Unauthorized { .. }) => {
                eprintln!("Session expired or rejected. Run `vitasage-dev login` again.");
            }
            Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
}

fn format_user(user: &UserOut) -> String {
    format!(
        "#{:<4} {:<20} {:<7} {:<9} {}",
        user.id,
        user.username,
        user.role,
        user.display_status(),
        user.full_name.as_deref().unwrap_or("-")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_user() {
        let user = UserOut {
            id: 3,
            username: "asha".to_string(),
            email: None,
            role: "doctor".to_string(),
            full_name: Some("Asha Rao".to_string()),
            status: false,
            last_login: None,
        };
        let line = format_user(&user);
        assert!(line.starts_with("#3"));
        assert!(line.contains("disabled"));
        assert!(line.ends_with("Asha Rao"));
    }
}
