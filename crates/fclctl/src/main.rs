use anyhow::{Context, Result};
use secrecy::ExposeSecret;
use std::path::Path;
use std::sync::Arc;

mod cli;

use cli::{Cli, Commands};
use fclcore::core::{init_logger, ClientConfig};
use fclcore::telegram::{InitData, WebAppHost};
use fclcore::{Draft, DraftClient, PageContext};

/// Entry point for the registration CLI
///
/// # Errors
/// Returns an error if configuration is invalid or the API call fails.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenvy::dotenv();
    let staging_env = cli.staging.then(|| dotenvy::from_filename(".env.staging"));

    let config = ClientConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    init_logger(&config.log_level)?;

    if let Some(Err(e)) = staging_env {
        tracing::warn!("Failed to load .env.staging: {}", e);
    }

    let page = build_page(&config)?;
    page.signal_ready();
    let client = DraftClient::new(&config.api_base, page).context("Failed to create HTTP client")?;
    tracing::debug!(api_base = %config.api_base, "Client ready");

    match cli.command {
        Commands::Whoami { verify } => whoami(&client, &config, verify),
        Commands::Load => {
            let draft = client.load_draft().await?;
            println!("{}", serde_json::to_string_pretty(&draft)?);
            Ok(())
        }
        Commands::Save { file, normalize } => {
            let mut draft = read_draft(&file)?;
            if normalize {
                draft = draft.normalized();
            }
            client.save_draft(&draft).await?;
            tracing::info!("Draft saved from {}", file.display());
            Ok(())
        }
        Commands::Submit { file, check } => {
            let draft = read_draft(&file)?;
            if check {
                draft.ensure_submittable()?;
            }
            client.submit_registration(&draft).await?;
            Ok(())
        }
        Commands::Health => {
            if client.health().await? {
                println!("ok");
                Ok(())
            } else {
                anyhow::bail!("Backend reported not ok")
            }
        }
    }
}

/// Assembles the page the client pretends to run in
///
/// A host state snapshot takes priority over a bare `init_data` value.
fn build_page(config: &ClientConfig) -> Result<PageContext> {
    let page = PageContext::new(config.page_url.clone());

    let host = match (&config.host_state, &config.init_data) {
        (Some(path), _) => Some(WebAppHost::from_file(path)?),
        (None, Some(init_data)) => Some(WebAppHost::with_init_data(init_data.expose_secret())),
        (None, None) => None,
    };

    Ok(match host {
        Some(host) => page.with_host(Arc::new(host)),
        None => {
            tracing::debug!("No Telegram host configured, relying on the page URL");
            page
        }
    })
}

fn whoami(client: &DraftClient, config: &ClientConfig, verify: bool) -> Result<()> {
    let page = client.page();
    print!("{}", identity_report(page));

    if !verify {
        return Ok(());
    }
    let Some(init_data) = page.init_data() else {
        println!("verified:  skipped, no init data");
        return Ok(());
    };

    let bot_token = config
        .bot_token
        .as_ref()
        .context("--verify needs a bot token (FCL_BOT_TOKEN)")?;
    let user = InitData::parse(&init_data).verify(bot_token.expose_secret(), config.max_auth_age)?;
    println!(
        "verified:  id={} username={}",
        user.id,
        user.username.as_deref().unwrap_or("-")
    );

    Ok(())
}

/// Token presence and user id; the user id does not depend on the token
fn identity_report(page: &PageContext) -> String {
    let token_line = match page.init_data_with_source() {
        Some((source, init_data)) => format!("init data: {} bytes from {}", init_data.len(), source),
        None => format!(
            "init data: none (requests will be sent without {})",
            fclcore::registration::INIT_DATA_HEADER
        ),
    };
    let user_line = match page.user_id() {
        Some(id) => format!("user id:   {}", id),
        None => "user id:   unknown".to_string(),
    };
    format!("{}\n{}\n", token_line, user_line)
}

fn read_draft(path: &Path) -> Result<Draft> {
    let json = fs_err::read_to_string(path)?;
    serde_json::from_str(&json).with_context(|| format!("Invalid draft JSON in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use url::Url;

    fn config(host_state: Option<&Path>, init_data: Option<&str>) -> ClientConfig {
        ClientConfig {
            api_base: Url::parse("http://localhost:5173/api").unwrap(),
            page_url: Url::parse("http://localhost:5173/register").unwrap(),
            init_data: init_data.map(secrecy::SecretString::from),
            host_state: host_state.map(Path::to_path_buf),
            bot_token: None,
            max_auth_age: Duration::from_secs(86400),
            log_level: "info".to_string(),
        }
    }

    fn snapshot(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", json).unwrap();
        file
    }

    #[test]
    fn test_host_state_wins_over_init_data() {
        let file = snapshot(r#"{"initData": "from-snapshot", "initDataUnsafe": {"user": {"id": 7}}}"#);
        let page = build_page(&config(Some(file.path()), Some("from-config"))).unwrap();

        assert_eq!(page.init_data().as_deref(), Some("from-snapshot"));
        assert_eq!(page.user_id(), Some(7));
    }

    #[test]
    fn test_init_data_only() {
        let page = build_page(&config(None, Some("from-config"))).unwrap();
        assert_eq!(page.init_data().as_deref(), Some("from-config"));
        assert!(page.host().is_some());
    }

    #[test]
    fn test_no_host() {
        let page = build_page(&config(None, None)).unwrap();
        assert!(page.host().is_none());
        assert_eq!(page.init_data(), None);
    }

    #[test]
    fn test_missing_snapshot_file_is_an_error() {
        let missing = Path::new("/nonexistent/fcl-host-state.json");
        assert!(build_page(&config(Some(missing), Some("from-config"))).is_err());
    }

    #[test]
    fn test_report_shows_user_id_without_init_data() {
        let file = snapshot(r#"{"initDataUnsafe": {"user": {"id": 5}}}"#);
        let page = build_page(&config(Some(file.path()), None)).unwrap();

        let report = identity_report(&page);
        assert!(report.contains("init data: none"), "report: {report}");
        assert!(report.contains("user id:   5"), "report: {report}");
    }

    #[test]
    fn test_report_with_token() {
        let file = snapshot(r#"{"initData": "abcd", "initDataUnsafe": {"user": {"id": 9}}}"#);
        let page = build_page(&config(Some(file.path()), None)).unwrap();

        assert_eq!(identity_report(&page), "init data: 4 bytes from host\nuser id:   9\n");
    }

    #[test]
    fn test_report_unknown_user() {
        let page = build_page(&config(None, Some("abc"))).unwrap();
        assert_eq!(identity_report(&page), "init data: 3 bytes from host\nuser id:   unknown\n");
    }
}
