use clap::{Parser, Subcommand};
use secrecy::SecretString;
use tracing::info;
use tracing_subscriber::EnvFilter;

use porteiro::app_context::AppContext;
use porteiro::seed::seed_demo_data;
use porteiro_core::permission::Action;

#[derive(Parser)]
#[command(name = "porteiro")]
#[command(about = "Role-based access control for the back-office suite")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show current configuration and exit
    Config,
    /// Seed the demo dataset and walk through a login (default)
    Demo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let ctx = AppContext::new()?;

    match cli.command.as_ref().unwrap_or(&Commands::Demo) {
        Commands::Config => {
            println!("{:#?}", &ctx.settings);
            return Ok(());
        }
        Commands::Demo => {}
    }

    seed_demo_data(&ctx.store).await?;

    let session = match ctx.restore().await {
        Some(session) => session,
        None => {
            let password = SecretString::from("password".to_string());
            ctx.login("admin@example.com", &password).await?
        }
    };

    println!("Signed in as {} <{}>", session.user.full_name, session.user.email);
    println!("{:<20} {:>6} {:>6} {:>6} {:>6}", "module", "access", "create", "edit", "delete");
    for row in &session.permissions {
        println!(
            "{:<20} {:>6} {:>6} {:>6} {:>6}",
            row.module_name, row.caps.access, row.caps.create, row.caps.edit, row.caps.delete
        );
    }

    if let Some(row) = session.permissions.first() {
        info!(
            "Gate check: delete on '{}': {}",
            row.module_id,
            ctx.has_permission(&row.module_id, Action::Delete).await
        );
    }

    ctx.logout().await;
    Ok(())
}
