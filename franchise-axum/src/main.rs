use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::http::HeaderValue;
use clap::{Args, Parser, Subcommand};
use franchise::{
    AccountConfig, FranchiseBuilder, JwtConfig, NewInvitationCode, Role, SqliteRepositoryProvider,
};
use franchise_core::{
    repositories::{InvitationCodeRepositoryAdapter, RepositoryProvider},
    services::InvitationCodeService,
};
use tokio::{net::TcpListener, sync::watch};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "franchise", version, about = "Franchise accounts backend")]
struct Cli {
    /// SQLite database URL
    #[arg(
        long,
        global = true,
        env = "DATABASE_URL",
        default_value = "sqlite://franchise.db"
    )]
    database_url: String,

    /// bcrypt work factor for new password hashes
    #[arg(long, global = true, env = "BCRYPT_COST", default_value_t = 12)]
    bcrypt_cost: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply migrations and serve the HTTP API
    Serve(ServeArgs),
    /// Apply pending migrations and exit
    Migrate,
    /// Create an invitation code and print it as JSON
    CreateInvitationCode(CreateInvitationCodeArgs),
    /// Print the version
    Version,
}

#[derive(Debug, Args)]
struct ServeArgs {
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    bind_addr: SocketAddr,

    /// HMAC secret used to sign access tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,

    #[arg(long, env = "JWT_ISSUER")]
    jwt_issuer: Option<String>,

    #[arg(long, env = "JWT_EXPIRES_IN_HOURS", default_value_t = 24)]
    jwt_expires_in_hours: i64,

    /// Frontend origin allowed to make credentialed requests
    #[arg(long, env = "CORS_ORIGIN", default_value = "http://localhost:3000")]
    cors_origin: String,
}

#[derive(Debug, Args)]
struct CreateInvitationCodeArgs {
    code: String,

    /// One of hq_admin, franchise_owner, franchisee, crew
    #[arg(long, default_value = "franchise_owner")]
    role: String,

    /// Omit for unlimited uses
    #[arg(long)]
    max_uses: Option<u32>,

    #[arg(long)]
    expires_in_days: Option<i64>,

    #[arg(long)]
    description: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match &cli.command {
        Command::Serve(args) => serve(&cli, args).await,
        Command::Migrate => migrate(&cli.database_url).await,
        Command::CreateInvitationCode(args) => {
            create_invitation_code(&cli.database_url, args).await
        }
        Command::Version => {
            println!("franchise {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn serve(cli: &Cli, args: &ServeArgs) -> anyhow::Result<()> {
    let mut jwt = JwtConfig::new_hs256(args.jwt_secret.as_bytes().to_vec())
        .with_expires_in(chrono::Duration::hours(args.jwt_expires_in_hours));
    if let Some(issuer) = &args.jwt_issuer {
        jwt = jwt.with_issuer(issuer);
    }

    let cors_origin = HeaderValue::from_str(&args.cors_origin)
        .with_context(|| format!("Invalid CORS origin: {}", args.cors_origin))?;

    let franchise = FranchiseBuilder::new()
        .with_sqlite(&cli.database_url)
        .await?
        .with_jwt_config(jwt)
        .with_account_config(AccountConfig::default().with_bcrypt_cost(cli.bcrypt_cost))
        .apply_migrations(true)
        .build()
        .await?;
    let franchise = Arc::new(franchise);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweep = franchise.start_background_tasks(shutdown_rx);

    let app = franchise_axum::routes(franchise)
        .with_cors_origin(cors_origin)
        .build();

    let listener = TcpListener::bind(args.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind_addr))?;
    tracing::info!(addr = %args.bind_addr, "Listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = sweep.await {
        tracing::warn!(error = %e, "Rate limit sweep task ended abnormally");
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn connect(database_url: &str) -> anyhow::Result<Arc<SqliteRepositoryProvider>> {
    let provider = SqliteRepositoryProvider::connect(database_url)
        .await
        .with_context(|| format!("Failed to connect to {database_url}"))?;
    Ok(Arc::new(provider))
}

async fn migrate(database_url: &str) -> anyhow::Result<()> {
    let provider = connect(database_url).await?;
    provider.migrate().await.context("Migration failed")?;
    tracing::info!("Migrations applied");
    Ok(())
}

async fn create_invitation_code(
    database_url: &str,
    args: &CreateInvitationCodeArgs,
) -> anyhow::Result<()> {
    let provider = connect(database_url).await?;
    provider.migrate().await.context("Migration failed")?;

    let role: Role = args.role.parse()?;
    let mut code = NewInvitationCode::builder().code(&args.code).role(role);
    if let Some(max_uses) = args.max_uses {
        code = code.max_uses(max_uses);
    }
    if let Some(days) = args.expires_in_days {
        code = code.expires_at(chrono::Utc::now() + chrono::Duration::days(days));
    }
    if let Some(description) = &args.description {
        code = code.description(description);
    }

    let invitations =
        InvitationCodeService::new(Arc::new(InvitationCodeRepositoryAdapter::new(provider)));
    let created = invitations.create(code.build()?).await?;

    println!("{}", serde_json::to_string_pretty(&created)?);
    Ok(())
}
