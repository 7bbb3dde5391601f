//! Colorbook CLI entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colorbook::{ui, AppContext};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "colorbook")]
#[command(about = "🖍️  Colorbook - turn a sentence into a coloring page")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up the OAuth client and output directory
    Onboard,

    /// Delete configuration and session
    Reset,

    #[command(flatten)]
    Session(SessionCommand),
}

/// Commands that need a loaded config and an initialized session
#[derive(Subcommand)]
enum SessionCommand {
    /// Sign in with Google
    Login,

    /// Sign out and forget the stored session
    Logout,

    /// Show configuration and session state
    Status,

    /// Print a valid access token, refreshing it if needed
    Token,

    /// Generate a coloring page
    Generate {
        /// What to draw
        #[arg(short, long)]
        prompt: String,

        /// Output file (defaults to the configured output directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print a data: URI instead of writing a file
        #[arg(long, conflicts_with = "output")]
        data_uri: bool,
    },

    /// Check that generation is ready to go
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    ctrlc::set_handler(|| {
        println!("\n👋 Bye!");
        std::process::exit(130);
    })
    .ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Onboard => colorbook::config::onboard()?,
        Commands::Reset => colorbook::config::reset()?,
        Commands::Session(command) => {
            let config = colorbook::config::load()?;
            let ctx = AppContext::from_config(config);
            ctx.initialize().await?;
            if let Err(e) = run(&ctx, command).await {
                match e.code() {
                    Some(code) => ui::print_error(&format!("{} ({})", e, code)),
                    None => ui::print_error(&e.to_string()),
                }
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn run(ctx: &AppContext, command: SessionCommand) -> colorbook::Result<()> {
    match command {
        SessionCommand::Login => {
            let user = ctx.auth.sign_in().await?;
            ui::print_success(&format!(
                "Signed in as {}",
                user.name.as_deref().unwrap_or(&user.email)
            ));
        }

        SessionCommand::Logout => {
            ctx.auth.sign_out().await?;
            ui::print_success("Signed out");
        }

        SessionCommand::Status => {
            ui::print_header("Status", &ctx.config.model);
            ui::print_step(&format!("Output directory: {:?}", ctx.config.output_dir));
            ui::print_step(&format!(
                "Project: {}",
                ctx.config.project_id.as_deref().unwrap_or("(not set)")
            ));
            match ctx.auth.current_user().await {
                Some(user) if ctx.auth.is_signed_in().await => {
                    ui::print_success(&format!("Signed in as {}", user.email))
                }
                Some(user) => ui::print_warning(&format!(
                    "Session for {} is no longer valid, run 'colorbook login'",
                    user.email
                )),
                None => ui::print_warning("Not signed in, run 'colorbook login'"),
            }
        }

        SessionCommand::Token => {
            println!("{}", ctx.auth.access_token().await?);
        }

        SessionCommand::Generate {
            prompt,
            output,
            data_uri,
        } => {
            let spinner = ui::spinner("Drawing your coloring page");
            let result = if data_uri {
                ctx.generate_data_uri(&prompt).await.map(|uri| {
                    spinner.finish_and_clear();
                    println!("{}", uri);
                })
            } else {
                ctx.generate(&prompt, output).await.map(|path| {
                    spinner.finish_and_clear();
                    ui::print_success(&format!("Saved {}", path.display()));
                })
            };
            if result.is_err() {
                spinner.finish_and_clear();
            }
            result?;
        }

        SessionCommand::Health => {
            if ctx.health().await {
                ui::print_success("Ready to generate");
            } else {
                ui::print_warning("Not ready: sign in and check your configuration");
            }
        }
    }

    Ok(())
}
