use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tymelyne_app::community::{CommunityFeed, ToggleOutcome};
use tymelyne_app::config::AppConfig;
use tymelyne_app::goals::{self, NewGoal};
use tymelyne_app::progress::{self, ViewState};
use tymelyne_app::session::{Principal, SessionProvider};
use tymelyne_app::{achievements, challenges, preferences, AppContext, AppResult};
use tymelyne_core::error::CoreError;
use tymelyne_core::goals::TaskFilter;
use tymelyne_core::types::DbId;
use tymelyne_db::models::preference::UpdatePreferences;

#[derive(Parser)]
#[command(name = "tymelyne")]
#[command(about = "Goals, tasks, achievements, and community from the command line")]
struct Cli {
    /// Account email
    #[arg(long, global = true, env = "TYMELYNE_EMAIL")]
    email: Option<String>,

    /// Account password
    #[arg(long, global = true, env = "TYMELYNE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Level, completion, streaks, and the quote of the day
    Dashboard,
    /// List goals
    Goals,
    /// Create a goal
    AddGoal {
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value_t = 0)]
        progress: i32,
        /// RFC 3339 deadline
        #[arg(long)]
        deadline: Option<DateTime<Utc>>,
    },
    /// List tasks
    Tasks {
        #[arg(long, value_enum, default_value_t = FilterArg::All)]
        filter: FilterArg,
        #[arg(long)]
        category: Option<String>,
    },
    /// Mark a task completed
    CompleteTask {
        id: DbId,
        /// Mark it pending again instead
        #[arg(long)]
        undo: bool,
    },
    /// Earned achievements
    Achievements {
        /// Evaluate unlock rules first
        #[arg(long)]
        evaluate: bool,
    },
    /// One page of the community feed
    Feed {
        #[arg(long, default_value_t = 0)]
        page: u64,
    },
    /// Toggle your like on a post from the given feed page
    Like {
        post_id: DbId,
        #[arg(long, default_value_t = 0)]
        page: u64,
    },
    /// Challenges and your participation
    Challenges,
    /// Record progress on a joined challenge
    ChallengeProgress { id: DbId, value: i32 },
    /// Show or change preferences
    Preferences {
        #[arg(long)]
        dark_mode: Option<bool>,
        #[arg(long)]
        email_notifications: Option<bool>,
        #[arg(long)]
        push_notifications: Option<bool>,
        #[arg(long)]
        weekly_report: Option<bool>,
        #[arg(long)]
        timezone: Option<String>,
        #[arg(long)]
        language: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FilterArg {
    All,
    Completed,
    Pending,
}

impl From<FilterArg> for TaskFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => TaskFilter::All,
            FilterArg::Completed => TaskFilter::Completed,
            FilterArg::Pending => TaskFilter::Pending,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    // Logs go to stderr so stdout stays valid JSON.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tymelyne=info,tymelyne_app=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // --- Configuration ---
    let config = AppConfig::from_env()?;
    let ctx = AppContext::connect(&config)?;

    if let Err(e) = run(ctx, cli).await {
        tracing::error!(error = %e, "Command failed");
        anyhow::bail!(e.user_message());
    }
    Ok(())
}

async fn run(ctx: AppContext, cli: Cli) -> AppResult<()> {
    let session = SessionProvider::new(ctx.clone());
    let principal = authenticate(&session, cli.email.as_deref(), cli.password.as_deref()).await?;
    let user_id = principal.id();
    let now = Utc::now();

    match cli.command {
        Command::Dashboard => match progress::load_dashboard(&ctx, user_id, now).await {
            ViewState::Ready(overview) => print_json(&overview),
            unavailable => print_json(&unavailable),
        },
        Command::Goals => print_json(&goals::list_goals(&ctx, user_id).await?),
        Command::AddGoal {
            title,
            description,
            progress,
            deadline,
        } => {
            let input = NewGoal {
                title,
                description,
                progress,
                deadline,
            };
            print_json(&goals::create_goal(&ctx, user_id, input).await?)
        }
        Command::Tasks { filter, category } => print_json(
            &goals::list_tasks(&ctx, user_id, filter.into(), category.as_deref()).await?,
        ),
        Command::CompleteTask { id, undo } => {
            print_json(&goals::set_task_completed(&ctx, user_id, id, !undo).await?)
        }
        Command::Achievements { evaluate } => {
            if evaluate {
                let report = achievements::evaluate(&ctx, user_id).await?;
                tracing::info!(unlocked = report.newly_unlocked.len(), "Evaluation finished");
            }
            print_json(&achievements::earned(&ctx, user_id).await?)
        }
        Command::Feed { page } => {
            let feed = CommunityFeed::new(ctx.clone(), user_id);
            print_json(&feed.load_page(page).await?)
        }
        Command::Like { post_id, page } => {
            let feed = CommunityFeed::new(ctx.clone(), user_id);
            feed.load_page(page).await?;
            match feed.toggle_like(post_id).await? {
                ToggleOutcome::Applied(state) => print_json(&state),
                ToggleOutcome::Suppressed => Ok(()),
            }
        }
        Command::Challenges => print_json(&challenges::list(&ctx, user_id, now).await?),
        Command::ChallengeProgress { id, value } => {
            print_json(&challenges::update_progress(&ctx, user_id, id, value, now).await?)
        }
        Command::Preferences {
            dark_mode,
            email_notifications,
            push_notifications,
            weekly_report,
            timezone,
            language,
        } => {
            let patch = UpdatePreferences {
                dark_mode,
                email_notifications,
                push_notifications,
                weekly_report,
                timezone,
                language,
            };
            let prefs = if is_empty_patch(&patch) {
                preferences::load_or_create(&ctx, user_id).await?
            } else {
                preferences::save(&ctx, user_id, &patch).await?
            };
            print_json(&prefs)
        }
    }
}

/// Sign in with the given credentials, or fall back to a stored session.
async fn authenticate(
    session: &SessionProvider,
    email: Option<&str>,
    password: Option<&str>,
) -> AppResult<Principal> {
    if let (Some(email), Some(password)) = (email, password) {
        return session.sign_in(email, password).await;
    }
    session.restore().await;
    session.require()
}

fn is_empty_patch(patch: &UpdatePreferences) -> bool {
    patch.dark_mode.is_none()
        && patch.email_notifications.is_none()
        && patch.push_notifications.is_none()
        && patch.weekly_report.is_none()
        && patch.timezone.is_none()
        && patch.language.is_none()
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| CoreError::Internal(format!("Failed to encode output: {e}")))?;
    println!("{text}");
    Ok(())
}
