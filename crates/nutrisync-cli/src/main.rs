//! NutriSync CLI
//!
//! Terminal front-end for logging food, activity and body metrics, with
//! optional cloud sync and AI coaching.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use nutrisync_advisor::{
    Advisor, AdvisorError, AdvisoryContext, CoachReply, DiagnosisOutcome, FoodDiagnosis,
    GeminiService,
};
use nutrisync_core::{
    AppConfig, Clock, DailyReport, Gender, HealthGoal, NewExercise, NewFood, Profile,
    SystemClock,
};
use nutrisync_sync::{
    FileCache, PostgrestRemote, Reconciler, StateStore, SyncReport, WriteReceipt,
};

#[derive(Parser)]
#[command(name = "nutrisync")]
#[command(about = "NutriSync - Personal nutrition and lifestyle tracker")]
#[command(version)]
struct Cli {
    /// Config file (default: <config dir>/nutrisync/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the local state snapshot
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Remote store to sync with
    #[arg(long, global = true, value_enum, default_value_t = RemoteMode::Auto)]
    remote: RemoteMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RemoteMode {
    /// Hosted store when configured, otherwise local only
    Auto,
    /// Local only
    Off,
}

#[derive(Subcommand)]
enum Commands {
    /// Show sync mode, counters and any advisory
    Status,

    /// Show or edit the profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Log a food for today
    AddFood {
        name: String,
        #[arg(long)]
        calories: f64,
        #[arg(long, default_value_t = 0.0)]
        protein: f64,
        #[arg(long, default_value_t = 0.0)]
        carbs: f64,
        #[arg(long, default_value_t = 0.0)]
        fat: f64,
        #[arg(long, default_value_t = 0.0)]
        fiber: f64,
        #[arg(long, default_value_t = 0.0)]
        calcium: f64,
        #[arg(long, default_value_t = 0.0)]
        iron: f64,
    },

    /// Log an exercise session for today
    AddExercise {
        kind: String,
        #[arg(long)]
        calories: f64,
        #[arg(long)]
        minutes: f64,
    },

    /// Set (or with --add, increase) water intake in ml
    Hydration {
        ml: f64,
        #[arg(long)]
        add: bool,
        /// Day to edit (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Set hours slept
    Sleep {
        hours: f64,
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Set hours spent sitting
    Sedentary {
        hours: f64,
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Show today's metrics
    Report,

    /// Drain pending writes and reload from the remote
    RetrySync,

    /// Ask the coach a question
    Coach {
        #[arg(required = true)]
        message: Vec<String>,
    },

    /// Get a structured diagnosis for a food
    Diagnose {
        #[arg(required = true)]
        food: Vec<String>,
        /// Log the diagnosed food for today
        #[arg(long)]
        accept: bool,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    Show,
    /// Change profile fields; unspecified fields keep their value
    Set {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        age: Option<u32>,
        /// Weight in kg
        #[arg(long)]
        weight: Option<f64>,
        #[arg(long)]
        height_feet: Option<u32>,
        #[arg(long)]
        height_inches: Option<f64>,
        #[arg(long, value_enum)]
        gender: Option<GenderArg>,
        #[arg(long, value_enum)]
        goal: Option<GoalArg>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum GenderArg {
    Male,
    Female,
}

impl From<GenderArg> for Gender {
    fn from(arg: GenderArg) -> Self {
        match arg {
            GenderArg::Male => Gender::Male,
            GenderArg::Female => Gender::Female,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum GoalArg {
    Loss,
    Maintain,
    Gain,
}

impl From<GoalArg> for HealthGoal {
    fn from(arg: GoalArg) -> Self {
        match arg {
            GoalArg::Loss => HealthGoal::WeightLoss,
            GoalArg::Maintain => HealthGoal::Maintenance,
            GoalArg::Gain => HealthGoal::WeightGain,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let store = open_store(&config, cli.remote).await?;

    match cli.command {
        Commands::Status => cmd_status(&store),
        Commands::Profile { action } => cmd_profile(&store, action).await,
        Commands::AddFood {
            name,
            calories,
            protein,
            carbs,
            fat,
            fiber,
            calcium,
            iron,
        } => {
            let food = NewFood {
                name,
                calories,
                protein,
                carbs,
                fat,
                fiber,
                calcium,
                iron,
            };
            finish_write(store.add_food_today(food).await?).await
        }
        Commands::AddExercise {
            kind,
            calories,
            minutes,
        } => {
            let exercise = NewExercise {
                kind,
                calories_burned: calories,
                duration_minutes: minutes,
            };
            finish_write(store.add_exercise_today(exercise).await?).await
        }
        Commands::Hydration { ml, add, date } => {
            let date = date.unwrap_or_else(|| store.clock().today());
            let receipt = if add {
                store.add_hydration(date, ml).await?
            } else {
                store.set_hydration(date, ml).await?
            };
            finish_write(receipt).await
        }
        Commands::Sleep { hours, date } => {
            let date = date.unwrap_or_else(|| store.clock().today());
            finish_write(store.set_sleep_hours(date, hours).await?).await
        }
        Commands::Sedentary { hours, date } => {
            let date = date.unwrap_or_else(|| store.clock().today());
            finish_write(store.set_sedentary_hours(date, hours).await?).await
        }
        Commands::Report => cmd_report(&store),
        Commands::RetrySync => cmd_retry(&store).await,
        Commands::Coach { message } => cmd_coach(&store, &config, &message.join(" ")).await,
        Commands::Diagnose { food, accept } => {
            cmd_diagnose(&store, &config, &food.join(" "), accept).await
        }
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AppConfig::load(),
    }
    .with_env_overrides();

    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }

    Ok(config)
}

async fn open_store(config: &AppConfig, mode: RemoteMode) -> Result<StateStore> {
    config
        .ensure_dirs()
        .with_context(|| format!("Failed to create {}", config.data_dir.display()))?;

    let cache = Arc::new(FileCache::new(config.cache_path()));
    let mut reconciler = Reconciler::new(cache);

    match mode {
        RemoteMode::Auto if config.remote.is_configured() => {
            let remote = PostgrestRemote::from_config(&config.remote)
                .context("Failed to set up remote store")?;
            reconciler = reconciler.with_remote(Arc::new(remote));
        }
        RemoteMode::Auto | RemoteMode::Off => {
            tracing::debug!("Running without a remote store");
        }
    }

    let store = StateStore::new(reconciler, Arc::new(SystemClock));
    store.load().await.context("Failed to load state")?;

    if let Some(advisory) = store.advisory() {
        eprintln!("! {}", advisory);
    }

    Ok(store)
}

/// Print what happened locally, then wait for the remote half.
async fn finish_write(receipt: WriteReceipt) -> Result<()> {
    if let nutrisync_sync::CacheOutcome::Failed(reason) = &receipt.cache {
        eprintln!("✗ Could not save locally: {}", reason);
    }

    match receipt.sync.outcome().await {
        SyncReport::LocalOnly => println!("✓ Saved"),
        SyncReport::Skipped => println!("✓ Saved locally (sync paused, run: nutrisync retry-sync)"),
        SyncReport::Completed { synced, failed } if failed.is_empty() => {
            println!("✓ Saved and synced ({} records)", synced);
        }
        SyncReport::Completed { synced, failed } => {
            println!("✓ Saved locally");
            println!("✗ Failed to sync {} of {} records:", failed.len(), synced + failed.len());
            for failure in &failed {
                println!("    {}: {}", failure.target, failure.error);
            }
        }
    }

    Ok(())
}

fn cmd_status(store: &StateStore) -> Result<()> {
    let stats = store.stats();
    let logs = store.snapshot().map(|s| s.logs.len()).unwrap_or(0);

    println!("NutriSync v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("  Sync mode:  {}", store.mode());
    println!("  Days logged: {}", logs);
    println!();
    println!(
        "  Upserts:    {} ok / {} failed / {} skipped ({:.0}% success)",
        stats.upserts_succeeded,
        stats.upserts_failed,
        stats.upserts_skipped,
        stats.success_rate() * 100.0
    );
    println!(
        "  Cache:      {} writes / {} failures",
        stats.cache_writes, stats.cache_failures
    );

    if let Some(advisory) = store.advisory() {
        println!();
        println!("  Advisory:   {}", advisory);
    }

    Ok(())
}

async fn cmd_profile(store: &StateStore, action: ProfileAction) -> Result<()> {
    let current = store
        .snapshot()
        .context("State not loaded")?
        .profile;

    match action {
        ProfileAction::Show => {
            print_profile(&current);
            Ok(())
        }
        ProfileAction::Set {
            name,
            age,
            weight,
            height_feet,
            height_inches,
            gender,
            goal,
        } => {
            let profile = Profile {
                name: name.unwrap_or(current.name),
                age: age.unwrap_or(current.age),
                weight: weight.unwrap_or(current.weight),
                height_feet: height_feet.unwrap_or(current.height_feet),
                height_inches: height_inches.unwrap_or(current.height_inches),
                gender: gender.map(Gender::from).unwrap_or(current.gender),
                goal: goal.map(HealthGoal::from).unwrap_or(current.goal),
            };

            let receipt = store
                .update_profile(profile)
                .await
                .context("Profile rejected")?;
            print_profile(&receipt.applied.profile);
            finish_write(receipt).await
        }
    }
}

fn print_profile(profile: &Profile) {
    println!("Profile: {}", profile.name);
    println!("  Age:     {}", profile.age);
    println!("  Weight:  {} kg", profile.weight);
    println!("  Height:  {}' {}\"", profile.height_feet, profile.height_inches);
    println!("  Gender:  {:?}", profile.gender);
    println!("  Goal:    {}", profile.goal);
}

fn cmd_report(store: &StateStore) -> Result<()> {
    let report = store.today_report().context("State not loaded")?;
    print_report(store.clock().today(), &report);
    Ok(())
}

fn print_report(date: NaiveDate, report: &DailyReport) {
    println!("Report for {}", date);
    println!();
    println!("  BMI:        {:.1} ({:?})", report.bmi, report.bmi_category);
    println!("  BMR:        {:.0} kcal", report.bmr);
    println!();
    println!("  Intake:     {:.0} kcal", report.energy.intake);
    println!("  Exercise:   {:.0} kcal", report.energy.exercise);
    println!("  Target:     {:.0} kcal", report.energy.target);
    println!("  Net:        {:+.0} kcal", report.energy.net);
    println!();
    println!(
        "  Protein:    {:.1} g (target {:.0}-{:.0} g){}",
        report.totals.protein,
        report.protein_target.min_g,
        report.protein_target.max_g,
        if report.protein_deficient { "  ⚠ low" } else { "" }
    );
    println!(
        "  Macros:     P {:.0}% / C {:.0}% / F {:.0}%{}",
        report.macros.protein * 100.0,
        report.macros.carbs * 100.0,
        report.macros.fat * 100.0,
        if report.fat_excessive { "  ⚠ fat high" } else { "" }
    );
    println!(
        "  Fiber:      {:.1} g   Calcium: {:.0} mg   Iron: {:.1} mg",
        report.totals.fiber, report.totals.calcium, report.totals.iron
    );
}

async fn cmd_retry(store: &StateStore) -> Result<()> {
    let report = store.retry_sync().await.context("Retry failed")?;

    match report.failure {
        Some(reason) => println!("✗ Still offline: {}", reason),
        None => println!(
            "✓ Reloaded from {:?} ({} days), mode: {}",
            report.source,
            report.state.logs.len(),
            store.mode()
        ),
    }

    Ok(())
}

fn advisor(config: &AppConfig) -> Result<Advisor<GeminiService>> {
    match GeminiService::from_config(&config.advisor) {
        Ok(service) => Ok(Advisor::new(service)),
        Err(AdvisorError::NotConfigured) => {
            bail!("Advisor not configured. Set GEMINI_API_KEY or advisor.api_key in the config file.")
        }
        Err(e) => Err(e).context("Failed to set up advisor"),
    }
}

fn context_for(store: &StateStore) -> Result<AdvisoryContext> {
    let state = store.snapshot().context("State not loaded")?;
    Ok(AdvisoryContext::from_state(&state, store.clock().today()))
}

async fn cmd_coach(store: &StateStore, config: &AppConfig, message: &str) -> Result<()> {
    let advisor = advisor(config)?;
    let ctx = context_for(store)?;

    match advisor.coach(message, &ctx).await {
        CoachReply::Answer(text) => println!("{}", text),
        CoachReply::Unavailable(text) => eprintln!("✗ {}", text),
    }

    Ok(())
}

async fn cmd_diagnose(
    store: &StateStore,
    config: &AppConfig,
    food: &str,
    accept: bool,
) -> Result<()> {
    let advisor = advisor(config)?;
    let ctx = context_for(store)?;

    match advisor.diagnose(food, &ctx).await {
        DiagnosisOutcome::Diagnosed(diagnosis) => {
            print_diagnosis(&diagnosis);
            if accept {
                println!();
                finish_write(store.add_food_today(diagnosis.to_new_food()).await?).await?;
            }
        }
        DiagnosisOutcome::Unavailable(text) => eprintln!("✗ {}", text),
        DiagnosisOutcome::Malformed(e) => eprintln!("✗ Could not read the diagnosis: {}", e),
    }

    Ok(())
}

fn print_diagnosis(d: &FoodDiagnosis) {
    println!("{} ({})  [{}]", d.food_name, d.portion, d.health_status);
    println!();
    println!(
        "  {:.0} kcal   P {:.1} g   C {:.1} g   F {:.1} g   Fiber {:.1} g",
        d.calories, d.macros.protein, d.macros.carbs, d.macros.fat, d.macros.fiber
    );
    println!(
        "  Iron: {}   Calcium: {}   Vitamins: {}",
        d.micros.iron, d.micros.calcium, d.micros.vitamins
    );
    println!();
    println!("  {}", d.explanation);
    println!("  Goal:   {}", d.goal_alignment);
    println!("  Swap:   {}", d.swap_suggestion);
    println!("  Advice: {}", d.quick_advice);
    println!("  Today:  {}", d.cumulative_impact);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_modes() {
        let cli = Cli::try_parse_from(["nutrisync", "--remote", "off", "status"]).unwrap();
        assert!(cli.remote == RemoteMode::Off);

        let cli = Cli::try_parse_from(["nutrisync", "status"]).unwrap();
        assert!(cli.remote == RemoteMode::Auto);

        // An in-process remote would start empty and wipe the cached logs
        assert!(Cli::try_parse_from(["nutrisync", "--remote", "memory", "status"]).is_err());
    }

    #[test]
    fn test_hydration_add_flag() {
        let cli = Cli::try_parse_from(["nutrisync", "hydration", "250", "--add"]).unwrap();
        match cli.command {
            Commands::Hydration { ml, add, date } => {
                assert_eq!(ml, 250.0);
                assert!(add);
                assert!(date.is_none());
            }
            _ => panic!("expected the hydration command"),
        }
    }
}
