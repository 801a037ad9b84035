use anyhow::Result;
use clap::Args;
use seatwatch_browser::{BrowserSession, ChromeFinder, ChromeLauncher, PageProbe, ProfileManager};
use seatwatch_core::aggregate::{ResultAggregator, RunSummary};
use seatwatch_core::config::{Timing, WatchConfig};
use seatwatch_core::probe::Probe;
use seatwatch_notify::{ConsoleReporter, MultiReporter, TelegramReporter};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Exit code for failures of the environment rather than the invocation:
/// Chrome missing, the page unreachable, or the region / centre context
/// never established. Cron wrappers treat this as "retry later".
pub const EXIT_CONTEXT_FAILED: i32 = 3;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Page holding the cascading form
    #[arg(long, value_name = "URL")]
    pub url: Url,

    /// Region label to select, e.g. "Southern"
    #[arg(long, value_name = "LABEL")]
    pub region: String,

    /// Centre (point of use) label to select, e.g. "HYDERABAD"
    #[arg(long, value_name = "LABEL")]
    pub pou: String,

    /// Course label to check; repeat the flag for several courses
    #[arg(long = "course", value_name = "LABEL", required = true)]
    pub courses: Vec<String>,

    /// Which batch rows to include in the report
    #[arg(long, value_enum, default_value = "all")]
    pub report: crate::ReportChoice,

    /// Send nothing at all when no batch rows were found
    #[arg(long)]
    pub skip_empty: bool,

    /// Selection attempts per dropdown before giving up
    #[arg(long, default_value_t = 5, value_name = "N")]
    pub max_attempts: usize,

    /// Settle delay after each selection, in milliseconds
    #[arg(long, default_value_t = 2000, value_name = "MS")]
    pub settle_ms: u64,

    /// Path to Chrome binary (overrides auto-detection)
    #[arg(long)]
    pub chrome_path: Option<PathBuf>,

    /// Named persistent Chrome profile (default: throwaway temp profile)
    #[arg(long, value_name = "NAME")]
    pub profile: Option<String>,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headful: bool,

    /// Telegram bot token used for notifications
    #[arg(
        long,
        value_name = "TOKEN",
        env = "TELEGRAM_BOT_TOKEN",
        hide_env_values = true,
        requires = "telegram_chat"
    )]
    pub telegram_token: Option<String>,

    /// Telegram chat id receiving notifications
    #[arg(
        long,
        value_name = "CHAT",
        env = "TELEGRAM_CHAT_ID",
        requires = "telegram_token"
    )]
    pub telegram_chat: Option<String>,
}

pub fn execute(args: CheckArgs) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(run_check(args));

    runtime.shutdown_timeout(Duration::from_millis(100));

    match result {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(e) if is_environment_failure(&e) => {
            eprintln!("❌ {e:#}");
            std::process::exit(EXIT_CONTEXT_FAILED);
        }
        Err(e) => Err(e),
    }
}

async fn run_check(args: CheckArgs) -> Result<RunSummary> {
    println!("🔍 Locating Chrome...");
    let chrome_binary = ChromeFinder::new(args.chrome_path.clone()).find()?;
    println!("✅ Found Chrome at: {}", chrome_binary.display());

    let profile = match &args.profile {
        Some(name) => {
            let profile = ProfileManager::named(name)?;
            println!("📁 Using profile: {}", profile.path().display());
            profile
        }
        None => {
            println!("📁 Using temporary profile");
            ProfileManager::temporary()?
        }
    };

    // The page itself is opened by the probe once the session is up, so the
    // launcher starts on about:blank.
    let mut launcher = ChromeLauncher::new(chrome_binary, profile.path().to_path_buf(), None);
    if args.headful {
        launcher = launcher.with_headful();
    }
    let debugging_port = launcher.debugging_port();

    println!("🚀 Launching Chrome...");
    let mut chrome = launcher.launch()?;
    let chrome_pid = chrome.id();
    println!("✅ Chrome started (PID: {chrome_pid})");

    let outcome = watch(&args, debugging_port).await;

    // Chrome is ours to stop no matter how the run went.
    println!("🛑 Stopping Chrome...");
    kill_process_by_pid(chrome_pid);
    let _ = tokio::task::spawn_blocking(move || chrome.wait()).await;

    outcome
}

async fn watch(args: &CheckArgs, debugging_port: u16) -> Result<RunSummary> {
    println!("🔌 Connecting to Chrome...");
    let session = BrowserSession::connect(debugging_port).await?;
    let probe = PageProbe::new(session.page().clone());

    let config = build_config(args);
    let reporter = build_reporter(args)?;

    println!("📊 Checking {} course(s) at {}", config.courses.len(), args.url);
    let result = ResultAggregator::new(config).run(&probe, &reporter).await;

    let _ = probe.close().await;
    session.shutdown().await;

    Ok(result?)
}

fn build_config(args: &CheckArgs) -> WatchConfig {
    let timing = Timing {
        settle: Duration::from_millis(args.settle_ms),
        ..Timing::default()
    };

    WatchConfig::new(
        args.url.to_string(),
        args.region.clone(),
        args.pou.clone(),
        args.courses.clone(),
    )
    .with_mode(args.report.to_mode())
    .with_max_attempts(args.max_attempts)
    .with_timing(timing)
    .with_notify_empty(!args.skip_empty)
}

fn build_reporter(args: &CheckArgs) -> Result<MultiReporter> {
    let context = format!("{} / {}", args.region, args.pou);
    let mut reporter =
        MultiReporter::new().with(Box::new(ConsoleReporter::new().with_context(context.clone())));

    if let (Some(token), Some(chat)) = (&args.telegram_token, &args.telegram_chat) {
        reporter = reporter.with(Box::new(
            TelegramReporter::new(token.clone(), chat.clone())?.with_context(context),
        ));
        println!("📨 Telegram notifications enabled");
    }

    Ok(reporter)
}

fn print_summary(summary: &RunSummary) {
    use console::style;

    println!();
    if summary.positives > 0 {
        println!(
            "🎉 {}",
            style(format!(
                "{} open batch(es) across {} course(s)",
                summary.positives, summary.courses_fetched
            ))
            .green()
            .bold()
        );
    } else {
        println!("📭 No open batches found");
    }
    if summary.courses_skipped > 0 {
        println!("⚠️  {} course(s) could not be fetched", summary.courses_skipped);
    }
    if !summary.notified && summary.records > 0 {
        println!("⚠️  Report was not delivered");
    }
}

fn is_environment_failure(error: &anyhow::Error) -> bool {
    if let Some(core) = error.downcast_ref::<seatwatch_core::Error>() {
        return matches!(
            core,
            seatwatch_core::Error::ContextNotEstablished(_)
                | seatwatch_core::Error::Navigation(_)
                | seatwatch_core::Error::Probe(_)
        );
    }
    error.downcast_ref::<seatwatch_browser::Error>().is_some()
}

fn kill_process_by_pid(pid: u32) {
    #[cfg(unix)]
    {
        use std::process::Command;
        let _ = Command::new("kill").arg(pid.to_string()).output();
    }

    #[cfg(windows)]
    {
        use std::process::Command;
        let _ = Command::new("taskkill")
            .args(["/PID", &pid.to_string(), "/F"])
            .output();
    }
}
