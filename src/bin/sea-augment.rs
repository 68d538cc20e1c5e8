use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use sea_augment::{
    Animator, AugmentConfig, CancelToken, CommandService, GenerativeService, LogObserver,
    Orchestrator, ResultStore, RetryingCaller, RunEvent, RunObserver, Sleeper, ThreadSleeper,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sea-augment", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the prompts and job count a configuration expands to.
    Plan(PlanArgs),
    /// Generate the dataset.
    Run(RunArgs),
}

#[derive(Parser, Debug)]
struct PlanArgs {
    /// Run configuration JSON.
    #[arg(long)]
    config: PathBuf,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Run configuration JSON.
    #[arg(long)]
    config: PathBuf,

    /// Export directory.
    #[arg(long)]
    out: PathBuf,

    /// Request an animated rendition of every result as it is produced.
    #[arg(long, default_value_t = false)]
    animate: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Plan(args) => cmd_plan(args),
        Command::Run(args) => cmd_run(args),
    }
}

fn load_config(path: &std::path::Path) -> anyhow::Result<AugmentConfig> {
    let cfg = AugmentConfig::from_path(path)
        .with_context(|| format!("load config '{}'", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<ExitCode> {
    let cfg = load_config(&args.config)?;
    let plan = cfg.job_plan(cfg.images.len());
    plan.validate(cfg.images.len())?;

    if let Some(sea_state) = cfg.sea_state {
        println!("sea state: {}", sea_state.label());
    }
    for prompt in &plan.scenario_prompts {
        println!("scenario: {prompt}");
    }
    for prompt in &plan.obstacle_prompts {
        println!("obstacle: {prompt}");
    }
    println!(
        "{} images x {} jobs = {} jobs",
        cfg.images.len(),
        plan.jobs_per_image(),
        plan.total_jobs
    );
    Ok(ExitCode::SUCCESS)
}

/// Logs every event and, when enabled, starts an animation for each new result.
struct CliObserver {
    log: LogObserver,
    animator: Option<Animator>,
    tasks: Vec<JoinHandle<()>>,
}

impl RunObserver for CliObserver {
    fn on_event(&mut self, event: &RunEvent) {
        self.log.on_event(event);
        if let (RunEvent::ResultAdded { id }, Some(animator)) = (event, &self.animator)
            && let Some(task) = animator.start(*id)
        {
            self.tasks.push(task);
        }
    }
}

fn cmd_run(args: RunArgs) -> anyhow::Result<ExitCode> {
    let cfg = load_config(&args.config)?;
    let images = cfg.load_images()?;
    let plan = cfg.job_plan(images.len());

    let service: Arc<dyn GenerativeService> = Arc::new(CommandService::new(cfg.service.clone())?);
    let sleeper: Arc<dyn Sleeper> = Arc::new(ThreadSleeper);
    let caller = RetryingCaller::new(cfg.retry_policy(), Arc::clone(&sleeper));
    let store = ResultStore::new();

    let animator = args.animate.then(|| {
        Animator::new(
            Arc::clone(&service),
            store.clone(),
            caller.clone(),
            Arc::clone(&sleeper),
        )
        .with_poll_interval(cfg.poll_interval())
    });
    let mut observer = CliObserver {
        log: LogObserver,
        animator,
        tasks: Vec::new(),
    };

    let orch = Orchestrator::new(service, caller, sleeper, store.clone(), cfg.run_options());
    let report = orch.run(&images, &plan, &CancelToken::new(), &mut observer)?;

    if !observer.tasks.is_empty() {
        eprintln!("waiting for {} animation(s)...", observer.tasks.len());
    }
    for task in observer.tasks.drain(..) {
        if task.join().is_err() {
            tracing::error!("animation thread panicked");
        }
    }
    for result in store.snapshot() {
        if let Some(err) = store.animation_status(result.id).and_then(|s| s.error) {
            eprintln!("animation {} failed: {err}", result.id);
        }
    }

    let results = store.snapshot();
    if !results.is_empty() {
        let summary = sea_augment::export_dataset(&results, &args.out, cfg.seed)?;
        eprintln!("wrote {}", summary.manifest.display());
    }

    println!("{report}");
    Ok(if report.is_aborted() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
