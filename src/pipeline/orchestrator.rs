use crate::foundation::core::{BoundingBox, ImagePayload, SeaState, SourceImage};
use crate::foundation::error::{AugmentError, AugmentResult};
use crate::foundation::timing::{CancelToken, Sleeper};
use crate::perturb::transform::{PerturbationConfig, apply_perturbations};
use crate::pipeline::events::{RunEvent, RunObserver, Stage};
use crate::pipeline::outcome::{RunOutcome, RunReport, RunStatus};
use crate::plan::planner::JobPlan;
use crate::plan::rules::{StyleRule, apply_style_rules, default_style_rules};
use crate::service::api::{GenerativeService, ServiceError};
use crate::service::retry::RetryingCaller;
use crate::store::results::{NewResult, ResultStore};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;

/// Mandatory pause after every external call.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(1500);

const ORIGINAL_SCENERY_LABEL: &str = "original scenery";

/// Per-run behaviour switches.
#[derive(Clone, Debug, PartialEq)]
pub struct RunOptions {
    /// Run the preservation check on every scenery result.
    pub verify_preservation: bool,
    /// Evaluate every obstacle result for hard-example difficulty.
    pub harden_examples: bool,
    /// Degradations applied before results are stored.
    pub perturbation: PerturbationConfig,
    /// Pause after every external call.
    pub cooldown: Duration,
    /// Keyword rules appending style clauses to obstacle prompts.
    pub style_rules: Vec<StyleRule>,
    /// Base seed; noise of the result at 1-based store position `n` is seeded with `seed + n`,
    /// the `generation_seed` written on export.
    pub seed: u64,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            verify_preservation: true,
            harden_examples: false,
            perturbation: PerturbationConfig::default(),
            cooldown: DEFAULT_COOLDOWN,
            style_rules: default_style_rules(),
            seed: 0,
        }
    }
}

/// Executes a [`JobPlan`] against the generative service, one call at a time.
///
/// Loop order is images, then scenarios, then obstacles. Every call goes through the
/// [`RetryingCaller`] and is followed by the cooldown. Cancellation is checked before each
/// scenario and obstacle job and after every call; it never interrupts a call in flight.
pub struct Orchestrator {
    service: Arc<dyn GenerativeService>,
    caller: RetryingCaller,
    sleeper: Arc<dyn Sleeper>,
    store: ResultStore,
    opts: RunOptions,
}

enum Halt {
    Cancelled,
    Fatal(AugmentError),
}

impl From<AugmentError> for Halt {
    fn from(err: AugmentError) -> Self {
        Self::Fatal(err)
    }
}

impl Orchestrator {
    /// Create an orchestrator appending into `store`.
    pub fn new(
        service: Arc<dyn GenerativeService>,
        caller: RetryingCaller,
        sleeper: Arc<dyn Sleeper>,
        store: ResultStore,
        opts: RunOptions,
    ) -> Self {
        Self {
            service,
            caller,
            sleeper,
            store,
            opts,
        }
    }

    /// Store receiving the results.
    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Execute `plan` over `images`.
    ///
    /// Returns `Err` only for invalid input detected before the first call. Cancellation and
    /// fatal service errors end the run early and are reported through [`RunReport::status`];
    /// results stored before that point are kept.
    #[tracing::instrument(skip_all, fields(images = images.len(), total_jobs = plan.total_jobs))]
    pub fn run(
        &self,
        images: &[Arc<SourceImage>],
        plan: &JobPlan,
        cancel: &CancelToken,
        observer: &mut dyn RunObserver,
    ) -> AugmentResult<RunReport> {
        plan.validate(images.len())?;
        let total = images.len() as u64 * plan.jobs_per_image();
        if total != plan.total_jobs {
            return Err(AugmentError::validation(format!(
                "job plan expects {} jobs but {} images yield {total}",
                plan.total_jobs,
                images.len()
            )));
        }

        observer.on_event(&RunEvent::Started { total_jobs: total });
        let mut run = Run {
            orch: self,
            plan,
            cancel,
            observer,
            outcome: RunOutcome::default(),
            current: 0,
            total,
        };

        let status = match run.execute(images) {
            Ok(()) => RunStatus::Completed,
            Err(Halt::Cancelled) => RunStatus::Stopped,
            Err(Halt::Fatal(err)) => {
                tracing::error!(%err, "a critical error stopped the generation");
                RunStatus::Aborted {
                    message: abort_message(&err),
                }
            }
        };

        let report = RunReport {
            status,
            outcome: run.outcome,
            total_jobs: total,
            attempted: run.current,
        };
        tracing::info!(
            succeeded = report.outcome.succeeded,
            failed = report.outcome.failed,
            discarded = report.outcome.discarded,
            rejected = report.outcome.rejected,
            "{report}"
        );
        Ok(report)
    }
}

fn abort_message(err: &AugmentError) -> String {
    let text = err.to_string();
    if err.is_rate_limit_exhausted() || text.contains("RESOURCE_EXHAUSTED") {
        format!(
            "API quota or rate limit exceeded; generation was interrupted. Check your plan and \
             billing details and try again later ({text})"
        )
    } else {
        text
    }
}

/// Seed for the result about to become the `position`-th (0-based) entry of the store.
fn noise_seed(seed: u64, position: usize) -> u64 {
    seed.wrapping_add(position as u64 + 1)
}

/// Mutable state of one run.
struct Run<'a> {
    orch: &'a Orchestrator,
    plan: &'a JobPlan,
    cancel: &'a CancelToken,
    observer: &'a mut dyn RunObserver,
    outcome: RunOutcome,
    current: u64,
    total: u64,
}

impl Run<'_> {
    fn execute(&mut self, images: &[Arc<SourceImage>]) -> Result<(), Halt> {
        let plan = self.plan;
        for image in images {
            for scenario in plan.scenario_slots() {
                self.checkpoint()?;
                self.run_scenario(image, scenario)?;
            }
        }
        Ok(())
    }

    fn run_scenario(
        &mut self,
        source: &Arc<SourceImage>,
        scenario: Option<&str>,
    ) -> Result<(), Halt> {
        let plan = self.plan;
        let orch = self.orch;
        let opts = &orch.opts;
        let dependents = plan.obstacle_prompts.len() as u64;
        let mut base = source.image.clone();
        let mut sea_state = None;

        if let Some(prompt) = scenario {
            self.advance(1);
            self.stage(Stage::Scenery);
            let edit = self.call(|s| s.edit_image(&source.image, prompt, false))?;
            self.checkpoint()?;

            let Some(scenery) = edit.image.clone() else {
                self.job_failed(edit.failure_reason());
                self.skip(dependents);
                return Ok(());
            };

            if opts.verify_preservation {
                self.stage(Stage::Verifying);
                let preserved = self.advisory("preservation check", false, |s| {
                    s.check_preservation(&source.image, &scenery)
                });
                self.checkpoint()?;
                if !preserved {
                    tracing::warn!(scenario = prompt, "principal subject lost; scenery discarded");
                    self.outcome.rejected += 1;
                    self.outcome.discarded += dependents;
                    self.observer.on_event(&RunEvent::Discarded { jobs: dependents });
                    self.skip(dependents);
                    return Ok(());
                }
            }

            if plan.sea_state_requested {
                self.stage(Stage::ClassifyingSeaState);
                sea_state = self.advisory("sea state classification", None, |s| {
                    s.classify_sea_state(&scenery)
                });
                self.checkpoint()?;
            }

            self.store_result(source, &scenery, prompt.to_string(), None, sea_state, None);
            base = scenery;
        }

        for obstacle in &plan.obstacle_prompts {
            self.checkpoint()?;
            self.advance(1);
            self.stage(Stage::Obstacle);
            let prompt = apply_style_rules(&opts.style_rules, scenario, obstacle);
            let edit = self.call(|s| s.edit_image(&base, &prompt, true))?;
            self.checkpoint()?;

            let Some(image) = edit.image.clone() else {
                self.job_failed(edit.failure_reason());
                continue;
            };

            let is_hard = if opts.harden_examples {
                self.stage(Stage::EvaluatingHardExample);
                let hard = self.advisory("hard example evaluation", false, |s| {
                    s.evaluate_hard_example(&image)
                });
                self.checkpoint()?;
                Some(hard)
            } else {
                None
            };

            let label = format!("{obstacle} ({})", scenario.unwrap_or(ORIGINAL_SCENERY_LABEL));
            self.store_result(source, &image, label, edit.bounding_box, sea_state, is_hard);
        }
        Ok(())
    }

    fn checkpoint(&self) -> Result<(), Halt> {
        if self.cancel.is_cancelled() {
            tracing::info!("cancellation requested; stopping after the current job");
            return Err(Halt::Cancelled);
        }
        Ok(())
    }

    /// One retried service call followed by the cooldown.
    fn call<T>(
        &mut self,
        mut op: impl FnMut(&dyn GenerativeService) -> Result<T, ServiceError>,
    ) -> AugmentResult<T> {
        let orch = self.orch;
        let cancel = self.cancel;
        let observer = &mut *self.observer;
        let service = orch.service.as_ref();
        let res = orch.caller.call(
            || op(service),
            &mut |notice| {
                if !cancel.is_cancelled() {
                    observer.on_event(&RunEvent::Retry(notice));
                }
            },
        );
        orch.sleeper.sleep(orch.opts.cooldown);
        res
    }

    /// Like [`Self::call`], but any failure is logged and replaced by `fallback`.
    fn advisory<T>(
        &mut self,
        what: &str,
        fallback: T,
        op: impl FnMut(&dyn GenerativeService) -> Result<T, ServiceError>,
    ) -> T {
        match self.call(op) {
            Ok(v) => v,
            Err(err) => {
                tracing::warn!(%err, "{what} failed; continuing with the default");
                fallback
            }
        }
    }

    fn store_result(
        &mut self,
        source: &Arc<SourceImage>,
        image: &ImagePayload,
        prompt: String,
        bounding_box: Option<BoundingBox>,
        sea_state: Option<SeaState>,
        is_hard_example: Option<bool>,
    ) {
        let orch = self.orch;
        let opts = &orch.opts;
        let image = if opts.perturbation.is_active() {
            self.stage(Stage::Perturbing);
            let mut rng = StdRng::seed_from_u64(noise_seed(opts.seed, orch.store.len()));
            match apply_perturbations(image, &opts.perturbation, &mut rng) {
                Ok(perturbed) => perturbed,
                Err(err) => {
                    tracing::warn!(%err, "failed to apply perturbations; keeping the original");
                    image.clone()
                }
            }
        } else {
            image.clone()
        };

        let id = orch.store.append(NewResult {
            source: Arc::clone(source),
            image,
            prompt,
            bounding_box,
            sea_state,
            is_hard_example,
        });
        self.outcome.succeeded += 1;
        self.observer.on_event(&RunEvent::ResultAdded { id });
    }

    fn job_failed(&mut self, reason: String) {
        tracing::warn!(%reason, "image generation failed");
        self.outcome.failed += 1;
        self.observer.on_event(&RunEvent::JobFailed { reason });
    }

    fn stage(&mut self, stage: Stage) {
        self.observer.on_event(&RunEvent::Stage(stage));
    }

    fn advance(&mut self, jobs: u64) {
        self.current += jobs;
        tracing::debug!(current = self.current, total = self.total, "job");
        self.observer.on_event(&RunEvent::Progress {
            current: self.current,
            total: self.total,
        });
    }

    fn skip(&mut self, jobs: u64) {
        if jobs > 0 {
            self.advance(jobs);
        }
    }
}
