//! Training engine - runs episodes, replays and reports metrics

use crate::config::{validate_engine_config, EngineConfig};
use crate::episode::{EpisodeDriver, EpisodeSummary};
use crate::error::SimError;
use crate::metrics::{EpisodeRecord, MetricsSink};
use crate::persistence::RunCheckpoint;
use crate::policy::Policy;

/// Totals of a finished run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub episodes: u32,
    pub best_score: u32,
    pub total_score: u64,
    pub exploration: f32,
}

/// Main training loop over one scene.
pub struct SimulationEngine<P: Policy, M: MetricsSink> {
    pub driver: EpisodeDriver,
    pub policy: P,
    pub metrics: M,
    config: EngineConfig,
    next_episode: u32,
    exploration: f32,
    best_score: u32,
    total_score: u64,
}

impl<P: Policy, M: MetricsSink> SimulationEngine<P, M> {
    pub fn new(
        driver: EpisodeDriver,
        policy: P,
        metrics: M,
        config: EngineConfig,
    ) -> Result<Self, SimError> {
        let errors = validate_engine_config(&config);
        if !errors.is_empty() {
            return Err(SimError::InvalidConfig(errors));
        }
        Ok(Self {
            driver,
            policy,
            metrics,
            config,
            next_episode: 1,
            exploration: 1.0,
            best_score: 0,
            total_score: 0,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current progress, suitable for [`crate::persistence::save_checkpoint`].
    pub fn checkpoint(&self) -> RunCheckpoint {
        RunCheckpoint::new(
            self.next_episode,
            self.exploration,
            self.best_score,
            self.total_score,
        )
    }

    /// Continue a run: reload the policy at the saved exploration rate and
    /// pick up at the saved episode.
    pub fn resume(&mut self, checkpoint: &RunCheckpoint) -> Result<(), SimError> {
        self.policy
            .load(&self.config.policy_name, checkpoint.exploration)?;
        self.next_episode = checkpoint.next_episode;
        self.exploration = checkpoint.exploration;
        self.best_score = checkpoint.best_score;
        self.total_score = checkpoint.total_score;
        log::info!(
            "resuming {} at episode {}",
            self.config.policy_name,
            self.next_episode
        );
        Ok(())
    }

    fn record(&self, episode: u32, summary: &EpisodeSummary, entropy: f32) -> EpisodeRecord {
        let scene = self.driver.scene();
        EpisodeRecord {
            episode,
            entropy,
            exploration: self.exploration,
            terminal: summary.reason,
            rooms: scene.rooms.len(),
            env_width: scene.env_width,
            env_height: scene.env_height,
            frames: summary.stats.frames,
            frame_budget: self.driver.frame_budget(),
            score: summary.stats.score,
            room_changes: summary.stats.room_changes,
            random_actions: summary.stats.random_actions,
            reward: summary.stats.reward,
        }
    }

    /// Run the remaining episodes, then save the policy.
    ///
    /// A user abort, from the driver's signal or from `replay`, stops the
    /// run with [`SimError::UserAbort`]; the checkpoint still points at the
    /// first unfinished episode.
    pub fn run(&mut self) -> Result<RunSummary, SimError> {
        self.metrics.debug(0, self.driver.describe());
        self.metrics.debug(
            0,
            &format!(
                "training with: {} frames {} episodes {} replies",
                self.driver.frame_budget(),
                self.config.episodes,
                self.config.replay_batch
            ),
        );

        while self.next_episode <= self.config.episodes {
            let episode = self.next_episode;
            let summary = match self.driver.run_episode(&mut self.policy) {
                Ok(summary) => summary,
                Err(SimError::UserAbort) => {
                    self.metrics.debug(self.driver.stats().frames, "user abort");
                    log::warn!("run aborted during episode {}", episode);
                    return Err(SimError::UserAbort);
                }
                Err(e) => return Err(e),
            };

            let frames = summary.stats.frames;
            self.metrics.debug(frames, "Start agent replay.");
            let stats = match self.policy.replay(self.config.replay_batch) {
                Ok(stats) => stats,
                Err(e) => {
                    let e = SimError::from(e);
                    self.metrics.debug(frames, &e.to_string());
                    if matches!(e, SimError::UserAbort) {
                        log::warn!("run aborted during replay of episode {}", episode);
                    }
                    return Err(e);
                }
            };
            self.exploration = stats.exploration;
            self.best_score = self.best_score.max(summary.stats.score);
            self.total_score += u64::from(summary.stats.score);
            let record = self.record(episode, &summary, stats.entropy);
            self.metrics.log(frames, &record);
            self.metrics.debug(frames, "Agent replay completed.");
            self.next_episode = episode + 1;
        }

        self.metrics.debug(0, "Weights saving...");
        self.policy.save(&self.config.policy_name)?;
        self.metrics.debug(0, "Weights saving completed.");
        log::info!(
            "run complete: {} episodes, best score {}, total score {}",
            self.config.episodes,
            self.best_score,
            self.total_score
        );
        Ok(RunSummary {
            episodes: self.config.episodes,
            best_score: self.best_score,
            total_score: self.total_score,
            exploration: self.exploration,
        })
    }
}
