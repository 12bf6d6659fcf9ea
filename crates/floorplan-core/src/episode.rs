//! Episode driver - the per-episode state machine.
//!
//! ```text
//! AwaitingReset --reset--> Running --step--> Running
//!                                  \--step--> Terminal(Collision | Timeout) --reset--> Running
//! ```
//!
//! A user abort is observed before every step and leaves the driver in
//! `AwaitingReset`. The agent and the objective are `hecs` entities; the
//! scene itself is plain data owned by the driver.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use floorplan_logic::geometry::point_distance;
use floorplan_logic::perception::{project_segments, Observation, SceneSnapshot};
use floorplan_logic::scene::Scene;
use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::components::{Agent, Body, Heading, Objective, RoomTracker};
use crate::config::{validate_config, DriverConfig};
use crate::error::SimError;
use crate::policy::{Action, Decision, Policy, Transition};
use crate::systems::*;

/// Shared stop flag, settable from any thread.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminalReason {
    Collision,
    Timeout,
}

impl fmt::Display for TerminalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalReason::Collision => write!(f, "collision"),
            TerminalReason::Timeout => write!(f, "timeout"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeState {
    AwaitingReset,
    Running,
    Terminal(TerminalReason),
}

/// Counters of the current episode.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EpisodeStats {
    pub frames: u32,
    pub score: u32,
    pub room_changes: u32,
    pub random_actions: u32,
    pub reward: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub action: Action,
    pub random: bool,
    pub reward: f32,
    pub room_changed: bool,
    pub captured: bool,
    pub terminal: Option<TerminalReason>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeSummary {
    pub reason: TerminalReason,
    pub stats: EpisodeStats,
}

pub struct EpisodeDriver {
    /// ECS world holding the agent and the objective.
    pub world: World,
    scene: Scene,
    config: DriverConfig,
    agent: Entity,
    objective: Entity,
    state: EpisodeState,
    stats: EpisodeStats,
    frame_budget: u32,
    rng: StdRng,
    abort: AbortSignal,
    observation: Observation,
    /// Best agent-objective distance this episode.
    best_distance: f32,
    frames_since_room_change: u32,
    /// Progress of a committed door crossing, 0 when idle.
    door_step: u32,
    last_action: Action,
}

/// Frames allowed per episode: `100·rooms + 0.005·width·height`.
pub fn frame_budget_for(scene: &Scene) -> u32 {
    (100.0 * scene.rooms.len() as f32 + 0.005 * scene.env_width * scene.env_height) as u32
}

impl EpisodeDriver {
    pub fn new(scene: Scene, config: DriverConfig) -> Result<Self, SimError> {
        let errors = validate_config(&config);
        if !errors.is_empty() {
            return Err(SimError::InvalidConfig(errors));
        }
        if scene.rooms.is_empty() {
            return Err(SimError::EmptyScene);
        }
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut world = World::new();
        let agent = world.spawn((
            Agent,
            Body::square(config.agent_size),
            Heading::new(config.initial_heading),
            RoomTracker::default(),
        ));
        let objective = world.spawn((Objective, Body::square(config.objective_size)));
        let frame_budget = frame_budget_for(&scene);
        log::info!(
            "episode driver over {} rooms, {} frames per episode",
            scene.rooms.len(),
            frame_budget
        );

        Ok(Self {
            world,
            scene,
            config,
            agent,
            objective,
            state: EpisodeState::AwaitingReset,
            stats: EpisodeStats::default(),
            frame_budget,
            rng,
            abort: AbortSignal::new(),
            observation: Observation {
                rays: Vec::new(),
                sees_objective: false,
            },
            best_distance: f32::INFINITY,
            frames_since_room_change: 0,
            door_step: 0,
            last_action: Action::Forward,
        })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn state(&self) -> EpisodeState {
        self.state
    }

    pub fn stats(&self) -> EpisodeStats {
        self.stats
    }

    pub fn frame_budget(&self) -> u32 {
        self.frame_budget
    }

    pub fn observation(&self) -> &Observation {
        &self.observation
    }

    /// A handle that stops the driver before its next step.
    pub fn abort_signal(&self) -> AbortSignal {
        self.abort.clone()
    }

    pub fn agent_body(&self) -> Result<Body, SimError> {
        Ok(*self.world.get::<&Body>(self.agent)?)
    }

    pub fn objective_body(&self) -> Result<Body, SimError> {
        Ok(*self.world.get::<&Body>(self.objective)?)
    }

    pub fn heading(&self) -> Result<Heading, SimError> {
        Ok(*self.world.get::<&Heading>(self.agent)?)
    }

    /// Read-only view for perception and rendering.
    pub fn snapshot(&self) -> Result<SceneSnapshot<'_>, SimError> {
        Ok(SceneSnapshot {
            scene: &self.scene,
            agent: self.agent_body()?.rect,
            facing: f32::from(self.heading()?.degrees),
            objective: self.objective_body()?.rect,
        })
    }

    /// Start a new episode: objective first, then the agent.
    pub fn reset(&mut self) -> Result<&Observation, SimError> {
        respawn_objective(
            &mut self.world,
            self.objective,
            &self.scene,
            &self.config,
            &mut self.rng,
        )?;
        respawn_agent(
            &mut self.world,
            self.agent,
            &self.scene,
            &self.config,
            &mut self.rng,
        )?;
        self.stats = EpisodeStats::default();
        self.best_distance = f32::INFINITY;
        self.frames_since_room_change = 0;
        self.door_step = 0;
        self.last_action = Action::Forward;
        self.refresh_observation()?;
        self.state = EpisodeState::Running;
        log::debug!("episode reset, agent at {:?}", self.agent_body()?.rect);
        Ok(&self.observation)
    }

    /// Teleport the agent, keeping the episode running. The room tracker
    /// follows silently.
    pub fn place_agent(&mut self, x: f32, y: f32, heading: u16) -> Result<(), SimError> {
        let room = {
            let mut body = self.world.get::<&mut Body>(self.agent)?;
            body.move_to(x, y);
            sense_room(&self.scene, &body)
        };
        *self.world.get::<&mut Heading>(self.agent)? = Heading::new(heading);
        self.world.get::<&mut RoomTracker>(self.agent)?.last_room = room;
        self.refresh_observation()
    }

    pub fn place_objective(&mut self, x: f32, y: f32) -> Result<(), SimError> {
        self.world.get::<&mut Body>(self.objective)?.move_to(x, y);
        self.refresh_observation()
    }

    fn refresh_observation(&mut self) -> Result<(), SimError> {
        self.observation = project_segments(&self.snapshot()?);
        Ok(())
    }

    fn center_distance(&self) -> Result<f32, SimError> {
        Ok(point_distance(
            self.agent_body()?.rect.center(),
            self.objective_body()?.rect.center(),
        ))
    }

    /// Pick the action: the door override when active, the policy otherwise.
    fn decide(&mut self, policy: &mut dyn Policy) -> Result<Decision, SimError> {
        let agent = self.agent_body()?.rect;
        if self.config.logic_driver
            && self.door_step == 0
            && self.frames_since_room_change > self.config.door_activation_frames
            && door_in_front(&self.scene, &agent, self.config.door_front)
        {
            self.door_step = 1;
        }
        if self.door_step == 0 {
            let decision = policy.act(&self.observation);
            self.last_action = decision.action;
            return Ok(decision);
        }

        self.door_step += 1;
        log::debug!("door crossing step {}", self.door_step);
        match closest_door(&self.scene, &agent, self.config.door_closest) {
            Some(door) => {
                if self.last_action == Action::Forward {
                    cross_door(&mut self.world, self.agent, &door)?;
                    self.door_step = 0;
                }
                self.last_action = Action::Forward;
            }
            None => {
                log::debug!("lost door");
                self.door_step = 0;
            }
        }
        Ok(Decision {
            action: self.last_action,
            random: false,
        })
    }

    /// Reward of a non-terminal step. Relocates the objective on capture.
    fn reward(&mut self, room_changed: bool) -> Result<(f32, bool), SimError> {
        let r = self.config.rewards;
        let mut reward = r.survival;
        if self.stats.frames % r.decay_interval == 0 && reward > 0.0 {
            reward -= r.decay;
        }
        // Progress toward the objective only pays while it is in view.
        if self.observation.sees_objective {
            reward += r.objective_seen;
            let distance = self.center_distance()?;
            if distance < self.best_distance {
                self.best_distance = distance;
                reward += r.closer;
            }
        }
        let captured = objective_reached(&self.world);
        if captured {
            respawn_objective(
                &mut self.world,
                self.objective,
                &self.scene,
                &self.config,
                &mut self.rng,
            )?;
            self.stats.score += 1;
            reward += r.capture;
            self.refresh_observation()?;
            log::debug!("objective captured, score {}", self.stats.score);
        }
        if room_changed {
            reward += r.room_change;
        }
        Ok((reward, captured))
    }

    /// Advance one frame.
    pub fn step(&mut self, policy: &mut dyn Policy) -> Result<StepOutcome, SimError> {
        if self.state != EpisodeState::Running {
            return Err(SimError::NotRunning);
        }
        if self.abort.is_triggered() {
            self.state = EpisodeState::AwaitingReset;
            log::warn!("episode aborted at frame {}", self.stats.frames);
            return Err(SimError::UserAbort);
        }
        self.stats.frames += 1;
        self.frames_since_room_change += 1;

        let state = self.observation.features();
        let decision = self.decide(policy)?;
        if decision.random {
            self.stats.random_actions += 1;
        }
        apply_action(&mut self.world, decision.action, self.config.speed);
        let room_changed = room_sensor_system(&mut self.world, &self.scene);
        if room_changed {
            self.stats.room_changes += 1;
            self.frames_since_room_change = 0;
        }

        let terminal = if collision_system(&self.world, &self.scene).is_some() {
            Some(TerminalReason::Collision)
        } else if self.stats.frames > self.frame_budget {
            Some(TerminalReason::Timeout)
        } else {
            None
        };

        let (reward, captured, next_state) = match terminal {
            Some(reason) => {
                self.state = EpisodeState::Terminal(reason);
                log::debug!("episode ended by {} at frame {}", reason, self.stats.frames);
                (0.0, false, state.clone())
            }
            None => {
                self.refresh_observation()?;
                let (reward, captured) = self.reward(room_changed)?;
                (reward, captured, self.observation.features())
            }
        };
        self.stats.reward += reward;

        if self.stats.frames > self.config.remember_after {
            policy.remember(Transition {
                state,
                action: decision.action,
                reward,
                next_state,
                terminal: terminal.is_some(),
            });
        }

        Ok(StepOutcome {
            action: decision.action,
            random: decision.random,
            reward,
            room_changed,
            captured,
            terminal,
        })
    }

    /// Reset, then step until the episode ends.
    pub fn run_episode(&mut self, policy: &mut dyn Policy) -> Result<EpisodeSummary, SimError> {
        self.reset()?;
        loop {
            if let Some(reason) = self.step(policy)?.terminal {
                let summary = EpisodeSummary {
                    reason,
                    stats: self.stats,
                };
                log::info!(
                    "episode over: {} after {} frames, score {}, reward {}",
                    reason,
                    summary.stats.frames,
                    summary.stats.score,
                    summary.stats.reward
                );
                return Ok(summary);
            }
        }
    }

    /// Reported once per run so the metrics show which driver was used.
    pub fn describe(&self) -> &'static str {
        if self.config.logic_driver {
            "With LOGIC_DRIVER"
        } else {
            "WITHOUT any driver"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RewardConfig;
    use crate::policy::{PolicyError, ReplayStats};
    use floorplan_logic::geometry::Rect;
    use floorplan_logic::scene::{Door, FurnitureKind, Orientation, Room, RoomType, Side};

    /// Always returns the same action and records what it was given.
    struct Fixed {
        action: Action,
        remembered: Vec<Transition>,
    }

    impl Fixed {
        fn new(action: Action) -> Self {
            Self {
                action,
                remembered: Vec::new(),
            }
        }
    }

    impl Policy for Fixed {
        fn act(&mut self, _: &Observation) -> Decision {
            Decision {
                action: self.action,
                random: false,
            }
        }
        fn remember(&mut self, t: Transition) {
            self.remembered.push(t);
        }
        fn replay(&mut self, _: usize) -> Result<ReplayStats, PolicyError> {
            Ok(ReplayStats {
                entropy: 0.0,
                exploration: 0.0,
            })
        }
        fn save(&mut self, _: &str) -> Result<(), PolicyError> {
            Ok(())
        }
        fn load(&mut self, _: &str, _: f32) -> Result<(), PolicyError> {
            Ok(())
        }
    }

    /// Two rooms joined through a door at x = 100 / x = 130, floor
    /// covering both.
    fn scene() -> Scene {
        let mut scene = Scene::new(300.0, 300.0, 8.5, 8.5);
        scene.floor = Rect::new(0.0, 0.0, 230.0, 100.0);
        scene.rooms.push(Room {
            index: 0,
            room_type: RoomType::Hall,
            rect: Rect::new(0.0, 0.0, 100.0, 100.0),
            door: Door {
                rect: Rect::new(100.0, 40.0, 0.0, 20.0),
                side: Side::East,
            },
            furniture: Vec::new(),
        });
        scene.rooms.push(Room {
            index: 1,
            room_type: RoomType::Kitchen,
            rect: Rect::new(130.0, 0.0, 100.0, 100.0),
            door: Door {
                rect: Rect::new(130.0, 40.0, 0.0, 20.0),
                side: Side::West,
            },
            furniture: Vec::new(),
        });
        scene.add_object(
            1,
            None,
            FurnitureKind::Sofa,
            Rect::new(200.0, 10.0, 20.0, 60.0),
            Orientation::W,
        );
        scene
    }

    fn driver(config: DriverConfig) -> EpisodeDriver {
        let config = DriverConfig {
            seed: Some(3),
            ..config
        };
        let mut driver = EpisodeDriver::new(scene(), config).unwrap();
        driver.reset().unwrap();
        driver
    }

    #[test]
    fn frame_budget_scales_with_rooms_and_area() {
        let d = driver(DriverConfig::default());
        // 100·2 + 0.005·300·300 = 650.
        assert_eq!(d.frame_budget(), 650);
    }

    #[test]
    fn step_requires_running_episode() {
        let mut d = EpisodeDriver::new(scene(), DriverConfig::default()).unwrap();
        let mut policy = Fixed::new(Action::Forward);
        assert!(matches!(d.step(&mut policy), Err(SimError::NotRunning)));
    }

    #[test]
    fn walking_into_furniture_ends_the_episode() {
        let mut d = driver(DriverConfig::default());
        d.place_agent(190.0, 30.0, 0).unwrap();
        d.place_objective(20.0, 80.0).unwrap();
        let mut policy = Fixed::new(Action::Forward);
        let mut last = None;
        for _ in 0..10 {
            let outcome = d.step(&mut policy).unwrap();
            if outcome.terminal.is_some() {
                last = Some(outcome);
                break;
            }
        }
        let outcome = last.unwrap();
        assert_eq!(outcome.terminal, Some(TerminalReason::Collision));
        assert_eq!(outcome.reward, 0.0);
        assert_eq!(d.state(), EpisodeState::Terminal(TerminalReason::Collision));
        assert!(matches!(d.step(&mut policy), Err(SimError::NotRunning)));
    }

    #[test]
    fn survival_reward_decays_every_tenth_frame() {
        let mut d = driver(DriverConfig {
            rewards: RewardConfig {
                objective_seen: 0.0,
                closer: 0.0,
                ..Default::default()
            },
            ..Default::default()
        });
        d.place_agent(20.0, 20.0, 90).unwrap();
        d.place_objective(160.0, 80.0).unwrap();
        // Turning in place never collides.
        let mut policy = Fixed::new(Action::TurnLeft);
        let rewards: Vec<f32> = (0..10)
            .map(|_| d.step(&mut policy).unwrap().reward)
            .collect();
        assert!(rewards[..9].iter().all(|&r| r == 1.0));
        assert_eq!(rewards[9], 0.0);
        assert_eq!(d.stats().reward, 9.0);
    }

    #[test]
    fn approach_bonus_needs_the_objective_in_view() {
        let mut d = driver(DriverConfig {
            rewards: RewardConfig {
                objective_seen: 0.0,
                ..Default::default()
            },
            ..Default::default()
        });
        // Facing west with the objective to the east: no ray reaches it.
        d.place_agent(20.0, 20.0, 180).unwrap();
        d.place_objective(70.0, 20.0).unwrap();
        assert!(!d.observation().sees_objective);
        let mut policy = Fixed::new(Action::TurnLeft);
        let outcome = d.step(&mut policy).unwrap();
        assert!(!d.observation().sees_objective);
        assert_eq!(outcome.reward, 1.0);
    }

    #[test]
    fn transitions_are_remembered_after_warmup() {
        let mut d = driver(DriverConfig::default());
        d.place_agent(20.0, 20.0, 90).unwrap();
        let mut policy = Fixed::new(Action::TurnRight);
        for _ in 0..8 {
            d.step(&mut policy).unwrap();
        }
        assert_eq!(policy.remembered.len(), 3);
        let t = &policy.remembered[0];
        assert_eq!(t.state.len(), 40);
        assert_eq!(t.action, Action::TurnRight);
        assert!(!t.terminal);
    }

    #[test]
    fn touching_the_objective_scores_and_relocates_it() {
        let mut d = driver(DriverConfig::default());
        d.place_agent(40.0, 40.0, 0).unwrap();
        d.place_objective(43.0, 36.0).unwrap();
        let mut policy = Fixed::new(Action::TurnLeft);
        let outcome = d.step(&mut policy).unwrap();
        assert!(outcome.captured);
        assert!(outcome.terminal.is_none());
        assert!(outcome.reward >= 10.0);
        assert_eq!(d.stats().score, 1);
        // Standing still does not score again.
        for _ in 0..20 {
            assert!(!d.step(&mut policy).unwrap().captured);
        }
        assert_eq!(d.stats().score, 1);
    }

    #[test]
    fn crossing_rooms_is_rewarded() {
        let mut d = driver(DriverConfig::default());
        // Top-left corner one step from leaving room 0 through its door.
        d.place_agent(99.0, 46.0, 0).unwrap();
        d.place_objective(20.0, 80.0).unwrap();
        let mut policy = Fixed::new(Action::Forward);
        let outcome = d.step(&mut policy).unwrap();
        assert!(outcome.room_changed);
        assert!(outcome.terminal.is_none());
        assert_eq!(d.stats().room_changes, 1);
    }

    #[test]
    fn abort_stops_before_the_next_step() {
        let mut d = driver(DriverConfig::default());
        let signal = d.abort_signal();
        signal.trigger();
        let mut policy = Fixed::new(Action::TurnLeft);
        assert!(matches!(d.step(&mut policy), Err(SimError::UserAbort)));
        assert_eq!(d.state(), EpisodeState::AwaitingReset);
        signal.clear();
        d.reset().unwrap();
        assert!(d.step(&mut policy).is_ok());
    }

    #[test]
    fn logic_driver_walks_through_a_door() {
        let mut d = driver(DriverConfig {
            logic_driver: true,
            ..Default::default()
        });
        d.place_agent(20.0, 46.0, 90).unwrap();
        d.place_objective(20.0, 80.0).unwrap();
        let mut policy = Fixed::new(Action::TurnLeft);
        // Idle long enough to arm the override.
        for _ in 0..21 {
            d.step(&mut policy).unwrap();
        }
        d.place_agent(88.0, 46.0, 0).unwrap();
        let first = d.step(&mut policy).unwrap();
        assert_eq!(first.action, Action::Forward);
        let second = d.step(&mut policy).unwrap();
        assert_eq!(second.action, Action::Forward);
        assert!(second.room_changed);
        assert_eq!(d.heading().unwrap().degrees, 0);
        assert!(d.agent_body().unwrap().rect.x > 100.0);
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let config = DriverConfig {
            speed: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            EpisodeDriver::new(scene(), config),
            Err(SimError::InvalidConfig(_))
        ));
        let empty = Scene::new(10.0, 10.0, 1.0, 1.0);
        assert!(matches!(
            EpisodeDriver::new(empty, DriverConfig::default()),
            Err(SimError::EmptyScene)
        ));
    }
}
