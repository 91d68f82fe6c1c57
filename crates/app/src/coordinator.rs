//! Coordinator — the per-group orchestrator.
//!
//! A [`Coordinator`] owns everything that makes up one light group: its
//! state machine, timers, triggers, light controller and manual detector.
//! Every input reaches it as an [`Inbound`] message, including callbacks
//! from entity subscriptions and fired timers, so events for one group are
//! always processed one at a time. State-machine events raised while
//! handling a message are queued and dispatched in order before the next
//! message is taken.

use std::collections::{HashMap, VecDeque};
use std::ops::ControlFlow;
use std::sync::Arc;

use motionlights_domain::config::LightGroupConfig;
use motionlights_domain::entity::StateChange;
use motionlights_domain::error::MotionLightsError;
use motionlights_domain::manual::ManualReason;
use motionlights_domain::state_machine::{
    LightingState, StateMachine, TimerKind, Transition, TransitionEvent, reevaluate,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::attribution::AttributionRegistry;
use crate::light_controller::LightController;
use crate::manual_detection::ManualDetector;
use crate::ports::{EntityStates, LightCommander, ScheduleHandle, Scheduler};
use crate::status::{CoordinatorStatus, EventLog};
use crate::timer_manager::{TimerExpiry, TimerManager};
use crate::trigger_manager::{
    EntityTrigger, MOTION_TRIGGER, OVERRIDE_TRIGGER, TriggerManager, TriggerSignal,
};

/// Events a light group reacts to, as delivered by subscriptions or by an
/// external caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExternalEvent {
    MotionOn,
    MotionOff,
    OverrideOn,
    OverrideOff,
    LightChanged(StateChange),
    ManualOffIntervention,
    TimerExpired { timer: TimerKind },
    ContextChanged { entity_id: String },
}

/// Messages accepted by a coordinator's mailbox.
#[derive(Debug)]
pub enum Inbound {
    External(ExternalEvent),
    TimerFired(TimerExpiry),
    MotionDelayElapsed {
        generation: u64,
    },
    RefreshLights,
    Status(oneshot::Sender<CoordinatorStatus>),
    Reconfigure {
        config: LightGroupConfig,
        reply: oneshot::Sender<Result<(), MotionLightsError>>,
    },
    Shutdown(oneshot::Sender<()>),
}

pub type Mailbox = mpsc::UnboundedSender<Inbound>;

fn notify(mailbox: &Mailbox, inbound: Inbound) {
    if mailbox.send(inbound).is_err() {
        tracing::debug!("light group stopped, dropping message");
    }
}

struct PendingMotion {
    handle: ScheduleHandle,
    generation: u64,
}

pub struct Coordinator<H, S> {
    name: String,
    config: LightGroupConfig,
    host: H,
    scheduler: S,
    mailbox: Mailbox,
    machine: StateMachine,
    timers: TimerManager<S>,
    lights: LightController<H>,
    detector: ManualDetector,
    registry: AttributionRegistry,
    triggers: TriggerManager,
    subscriptions: Vec<motionlights_domain::id::SubscriptionId>,
    light_states: HashMap<String, bool>,
    motion_active: bool,
    override_active: bool,
    pending_motion: Option<PendingMotion>,
    motion_generation: u64,
    last_manual_reason: Option<ManualReason>,
    event_log: EventLog,
    pending: VecDeque<TransitionEvent>,
}

impl<H, S> Coordinator<H, S>
where
    H: EntityStates + LightCommander + Clone + Send + Sync + 'static,
    S: Scheduler + Clone + Send + Sync + 'static,
{
    /// Build an idle coordinator; nothing is subscribed until
    /// [`setup`](Self::setup).
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        config: LightGroupConfig,
        host: H,
        scheduler: S,
        mailbox: Mailbox,
    ) -> Self {
        let registry = AttributionRegistry::default();
        Self {
            name: name.into(),
            lights: LightController::new(host.clone(), &config, registry.clone()),
            detector: ManualDetector::new(registry.clone()),
            timers: TimerManager::new(scheduler.clone()),
            config,
            host,
            scheduler,
            mailbox,
            machine: StateMachine::default(),
            registry,
            triggers: TriggerManager::new(),
            subscriptions: Vec::new(),
            light_states: HashMap::new(),
            motion_active: false,
            override_active: false,
            pending_motion: None,
            motion_generation: 0,
            last_manual_reason: None,
            event_log: EventLog::default(),
            pending: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn state(&self) -> LightingState {
        self.machine.current()
    }

    #[must_use]
    pub fn config(&self) -> &LightGroupConfig {
        &self.config
    }

    /// Subscribe to every configured entity and pick the initial state.
    ///
    /// An active override places the group in `disabled`; any light already
    /// on places it in `manual_timeout` with the extended timer running;
    /// otherwise it starts in `standby`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid configuration, and any
    /// subscription or scheduler failure. Subscriptions made before the
    /// failure stay in place until [`shutdown`](Self::shutdown).
    #[tracing::instrument(skip(self), fields(group = %self.name))]
    pub async fn setup(&mut self) -> Result<(), MotionLightsError> {
        self.config.validate()?;
        self.subscribe_all().await?;
        self.read_light_states().await;
        self.motion_active = self.triggers.is_active(MOTION_TRIGGER);
        self.override_active = self.triggers.is_active(OVERRIDE_TRIGGER);

        if self.override_active {
            self.machine
                .reset(LightingState::Disabled, "override active at startup");
        } else if self.lights_on() > 0 {
            self.machine
                .reset(LightingState::ManualTimeout, "lights on at startup");
            let callback = self.timer_callback();
            self.timers.start(
                TimerKind::Extended,
                self.config.extended_timeout(),
                callback,
            )?;
        }

        let state = self.machine.current();
        tracing::info!(%state, lights_on = self.lights_on(), "light group ready");
        self.event_log.push(format!("started in {state}"));
        Ok(())
    }

    /// Process one mailbox message. Breaks once the coordinator shut down.
    pub async fn handle(&mut self, inbound: Inbound) -> ControlFlow<()> {
        match inbound {
            Inbound::External(event) => self.process_external_event(event).await,
            Inbound::TimerFired(expiry) => self.on_timer_fired(expiry).await,
            Inbound::MotionDelayElapsed { generation } => {
                self.on_motion_delay_elapsed(generation).await;
            }
            Inbound::RefreshLights => self.refresh_lights().await,
            Inbound::Status(reply) => {
                let _ = reply.send(self.status());
            }
            Inbound::Reconfigure { config, reply } => {
                let result = self.reconfigure(config).await;
                let _ = reply.send(result);
            }
            Inbound::Shutdown(reply) => {
                self.shutdown().await;
                let _ = reply.send(());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// React to one external event, then dispatch every state-machine event
    /// it raised.
    #[tracing::instrument(skip(self), fields(group = %self.name, state = %self.machine.current()))]
    pub async fn process_external_event(&mut self, event: ExternalEvent) {
        match event {
            ExternalEvent::MotionOn => self.on_motion(true),
            ExternalEvent::MotionOff => self.on_motion(false),
            ExternalEvent::OverrideOn => {
                self.override_active = true;
                self.cancel_motion_delay();
                self.pending.push_back(TransitionEvent::OverrideOn);
            }
            ExternalEvent::OverrideOff => {
                self.override_active = false;
                self.pending.push_back(TransitionEvent::OverrideOff);
            }
            ExternalEvent::LightChanged(change) => self.on_light_changed(&change),
            ExternalEvent::ManualOffIntervention => {
                if self.machine.current() == LightingState::ManualOff {
                    self.start_timer(TimerKind::Extended);
                } else {
                    self.pending
                        .push_back(TransitionEvent::ManualOffIntervention);
                }
            }
            ExternalEvent::TimerExpired { timer } => {
                self.timers.cancel(timer);
                self.pending.push_back(TransitionEvent::TimerExpired(timer));
            }
            ExternalEvent::ContextChanged { entity_id } => {
                self.on_context_changed(&entity_id).await;
            }
        }
        self.drain().await;
    }

    async fn on_timer_fired(&mut self, expiry: TimerExpiry) {
        if !self.timers.acknowledge(expiry) {
            tracing::debug!(timer = %expiry.kind, "ignoring expiry of replaced timer");
            return;
        }
        tracing::info!(group = %self.name, timer = %expiry.kind, "timer expired");
        self.pending
            .push_back(TransitionEvent::TimerExpired(expiry.kind));
        self.drain().await;
    }

    async fn on_motion_delay_elapsed(&mut self, generation: u64) {
        match &self.pending_motion {
            Some(pending) if pending.generation == generation => self.pending_motion = None,
            _ => {
                tracing::debug!("ignoring stale motion delay");
                return;
            }
        }
        if self.motion_active {
            self.pending.push_back(TransitionEvent::MotionOn);
        }
        self.drain().await;
    }

    /// Re-read every light from the host.
    pub async fn refresh_lights(&mut self) {
        self.read_light_states().await;
        tracing::debug!(group = %self.name, lights_on = self.lights_on(), "lights refreshed");
    }

    /// Drop attribution tokens past their retention.
    pub fn prune_tokens(&self) -> usize {
        let pruned = self.registry.prune();
        tracing::debug!(group = %self.name, pruned, "attribution tokens pruned");
        pruned
    }

    /// Replace the configuration while keeping the current state.
    ///
    /// Subscriptions are rebuilt, the brightness selector is reset and any
    /// running timer restarts with the new duration. Motion that stopped with
    /// the sensor swap and an override switch that now reads differently are
    /// applied as regular events.
    ///
    /// # Errors
    ///
    /// Returns a validation error, leaving the group untouched, when
    /// `config` is invalid. A subscription failure is returned after the new
    /// configuration was adopted.
    #[tracing::instrument(skip(self, config), fields(group = %self.name))]
    pub async fn reconfigure(&mut self, config: LightGroupConfig) -> Result<(), MotionLightsError> {
        config.validate()?;

        let running = self.timers.active_kinds();
        let was_moving = self.motion_active;
        self.unsubscribe_all().await;
        self.cancel_motion_delay();
        self.timers.cancel_all();

        self.config = config;
        self.lights.reconfigure(&self.config);
        self.subscribe_all().await?;
        self.read_light_states().await;
        self.motion_active = self.triggers.is_active(MOTION_TRIGGER);
        for kind in running {
            self.start_timer(kind);
        }
        if was_moving && !self.motion_active {
            self.pending.push_back(TransitionEvent::MotionOff);
        }

        tracing::info!(state = %self.machine.current(), "configuration replaced");
        self.event_log.push("configuration replaced");

        let override_now = self.triggers.is_active(OVERRIDE_TRIGGER);
        if override_now == self.override_active {
            self.drain().await;
        } else if override_now {
            self.process_external_event(ExternalEvent::OverrideOn).await;
        } else {
            self.process_external_event(ExternalEvent::OverrideOff)
                .await;
        }
        Ok(())
    }

    /// Cancel timers and drop every subscription.
    pub async fn shutdown(&mut self) {
        self.timers.cancel_all();
        self.cancel_motion_delay();
        self.unsubscribe_all().await;
        tracing::info!(group = %self.name, "light group stopped");
    }

    #[must_use]
    pub fn status(&self) -> CoordinatorStatus {
        CoordinatorStatus {
            name: self.name.clone(),
            current_state: self.machine.current(),
            previous_state: self.machine.previous(),
            last_transition_reason: self.machine.last_reason().map(str::to_string),
            last_transition_time: self.machine.last_transition_at(),
            motion_active: self.motion_active,
            override_active: self.override_active,
            motion_activation_enabled: self.config.motion_activation,
            timers: self.timers.statuses(),
            lights_on: self.lights_on(),
            total_lights: self.config.lights.len(),
            brightness_mode: self.lights.selected_mode(),
            last_manual_reason: self.last_manual_reason,
            event_log: self.event_log.entries(),
        }
    }

    // ------------------------------------------------------------------
    // Event intake
    // ------------------------------------------------------------------

    fn on_motion(&mut self, active: bool) {
        self.motion_active = active;
        if !active {
            self.cancel_motion_delay();
            self.pending.push_back(TransitionEvent::MotionOff);
            return;
        }

        let state = self.machine.current();
        if !self.config.motion_activation {
            if state.is_manual() {
                tracing::debug!(%state, "motion activation disabled, extending manual hold");
                self.start_timer(TimerKind::Extended);
            }
            return;
        }
        if !self.config.motion_delay().is_zero()
            && matches!(state, LightingState::Standby | LightingState::ManualOff)
        {
            self.start_motion_delay();
            return;
        }
        self.pending.push_back(TransitionEvent::MotionOn);
    }

    fn on_light_changed(&mut self, change: &StateChange) {
        if !self.config.is_light(&change.entity_id) {
            return;
        }
        self.light_states
            .insert(change.entity_id.clone(), change.new.is_on());

        let Some(reason) = self.detector.check(change).reason() else {
            return;
        };
        let state = self.machine.current();
        if state == LightingState::Disabled {
            tracing::debug!(light = %change.entity_id, "manual change ignored while override is on");
            return;
        }

        tracing::info!(light = %change.entity_id, %reason, "manual intervention detected");
        self.last_manual_reason = Some(reason);
        self.event_log
            .push(format!("manual change on {}: {reason}", change.entity_id));

        if self.lights_on() > 0 {
            self.pending.push_back(TransitionEvent::ManualIntervention);
        } else if state == LightingState::ManualOff {
            self.start_timer(TimerKind::Extended);
        } else {
            self.pending.push_back(TransitionEvent::LightsAllOff);
        }
    }

    async fn on_context_changed(&mut self, entity_id: &str) {
        let mode = self.lights.select_mode().await;
        tracing::debug!(entity = entity_id, %mode, "brightness context changed");

        let state = self.machine.current();
        let automatic = matches!(
            state,
            LightingState::MotionDetected | LightingState::AutoTimeout
        );
        if automatic && self.lights.applied_mode() != Some(mode) {
            self.event_log.push(format!("brightness switched to {mode}"));
            self.lights.turn_on(mode, "brightness context changed").await;
        }
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    async fn drain(&mut self) {
        while let Some(event) = self.pending.pop_front() {
            self.dispatch(event).await;
        }
    }

    async fn dispatch(&mut self, event: TransitionEvent) {
        let state = self.machine.current();
        let reevaluated = (state == LightingState::Disabled
            && event == TransitionEvent::OverrideOff)
            .then(|| {
                reevaluate(
                    self.lights_on() > 0,
                    self.motion_active,
                    self.config.motion_activation,
                )
            });

        let Some(transition) = self.machine.dispatch(event, reevaluated) else {
            tracing::debug!(%state, %event, "no transition, ignoring event");
            return;
        };

        if transition.is_self_loop() {
            tracing::debug!(%state, %event, "state re-entered");
        } else {
            tracing::info!(
                group = %self.name,
                from = %transition.from,
                to = %transition.to,
                %event,
                "state transition"
            );
        }
        self.event_log.push(format!(
            "{} -> {} on {event}",
            transition.from, transition.to
        ));
        self.enter(transition).await;
    }

    /// Side effects of arriving in a state.
    async fn enter(&mut self, transition: Transition) {
        let Transition { from, to, event } = transition;
        match to {
            LightingState::Disabled => {
                self.timers.cancel_all();
                self.cancel_motion_delay();
            }
            LightingState::MotionDetected => {
                self.timers.cancel_all();
                self.lights.turn_on_auto("motion detected").await;
            }
            LightingState::AutoTimeout => {
                self.timers.cancel(TimerKind::Extended);
                self.start_timer(TimerKind::Motion);
            }
            LightingState::MotionAdjusted => self.timers.cancel_all(),
            LightingState::ManualTimeout => {
                self.timers.cancel(TimerKind::Motion);
                self.start_timer(TimerKind::Extended);
            }
            LightingState::ManualOff => {
                self.timers.cancel(TimerKind::Motion);
                let held = from == LightingState::ManualTimeout
                    && self.timers.is_active(TimerKind::Extended);
                if !held {
                    self.start_timer(TimerKind::Extended);
                }
            }
            LightingState::Standby => {
                self.timers.cancel_all();
                self.cancel_motion_delay();
                let turn_off = match event {
                    TransitionEvent::TimerExpired(TimerKind::Motion) => true,
                    TransitionEvent::TimerExpired(TimerKind::Extended) => {
                        from == LightingState::ManualTimeout && self.lights_on() > 0
                    }
                    _ => false,
                };
                if turn_off {
                    self.lights.turn_off("timer expired").await;
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------

    fn timer_callback(&self) -> impl FnOnce(TimerExpiry) + Clone + Send + 'static {
        let mailbox = self.mailbox.clone();
        move |expiry| notify(&mailbox, Inbound::TimerFired(expiry))
    }

    /// Start `kind` with its configured duration, retrying once. When the
    /// scheduler keeps failing the timer is treated as already expired.
    fn start_timer(&mut self, kind: TimerKind) {
        let duration = match kind {
            TimerKind::Motion => self.config.no_motion_wait(),
            TimerKind::Extended => self.config.extended_timeout(),
        };
        let callback = self.timer_callback();
        let Err(first) = self.timers.start(kind, duration, callback.clone()) else {
            return;
        };
        tracing::warn!(timer = %kind, err = %first, "failed to start timer, retrying");
        if let Err(err) = self.timers.start(kind, duration, callback) {
            tracing::error!(group = %self.name, timer = %kind, %err, "timer unavailable, expiring now");
            self.event_log.push(format!("{kind} timer unavailable"));
            self.pending.push_back(TransitionEvent::TimerExpired(kind));
        }
    }

    fn start_motion_delay(&mut self) {
        if self.pending_motion.is_some() {
            return;
        }
        self.motion_generation += 1;
        let generation = self.motion_generation;
        let delay = self.config.motion_delay();
        let schedule = move |scheduler: &S, mailbox: Mailbox| {
            scheduler.schedule(
                delay,
                Box::new(move || notify(&mailbox, Inbound::MotionDelayElapsed { generation })),
            )
        };

        let scheduled = schedule(&self.scheduler, self.mailbox.clone()).or_else(|err| {
            tracing::warn!(%err, "failed to schedule motion delay, retrying");
            schedule(&self.scheduler, self.mailbox.clone())
        });
        match scheduled {
            Ok(handle) => {
                tracing::debug!(seconds = delay.as_secs(), "motion delay started");
                self.pending_motion = Some(PendingMotion { handle, generation });
            }
            Err(err) => {
                tracing::error!(group = %self.name, %err, "motion delay unavailable, reacting now");
                self.pending.push_back(TransitionEvent::MotionOn);
            }
        }
    }

    fn cancel_motion_delay(&mut self) {
        if let Some(pending) = self.pending_motion.take() {
            pending.handle.cancel();
            tracing::debug!("motion delay cancelled");
        }
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    async fn subscribe_all(&mut self) -> Result<(), MotionLightsError> {
        let mut triggers = TriggerManager::new();
        if !self.config.motion_sensors.is_empty() {
            let mailbox = self.mailbox.clone();
            let trigger = EntityTrigger::motion(self.config.motion_sensors.clone()).on_signal(
                move |signal| {
                    let event = match signal {
                        TriggerSignal::Activated => ExternalEvent::MotionOn,
                        TriggerSignal::Deactivated => ExternalEvent::MotionOff,
                    };
                    notify(&mailbox, Inbound::External(event));
                },
            );
            triggers.add_trigger(MOTION_TRIGGER, trigger);
        }
        if let Some(switch) = &self.config.override_switch {
            let mailbox = self.mailbox.clone();
            let trigger = EntityTrigger::override_switch(switch.clone()).on_signal(move |signal| {
                let event = match signal {
                    TriggerSignal::Activated => ExternalEvent::OverrideOn,
                    TriggerSignal::Deactivated => ExternalEvent::OverrideOff,
                };
                notify(&mailbox, Inbound::External(event));
            });
            triggers.add_trigger(OVERRIDE_TRIGGER, trigger);
        }
        self.triggers = triggers;
        self.triggers.setup_all(&self.host).await?;

        let mailbox = self.mailbox.clone();
        let lights = self
            .host
            .subscribe(
                &self.config.lights,
                Arc::new(move |change: &StateChange| {
                    notify(
                        &mailbox,
                        Inbound::External(ExternalEvent::LightChanged(change.clone())),
                    );
                }),
            )
            .await?;
        self.subscriptions.push(lights);

        let context = self.config.context_entities();
        if !context.is_empty() {
            let mailbox = self.mailbox.clone();
            let subscription = self
                .host
                .subscribe(
                    &context,
                    Arc::new(move |change: &StateChange| {
                        notify(
                            &mailbox,
                            Inbound::External(ExternalEvent::ContextChanged {
                                entity_id: change.entity_id.clone(),
                            }),
                        );
                    }),
                )
                .await?;
            self.subscriptions.push(subscription);
        }
        Ok(())
    }

    async fn unsubscribe_all(&mut self) {
        self.triggers.cleanup_all(&self.host).await;
        for subscription in std::mem::take(&mut self.subscriptions) {
            self.host.unsubscribe(subscription).await;
        }
    }

    async fn read_light_states(&mut self) {
        let mut states = HashMap::with_capacity(self.config.lights.len());
        for light in &self.config.lights {
            let on = self
                .host
                .get_state(light)
                .await
                .is_some_and(|snapshot| snapshot.is_on());
            states.insert(light.clone(), on);
        }
        self.light_states = states;
    }

    fn lights_on(&self) -> usize {
        self.light_states.values().filter(|on| **on).count()
    }
}
