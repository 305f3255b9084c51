use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::time::MissedTickBehavior;

use crate::devices::Servo;
use crate::errors::MotionError::{CapacityExceeded, NotRegistered};
use crate::errors::{Error, MoveFault};
use crate::motion::MoveRequest;
use crate::utils::{task, Clock, EventHandler, EventManager, SystemClock, TaskHandler};
use crate::{pause, pause_sync};

/// Lists all events a [`MotionScheduler`] can emit/listen.
pub enum SchedulerEvent {
    /// Triggered when the last moving servo reaches its target.
    OnAllStopped,
}

/// Convert events to string to facilitate usage with [`EventManager`].
impl From<SchedulerEvent> for String {
    fn from(event: SchedulerEvent) -> Self {
        let event = match event {
            SchedulerEvent::OnAllStopped => "all_stopped",
        };
        event.into()
    }
}

/// Who drives the ticks.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulingMode {
    /// The caller ticks: [`MotionScheduler::tick_all`] (or a wait helper) must be called in a loop.
    Polling,
    /// A background task ticks at a fixed interval while something moves (default).
    #[default]
    Interrupt,
}

/// Configuration of a [`MotionScheduler`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// The maximum number of servos (default: 12).
    capacity: usize,
    /// The interval in ms between two background ticks (default: 20ms).
    tick_interval: u64,
    /// The tick model (default: Interrupt).
    mode: SchedulingMode,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            capacity: 12,
            tick_interval: 20,
            mode: SchedulingMode::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn get_capacity(&self) -> usize {
        self.capacity
    }

    /// Sets the maximum number of servos the scheduler holds.
    pub fn set_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn get_tick_interval(&self) -> u64 {
        self.tick_interval
    }

    /// Sets the interval (in ms) between two background ticks. 0 is raised to 1ms.
    pub fn set_tick_interval(mut self, tick_interval: u64) -> Self {
        self.tick_interval = tick_interval.max(1);
        self
    }

    pub fn get_mode(&self) -> SchedulingMode {
        self.mode
    }

    pub fn set_mode(mut self, mode: SchedulingMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Identifies the slot a servo occupies in a [`MotionScheduler`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotHandle(usize);

impl SlotHandle {
    /// Returns the slot index: slots are ticked by increasing index.
    pub fn get_index(&self) -> usize {
        self.0
    }
}

impl Display for SlotHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Drives every registered [`Servo`] along its move.
///
/// The scheduler is a cheap-clone handle: clones share the same registry. Several schedulers may
/// coexist, each with its own servos, clock and tick driver.
///
/// In [`SchedulingMode::Interrupt`] (default), a background task spawned through
/// [`task::run`] ticks every servo at a fixed interval as long as one of them moves: the program
/// must run inside `#[servo_easing::runtime]`. In [`SchedulingMode::Polling`], nothing happens
/// unless [`Self::tick_all`] (or one of the wait helpers) is called.
///
/// # Example
/// ```
/// use servo_easing::devices::Servo;
/// use servo_easing::errors::Error;
/// use servo_easing::hardware::ActuatorBackend;
/// use servo_easing::motion::{MotionScheduler, SchedulerConfig, SchedulingMode};
///
/// #[derive(Debug)]
/// struct Printer;
///
/// impl ActuatorBackend for Printer {
///     fn get_name(&self) -> String { String::from("printer") }
///     fn probe(&mut self) -> bool { true }
///     fn attach(&mut self, _: u16) -> Result<(), Error> { Ok(()) }
///     fn write_pulse(&mut self, pulse: u16) { println!("{}µs", pulse) }
/// }
///
/// let scheduler = MotionScheduler::new(SchedulerConfig::default().set_mode(SchedulingMode::Polling));
/// let servo = Servo::new(&scheduler, Printer, 0.0).unwrap();
///
/// servo.start_ease_to_d(90.0, 100).unwrap();
/// scheduler.blocking_wait_until_all_stopped(5);
/// assert_eq!(servo.get_current_angle(), 90.0);
/// ```
#[derive(Clone, Debug)]
pub struct MotionScheduler {
    shared: Arc<Shared>,
}

#[derive(Debug)]
pub(crate) struct Shared {
    config: SchedulerConfig,
    clock: Arc<dyn Clock>,
    slots: RwLock<Vec<Option<Servo>>>,
    /// Inner handler to the task ticking in background.
    ticker: Mutex<Option<TaskHandler>>,
    /// Whether something moved at the last tick: used to detect the "all stopped" transition.
    moving: AtomicBool,
    events: EventManager,
}

impl Default for MotionScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl MotionScheduler {
    /// Creates a scheduler timed by the system clock.
    pub fn new(config: SchedulerConfig) -> Self {
        Self::with_clock(config, SystemClock::default())
    }

    /// Creates a scheduler timed by a given clock.
    pub fn with_clock<C: Clock + 'static>(config: SchedulerConfig, clock: C) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                clock: Arc::new(clock),
                slots: RwLock::new(vec![None; config.capacity]),
                ticker: Mutex::new(None),
                moving: AtomicBool::new(false),
                events: EventManager::default(),
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> Weak<Shared> {
        Arc::downgrade(&self.shared)
    }

    pub(crate) fn upgrade(shared: &Weak<Shared>) -> Option<Self> {
        shared.upgrade().map(|shared| Self { shared })
    }

    /// Registers a servo in the first free slot.
    ///
    /// A servo registered in another scheduler leaves it. Registering a servo twice returns its
    /// current slot.
    ///
    /// # Errors
    /// * `CapacityExceeded`: every slot is taken.
    pub fn register(&self, servo: &Servo) -> Result<SlotHandle, Error> {
        if let Some((owner, slot)) = servo.get_registration() {
            match Arc::ptr_eq(&owner.shared, &self.shared) {
                true => return Ok(slot),
                false => {
                    owner.detach(slot);
                }
            }
        }

        let mut slots = self.shared.slots.write();
        let index = slots
            .iter()
            .position(Option::is_none)
            .ok_or(CapacityExceeded {
                capacity: self.shared.config.capacity,
            })?;
        let slot = SlotHandle(index);
        slots[index] = Some(servo.clone());
        servo.set_registration(Some((self, slot)));
        log::debug!("{} registered in slot {}", servo.get_name(), slot);

        if servo.is_moving() {
            drop(slots);
            self.notify_moving();
        }
        Ok(slot)
    }

    /// Frees a slot and returns the servo it held. The servo keeps its state but is no longer
    /// ticked.
    pub fn detach(&self, slot: SlotHandle) -> Option<Servo> {
        let servo = self.shared.slots.write().get_mut(slot.0)?.take()?;
        servo.set_registration(None);
        log::debug!("{} detached from slot {}", servo.get_name(), slot);
        Some(servo)
    }

    /// Advances every registered servo to the current clock time.
    ///
    /// Returns whether any servo is still moving.
    pub fn tick_all(&self) -> bool {
        self.tick_all_at(self.now())
    }

    /// Advances every registered servo to a given time, in slot order: each servo is fully
    /// updated (state and output) before the next one.
    ///
    /// Emits [`SchedulerEvent::OnAllStopped`] when the last moving servo stops.
    /// Returns whether any servo is still moving.
    pub fn tick_all_at(&self, now: u64) -> bool {
        let servos = self.get_servos();
        let mut moving = false;
        for servo in servos {
            moving |= servo.advance(now);
        }

        let was_moving = self.shared.moving.swap(moving, Ordering::SeqCst);
        if was_moving && !moving {
            log::trace!("All servos stopped at {}ms", now);
            self.shared
                .events
                .emit(SchedulerEvent::OnAllStopped, self.clone());
        }
        moving
    }

    /// Returns whether any registered servo is moving.
    pub fn any_moving(&self) -> bool {
        self.shared
            .slots
            .read()
            .iter()
            .flatten()
            .any(|servo| servo.is_moving())
    }

    /// Waits until no servo moves anymore.
    ///
    /// In polling mode (or when no background ticker runs), ticks then sleeps `poll` ms in a loop.
    /// Otherwise, only sleeps while the ticker does the work.
    pub async fn wait_until_all_stopped(&self, poll: u64) {
        while self.poll_moving() {
            pause!(poll);
        }
    }

    /// Blocking version of [`Self::wait_until_all_stopped`].
    pub fn blocking_wait_until_all_stopped(&self, poll: u64) {
        while self.poll_moving() {
            pause_sync!(poll);
        }
    }

    /// Ticks unless the background ticker does, and returns whether something still moves.
    pub(crate) fn poll_moving(&self) -> bool {
        match self.is_ticking() {
            true => self.any_moving(),
            false => self.tick_all(),
        }
    }

    /// Stops every registered servo where it stands.
    pub fn stop_all(&self) {
        for servo in self.get_servos() {
            servo.stop();
        }
    }

    /// Starts several moves so that they all finish together.
    ///
    /// Each request is resolved against its servo, then every move gets the longest resolved
    /// duration and the same start time. Servos already standing at their target are stopped and
    /// left out.
    ///
    /// Returns the shared duration in ms (0 if nothing needs to move).
    ///
    /// # Errors
    /// * `NotRegistered`: a servo is not ticked by this scheduler.
    /// * `InvalidMove`: a request cannot be resolved (zero speed or duration, or a zero-length
    ///   move away from the servo position).
    ///
    /// On error, no servo is touched.
    pub fn synchronize(&self, moves: &[(&Servo, MoveRequest)]) -> Result<u64, Error> {
        if let Some((servo, _)) = moves.iter().find(|(servo, _)| !self.owns(servo)) {
            return Err(NotRegistered {
                servo: servo.get_name(),
            }
            .into());
        }

        let mut resolved = Vec::with_capacity(moves.len());
        let mut arrived = vec![];
        for (servo, request) in moves {
            match servo.resolve(request) {
                Ok(plan) => resolved.push((*servo, plan)),
                Err(err)
                    if err.move_fault() == Some(MoveFault::ZeroLength)
                        && servo.stands_at(request) =>
                {
                    arrived.push(*servo)
                }
                Err(err) => return Err(err),
            }
        }
        for servo in arrived {
            servo.stop();
        }

        let duration = resolved
            .iter()
            .map(|(_, plan)| plan.duration)
            .max()
            .unwrap_or(0);
        let now = self.now();
        for (servo, mut plan) in resolved {
            plan.duration = duration;
            servo.install(plan, now);
        }
        if duration > 0 {
            self.notify_moving();
        }
        Ok(duration)
    }

    /// Returns whether the servo is registered in this scheduler.
    pub fn owns(&self, servo: &Servo) -> bool {
        servo
            .get_registration()
            .is_some_and(|(owner, _)| Arc::ptr_eq(&owner.shared, &self.shared))
    }

    /// Stops the ticker and every servo, then empties all slots.
    pub fn shutdown(&self) {
        if let Some(handler) = self.shared.ticker.lock().take() {
            handler.abort();
        }
        let servos: Vec<Servo> = self
            .shared
            .slots
            .write()
            .iter_mut()
            .filter_map(Option::take)
            .collect();
        for servo in servos {
            servo.stop();
            servo.set_registration(None);
        }
        self.shared.moving.store(false, Ordering::SeqCst);
        log::debug!("Scheduler shut down");
    }

    /// Records that a move started and makes sure it gets ticked.
    pub(crate) fn notify_moving(&self) {
        self.shared.moving.store(true, Ordering::SeqCst);
        self.wake();
    }

    /// Spawns the background ticker if the scheduler needs one and none runs.
    fn wake(&self) {
        if self.shared.config.mode != SchedulingMode::Interrupt {
            return;
        }

        let mut ticker = self.shared.ticker.lock();
        if ticker.as_ref().is_some_and(|handler| !handler.is_finished()) {
            return;
        }

        let shared = self.downgrade();
        let period = Duration::from_millis(self.shared.config.tick_interval);
        let spawned = task::run(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let scheduler = match MotionScheduler::upgrade(&shared) {
                    None => break,
                    Some(scheduler) => scheduler,
                };
                scheduler.tick_all();

                // Deciding to stop and forgetting the handler happen under the same lock `wake()`
                // takes: a move configured meanwhile spawns a new ticker.
                let mut ticker = scheduler.shared.ticker.lock();
                if !scheduler.any_moving() {
                    *ticker = None;
                    log::trace!("Ticker idle: stopped");
                    break;
                }
            }
            Ok::<(), Error>(())
        });

        match spawned {
            Ok(handler) => {
                log::trace!("Ticker started ({}ms)", period.as_millis());
                *ticker = Some(handler);
            }
            Err(err) => log::warn!("Ticker cannot start, falling back to polling: {}", err),
        }
    }

    // ########################################
    // Setters and Getters.

    /// Returns the current time of the scheduler clock (ms).
    pub fn now(&self) -> u64 {
        self.shared.clock.now()
    }

    pub fn get_clock(&self) -> Arc<dyn Clock> {
        self.shared.clock.clone()
    }

    pub fn get_config(&self) -> SchedulerConfig {
        self.shared.config
    }

    pub fn get_mode(&self) -> SchedulingMode {
        self.shared.config.mode
    }

    /// Returns the registered servos, by slot order.
    pub fn get_servos(&self) -> Vec<Servo> {
        self.shared.slots.read().iter().flatten().cloned().collect()
    }

    /// Returns the servo held by a slot.
    pub fn get_servo(&self, slot: SlotHandle) -> Option<Servo> {
        self.shared.slots.read().get(slot.0).cloned().flatten()
    }

    /// Returns the number of registered servos.
    pub fn len(&self) -> usize {
        self.shared.slots.read().iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.shared.config.capacity
    }

    /// Returns whether the background ticker currently runs.
    pub fn is_ticking(&self) -> bool {
        self.shared
            .ticker
            .lock()
            .as_ref()
            .is_some_and(|handler| !handler.is_finished())
    }

    // ########################################
    // Event related functions

    /// Registers a callback to be executed on a given event.
    ///
    /// Available events for a scheduler are defined by the enum: [`SchedulerEvent`]:
    /// - **`OnAllStopped` | `all_stopped`**: Triggered when the last moving servo stops.
    ///    _The callback must receive the following parameter: `|_: MotionScheduler| { ... }`_
    ///
    /// Callbacks run on the ticking thread: keep them short.
    pub fn on<S, F, T>(&self, event: S, callback: F) -> EventHandler
    where
        S: Into<String>,
        T: 'static + Send + Sync + Clone,
        F: FnMut(T) + Send + 'static,
    {
        self.shared.events.on(event, callback)
    }
}

impl Display for MotionScheduler {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SCHEDULER ({:?}) [servos={}/{}, tick={}ms, moving={}]",
            self.shared.config.mode,
            self.len(),
            self.capacity(),
            self.shared.config.tick_interval,
            self.any_moving()
        )
    }
}
