use std::fmt::{Debug, Display, Formatter};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::errors::HardwareError::DeviceNotFound;
use crate::errors::{Error, MoveFault};
use crate::hardware::ActuatorBackend;
use crate::motion::scheduler::Shared;
use crate::motion::{Easing, MotionScheduler, MoveRequest, ResolvedMove, SlotHandle};
use crate::utils::{Clock, EventHandler, EventManager, Range, Scalable};
use crate::{pause, pause_sync};

/// Lists all events a Servo can emit/listen.
pub enum ServoEvent {
    /// Triggered when a move reaches its target.
    OnTargetReached,
}

/// Convert events to string to facilitate usage with [`EventManager`].
impl From<ServoEvent> for String {
    fn from(event: ServoEvent) -> Self {
        let event = match event {
            ServoEvent::OnTargetReached => "target_reached",
        };
        event.into()
    }
}

/// The direction of the move in progress.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Increasing,
    Decreasing,
    /// The servo stands still.
    #[default]
    None,
}

/// Represents a Servo driven by an [`ActuatorBackend`] and eased along its moves by a
/// [`MotionScheduler`].
///
/// A servo is a cheap-clone handle: clones share the same state (the scheduler holds one of them).
/// Every access goes through a single lock, so a tick never sees half a move and a new move
/// replaces the previous one at once.
#[derive(Clone)]
pub struct Servo {
    state: Arc<Mutex<ServoState>>,
    events: EventManager,
}

struct ServoState {
    backend: Box<dyn ActuatorBackend>,
    attached: bool,

    // ########################################
    // # Settings
    /// The servo range limitation in the physical world (default: [0, 180]).
    range: Range<f32>,
    /// The servo theoretical degree of movement (default: [0, 180]).
    degree_range: Range<f32>,
    /// The servo PWM range in µs (default: [544, 2400]).
    pwm_range: Range<u16>,
    /// Specifies if the servo command is inverted (default: false).
    inverted: bool,
    /// Degrees added to every angle at output (default: 0).
    trim: f32,
    /// The speed in °/s of moves requested without speed nor duration (default: 60).
    speed: u16,
    /// The easing of the next moves (default: Linear).
    easing: Easing,

    // ########################################
    // # Motion
    current: f32,
    start: f32,
    target: f32,
    started_at: u64,
    duration: u64,
    /// The easing captured when the move in progress started.
    active_easing: Easing,
    moving: bool,
    paused_at: Option<u64>,
    /// The last pulse written to the backend.
    pulse: u16,

    // ########################################
    // # Registration
    scheduler: Weak<Shared>,
    slot: Option<SlotHandle>,
    /// The clock of the owning scheduler: every timestamp above is read from it.
    clock: Arc<dyn Clock>,
}

impl ServoState {
    /// Converts an angle into the pulse to write.
    fn pulse_for(&self, angle: f32) -> u16 {
        let angle = self
            .degree_range
            .clamp(self.range.clamp(angle) + self.trim);
        let (from, to) = match self.inverted {
            false => (self.degree_range.start, self.degree_range.end),
            true => (self.degree_range.end, self.degree_range.start),
        };
        angle
            .scale(from, to, self.pwm_range.start as f32, self.pwm_range.end as f32)
            .round() as u16
    }

    /// Writes the pulse of an angle, unless it is already the one held.
    fn write_angle(&mut self, angle: f32) {
        let pulse = self.pulse_for(angle);
        if self.attached && pulse != self.pulse {
            log::trace!("{} <- {}µs ({}°)", self.backend.get_name(), pulse, angle);
            self.backend.write_pulse(pulse);
            self.pulse = pulse;
        }
    }

    /// Writes the current angle again: used after settings change the pulse mapping.
    fn refresh(&mut self) {
        let angle = self.current;
        self.write_angle(angle);
    }

    fn install(&mut self, plan: ResolvedMove, now: u64) {
        self.start = plan.start;
        self.target = plan.target;
        self.duration = plan.duration;
        self.started_at = now;
        self.active_easing = self.easing;
        self.moving = true;
        self.paused_at = None;
        log::debug!(
            "{} moves {}° -> {}° in {}ms ({:?})",
            self.backend.get_name(),
            plan.start,
            plan.target,
            plan.duration,
            self.active_easing
        );
    }

    fn halt(&mut self) {
        self.moving = false;
        self.paused_at = None;
    }

    /// Whether the servo already stands at the request target.
    fn stands_at(&self, request: &MoveRequest) -> bool {
        self.range.clamp(request.target) == self.current
    }

    /// Moves the timestamps of a move in progress from one clock to another, keeping the time
    /// already elapsed.
    fn rebase(&mut self, from: u64, to: u64) {
        let shift = |at: u64| match to >= from {
            true => at + (to - from),
            false => at.saturating_sub(from - to),
        };
        self.started_at = shift(self.started_at);
        self.paused_at = self.paused_at.map(shift);
    }
}

impl Servo {
    /// Creates a Servo over a backend and registers it in a scheduler.
    ///
    /// The output is attached right away at the pulse of `angle` (clamped in [0, 180]).
    ///
    /// # Errors
    /// * `DeviceNotFound`: the backend probe failed.
    /// * `InvalidHandle`: the backend refused to attach.
    /// * `CapacityExceeded`: the scheduler is full (the backend is detached again).
    pub fn new<B: ActuatorBackend + 'static>(
        scheduler: &MotionScheduler,
        backend: B,
        angle: f32,
    ) -> Result<Self, Error> {
        let mut backend = backend;
        if !backend.probe() {
            return Err(DeviceNotFound {
                device: backend.get_name(),
            }
            .into());
        }

        let range = Range::from([0.0_f32, 180.0]);
        let angle = range.clamp(angle);
        let mut state = ServoState {
            backend: Box::new(backend),
            attached: false,
            range,
            degree_range: range,
            pwm_range: Range::from([544, 2400]),
            inverted: false,
            trim: 0.0,
            speed: 60,
            easing: Easing::default(),
            current: angle,
            start: angle,
            target: angle,
            started_at: 0,
            duration: 0,
            active_easing: Easing::default(),
            moving: false,
            paused_at: None,
            pulse: 0,
            scheduler: Weak::new(),
            slot: None,
            clock: scheduler.get_clock(),
        };

        // The servo is attached with its initial position already set.
        let pulse = state.pulse_for(angle);
        state.backend.attach(pulse)?;
        state.attached = true;
        state.pulse = pulse;

        let servo = Self {
            state: Arc::new(Mutex::new(state)),
            events: EventManager::default(),
        };

        if let Err(err) = scheduler.register(&servo) {
            let mut state = servo.state.lock();
            state.backend.detach();
            state.attached = false;
            return Err(err);
        }
        Ok(servo)
    }

    /// Starts a move (non-blocking): the scheduler then eases the servo along it at every tick.
    ///
    /// A move in progress is replaced. The easing is captured now: changing it later only
    /// affects the next moves.
    ///
    /// # Errors
    /// * `InvalidMove(ZeroLength)`: start and target are the same. When the servo already stands
    ///   at the target, any move in progress is stopped and callers may treat the error as a
    ///   completed move. An explicit start elsewhere leaves the servo untouched.
    /// * `InvalidMove(ZeroDuration)` / `InvalidMove(ZeroSpeed)`: the move cannot be timed.
    pub fn configure(&self, request: MoveRequest) -> Result<(), Error> {
        let scheduler = {
            let mut state = self.state.lock();
            let now = state.clock.now();
            match request.resolve(state.current, state.range, state.speed) {
                Ok(plan) => state.install(plan, now),
                Err(err) => {
                    if err.move_fault() == Some(MoveFault::ZeroLength) && state.stands_at(&request)
                    {
                        state.halt();
                    }
                    return Err(err);
                }
            }
            state.scheduler.clone()
        };

        if let Some(scheduler) = MotionScheduler::upgrade(&scheduler) {
            scheduler.notify_moving();
        }
        Ok(())
    }

    /// Resolves a request against the servo current state, without starting it.
    pub(crate) fn resolve(&self, request: &MoveRequest) -> Result<ResolvedMove, Error> {
        let state = self.state.lock();
        request.resolve(state.current, state.range, state.speed)
    }

    /// Whether the servo already stands at the request target (clamped in the motion range).
    pub(crate) fn stands_at(&self, request: &MoveRequest) -> bool {
        self.state.lock().stands_at(request)
    }

    /// Starts an already resolved move.
    pub(crate) fn install(&self, plan: ResolvedMove, now: u64) {
        self.state.lock().install(plan, now);
    }

    /// Advances the move to a given time and writes the resulting position.
    ///
    /// When the move is over, the servo snaps exactly on its target and emits
    /// [`ServoEvent::OnTargetReached`]. Does nothing once stopped (or paused).
    ///
    /// Returns whether the servo is still moving.
    pub fn advance(&self, now: u64) -> bool {
        let reached = {
            let mut state = self.state.lock();
            if !state.moving {
                return false;
            }

            let elapsed = now.saturating_sub(state.started_at);
            let progress = (elapsed as f32 / state.duration as f32).clamp(0.0, 1.0);
            let angle = match progress >= 1.0 {
                true => state.target,
                false => {
                    let angle = state.start
                        + state.active_easing.call(progress) * (state.target - state.start);
                    match state.active_easing.overshoots() {
                        true => state.range.clamp(angle),
                        false => Range::from([state.start, state.target]).clamp(angle),
                    }
                }
            };

            state.current = angle;
            state.write_angle(angle);
            if progress >= 1.0 {
                state.moving = false;
                log::debug!("{} reached {}°", state.backend.get_name(), angle);
            }
            !state.moving
        };

        if reached {
            self.events.emit(ServoEvent::OnTargetReached, self.clone());
        }
        !reached
    }

    /// Moves the servo to the requested position at max speed: any move in progress stops.
    pub fn to(&self, angle: f32) -> &Self {
        let mut state = self.state.lock();
        state.halt();
        let angle = state.range.clamp(angle);
        state.start = angle;
        state.target = angle;
        state.current = angle;
        state.write_angle(angle);
        self
    }

    /// Starts a move to the target at the servo speed (see [`Self::set_speed`]).
    pub fn start_ease_to(&self, target: f32) -> Result<(), Error> {
        self.configure(MoveRequest::to(target))
    }

    /// Starts a move to the target lasting `duration` ms.
    pub fn start_ease_to_d(&self, target: f32, duration: u64) -> Result<(), Error> {
        self.configure(MoveRequest::to(target).with_duration(duration))
    }

    /// Moves the servo and waits for the move to end.
    ///
    /// A request for the angle the servo already stands at completes right away.
    pub async fn ease_to(&self, request: MoveRequest) -> Result<(), Error> {
        match self.configure(request) {
            Err(err)
                if err.move_fault() == Some(MoveFault::ZeroLength) && self.stands_at(&request) =>
            {
                Ok(())
            }
            Err(err) => Err(err),
            Ok(_) => {
                self.wait().await;
                Ok(())
            }
        }
    }

    /// Waits until the servo stops moving (a paused servo counts as stopped).
    ///
    /// When no background ticker drives the scheduler, the wait ticks it.
    pub async fn wait(&self) {
        while self.poll_moving() {
            pause!(self.poll_interval());
        }
    }

    /// Blocking version of [`Self::wait`].
    pub fn blocking_wait(&self) {
        while self.poll_moving() {
            pause_sync!(self.poll_interval());
        }
    }

    fn poll_moving(&self) -> bool {
        match self.get_scheduler() {
            Some(scheduler) => {
                scheduler.poll_moving();
            }
            None => {
                let now = self.state.lock().clock.now();
                self.advance(now);
            }
        }
        self.is_moving()
    }

    fn poll_interval(&self) -> u64 {
        self.get_scheduler()
            .map_or(20, |scheduler| scheduler.get_config().get_tick_interval())
    }

    /// Stops the servo where it stands: no snap to the target.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        if state.moving || state.paused_at.is_some() {
            log::debug!("{} stopped at {}°", state.backend.get_name(), state.current);
        }
        state.halt();
    }

    /// Suspends the move in progress: see [`Self::resume`].
    pub fn pause(&self) {
        let mut state = self.state.lock();
        if state.moving {
            state.moving = false;
            state.paused_at = Some(state.clock.now());
        }
    }

    /// Continues a paused move from where it was: its end is delayed by the time spent paused.
    pub fn resume(&self) {
        let scheduler = {
            let mut state = self.state.lock();
            let now = state.clock.now();
            let paused_at = match state.paused_at.take() {
                None => return,
                Some(paused_at) => paused_at,
            };
            state.started_at += now.saturating_sub(paused_at);
            state.moving = true;
            state.scheduler.clone()
        };
        if let Some(scheduler) = MotionScheduler::upgrade(&scheduler) {
            scheduler.notify_moving();
        }
    }

    /// Stops driving the output: the servo goes limp. Any move in progress stops.
    pub fn detach(&self) {
        let mut state = self.state.lock();
        state.halt();
        if state.attached {
            state.backend.detach();
            state.attached = false;
        }
    }

    /// Drives the output again, at the current angle.
    ///
    /// # Errors
    /// * `InvalidHandle` / `DeviceNotFound`: the backend refused to attach.
    pub fn attach(&self) -> Result<(), Error> {
        let mut state = self.state.lock();
        if !state.attached {
            let pulse = state.pulse_for(state.current);
            state.backend.attach(pulse)?;
            state.attached = true;
            state.pulse = pulse;
        }
        Ok(())
    }

    /// Returns whether both handles designate the same servo.
    pub fn same_as(&self, other: &Servo) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    pub(crate) fn get_registration(&self) -> Option<(MotionScheduler, SlotHandle)> {
        let state = self.state.lock();
        let scheduler = MotionScheduler::upgrade(&state.scheduler)?;
        Some((scheduler, state.slot?))
    }

    /// Records the scheduler owning the servo (or none). A new owner brings its clock: a move in
    /// progress keeps its elapsed time on it.
    pub(crate) fn set_registration(&self, owner: Option<(&MotionScheduler, SlotHandle)>) {
        let mut state = self.state.lock();
        match owner {
            None => {
                state.scheduler = Weak::new();
                state.slot = None;
            }
            Some((scheduler, slot)) => {
                let clock = scheduler.get_clock();
                if !Arc::ptr_eq(&state.clock, &clock) {
                    let (from, to) = (state.clock.now(), clock.now());
                    state.rebase(from, to);
                    state.clock = clock;
                }
                state.scheduler = scheduler.downgrade();
                state.slot = Some(slot);
            }
        }
    }

    // ########################################
    // Setters and Getters.

    /// Returns the backend name.
    pub fn get_name(&self) -> String {
        self.state.lock().backend.get_name()
    }

    /// Returns the scheduler the servo is registered in.
    pub fn get_scheduler(&self) -> Option<MotionScheduler> {
        MotionScheduler::upgrade(&self.state.lock().scheduler)
    }

    /// Returns the slot the servo occupies in its scheduler.
    pub fn get_slot(&self) -> Option<SlotHandle> {
        self.state.lock().slot
    }

    pub fn get_current_angle(&self) -> f32 {
        self.state.lock().current
    }

    /// Returns the target of the move in progress (or of the last one).
    pub fn get_target_angle(&self) -> f32 {
        self.state.lock().target
    }

    pub fn is_moving(&self) -> bool {
        self.state.lock().moving
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().paused_at.is_some()
    }

    pub fn is_attached(&self) -> bool {
        self.state.lock().attached
    }

    /// Returns the direction of the move in progress.
    pub fn get_direction(&self) -> Direction {
        let state = self.state.lock();
        if !state.moving && state.paused_at.is_none() {
            return Direction::None;
        }
        match state.target > state.start {
            true => Direction::Increasing,
            false => Direction::Decreasing,
        }
    }

    /// Returns the duration in ms of the move in progress (or of the last one).
    pub fn get_duration(&self) -> u64 {
        self.state.lock().duration
    }

    /// Returns the last pulse (in µs) written to the output.
    pub fn get_pulse(&self) -> u16 {
        self.state.lock().pulse
    }

    /// Returns the easing used by the next moves.
    pub fn get_easing(&self) -> Easing {
        self.state.lock().easing
    }

    /// Sets the easing of the next moves: a move in progress keeps its own.
    pub fn set_easing(self, easing: Easing) -> Self {
        self.state.lock().easing = easing;
        self
    }

    /// Returns the speed in °/s of moves requested without speed nor duration.
    pub fn get_speed(&self) -> u16 {
        self.state.lock().speed
    }

    /// Sets the speed in °/s of moves requested without speed nor duration (default: 60°/s).
    pub fn set_speed(self, speed: u16) -> Self {
        self.state.lock().speed = speed;
        self
    }

    /// Returns the servo motion range limitation in degree.
    ///
    /// A servo has a physical range (cf [`Self::set_degree_range`]) corresponding to a command range
    /// limitation (cf [`Self::set_pwm_range`]). Those are intrinsic to the servo itself. On the
    /// contrary, the motion range limitation here is a limitation you want to set for your servo
    /// because of how it is used in your robot: for example an arm that can turn only 20-40°.
    pub fn get_range(&self) -> Range<f32> {
        self.state.lock().range
    }

    /// Sets the Servo motion range limitation in degree. This guarantees the servo stays in the
    /// given range at any time.
    ///
    /// - No matter the order given, the range will always have min <= max
    /// - No matter the values given, the range will always stay within the Servo `degree_range`.
    pub fn set_range<R: Into<Range<f32>>>(self, range: R) -> Self {
        {
            let mut state = self.state.lock();
            let input = range.into().normalize();
            state.range = Range {
                start: state.degree_range.clamp(input.start),
                end: state.degree_range.clamp(input.end),
            };
        }
        self
    }

    /// Returns the theoretical range of degrees of movement for the servo.
    pub fn get_degree_range(&self) -> Range<f32> {
        self.state.lock().degree_range
    }

    /// Sets the theoretical range of degrees of movement for the servo (some servos can range
    /// from 0 to 90°, 180°, 270°, 360°, etc.).
    ///
    /// - No matter the order given, the range will always have min <= max
    /// - This may impact the `range` since it will always stay within the given `degree_range`.
    /// - An empty range (min == max) is ignored.
    pub fn set_degree_range<R: Into<Range<f32>>>(self, degree_range: R) -> Self {
        {
            let mut state = self.state.lock();
            let degree_range = degree_range.into().normalize();
            match degree_range.start == degree_range.end {
                true => log::warn!(
                    "{} ignores the empty degree range {}-{}",
                    state.backend.get_name(),
                    degree_range.start,
                    degree_range.end
                ),
                false => {
                    state.degree_range = degree_range;
                    state.range = Range {
                        start: state.degree_range.clamp(state.range.start),
                        end: state.degree_range.clamp(state.range.end),
                    };
                    state.refresh();
                }
            }
        }
        self
    }

    /// Returns the range of pulse widths (in µs) the servo responds to.
    pub fn get_pwm_range(&self) -> Range<u16> {
        self.state.lock().pwm_range
    }

    /// Sets the range of pulse widths (in µs) the servo responds to (default: [544, 2400]).
    pub fn set_pwm_range<R: Into<Range<u16>>>(self, pwm_range: R) -> Self {
        {
            let mut state = self.state.lock();
            state.pwm_range = pwm_range.into();
            state.refresh();
        }
        self
    }

    /// Returns if the servo command is set to be inverted.
    pub fn is_inverted(&self) -> bool {
        self.state.lock().inverted
    }

    /// Sets the servo command inversion mode: 0° then gets the pulse of the max degree.
    pub fn set_inverted(self, inverted: bool) -> Self {
        {
            let mut state = self.state.lock();
            state.inverted = inverted;
            state.refresh();
        }
        self
    }

    /// Returns the offset (in degrees) added to every angle at output.
    pub fn get_trim(&self) -> f32 {
        self.state.lock().trim
    }

    /// Sets the offset (in degrees) added to every angle at output: compensates a horn mounted
    /// off-center. Angles reported by the servo are not trimmed.
    pub fn set_trim(self, trim: f32) -> Self {
        {
            let mut state = self.state.lock();
            state.trim = trim;
            state.refresh();
        }
        self
    }

    // ########################################
    // Event related functions

    /// Registers a callback to be executed on a given event.
    ///
    /// Available events for a servo are defined by the enum: [`ServoEvent`]:
    /// - **`OnTargetReached` | `target_reached`**: Triggered when a move reaches its target.
    ///    _The callback must receive the following parameter: `|_: Servo| { ... }`_
    ///
    /// Callbacks run on the ticking thread, once the servo state is released.
    pub fn on<S, F, T>(&self, event: S, callback: F) -> EventHandler
    where
        S: Into<String>,
        T: 'static + Send + Sync + Clone,
        F: FnMut(T) + Send + 'static,
    {
        self.events.on(event, callback)
    }
}

impl Display for Servo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        write!(
            f,
            "SERVO ({}) [angle={}, target={}, range={}-{}, moving={}]",
            state.backend.get_name(),
            state.current,
            state.target,
            state.range.start,
            state.range.end,
            state.moving
        )
    }
}

impl Debug for Servo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Servo")
            .field("backend", &state.backend)
            .field("current", &state.current)
            .field("target", &state.target)
            .field("moving", &state.moving)
            .field("slot", &state.slot)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::errors::HardwareError::InvalidHandle;
    use crate::mocks::MockBackend;
    use crate::motion::{SchedulerConfig, SchedulingMode};
    use crate::utils::ManualClock;

    fn _setup_servo(angle: f32) -> (Servo, MockBackend, ManualClock, MotionScheduler) {
        let clock = ManualClock::default();
        let scheduler = MotionScheduler::with_clock(
            SchedulerConfig::default().set_mode(SchedulingMode::Polling),
            clock.clone(),
        );
        let backend = MockBackend::new("mock");
        let servo = Servo::new(&scheduler, backend.clone(), angle).unwrap();
        (servo, backend, clock, scheduler)
    }

    #[test]
    fn test_servo_creation() {
        let (servo, backend, _, _) = _setup_servo(90.0);
        assert_eq!(servo.get_current_angle(), 90.0);
        assert_eq!(servo.get_slot().map(|slot| slot.get_index()), Some(0));
        assert!(servo.is_attached());
        assert!(!servo.is_moving());
        assert_eq!(servo.get_direction(), Direction::None);
        // 90° in [544, 2400]µs.
        assert_eq!(servo.get_pulse(), 1472);
        assert_eq!(backend.get_writes(), vec![1472]);

        let (servo, _, _, _) = _setup_servo(500.0);
        assert_eq!(servo.get_current_angle(), 180.0);
    }

    #[test]
    fn test_servo_creation_failures() {
        let scheduler = MotionScheduler::default();

        let result = Servo::new(&scheduler, MockBackend::new("ghost").set_present(false), 0.0);
        assert_eq!(
            result.err().unwrap().to_string(),
            "Hardware error: Device not found: ghost."
        );

        let result = Servo::new(
            &scheduler,
            MockBackend::new("broken").set_attach_failure(true),
            0.0,
        );
        assert!(matches!(
            result,
            Err(Error::HardwareError {
                source: InvalidHandle { .. }
            })
        ));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_linear_move_at_speed() {
        let (servo, _, clock, scheduler) = _setup_servo(0.0);
        servo
            .configure(MoveRequest::from_to(0.0, 90.0).with_speed(10))
            .unwrap();
        assert_eq!(servo.get_duration(), 9000);
        assert_eq!(servo.get_target_angle(), 90.0);
        assert_eq!(servo.get_direction(), Direction::Increasing);

        clock.set(4500);
        assert!(scheduler.tick_all());
        assert_eq!(servo.get_current_angle(), 45.0);

        clock.set(9000);
        assert!(!scheduler.tick_all());
        assert_eq!(servo.get_current_angle(), 90.0);
        assert_eq!(servo.get_direction(), Direction::None);
    }

    #[test]
    fn test_default_speed() {
        let (servo, _, _, _) = _setup_servo(90.0);
        assert_eq!(servo.get_speed(), 60);
        servo.start_ease_to(0.0).unwrap();
        assert_eq!(servo.get_duration(), 1500);
        assert_eq!(servo.get_direction(), Direction::Decreasing);

        let servo = servo.set_speed(180);
        servo.start_ease_to(180.0).unwrap();
        assert_eq!(servo.get_duration(), 500);
    }

    #[test]
    fn test_advance_idempotent_after_completion() {
        let (servo, backend, _, _) = _setup_servo(0.0);
        servo.start_ease_to_d(60.0, 100).unwrap();
        assert!(!servo.advance(100));
        let writes = backend.get_writes();

        assert!(!servo.advance(150));
        assert!(!servo.advance(10_000));
        assert_eq!(servo.get_current_angle(), 60.0);
        assert_eq!(backend.get_writes(), writes, "No more writes once done");
    }

    #[test]
    fn test_no_redundant_writes() {
        let (servo, backend, _, _) = _setup_servo(0.0);
        backend.clear_writes();
        servo.start_ease_to_d(10.0, 10_000).unwrap();

        // Less than a µs apart: the pulse does not change.
        servo.advance(1);
        servo.advance(2);
        assert_eq!(backend.get_writes().len(), 0);

        servo.advance(5000);
        assert_eq!(backend.get_writes().len(), 1);
        servo.advance(5000);
        assert_eq!(backend.get_writes().len(), 1);
    }

    #[test]
    fn test_round_trip() {
        let (servo, backend, clock, scheduler) = _setup_servo(30.0);
        let initial = backend.get_last_pulse();

        servo.start_ease_to_d(150.0, 1000).unwrap();
        clock.set(1000);
        scheduler.tick_all();
        servo.start_ease_to_d(30.0, 1000).unwrap();
        clock.set(2000);
        scheduler.tick_all();

        assert_eq!(servo.get_current_angle(), 30.0);
        assert_eq!(backend.get_last_pulse(), initial);
    }

    #[test]
    fn test_stop_freezes() {
        let (servo, backend, clock, scheduler) = _setup_servo(0.0);
        servo.start_ease_to_d(100.0, 1000).unwrap();
        clock.set(300);
        scheduler.tick_all();
        servo.stop();

        let angle = servo.get_current_angle();
        assert!(angle > 0.0 && angle < 100.0);
        assert!(!servo.is_moving());

        let writes = backend.get_writes();
        clock.set(2000);
        scheduler.tick_all();
        assert_eq!(servo.get_current_angle(), angle, "No snap to target");
        assert_eq!(backend.get_writes(), writes);
    }

    #[test]
    fn test_zero_length_move() {
        let (servo, _, clock, _) = _setup_servo(0.0);
        servo.start_ease_to_d(90.0, 1000).unwrap();
        clock.set(500);
        servo.advance(500);

        let error = servo.start_ease_to(45.0).unwrap_err();
        assert_eq!(error.move_fault(), Some(MoveFault::ZeroLength));
        assert!(!servo.is_moving(), "The move in progress is stopped");
        assert_eq!(servo.get_current_angle(), 45.0);

        let error = servo.start_ease_to_d(90.0, 0).unwrap_err();
        assert_eq!(error.move_fault(), Some(MoveFault::ZeroDuration));
    }

    #[test]
    fn test_zero_length_move_elsewhere() {
        let (servo, _, clock, _) = _setup_servo(0.0);
        servo.start_ease_to_d(180.0, 1000).unwrap();
        clock.set(500);
        servo.advance(500);

        // From 30° to 30° while standing at 90°: refused, the move in progress goes on.
        let error = servo
            .configure(MoveRequest::from_to(30.0, 30.0))
            .unwrap_err();
        assert_eq!(error.move_fault(), Some(MoveFault::ZeroLength));
        assert!(servo.is_moving());
        assert_eq!(servo.get_current_angle(), 90.0);
        assert_eq!(servo.get_target_angle(), 180.0);

        servo.advance(1000);
        assert_eq!(servo.get_current_angle(), 180.0);
    }

    #[test]
    fn test_move_override() {
        let (servo, _, clock, _) = _setup_servo(0.0);
        servo.start_ease_to_d(180.0, 1000).unwrap();
        clock.set(500);
        servo.advance(500);
        assert_eq!(servo.get_current_angle(), 90.0);

        // Last writer wins: the new move starts where the servo stands.
        servo.start_ease_to_d(0.0, 1000).unwrap();
        servo.advance(750);
        assert_eq!(servo.get_current_angle(), 67.5);
        servo.advance(1500);
        assert_eq!(servo.get_current_angle(), 0.0);
    }

    #[test]
    fn test_easing_applies_to_next_move() {
        let (servo, _, clock, _) = _setup_servo(0.0);
        servo.start_ease_to_d(100.0, 1000).unwrap();
        let servo = servo.set_easing(Easing::QuadIn);
        assert_eq!(servo.get_easing(), Easing::QuadIn);

        servo.advance(500);
        assert_eq!(servo.get_current_angle(), 50.0, "The move in progress stays linear");
        servo.advance(1000);

        clock.set(1000);
        servo.start_ease_to_d(0.0, 1000).unwrap();
        servo.advance(1500);
        assert_eq!(servo.get_current_angle(), 75.0);
    }

    #[test]
    fn test_overshooting_easing() {
        let (servo, _, _, _) = _setup_servo(10.0);
        let servo = servo.set_easing(Easing::BackIn);
        servo.start_ease_to_d(110.0, 1000).unwrap();

        servo.advance(500);
        let angle = servo.get_current_angle();
        assert!(angle < 10.0, "Back curves pull back first: {}", angle);

        // Bounded by the motion range anyway.
        let servo = servo.set_range([5.0, 170.0]);
        servo.advance(300);
        assert!(servo.get_current_angle() >= 5.0);

        servo.advance(1000);
        assert_eq!(servo.get_current_angle(), 110.0);
    }

    #[test]
    fn test_pause_resume() {
        let (servo, _, clock, scheduler) = _setup_servo(0.0);
        servo.start_ease_to_d(100.0, 1000).unwrap();
        clock.set(250);
        scheduler.tick_all();
        servo.pause();
        assert!(servo.is_paused());
        assert!(!servo.is_moving());
        assert_eq!(servo.get_direction(), Direction::Increasing);

        clock.set(5000);
        scheduler.tick_all();
        assert_eq!(servo.get_current_angle(), 25.0);

        servo.resume();
        assert!(servo.is_moving());
        clock.set(5250);
        scheduler.tick_all();
        assert_eq!(servo.get_current_angle(), 50.0);
        clock.set(5750);
        scheduler.tick_all();
        assert_eq!(servo.get_current_angle(), 100.0);

        // Resuming something not paused does nothing.
        servo.resume();
        assert!(!servo.is_moving());
    }

    #[test]
    fn test_to() {
        let (servo, backend, _, _) = _setup_servo(90.0);
        servo.start_ease_to_d(0.0, 1000).unwrap();
        servo.to(180.0);
        assert!(!servo.is_moving());
        assert_eq!(servo.get_current_angle(), 180.0);
        assert_eq!(backend.get_last_pulse(), Some(2400));

        let servo = servo.set_range([20.0, 160.0]);
        servo.to(0.0);
        assert_eq!(servo.get_current_angle(), 20.0);
    }

    #[test]
    fn test_target_reached_event() {
        let (servo, _, _, _) = _setup_servo(0.0);
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        servo.on(ServoEvent::OnTargetReached, move |servo: Servo| {
            assert_eq!(servo.get_current_angle(), 45.0);
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        servo.start_ease_to_d(45.0, 100).unwrap();
        servo.advance(50);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        servo.advance(100);
        servo.advance(200);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_servo_range_setting() {
        let (servo, _, _, _) = _setup_servo(90.0);
        let servo = servo.set_range([200.0, 100.0]);
        assert_eq!(servo.get_range(), Range::from([100.0, 180.0]));

        let servo = servo.set_degree_range([0.0, 120.0]);
        assert_eq!(servo.get_degree_range(), Range::from([0.0, 120.0]));
        assert_eq!(servo.get_range(), Range::from([100.0, 120.0]));

        servo.to(110.0);
        assert_eq!(servo.get_current_angle(), 110.0);
        let result = servo.start_ease_to(0.0);
        assert!(result.is_ok(), "Target is clamped, not refused");
        assert_eq!(servo.get_target_angle(), 100.0);
    }

    #[test]
    fn test_servo_empty_degree_range() {
        let (servo, backend, _, _) = _setup_servo(90.0);
        let servo = servo.set_degree_range([90.0, 90.0]);
        assert_eq!(servo.get_degree_range(), Range::from([0.0, 180.0]));
        assert_eq!(backend.get_last_pulse(), Some(1472));

        servo.to(0.0);
        assert_eq!(servo.get_pulse(), 544);
    }

    #[test]
    fn test_servo_pwm_and_inversion() {
        let (servo, backend, _, _) = _setup_servo(0.0);
        let servo = servo.set_pwm_range([1000, 2000]);
        assert_eq!(servo.get_pwm_range(), Range::from([1000, 2000]));
        assert_eq!(backend.get_last_pulse(), Some(1000));

        let servo = servo.set_inverted(true);
        assert!(servo.is_inverted());
        assert_eq!(backend.get_last_pulse(), Some(2000));
        servo.to(45.0);
        assert_eq!(servo.get_pulse(), 1750);
    }

    #[test]
    fn test_servo_trim() {
        let (servo, backend, _, _) = _setup_servo(90.0);
        let servo = servo.set_pwm_range([1000, 2800]).set_trim(-10.0);
        assert_eq!(servo.get_trim(), -10.0);
        assert_eq!(servo.get_current_angle(), 90.0);
        assert_eq!(backend.get_last_pulse(), Some(1800));
    }

    #[test]
    fn test_detach_attach() {
        let (servo, backend, _, _) = _setup_servo(0.0);
        servo.start_ease_to_d(90.0, 100).unwrap();
        servo.detach();
        assert!(!servo.is_attached());
        assert!(!backend.is_attached());
        assert!(!servo.is_moving());

        backend.clear_writes();
        servo.to(90.0);
        assert!(backend.get_writes().is_empty(), "A detached output is not written");

        servo.attach().unwrap();
        assert!(backend.is_attached());
        assert_eq!(backend.get_writes(), vec![1472]);
    }

    #[test]
    fn test_blocking_wait() {
        let scheduler =
            MotionScheduler::new(SchedulerConfig::default().set_mode(SchedulingMode::Polling));
        let servo = Servo::new(&scheduler, MockBackend::default(), 0.0).unwrap();
        servo.start_ease_to_d(20.0, 60).unwrap();
        servo.blocking_wait();
        assert_eq!(servo.get_current_angle(), 20.0);

        // Unregistered servos advance by themselves.
        scheduler.detach(servo.get_slot().unwrap());
        servo.start_ease_to_d(0.0, 60).unwrap();
        servo.blocking_wait();
        assert_eq!(servo.get_current_angle(), 0.0);
    }

    #[servo_easing_macros::test]
    #[serial_test::serial]
    async fn test_ease_to() {
        let scheduler = MotionScheduler::default();
        let servo = Servo::new(&scheduler, MockBackend::default(), 0.0).unwrap();

        servo
            .ease_to(MoveRequest::to(45.0).with_duration(150))
            .await
            .unwrap();
        assert_eq!(servo.get_current_angle(), 45.0);
        assert!(!servo.is_moving());

        // Already there.
        assert!(servo.ease_to(MoveRequest::to(45.0)).await.is_ok());
        assert!(servo
            .ease_to(MoveRequest::from_to(45.0, 45.0))
            .await
            .is_ok());
        // Not there.
        assert!(servo
            .ease_to(MoveRequest::from_to(30.0, 30.0))
            .await
            .is_err());
        assert_eq!(servo.get_current_angle(), 45.0);
        assert!(servo
            .ease_to(MoveRequest::to(90.0).with_speed(0))
            .await
            .is_err());
    }

    #[test]
    fn test_servo_display() {
        let (servo, _, _, _) = _setup_servo(90.0);
        assert_eq!(
            format!("{}", servo),
            "SERVO (mock) [angle=90, target=90, range=0-180, moving=false]"
        );
    }
}
