use servo_easing::devices::Servo;
use servo_easing::mocks::MockBackend;
use servo_easing::motion::{Easing, MotionScheduler, SchedulerConfig, SchedulingMode};
use servo_easing::pause_sync;

/// No runtime here: the loop below drives every tick.
fn main() {
    let scheduler = MotionScheduler::new(
        SchedulerConfig::default()
            .set_mode(SchedulingMode::Polling)
            .set_capacity(2),
    );
    let backend = MockBackend::new("polled");
    let servo = Servo::new(&scheduler, backend.clone(), 90.0)
        .expect("Servo is instantiated")
        .set_easing(Easing::ElasticOut);

    servo
        .start_ease_to_d(10.0, 1500)
        .expect("Move is valid");
    while scheduler.tick_all() {
        // Any other work of the main loop goes here.
        pause_sync!(20);
    }

    println!(
        "{} after {} pulses written",
        servo,
        backend.get_writes().len()
    );
}
