use servo_easing::devices::{Servo, ServoEvent};
use servo_easing::mocks::MockBackend;
use servo_easing::motion::{MotionScheduler, MoveRequest, SchedulerEvent};

#[servo_easing::runtime]
async fn main() {
    let scheduler = MotionScheduler::default();

    let shoulder = Servo::new(&scheduler, MockBackend::new("shoulder"), 30.0)
        .expect("Servo is instantiated")
        .set_speed(40);
    let elbow = Servo::new(&scheduler, MockBackend::new("elbow"), 150.0)
        .expect("Servo is instantiated")
        .set_speed(40);

    for servo in [&shoulder, &elbow] {
        servo.on(ServoEvent::OnTargetReached, |servo: Servo| {
            println!("{} reached at {}°", servo.get_name(), servo.get_current_angle());
        });
    }
    scheduler.on(SchedulerEvent::OnAllStopped, |scheduler: MotionScheduler| {
        println!("All stopped: {}", scheduler);
    });

    // The shoulder travels 60° and the elbow 120°: both take the elbow's 3s.
    let duration = scheduler
        .synchronize(&[
            (&shoulder, MoveRequest::to(90.0)),
            (&elbow, MoveRequest::to(30.0)),
        ])
        .expect("Moves are valid");
    println!("Moving for {}ms", duration);

    scheduler.wait_until_all_stopped(50).await;
}
