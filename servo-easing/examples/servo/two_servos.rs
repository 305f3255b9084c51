use embedded_hal::digital::OutputPin;
use servo_easing::devices::Servo;
use servo_easing::errors::Error;
use servo_easing::hardware::{NativePwm, Pca9685};
use servo_easing::mocks::{MockI2c, MockOutputPin, MockPwmPin};
use servo_easing::motion::{Easing, MotionScheduler, MoveRequest};
use servo_easing::pause;

/// Sets up one servo on a native PWM channel and one on a PCA9685 expander channel.
fn setup(scheduler: &MotionScheduler) -> Result<(Servo, Servo), Error> {
    let native = Servo::new(
        scheduler,
        NativePwm::new("D9", MockPwmPin::new(u16::MAX)),
        0.0,
    )?
    .set_easing(Easing::CubicInOut);

    let expander = Pca9685::new(MockI2c::default(), 0x40);
    let remote = Servo::new(scheduler, expander.channel(0), 0.0)?
        .set_easing(Easing::BounceOut)
        .set_speed(90);

    Ok((native, remote))
}

#[servo_easing::runtime]
async fn main() {
    let scheduler = MotionScheduler::default();
    let mut led = MockOutputPin::default();

    let (native, remote) = match setup(&scheduler) {
        Ok(servos) => servos,
        Err(error) => {
            // Nothing to move: blink fast forever to signal the failure.
            println!("Setup failed: {}", error);
            loop {
                led.set_high().ok();
                pause!(100);
                led.set_low().ok();
                pause!(100);
            }
        }
    };
    println!("{}\n{}", native, remote);

    // Blocking moves: one servo after the other.
    if let Err(error) = native.ease_to(MoveRequest::to(180.0).with_duration(1000)).await {
        println!("{} cannot move: {}", native.get_name(), error);
    }
    if let Err(error) = remote.ease_to(MoveRequest::to(180.0)).await {
        println!("{} cannot move: {}", remote.get_name(), error);
    }

    // Non-blocking moves: both run in background while the led blinks.
    for target in [0.0, 90.0] {
        if let Err(error) = native.configure(MoveRequest::to(target).with_duration(1000)) {
            println!("{} cannot move to {}°: {}", native.get_name(), target, error);
        }
        if let Err(error) = remote.start_ease_to(target) {
            println!("{} cannot move to {}°: {}", remote.get_name(), target, error);
        }

        while native.is_moving() || remote.is_moving() {
            led.set_high().ok();
            pause!(250);
            led.set_low().ok();
            pause!(250);
        }
        println!("Reached {}°: {}", target, scheduler);
    }
}
