/// Trait for mapping a value from one scale to another.
pub trait Scalable {
    /// Maps a value from one scale to another: equivalent to the Arduino `map()` method,
    /// computed in floating point.
    /// <https://www.arduino.cc/reference/en/language/functions/math/map/>
    ///
    /// # Parameters
    /// * `self`:  the value to map
    /// * `from_low`:  the low end of the originating range
    /// * `from_high`:  the high end of the originating range
    /// * `to_low`:  the low end of the target range
    /// * `to_high`:  the high end of the target range
    fn scale(self, from_low: Self, from_high: Self, to_low: Self, to_high: Self) -> Self;
}

macro_rules! impl_scalable {
    ($($variant:ty),*) => {
        $(
            impl Scalable for $variant {
                fn scale(self, from_low: Self, from_high: Self, to_low: Self, to_high: Self) -> Self {
                    ((self as f64 - from_low as f64) * (to_high as f64 - to_low as f64)
                        / (from_high as f64 - from_low as f64)
                        + to_low as f64) as Self
                }
            }
        )*
    };
}

impl_scalable!(u8, u16, u32, u64, i16, i32, f32, f64);

#[cfg(test)]
mod tests {
    use super::Scalable;

    #[test]
    fn test_scale_degrees_to_pulse() {
        assert_eq!(0u16.scale(0, 180, 544, 2400), 544);
        assert_eq!(90u16.scale(0, 180, 544, 2400), 1472);
        assert_eq!(180u16.scale(0, 180, 544, 2400), 2400);
    }

    #[test]
    fn test_scale_reversed() {
        assert_eq!(0i32.scale(180, 0, 1000, 2000), 2000);
        assert_eq!(180i32.scale(180, 0, 1000, 2000), 1000);
    }

    #[test]
    fn test_scale_f32() {
        assert!((45.0f32.scale(0.0, 90.0, 0.0, 1.0) - 0.5).abs() < f32::EPSILON);
        assert!((1.0f32.scale(0.0, 1.0, 10.0, 20.0) - 20.0).abs() < f32::EPSILON);
    }
}
