use simple_easing::*;

/// Represents a set of easing functions.
///
/// An easing function is a temporal function that takes a time between 0 and 1 (beginning / end)
/// and associates to it a progress value according to an ease curve. Every built-in curve starts
/// at 0 and ends at 1: `Back` and `Elastic` curves overshoot in between.
///
/// See <https://easings.net> for a representation of easing methods.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Default, Clone, Copy, Debug)]
pub enum Easing {
    /// <https://easings.net/#easeInBack>
    BackIn,
    /// <https://easings.net/#easeInOutBack>
    BackInOut,
    /// <https://easings.net/#easeOutBack>
    BackOut,
    /// <https://easings.net/#easeInBounce>
    BounceIn,
    /// <https://easings.net/#easeInOutBounce>
    BounceInOut,
    /// <https://easings.net/#easeOutBounce>
    BounceOut,
    /// <https://easings.net/#easeInCirc>
    CircIn,
    /// <https://easings.net/#easeInOutCirc>
    CircInOut,
    /// <https://easings.net/#easeOutCirc>
    CircOut,
    /// <https://easings.net/#easeInCubic>
    CubicIn,
    /// <https://easings.net/#easeInOutCubic>
    CubicInOut,
    /// <https://easings.net/#easeOutCubic>
    CubicOut,
    /// <https://easings.net/#easeInElastic>
    ElasticIn,
    /// <https://easings.net/#easeInOutElastic>
    ElasticInOut,
    /// <https://easings.net/#easeOutElastic>
    ElasticOut,
    /// <https://easings.net/#easeInExpo>
    ExpoIn,
    /// <https://easings.net/#easeInOutExpo>
    ExpoInOut,
    /// <https://easings.net/#easeOutExpo>
    ExpoOut,
    // Applies no transformation (default).
    #[default]
    Linear,
    /// <https://easings.net/#easeInQuad>
    QuadIn,
    /// <https://easings.net/#easeInOutQuad>
    QuadInOut,
    /// <https://easings.net/#easeOutQuad>
    QuadOut,
    /// <https://easings.net/#easeInQuart>
    QuartIn,
    /// <https://easings.net/#easeInOutQuart>
    QuartInOut,
    /// <https://easings.net/#easeOutQuart>
    QuartOut,
    /// <https://easings.net/#easeInQuint>
    QuintIn,
    /// <https://easings.net/#easeInOutQuint>
    QuintInOut,
    /// <https://easings.net/#easeOutQuint>
    QuintOut,
    /// <https://easings.net/#easeInSine>
    SineIn,
    /// <https://easings.net/#easeInOutSine>
    SineInOut,
    /// <https://easings.net/#easeOutSine>
    SineOut,
    /// A caller-provided curve. It should map 0 to 0 and 1 to 1: a move always ends exactly on
    /// its target anyway.
    #[cfg_attr(feature = "serde", serde(skip))]
    UserDefined(fn(f32) -> f32),
}

impl Easing {
    /// Calls the easing function.
    ///
    /// # Parameters
    /// * `t`: the progress in time, between 0.0 and 1.0
    pub fn call(&self, t: f32) -> f32 {
        match self {
            Easing::BackIn => back_in(t),
            Easing::BackInOut => back_in_out(t),
            Easing::BackOut => back_out(t),
            Easing::BounceIn => bounce_in(t),
            Easing::BounceInOut => bounce_in_out(t),
            Easing::BounceOut => bounce_out(t),
            Easing::CircIn => circ_in(t),
            Easing::CircInOut => circ_in_out(t),
            Easing::CircOut => circ_out(t),
            Easing::CubicIn => cubic_in(t),
            Easing::CubicInOut => cubic_in_out(t),
            Easing::CubicOut => cubic_out(t),
            Easing::ElasticIn => elastic_in(t),
            Easing::ElasticInOut => elastic_in_out(t),
            Easing::ElasticOut => elastic_out(t),
            Easing::ExpoIn => expo_in(t),
            Easing::ExpoInOut => expo_in_out(t),
            Easing::ExpoOut => expo_out(t),
            Easing::Linear => t,
            Easing::QuadIn => quad_in(t),
            Easing::QuadInOut => quad_in_out(t),
            Easing::QuadOut => quad_out(t),
            Easing::QuartIn => quart_in(t),
            Easing::QuartInOut => quart_in_out(t),
            Easing::QuartOut => quart_out(t),
            Easing::QuintIn => quint_in(t),
            Easing::QuintInOut => quint_in_out(t),
            Easing::QuintOut => quint_out(t),
            Easing::SineIn => sine_in(t),
            Easing::SineInOut => sine_in_out(t),
            Easing::SineOut => sine_out(t),
            Easing::UserDefined(function) => function(t),
        }
    }

    /// Returns whether the curve may leave the `[0, 1]` interval mid-course.
    ///
    /// User-defined curves are unknown and therefore considered overshooting.
    pub fn overshoots(&self) -> bool {
        matches!(
            self,
            Easing::BackIn
                | Easing::BackInOut
                | Easing::BackOut
                | Easing::ElasticIn
                | Easing::ElasticInOut
                | Easing::ElasticOut
                | Easing::UserDefined(_)
        )
    }
}

impl PartialEq for Easing {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Easing::UserDefined(a), Easing::UserDefined(b)) => std::ptr::fn_addr_eq(*a, *b),
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUILT_IN: [Easing; 31] = [
        Easing::BackIn,
        Easing::BackInOut,
        Easing::BackOut,
        Easing::BounceIn,
        Easing::BounceInOut,
        Easing::BounceOut,
        Easing::CircIn,
        Easing::CircInOut,
        Easing::CircOut,
        Easing::CubicIn,
        Easing::CubicInOut,
        Easing::CubicOut,
        Easing::ElasticIn,
        Easing::ElasticInOut,
        Easing::ElasticOut,
        Easing::ExpoIn,
        Easing::ExpoInOut,
        Easing::ExpoOut,
        Easing::Linear,
        Easing::QuadIn,
        Easing::QuadInOut,
        Easing::QuadOut,
        Easing::QuartIn,
        Easing::QuartInOut,
        Easing::QuartOut,
        Easing::QuintIn,
        Easing::QuintInOut,
        Easing::QuintOut,
        Easing::SineIn,
        Easing::SineInOut,
        Easing::SineOut,
    ];

    fn assert_easing_approx_equal(easing: Easing, input: f32, expected: f32) {
        let result = easing.call(input);
        assert!(
            (result - expected).abs() < 1e-5,
            "{:?}: expected {}, got {}",
            easing,
            expected,
            result
        );
    }

    fn smoothstep(t: f32) -> f32 {
        t * t * (3.0 - 2.0 * t)
    }

    #[test]
    fn test_all_curves_start_at_zero_and_end_at_one() {
        for easing in BUILT_IN {
            assert_easing_approx_equal(easing, 0.0, 0.0);
            assert_easing_approx_equal(easing, 1.0, 1.0);
        }
    }

    #[test]
    fn test_linear_is_proportional() {
        let easing = Easing::Linear;
        for (t1, t2) in [(0.0, 0.25), (0.1, 0.6), (0.3, 0.9), (0.5, 1.0)] {
            let delta = easing.call(t2) - easing.call(t1);
            assert!((delta - (t2 - t1)).abs() < 1e-6);
        }
        assert_easing_approx_equal(easing, 0.5, 0.5);
    }

    #[test]
    fn test_back() {
        assert_easing_approx_equal(Easing::BackIn, 0.5, -0.0876975);
        assert_easing_approx_equal(Easing::BackInOut, 0.2, -0.092556);
        assert_easing_approx_equal(Easing::BackInOut, 0.5, 0.5);
        assert_easing_approx_equal(Easing::BackInOut, 0.8, 1.0925556);
        assert_easing_approx_equal(Easing::BackOut, 0.5, 1.0876975);
    }

    #[test]
    fn test_bounce() {
        assert_easing_approx_equal(Easing::BounceIn, 0.5, 0.234375);
        assert_easing_approx_equal(Easing::BounceInOut, 0.2, 0.113750);
        assert_easing_approx_equal(Easing::BounceInOut, 0.8, 0.88625);
        assert_easing_approx_equal(Easing::BounceOut, 0.5, 0.765625);
    }

    #[test]
    fn test_circ() {
        assert_easing_approx_equal(Easing::CircIn, 0.5, 0.133975);
        assert_easing_approx_equal(Easing::CircInOut, 0.2, 0.041742);
        assert_easing_approx_equal(Easing::CircInOut, 0.8, 0.958257);
        assert_easing_approx_equal(Easing::CircOut, 0.5, 0.866025);
    }

    #[test]
    fn test_cubic() {
        assert_easing_approx_equal(Easing::CubicIn, 0.5, 0.125);
        assert_easing_approx_equal(Easing::CubicOut, 0.5, 0.875);
        // 4t³ before the middle, 1 - (-2t + 2)³ / 2 after.
        assert_easing_approx_equal(Easing::CubicInOut, 0.2, 0.032);
        assert_easing_approx_equal(Easing::CubicInOut, 0.5, 0.5);
        assert_easing_approx_equal(Easing::CubicInOut, 0.8, 0.968);
    }

    #[test]
    fn test_elastic() {
        assert_easing_approx_equal(Easing::ElasticIn, 0.5, -0.015625);
        assert_easing_approx_equal(Easing::ElasticInOut, 0.2, -0.003906);
        assert_easing_approx_equal(Easing::ElasticInOut, 0.8, 1.0039063);
        assert_easing_approx_equal(Easing::ElasticOut, 0.5, 1.015625);
    }

    #[test]
    fn test_expo() {
        assert_easing_approx_equal(Easing::ExpoIn, 0.5, 0.03125);
        assert_easing_approx_equal(Easing::ExpoInOut, 0.2, 0.007812);
        assert_easing_approx_equal(Easing::ExpoInOut, 0.8, 0.992187);
        assert_easing_approx_equal(Easing::ExpoOut, 0.5, 0.96875);
    }

    #[test]
    fn test_polynomials() {
        assert_easing_approx_equal(Easing::QuadIn, 0.5, 0.25);
        assert_easing_approx_equal(Easing::QuadInOut, 0.2, 0.08);
        assert_easing_approx_equal(Easing::QuadOut, 0.5, 0.75);
        assert_easing_approx_equal(Easing::QuartIn, 0.5, 0.0625);
        assert_easing_approx_equal(Easing::QuartInOut, 0.8, 0.9872);
        assert_easing_approx_equal(Easing::QuartOut, 0.5, 0.9375);
        assert_easing_approx_equal(Easing::QuintInOut, 0.2, 0.00512);
        assert_easing_approx_equal(Easing::QuintOut, 0.5, 0.96875);
    }

    #[test]
    fn test_sine() {
        assert_easing_approx_equal(Easing::SineIn, 0.5, 0.292893);
        assert_easing_approx_equal(Easing::SineInOut, 0.2, 0.0954915);
        assert_easing_approx_equal(Easing::SineOut, 0.5, std::f32::consts::FRAC_1_SQRT_2);
    }

    #[test]
    fn test_user_defined() {
        let easing = Easing::UserDefined(smoothstep);
        assert_easing_approx_equal(easing, 0.0, 0.0);
        assert_easing_approx_equal(easing, 0.5, 0.5);
        assert_easing_approx_equal(easing, 0.25, 0.15625);
        assert_easing_approx_equal(easing, 1.0, 1.0);
        assert_eq!(easing, Easing::UserDefined(smoothstep));
        assert_ne!(easing, Easing::Linear);
        assert!(easing.overshoots());
    }

    #[test]
    fn test_overshoots() {
        for easing in BUILT_IN {
            if easing.overshoots() {
                continue;
            }
            for step in 0..=20 {
                let value = easing.call(step as f32 / 20.0);
                assert!(
                    (-1e-5..=1.0 + 1e-5).contains(&value),
                    "{:?} left [0, 1]: {}",
                    easing,
                    value
                );
            }
        }
        assert!(Easing::ElasticOut.overshoots());
        assert!(!Easing::BounceOut.overshoots());
    }

    #[test]
    fn test_default() {
        assert_eq!(Easing::default(), Easing::Linear);
        assert_eq!(Easing::QuadIn, Easing::QuadIn);
        assert_ne!(Easing::QuadIn, Easing::QuadOut);
    }
}
