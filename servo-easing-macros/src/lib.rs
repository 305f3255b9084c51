//! Defines the servo-easing runtime macros.

extern crate proc_macro;

use proc_macro::TokenStream;

use crate::internals::{runtime_macro, Flavor};

mod internals;

/// Runs an `async fn main()` on a multi-threaded tokio runtime driving servo motions.
///
/// It replaces the original [`#[tokio::main]`] which it depends on.
///
/// _The body runs to completion, then the function keeps the runtime alive until every task spawned
/// through `servo_easing::utils::task::run` (tick drivers included) has finished. In other words: the
/// program does not exit while a servo is still moving under the background tick driver._
///
/// # Example
/// ```ignore
/// #[servo_easing::runtime]
/// async fn main() {
///     // configure servos, start moves...
/// }
/// ```
#[proc_macro_attribute]
pub fn runtime(_: TokenStream, item: TokenStream) -> TokenStream {
    runtime_macro(item.into(), Flavor::Main).into()
}

/// Same as `#[servo_easing::runtime]` for test functions.
#[proc_macro_attribute]
pub fn test(_: TokenStream, item: TokenStream) -> TokenStream {
    runtime_macro(item.into(), Flavor::Test).into()
}
