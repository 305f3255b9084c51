use proc_macro2::TokenStream;
use quote::quote;
use syn::{Expr, ItemFn, ReturnType, Signature, Stmt};

/// Which kind of function the runtime wraps.
pub enum Flavor {
    Main,
    Test,
}

/// See `#[servo_easing_macros::runtime]`.
///
/// Works on proc_macro2 streams so the expansion can be unit tested.
pub fn runtime_macro(item: TokenStream, flavor: Flavor) -> TokenStream {
    let servo_easing = quote!(::servo_easing);

    let input: ItemFn = match syn::parse2(item) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };
    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = input;

    // The wrapper itself is synchronous: the body is driven by `block_on`.
    let sig = Signature {
        asyncness: None,
        ..sig
    };

    let mut stmts = block.stmts;
    let return_expr = match returns_value(&sig.output) {
        true => match stmts.pop() {
            Some(Stmt::Expr(expr, None)) => Some(expr),
            Some(stmt) => {
                stmts.push(stmt);
                None
            }
            None => None,
        },
        false => None,
    };
    let stmts = stmts.into_iter().filter(|stmt| !is_unit_expr(stmt));

    let test_attr = match flavor {
        Flavor::Main => quote! {},
        Flavor::Test => quote! {#[test]},
    };

    let runtime = match flavor {
        Flavor::Main => quote! {
            let rt = #servo_easing::utils::tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .unwrap();
        },
        Flavor::Test => quote! {
            let rt = #servo_easing::utils::tokio::runtime::Runtime::new().unwrap();
        },
    };

    let drain = drain_tasks(&servo_easing);

    quote! {
        #test_attr
        #(#attrs)*
        #vis #sig {
            #runtime
            rt.block_on(async {
                #servo_easing::utils::task::init_task_channel().await;
                #(#stmts)*
                #drain
                #return_expr
            })
        }
    }
}

/// Waits on every task result queued in the runtime channel.
fn drain_tasks(servo_easing: &TokenStream) -> TokenStream {
    quote! {
        let cell = #servo_easing::utils::task::RUNTIME_RX.get().ok_or(#servo_easing::errors::RuntimeError).unwrap();
        let mut lock = cell.lock();
        let receiver = lock.as_mut().ok_or(#servo_easing::errors::RuntimeError).unwrap();

        while receiver.len() > 0 {
            if let Some(mut task_receiver) = receiver.recv().await {
                if let Some(#servo_easing::utils::task::TaskResult::Err(err)) = task_receiver.recv().await {
                    #servo_easing::utils::log::error!("Task failed: {}", err);
                }
            }
        }
    }
}

fn returns_value(output: &ReturnType) -> bool {
    match output {
        ReturnType::Default => false,
        ReturnType::Type(_, ty) => {
            !matches!(&**ty, syn::Type::Tuple(tuple) if tuple.elems.is_empty())
        }
    }
}

fn is_unit_expr(stmt: &Stmt) -> bool {
    matches!(stmt, Stmt::Expr(Expr::Tuple(tuple), _) if tuple.elems.is_empty())
}

#[cfg(test)]
mod tests {
    use proc_macro2::TokenStream;
    use quote::quote;

    use crate::internals::{runtime_macro, Flavor};

    fn main_runtime() -> TokenStream {
        quote! {
            let rt = ::servo_easing::utils::tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .unwrap();
        }
    }

    fn drain() -> TokenStream {
        quote! {
            let cell = ::servo_easing::utils::task::RUNTIME_RX.get().ok_or(::servo_easing::errors::RuntimeError).unwrap();
            let mut lock = cell.lock();
            let receiver = lock.as_mut().ok_or(::servo_easing::errors::RuntimeError).unwrap();

            while receiver.len() > 0 {
                if let Some(mut task_receiver) = receiver.recv().await {
                    if let Some(::servo_easing::utils::task::TaskResult::Err(err)) = task_receiver.recv().await {
                        ::servo_easing::utils::log::error!("Task failed: {}", err);
                    }
                }
            }
        }
    }

    #[test]
    fn test_runtime_macro_with_result() {
        let runtime = main_runtime();
        let drain = drain();

        let input = quote! {
            async fn main() -> Result<(), Error> {
                let servo = 3;
                Ok(())
            }
        };
        let control = quote! {
            fn main() -> Result<(), Error> {
                #runtime
                rt.block_on(async {
                    ::servo_easing::utils::task::init_task_channel().await;
                    let servo = 3;
                    #drain
                    Ok(())
                })
            }
        };

        assert_eq!(
            runtime_macro(input, Flavor::Main).to_string(),
            control.to_string(),
            "The tail expression is returned after the tasks are drained."
        );
    }

    #[test]
    fn test_runtime_macro_without_result() {
        let runtime = main_runtime();
        let drain = drain();

        let input = quote! {
            async fn main() {
                let servo = 3;
                sweep.await;
            }
        };
        let control = quote! {
            fn main() {
                #runtime
                rt.block_on(async {
                    ::servo_easing::utils::task::init_task_channel().await;
                    let servo = 3;
                    sweep.await;
                    #drain
                })
            }
        };

        assert_eq!(
            runtime_macro(input, Flavor::Main).to_string(),
            control.to_string()
        );
    }

    #[test]
    fn test_runtime_macro_explicit_unit() {
        let runtime = main_runtime();
        let drain = drain();

        let input = quote! {
            async fn main() -> () {
                let servo = 3;
                ()
            }
        };
        let control = quote! {
            fn main() -> () {
                #runtime
                rt.block_on(async {
                    ::servo_easing::utils::task::init_task_channel().await;
                    let servo = 3;
                    #drain
                })
            }
        };

        assert_eq!(
            runtime_macro(input, Flavor::Main).to_string(),
            control.to_string()
        );
    }

    #[test]
    fn test_runtime_macro_test_flavor() {
        let drain = drain();

        let input = quote! {
            #[serial]
            async fn moves() { }
        };
        let control = quote! {
            #[test]
            #[serial]
            fn moves() {
                let rt = ::servo_easing::utils::tokio::runtime::Runtime::new().unwrap();
                rt.block_on(async {
                    ::servo_easing::utils::task::init_task_channel().await;
                    #drain
                })
            }
        };

        assert_eq!(
            runtime_macro(input, Flavor::Test).to_string(),
            control.to_string()
        );
    }

    #[test]
    fn test_runtime_macro_invalid_input() {
        let input = quote! { struct NotAFunction; };
        let output = runtime_macro(input, Flavor::Main).to_string();
        assert!(output.contains("compile_error"));
    }
}
