//! Basic usage example for merry.
//!
//! Demonstrates:
//! - Protecting a function with `protect()`
//! - Handling an exception kind with `on_exception()`
//! - Running a success handler with `on_success()`
//! - Running a cleanup handler with `on_cleanup()`
//! - Sharing state through the `g()` namespace
//!
//! Run with: `cargo run --example basic_usage`

use merry::kinds::{KEY_ERROR, ZERO_DIVISION_ERROR};
use merry::{without_error, Exception, Merry, MerryConfig, Outcome};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
struct Calls(u32);

fn main() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("no other subscriber is set");

    println!("=== merry: Basic Usage ===\n");

    let merry = Merry::with_config(MerryConfig::from_env());
    merry.g().insert(Calls(0));

    // -------------------------------------------------------------------------
    // 1. Protect a function
    // -------------------------------------------------------------------------
    println!("1. Protecting `divide`...");

    let g = merry.g().clone();
    let divide = merry.protect("divide", move |(a, b): (i64, i64)| -> Outcome<i64> {
        let calls = g.get_cloned::<Calls>().map_or(0, |c| c.0);
        g.insert(Calls(calls + 1));
        if b == 0 {
            return Err(Exception::new(&ZERO_DIVISION_ERROR, "division by zero"));
        }
        Ok(Some(a / b))
    });

    println!("   divide(10, 2) = {:?}", divide.call((10, 2)));

    // -------------------------------------------------------------------------
    // 2. Without a handler the exception is returned untouched
    // -------------------------------------------------------------------------
    println!("\n2. Calling divide(1, 0) with no handler...");

    match divide.call((1, 0)) {
        Ok(value) => println!("   unexpected value: {:?}", value),
        Err(e) => println!("   raised: {}", e),
    }

    // -------------------------------------------------------------------------
    // 3. Register an exception handler
    // -------------------------------------------------------------------------
    println!("\n3. Registering a ZeroDivisionError handler...");

    merry
        .on_exception([&ZERO_DIVISION_ERROR])
        .handle(|e: &Exception| -> Outcome<i64> {
            println!("   handler saw: {}", e);
            Ok(Some(0))
        })
        .expect("divide is protected");

    println!("   divide(1, 0) = {:?}", divide.call((1, 0)));

    // -------------------------------------------------------------------------
    // 4. Success and cleanup handlers
    // -------------------------------------------------------------------------
    println!("\n4. Success and cleanup handlers on `lookup`...");

    let table: HashMap<&'static str, &'static str> =
        [("a", "alpha"), ("b", "")].into_iter().collect();
    let lookup = merry.protect("lookup", move |key: &'static str| -> Outcome<String> {
        match table.get(key) {
            Some(value) if value.is_empty() => Ok(None),
            Some(value) => Ok(Some(value.to_string())),
            None => Err(Exception::new(&KEY_ERROR, format!("{:?}", key))),
        }
    });

    merry
        .on_exception([&KEY_ERROR])
        .handle(without_error(|| Ok(Some("<missing>".to_string()))))
        .expect("lookup is protected");
    merry
        .on_success()
        .handle(|| Ok(Some("<empty>".to_string())))
        .expect("lookup is protected");
    merry
        .on_cleanup()
        .handle(|| {
            println!("   cleanup ran");
            Ok(None::<String>)
        })
        .expect("lookup is protected");

    println!("   lookup(\"a\") = {:?}", lookup.call("a"));
    println!("   lookup(\"b\") = {:?}", lookup.call("b"));
    println!("   lookup(\"z\") = {:?}", lookup.call("z"));

    // -------------------------------------------------------------------------
    // 5. Read shared state
    // -------------------------------------------------------------------------
    println!("\n5. Reading the namespace...");

    println!("   divide ran {} times", merry.g().get_cloned::<Calls>().map_or(0, |c| c.0));
    println!("   handled kinds for divide: {:?}", merry.handled_kinds(&divide));

    println!("\n=== Done ===");
}
