//! Exception hierarchy example for merry.
//!
//! Demonstrates:
//! - Declaring custom kinds with `define_error_kind!`
//! - Mapping a domain error onto kinds with `Classify`
//! - Most-specific handler selection across a hierarchy
//! - Per-kind debug overrides that re-raise instead of handling
//!
//! Run with: `cargo run --example exception_hierarchy`

use merry::kinds::{EXCEPTION, LOOKUP_ERROR};
use merry::{define_error_kind, Classify, ErrorKind, Exception, Merry, Outcome};
use std::fmt;

define_error_kind! {
    /// Anything the payment service rejects.
    pub PAYMENT_ERROR: "PaymentError";
    pub CARD_DECLINED: "CardDeclined" extends PAYMENT_ERROR;
    pub FRAUD_SUSPECTED: "FraudSuspected" extends CARD_DECLINED;
    pub UNKNOWN_ACCOUNT: "UnknownAccount" extends LOOKUP_ERROR;
}

#[derive(Debug)]
enum PaymentFailure {
    Declined,
    Fraud,
    NoAccount(u32),
    Outage,
}

impl fmt::Display for PaymentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentFailure::Declined => f.write_str("card declined"),
            PaymentFailure::Fraud => f.write_str("transaction flagged"),
            PaymentFailure::NoAccount(id) => write!(f, "account {} not found", id),
            PaymentFailure::Outage => f.write_str("processor unavailable"),
        }
    }
}

impl std::error::Error for PaymentFailure {}

impl Classify for PaymentFailure {
    fn kind(&self) -> &'static ErrorKind {
        match self {
            PaymentFailure::Declined => &CARD_DECLINED,
            PaymentFailure::Fraud => &FRAUD_SUSPECTED,
            PaymentFailure::NoAccount(_) => &UNKNOWN_ACCOUNT,
            PaymentFailure::Outage => &PAYMENT_ERROR,
        }
    }
}

fn charge(account: u32) -> Result<u64, PaymentFailure> {
    match account {
        1 => Ok(100),
        2 => Err(PaymentFailure::Declined),
        3 => Err(PaymentFailure::Fraud),
        4 => Err(PaymentFailure::Outage),
        other => Err(PaymentFailure::NoAccount(other)),
    }
}

fn main() {
    println!("=== merry: Exception Hierarchy ===\n");

    // -------------------------------------------------------------------------
    // 1. Inspect the declared hierarchy
    // -------------------------------------------------------------------------
    println!("1. Declared kinds...");

    for kind in [&FRAUD_SUSPECTED, &UNKNOWN_ACCOUNT] {
        let chain: Vec<&str> = kind.ancestors().map(ErrorKind::name).collect();
        println!("   {:<16} -> {}", kind.name(), chain.join(" -> "));
    }

    // -------------------------------------------------------------------------
    // 2. Register handlers at several levels
    // -------------------------------------------------------------------------
    println!("\n2. Registering handlers...");

    let merry = Merry::new();
    let pay = merry.protect("pay", |account: u32| -> Outcome<String> {
        let cents = charge(account)?;
        Ok(Some(format!("charged {} cents", cents)))
    });

    merry
        .on_exception([&PAYMENT_ERROR])
        .handle(|e: &Exception| -> Outcome<String> { Ok(Some(format!("payment failed: {}", e.message()))) })
        .expect("pay is protected");
    merry
        .on_exception([&CARD_DECLINED])
        .handle(|_: &Exception| -> Outcome<String> { Ok(Some("please use another card".to_string())) })
        .expect("pay is protected");
    merry
        .on_exception([&EXCEPTION])
        .handle(|e: &Exception| -> Outcome<String> { Ok(Some(format!("unexpected {}", e.kind()))) })
        .expect("pay is protected");

    println!("   handled kinds: {:?}", merry.handled_kinds(&pay));

    // -------------------------------------------------------------------------
    // 3. The most specific handler wins
    // -------------------------------------------------------------------------
    println!("\n3. Dispatching...");

    for account in 1..=5 {
        println!("   pay({}) = {:?}", account, pay.call(account));
    }

    // -------------------------------------------------------------------------
    // 4. Debug override: let fraud bubble up to the caller
    // -------------------------------------------------------------------------
    println!("\n4. Re-raising FraudSuspected...");

    merry
        .on_exception([&FRAUD_SUSPECTED])
        .debug(true)
        .handle(|_: &Exception| -> Outcome<String> { Ok(None) })
        .expect("pay is protected");

    match pay.call(3) {
        Ok(value) => println!("   unexpected value: {:?}", value),
        Err(e) => println!("   raised to caller: {}", e),
    }

    println!("\n=== Done ===");
}
