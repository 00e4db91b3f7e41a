/*!
 * Conditions Demo - Main Entry Point
 *
 * Walks through the protocols on a small example:
 * - Recovering from a signal with a restart chosen by a handler
 * - Continuable errors through `proceed`
 * - Warnings, muffled and reported
 * - An unhandled error reaching the top level
 */

use conditions::{
    cerror, configure, error, init_tracing, invoke_restart, muffle, proceed, signal, toplevel,
    warn, with_handlers, with_restarts, Condition, ConditionResult, ConditionsConfig, Handlers,
    Restarts, USE_VALUE,
};
use miette::Report;
use tracing::info;

#[derive(Debug)]
struct OddNumber(i64);

impl Condition for OddNumber {}

#[derive(Debug)]
struct Deprecated(&'static str);

impl Condition for Deprecated {
    fn message(&self) -> String {
        format!("`{}` is deprecated", self.0)
    }
}

#[derive(Debug)]
struct DiskFull {
    needed: u64,
}

impl Condition for DiskFull {}

/// Each element passes through its own restart scope
fn double_odds(range: std::ops::Range<i64>) -> ConditionResult<Vec<i64>> {
    range
        .map(|k| {
            with_restarts(
                Restarts::new()
                    .restart(USE_VALUE, |x: i64| x)
                    .restart("double", |x: i64| 2 * x),
                || {
                    if k % 2 == 1 {
                        signal(OddNumber(k))?;
                    }
                    Ok(k)
                },
            )
        })
        .collect()
}

fn main() {
    init_tracing();
    configure(ConditionsConfig::from_env());

    info!("Conditions demo starting...");

    let outcome = toplevel(|| {
        let doubled = with_handlers(
            Handlers::new().on::<OddNumber, _>(|c| invoke_restart("double", c.0)),
            || double_odds(0..10),
        )?;
        info!(?doubled, "Odd numbers doubled by restart");

        with_handlers(Handlers::new().bind_type::<DiskFull>(proceed), || {
            cerror(DiskFull { needed: 4096 })
        })?;
        info!("Continued past DiskFull via proceed");

        with_handlers(Handlers::new().bind_type::<Deprecated>(muffle), || {
            warn(Deprecated("old_api"))
        })?;
        warn(Deprecated("legacy_flag"))?;

        error::<(), _>(DiskFull { needed: 1 << 30 })
    });

    match outcome {
        Ok(()) => info!("Demo finished"),
        Err(err) => eprintln!("{:?}", Report::new(err)),
    }
}
