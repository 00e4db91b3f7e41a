/*!
 * Protocol Tests
 * error, cerror, warn and the canned handlers
 */

use conditions::{
    cerror, config, configure, error, find_restart, invoker, muffle, proceed, resignal_in,
    signal, toplevel, use_value, warn, with_handlers, with_restarts, Condition, ConditionsConfig,
    ControlError, DepthCheck, Handlers, Resignal, Restarts, WarningOutput, MUFFLE, PROCEED,
    USE_VALUE,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::sync::Arc;

#[derive(Debug)]
struct ParseFailure {
    line: usize,
}
impl Condition for ParseFailure {}

#[derive(Debug)]
struct LowDisk;
impl Condition for LowDisk {
    fn message(&self) -> String {
        "disk space is low".to_string()
    }
}

#[derive(Debug)]
struct ConfigInvalid(String);
impl Condition for ConfigInvalid {}

/// Route warnings into a buffer for the duration of a test
fn capture_warnings() -> Arc<Mutex<Vec<String>>> {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let sink = captured.clone();
    configure(
        ConditionsConfig::new().with_warning_output(WarningOutput::Custom(Arc::new(
            move |c: &dyn Condition| sink.lock().push(c.message()),
        ))),
    );
    captured
}

#[test]
fn test_error_without_handler_is_unhandled() {
    let _check = DepthCheck::new();
    let err = error::<(), _>(ParseFailure { line: 3 })
        .unwrap_err()
        .into_control()
        .unwrap();
    assert_eq!(
        err,
        ControlError::Unhandled {
            condition_type: "ParseFailure".to_string(),
            message: "ParseFailure { line: 3 }".to_string(),
        }
    );
}

#[test]
fn test_error_handled_by_enclosing_restart() {
    let _check = DepthCheck::new();
    let value = with_restarts(Restarts::new().restart(USE_VALUE, |x: usize| x), || {
        with_handlers(
            Handlers::new().on::<ParseFailure, _>(|c| use_value(c.line * 100)),
            || error(ParseFailure { line: 4 }),
        )
    })
    .unwrap();
    assert_eq!(value, 400);
}

#[test]
fn test_error_declined_by_handler_still_fails() {
    let _check = DepthCheck::new();
    let called = Arc::new(Mutex::new(false));
    let flag = called.clone();
    let result = with_handlers(
        Handlers::new().on::<ParseFailure, _>(move |_| {
            *flag.lock() = true;
            Ok(())
        }),
        || error::<(), _>(ParseFailure { line: 1 }),
    );
    assert!(*called.lock());
    assert!(matches!(
        result.unwrap_err().into_control(),
        Some(ControlError::Unhandled { .. })
    ));
}

#[test]
fn test_cerror_proceeds() {
    let _check = DepthCheck::new();
    let result = with_handlers(Handlers::new().bind_type::<ParseFailure>(proceed), || {
        cerror(ParseFailure { line: 9 })?;
        Ok("continued")
    });
    assert_eq!(result.unwrap(), "continued");
    assert!(find_restart(PROCEED).is_none());
}

#[test]
fn test_cerror_offers_proceed_to_handlers() {
    let _check = DepthCheck::new();
    let seen = Arc::new(Mutex::new(None));
    let slot = seen.clone();
    let result = with_handlers(
        Handlers::new().on::<ParseFailure, _>(move |_| {
            *slot.lock() = find_restart(PROCEED).map(|h| h.name().to_string());
            Ok(())
        }),
        || cerror(ParseFailure { line: 1 }),
    );
    assert!(result.is_err());
    assert_eq!(seen.lock().as_deref(), Some(PROCEED));
}

#[test]
#[serial]
fn test_warn_reports_unmuffled() {
    let _check = DepthCheck::new();
    let captured = capture_warnings();

    warn(LowDisk).unwrap();
    with_handlers(Handlers::new().bind_type::<LowDisk>(muffle), || warn(LowDisk)).unwrap();
    with_handlers(Handlers::new().on::<LowDisk, _>(|_| Ok(())), || warn(LowDisk)).unwrap();

    configure(ConditionsConfig::new());
    assert_eq!(
        *captured.lock(),
        vec!["disk space is low".to_string(), "disk space is low".to_string()]
    );
}

#[test]
#[serial]
fn test_warn_muffle_restart_visible_to_handler() {
    let _check = DepthCheck::new();
    let captured = capture_warnings();
    let names = Arc::new(Mutex::new(Vec::new()));
    let sink = names.clone();

    with_handlers(
        Handlers::new().on::<LowDisk, _>(move |_| {
            sink.lock()
                .extend(find_restart(MUFFLE).map(|h| h.name().to_string()));
            Ok(())
        }),
        || warn(LowDisk),
    )
    .unwrap();

    configure(ConditionsConfig::new());
    assert_eq!(*names.lock(), vec![MUFFLE.to_string()]);
    assert_eq!(captured.lock().len(), 1);
}

#[test]
#[serial]
fn test_silent_warning_output() {
    configure(ConditionsConfig::new().with_warning_output(WarningOutput::Silent));
    assert!(warn(LowDisk).is_ok());
    assert!(matches!(config().warning_output, WarningOutput::Silent));
    configure(ConditionsConfig::new());
}

#[test]
#[serial]
fn test_name_validation_can_be_disabled() {
    configure(ConditionsConfig::new().with_name_validation(false));
    let result = with_restarts(Restarts::new().restart("not-an-identifier", |_: ()| 1), || {
        conditions::invoke_restart("not-an-identifier", ())
    });
    configure(ConditionsConfig::new());
    assert_eq!(result.unwrap(), 1);

    let rejected = with_restarts(Restarts::new().restart("not-an-identifier", |_: ()| 1), || Ok(0));
    assert_eq!(
        rejected.unwrap_err().into_control(),
        Some(ControlError::InvalidRestartName("not-an-identifier".into()))
    );
}

#[test]
fn test_invoker_factory() {
    let _check = DepthCheck::new();
    let handler = invoker("skip");
    let value = with_restarts(Restarts::new().restart("skip", |_: ()| None), || {
        with_handlers(Handlers::new().bind_type::<ParseFailure>(handler.clone()), || {
            signal(ParseFailure { line: 2 })?;
            Ok(Some(2))
        })
    })
    .unwrap();
    assert_eq!(value, None);
}

#[test]
fn test_resignal_converts_conditions() {
    let _check = DepthCheck::new();
    let mapping = Resignal::new()
        .map(|c: &ParseFailure| ConfigInvalid(format!("bad line {}", c.line)));

    let value = with_restarts(Restarts::new().restart(USE_VALUE, |s: String| s), || {
        with_handlers(
            Handlers::new().on::<ConfigInvalid, _>(|c| use_value(c.0.clone())),
            || {
                resignal_in(mapping, || {
                    signal(ParseFailure { line: 12 })?;
                    Ok("parsed".to_string())
                })
            },
        )
    })
    .unwrap();

    assert_eq!(value, "bad line 12");
}

#[test]
fn test_toplevel_boundary() {
    assert_eq!(toplevel(|| Ok(1)), Ok(1));
    let err = toplevel(|| error::<u8, _>(ConfigInvalid("x".into()))).unwrap_err();
    assert!(matches!(err, ControlError::Unhandled { .. }));
}

#[test]
#[should_panic(expected = "escaped to the top level")]
fn test_toplevel_panics_on_escaped_transfer() {
    // A transfer created while its frame was live, smuggled out as a value
    let _ = toplevel(|| {
        let transfer = with_restarts(Restarts::new().restart("inner", |_: ()| Ok(())), || {
            Ok(conditions::invoke_restart::<(), _>("inner", ()))
        })?;
        transfer
    });
}
