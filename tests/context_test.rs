/*!
 * Context Tests
 * Per-thread isolation, snapshots and inherited contexts
 */

use conditions::{
    depths, find_restart, invoke_restart, signal, spawn, with_handlers, with_restarts, Condition,
    ContextSnapshot, DepthCheck, Handlers, Restarts, StackDepths, Unwind,
};
use pretty_assertions::assert_eq;
use std::thread;

#[derive(Debug)]
struct Interrupted(u32);
impl Condition for Interrupted {}

#[test]
fn test_threads_have_independent_stacks() {
    let _check = DepthCheck::new();
    with_restarts(Restarts::new().restart("local", |_: ()| ()), || {
        let other = thread::spawn(|| (depths(), find_restart("local").is_some()))
            .join()
            .unwrap();
        assert_eq!(other, (StackDepths::default(), false));
        assert!(find_restart("local").is_some());
        Ok(())
    })
    .unwrap();
}

#[test]
fn test_child_invokes_parent_restart() {
    let _check = DepthCheck::new();
    let value = with_restarts(Restarts::new().restart("abort_job", |code: u32| code), || {
        let child = spawn(|| {
            assert!(find_restart("abort_job").is_some());
            invoke_restart::<u32, _>("abort_job", 17_u32)
        });
        let result = child.join();
        assert!(matches!(result, Err(Unwind::Transfer(_))));
        result
    })
    .unwrap();

    assert_eq!(value, 17);
}

#[test]
fn test_child_uses_inherited_handlers() {
    let _check = DepthCheck::new();
    let value = with_restarts(Restarts::new().restart("stop", |n: u32| n * 2), || {
        with_handlers(
            Handlers::new().on::<Interrupted, _>(|c| invoke_restart("stop", c.0)),
            || {
                spawn(|| {
                    signal(Interrupted(21))?;
                    Ok(0)
                })
                .join()
            },
        )
    })
    .unwrap();

    assert_eq!(value, 42);
}

#[test]
fn test_child_pushes_invisible_to_parent() {
    let _check = DepthCheck::new();
    with_restarts(Restarts::new().restart("parent", |_: ()| ()), || {
        let before = depths();
        let child_depth = spawn(|| {
            with_restarts(Restarts::new().restart("child", |_: ()| 0), || {
                Ok(depths().restarts)
            })
        })
        .join()?;

        assert_eq!(child_depth, before.restarts + 1);
        assert_eq!(depths(), before);
        assert!(find_restart("child").is_none());
        Ok(())
    })
    .unwrap();
}

#[test]
fn test_snapshot_enter_on_another_thread() {
    let _check = DepthCheck::new();
    let snapshot = with_restarts(Restarts::new().restart("captured", |_: ()| ()), || {
        Ok(ContextSnapshot::capture())
    })
    .unwrap();
    assert_eq!(snapshot.restart_depth(), depths().restarts + 1);

    let visible = thread::spawn(move || {
        let inside = snapshot
            .enter(|| Ok(find_restart("captured").map(|h| h.name().to_string())))
            .ok()
            .flatten();
        (inside, find_restart("captured").is_none())
    })
    .join()
    .unwrap();

    assert_eq!(visible, (Some("captured".to_string()), true));
}

#[test]
fn test_child_control_error_returns_to_parent() {
    let _check = DepthCheck::new();
    let result = spawn(|| invoke_restart::<(), _>("missing", ())).join();
    assert!(matches!(result, Err(Unwind::Control(_))));
}
