use std::sync::Arc;

use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;
use xu_bridge::{
    ChainBuilder, ErrorKind, Exception, ExceptionBridge, ObjectRegistry, Raised, Status,
    StatusCode,
};

fn bridge() -> ExceptionBridge {
    ExceptionBridge::new(Arc::new(ObjectRegistry::new()))
}

fn raised(bridge: &ExceptionBridge, status: Status) -> Exception {
    match bridge.raise(status) {
        Err(Raised::Exception(e)) => e,
        other => panic!("expected an exception, got {other:?}"),
    }
}

fn assert_raised_from(outer: &Exception, inner: &Exception) {
    assert!(Exception::ptr_eq(outer.cause().unwrap(), inner));
    assert!(Exception::ptr_eq(outer.context().unwrap(), inner));
}

#[test]
fn three_hops_through_statuses() {
    let b = bridge();
    let first = b.capture(&Exception::new(ErrorKind::Value, "first error"));
    let second = b.chain_status(first, ErrorKind::Type, "second error").unwrap();
    let third = b.chain_status(second, ErrorKind::Assertion, "third error").unwrap();
    assert_eq!(third.code(), StatusCode::Internal);

    let e3 = raised(&b, third);
    assert_eq!(e3.to_string(), "AssertionError: third error");
    let e2 = e3.cause().unwrap();
    assert_raised_from(&e3, e2);
    assert_eq!(e2.to_string(), "TypeError: second error");
    let e1 = e2.cause().unwrap();
    assert_raised_from(e2, e1);
    assert_eq!(e1.to_string(), "ValueError: first error");
    assert!(e1.cause().is_none() && e1.context().is_none());
    assert_eq!(e3.depth(), 3);
    assert_eq!(b.registry().live_count(), 0);
}

#[test]
fn chain_from_plain_status() {
    let b = bridge();
    let inner = Status::new(StatusCode::NotFound, "no such key");
    let outer = b.chain_status(inner, ErrorKind::Type, "lookup failed").unwrap();
    let e = raised(&b, outer);
    assert_eq!(e.cause().unwrap().message(), "[NOT_FOUND] no such key");
}

#[test]
fn ok_inner_status_is_not_chained() {
    let b = bridge();
    let st = b.chain_status(Status::ok_status(), ErrorKind::Type, "x").unwrap();
    assert!(st.is_ok());
    let st = b.wrap_status(Status::ok_status(), StatusCode::Internal, "x").unwrap();
    assert!(st.is_ok());
}

#[test]
fn wrap_builds_the_outer_from_code_and_message() {
    let b = bridge();
    let original = Exception::new(ErrorKind::Precondition, "inner");
    let inner = b.capture(&original);
    let outer = b.wrap_status(inner, StatusCode::Aborted, "outer").unwrap();
    assert_eq!(outer.code(), StatusCode::Aborted);

    let e = raised(&b, outer);
    assert_eq!(e.kind(), ErrorKind::Value);
    assert_eq!(e.message(), "[ABORTED] outer");
    assert_raised_from(&e, &original);
}

#[test]
fn builder_matches_status_chain() {
    let b = bridge();
    let mut builder = ChainBuilder::new();
    builder.push(ErrorKind::Value, "first error");
    builder.push(ErrorKind::Type, "second error");
    builder.push(ErrorKind::Assertion, "third error");

    let mut st = b.capture(&Exception::new(ErrorKind::Value, "first error"));
    st = b.chain_status(st, ErrorKind::Type, "second error").unwrap();
    st = b.chain_status(st, ErrorKind::Assertion, "third error").unwrap();
    let through_statuses = ChainBuilder::from_exception(&raised(&b, st));
    assert_eq!(through_statuses.links(), builder.links());

    let direct = builder.materialize().unwrap();
    let rebuilt = raised(&b, b.capture(&direct));
    assert!(Exception::ptr_eq(&rebuilt, &direct));
}

#[test]
fn deep_chains_are_released_without_recursion() {
    let mut builder = ChainBuilder::new();
    for _ in 0..100_000 {
        builder.push(ErrorKind::Type, "hop");
    }
    let e = builder.materialize().unwrap();
    assert_eq!(e.depth(), 100_000);
    drop(builder);
    drop(e);

    let b = bridge();
    let mut st = b.capture(&Exception::new(ErrorKind::Value, "root"));
    for _ in 0..50_000 {
        st = b.chain_status(st, ErrorKind::Type, "hop").unwrap();
    }
    assert_eq!(b.registry().live_count(), 1);
    drop(st);
    assert_eq!(b.registry().live_count(), 0);
}

fn any_kind() -> impl Strategy<Value = ErrorKind> {
    proptest::sample::select(ErrorKind::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64, max_shrink_iters: 200, .. ProptestConfig::default()
    })]
    #[test]
    fn chains_survive_any_depth(hops in proptest::collection::vec((any_kind(), "[a-z ]{0,12}"), 1..8)) {
        let b = bridge();
        let (kind, message) = &hops[0];
        let mut st = b.capture(&Exception::new(*kind, message.clone()));
        let mut expected = ChainBuilder::new();
        expected.push(*kind, message.clone());
        for (kind, message) in &hops[1..] {
            st = b.chain_status(st, *kind, message).unwrap();
            expected.push(*kind, message.clone());
        }
        let e = raised(&b, st);
        prop_assert_eq!(e.depth(), hops.len());
        let got = ChainBuilder::from_exception(&e);
        prop_assert_eq!(got.links(), expected.links());
        prop_assert_eq!(b.registry().live_count(), 0);
    }
}
