use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use tinproxy::{EffectRegistry, TrackedState, Value};

fn key() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "count", "name"]).prop_map(str::to_string)
}

fn value() -> impl Strategy<Value = Value> {
    prop_oneof![
        (-1000i32..1000).prop_map(Value::from),
        "[a-z]{0,8}".prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
    ]
}

proptest! {
    #[test]
    fn every_effect_sees_each_write(
        writes in prop::collection::vec((key(), value()), 0..20),
        effect_count in 1usize..5,
    ) {
        let registry = EffectRegistry::new();
        let state = TrackedState::new(Vec::<(String, Value)>::new(), registry.clone());
        let seen = Arc::new(Mutex::new(Vec::new()));

        for index in 0..effect_count {
            let state = state.clone();
            let seen = seen.clone();
            registry
                .watch(move || seen.lock().unwrap().push((index, state.snapshot())))
                .unwrap();
        }

        for (key, value) in &writes {
            seen.lock().unwrap().clear();
            state.set(key.clone(), value.clone()).unwrap();

            let seen = seen.lock().unwrap();
            prop_assert_eq!(seen.len(), effect_count);
            for (position, (index, snapshot)) in seen.iter().enumerate() {
                prop_assert_eq!(*index, position);
                prop_assert_eq!(snapshot.get(key), Some(value));
            }
        }
    }

    #[test]
    fn invocation_count_is_registration_plus_writes(
        writes in prop::collection::vec((key(), value()), 0..20),
        effect_count in 0usize..5,
    ) {
        let registry = EffectRegistry::new();
        let state = TrackedState::new(Vec::<(String, Value)>::new(), registry.clone());
        let calls = Arc::new(Mutex::new(0usize));

        for _ in 0..effect_count {
            let calls = calls.clone();
            registry.watch(move || *calls.lock().unwrap() += 1).unwrap();
        }
        for (key, value) in writes.iter().cloned() {
            state.set(key, value).unwrap();
        }

        prop_assert_eq!(*calls.lock().unwrap(), effect_count * (writes.len() + 1));
    }

    #[test]
    fn repeated_equal_writes_are_not_suppressed(n in 0i32..100, repeats in 1usize..10) {
        let registry = EffectRegistry::new();
        let state = TrackedState::new([("count", n)], registry.clone());
        let calls = Arc::new(Mutex::new(0usize));
        {
            let calls = calls.clone();
            registry.watch(move || *calls.lock().unwrap() += 1).unwrap();
        }

        for _ in 0..repeats {
            state.set("count", n).unwrap();
        }

        prop_assert_eq!(*calls.lock().unwrap(), repeats + 1);
    }
}
