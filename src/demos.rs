//! Small demonstrations of write interception, one per name.

use std::sync::Arc;

use parking_lot::Mutex;
use tinproxy::{
    EffectRegistry, KindConstraint, LogWrites, ReadOnly, RegistryConfig, Result, TrackedState,
    Value,
};

pub type Demo = fn(RegistryConfig) -> Result<()>;

const DEMOS: &[(&str, Demo)] = &[
    ("noop", noop),
    ("logging", logging),
    ("fn-trap", fn_trap),
    ("validation", validation),
    ("read-only", read_only),
    ("reactivity", reactivity),
];

// camelCase spellings accepted alongside the kebab-case names
const ALIASES: &[(&str, &str)] = &[("fnTrap", "fn-trap"), ("readOnly", "read-only")];

pub fn lookup(name: &str) -> Option<Demo> {
    let name = ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map_or(name, |(_, canonical)| *canonical);
    DEMOS
        .iter()
        .find(|(demo_name, _)| *demo_name == name)
        .map(|(_, demo)| *demo)
}

fn empty(registry: EffectRegistry) -> TrackedState {
    TrackedState::new(Vec::<(String, Value)>::new(), registry)
}

/// No interceptors: writes land in the mapping untouched.
fn noop(config: RegistryConfig) -> Result<()> {
    let state = empty(EffectRegistry::with_config(config));
    state.set("a", 1)?;
    if let Some(a) = state.get("a") {
        println!("{a}");
    }
    println!("{:?}", state.snapshot());
    Ok(())
}

fn logging(config: RegistryConfig) -> Result<()> {
    let state = TrackedState::builder(EffectRegistry::with_config(config))
        .intercept(LogWrites)
        .build();
    state.set("a", 1)?;
    state.set("b", "hello world")?;
    Ok(())
}

/// Wraps a two-argument function, logging each call and scaling the result.
struct Intercepted<F> {
    name: &'static str,
    inner: F,
    scale: f64,
}

impl<F> Intercepted<F>
where
    F: Fn(f64, f64) -> f64,
{
    fn call(&self, a: f64, b: f64) -> f64 {
        let result = (self.inner)(a, b);
        tracing::info!(
            "Calling function \"{}\" with args \"{a},{b}\" and the result is \"{result}\".",
            self.name
        );
        result * self.scale
    }
}

fn fn_trap(_config: RegistryConfig) -> Result<()> {
    let sum = |a: f64, b: f64| a + b;
    let proxy = Intercepted {
        name: "sum",
        inner: sum,
        scale: 10.0,
    };
    println!("{}", sum(5.0, 5.0));
    println!("{}", proxy.call(5.0, 5.0));
    Ok(())
}

fn validation(config: RegistryConfig) -> Result<()> {
    let state = TrackedState::builder(EffectRegistry::with_config(config))
        .intercept(KindConstraint::numbers_only())
        .build();
    state.set("a", 1)?;
    if let Err(err) = state.set("b", "hello world") {
        eprintln!("{err}");
    }
    Ok(())
}

fn read_only(config: RegistryConfig) -> Result<()> {
    let state = TrackedState::builder(EffectRegistry::with_config(config))
        .entry("name", "John Doe")
        .entry("age", 42)
        .intercept(ReadOnly)
        .build();
    if let Some(name) = state.get("name") {
        println!("Name: {name}");
    }
    if let Err(err) = state.set("age", 25) {
        eprintln!("{err}");
    }
    Ok(())
}

/// Any write to the state re-renders the counter text.
fn reactivity(config: RegistryConfig) -> Result<()> {
    let registry = EffectRegistry::with_config(config);
    let state = TrackedState::new([("count", 0)], registry.clone());
    let inner_html = Arc::new(Mutex::new(String::new()));

    registry.watch({
        let state = state.clone();
        let inner_html = inner_html.clone();
        move || {
            let count = state.get_number("count").unwrap_or_default();
            *inner_html.lock() = format!("Counter is {count}");
        }
    })?;

    println!("{}", inner_html.lock());
    state.update_number("count", |n| n + 1.0)?;
    println!("{}", inner_html.lock());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_demo_is_registered_and_succeeds() {
        for (name, _) in DEMOS {
            let demo = lookup(name).unwrap();
            demo(RegistryConfig::default()).unwrap();
        }
    }

    #[test]
    fn unknown_names_are_not_found() {
        assert!(lookup("").is_none());
        assert!(lookup("readonly").is_none());
        assert!(lookup("fn_trap").is_none());
    }

    #[test]
    fn camel_case_aliases_resolve() {
        for (alias, canonical) in ALIASES {
            let demo = lookup(alias).unwrap();
            assert_eq!(demo as usize, lookup(canonical).unwrap() as usize);
            demo(RegistryConfig::default()).unwrap();
        }
    }

    #[test]
    fn intercepted_call_scales_the_result() {
        let proxy = Intercepted {
            name: "sum",
            inner: |a: f64, b: f64| a + b,
            scale: 10.0,
        };
        assert_eq!(proxy.call(5.0, 5.0), 100.0);
    }
}
