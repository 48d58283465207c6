//! End-to-end dispatch behaviour.
//!
//! These tests compile descriptions through the public API only and check
//! the observable routing laws.

use polydispatch::{
    compile, AliasResolutionError, CallArgs, CanonicalKey, Classifier, ClassifierRule, CompileError,
    Description, DispatchError, Engine, HostObject, Implementation, Overload, Signature,
    SharedResolver, Value,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn tagged(label: &'static str) -> impl Fn(CallArgs) -> Value + Send + Sync + 'static {
    move |args| Value::array([Value::from(label), args.into_value()])
}

fn list(items: &[i32]) -> Value {
    Value::array(items.iter().copied())
}

#[test]
fn test_optional_group_prefix_law() {
    let resolver = compile(&Description::new().method("[array:list] [object:options]?", tagged("f")))
        .unwrap();

    let table = resolver.table();
    let keys: Vec<String> = table.keys().map(ToString::to_string).collect();
    assert_eq!(keys, vec!["[array]", "[array, object]"]);
    assert_eq!(
        table.get(&["array"]).unwrap().id,
        table.get(&["array", "object"]).unwrap().id
    );

    assert_eq!(
        resolver.call(vec![list(&[1, 2, 3])]).unwrap(),
        Value::array([
            Value::from("f"),
            Value::object([("list", list(&[1, 2, 3]))]),
        ])
    );
    assert_eq!(
        resolver
            .call(vec![list(&[1, 2, 3]), Value::object([("x", 1)])])
            .unwrap(),
        Value::array([
            Value::from("f"),
            Value::object([
                ("list", list(&[1, 2, 3])),
                ("options", Value::object([("x", 1)])),
            ]),
        ])
    );
}

#[test]
fn test_alternative_cross_product_law() {
    let resolver = compile(&Description::new().method("[object, string|array]", tagged("f"))).unwrap();
    let table = resolver.table();
    let keys: Vec<String> = table.keys().map(ToString::to_string).collect();
    assert_eq!(keys, vec!["[object, string]", "[object, array]"]);
    assert_eq!(table.entries().len(), 1);

    let obj = Value::object([("a", 1)]);
    assert!(resolver.call(vec![obj.clone(), Value::from("s")]).is_ok());
    assert!(resolver.call(vec![obj, list(&[])]).is_ok());
}

fn alias_chain(length: usize) -> Description {
    let mut desc = Description::new().method("[number]", |_| Value::from("terminal"));
    for i in 1..=length {
        let target = if i == length {
            "[number]".to_string()
        } else {
            format!("[hop{}]", i + 1)
        };
        desc = desc.alias(&format!("[hop{i}]"), &target);
    }
    desc
}

#[test]
fn test_alias_chain_of_four_resolves() {
    let resolver = compile(&alias_chain(4)).unwrap();
    let entry = resolver.table().get(&["hop1"]).unwrap();
    assert_eq!(entry.source, "[number]");
}

#[test]
fn test_alias_chain_of_five_exceeds_hop_limit() {
    let err = compile(&alias_chain(5)).unwrap_err();
    assert_eq!(
        err,
        CompileError::Alias(AliasResolutionError::HopLimitExceeded {
            alias: "[hop1]".to_string(),
            limit: 4,
        })
    );
}

#[test]
fn test_raising_hop_limit_admits_longer_chains() {
    let engine = Engine::builder()
        .config(polydispatch::EngineConfig::new().with_max_alias_hops(5))
        .build();
    assert!(engine.compile(&alias_chain(5)).is_ok());
}

#[test]
fn test_dispatch_miss_reports_type_key() {
    let resolver = compile(
        &Description::new()
            .method("[array, number]", tagged("f1"))
            .method("[array, number, boolean]", tagged("f2")),
    )
    .unwrap();

    let first = resolver.call(vec![list(&[]), Value::from(5)]).unwrap();
    assert_eq!(first.as_elements().unwrap()[0], Value::from("f1"));
    let second = resolver
        .call(vec![list(&[]), Value::from(5), Value::from(true)])
        .unwrap();
    assert_eq!(second.as_elements().unwrap()[0], Value::from("f2"));

    match resolver.call(vec![]) {
        Err(DispatchError::Miss(miss)) => {
            assert!(miss.to_string().contains("[]"));
            assert!(miss.key.is_empty());
        }
        other => panic!("Expected dispatch miss, got {:?}", other),
    }
}

#[test]
fn test_classifier_extension_routes_tagged_values() {
    let desc = Description::new()
        .method("[point]", |_| Value::from("point"))
        .method("[string]", |_| Value::from("string"));
    let probe = Value::from(HostObject::new("Point").with_property("x", 1).with_property("y", 2));

    let plain = compile(&desc).unwrap();
    assert!(plain.call(vec![probe.clone()]).is_err());

    let mut classifier = Classifier::standard();
    classifier.register(ClassifierRule::predicate("point", |value, _, constructor| {
        constructor.map_or(false, |c| *c == polydispatch::Constructor::named("Point"))
            && value.property("x").is_some()
    }));
    let extended = Engine::builder().classifier(classifier).build().compile(&desc).unwrap();

    assert_eq!(extended.call(vec![probe]).unwrap(), Value::from("point"));
    assert_eq!(
        extended.call(vec![Value::from("s")]).unwrap(),
        Value::from("string")
    );
    assert_eq!(
        extended.type_key(&[Value::from(1), list(&[1])]).to_string(),
        "[number, array]"
    );
}

#[test]
fn test_list_form_defaults() {
    let resolver = compile(&Description::from_list([
        Overload::new("[array, number]", Implementation::new(tagged("list"))),
        Overload::new("[number:count, array:items]", Implementation::new(tagged("count")))
            .with_defaults(vec![Value::from(0), list(&[])]),
    ]))
    .unwrap();

    let padded = resolver.call(vec![Value::from(7)]).unwrap();
    assert_eq!(
        padded,
        Value::array([
            Value::from("count"),
            Value::object([("count", Value::from(7)), ("items", list(&[]))]),
        ])
    );

    let direct = resolver.call(vec![list(&[1]), Value::from(2)]).unwrap();
    assert_eq!(direct.as_elements().unwrap()[0], Value::from("list"));
}

#[test]
fn test_shared_resolver_swaps_whole_tables() {
    let shared = SharedResolver::new(
        compile(&Description::new().method("[number]", |_| Value::from("v1"))).unwrap(),
    );
    let before = shared.load();

    let rebuilt = compile(
        &Description::new()
            .method("[number]", |_| Value::from("v2"))
            .method("[string]", |_| Value::from("v2")),
    )
    .unwrap();
    shared.publish(rebuilt);

    assert_eq!(before.call(vec![Value::from(1)]).unwrap(), Value::from("v1"));
    assert!(before.call(vec![Value::from("s")]).is_err());
    assert_eq!(shared.call(vec![Value::from(1)]).unwrap(), Value::from("v2"));
    assert_eq!(shared.call(vec![Value::from("s")]).unwrap(), Value::from("v2"));
}

#[test]
fn test_shared_resolver_is_usable_across_threads() {
    let shared = std::sync::Arc::new(SharedResolver::new(
        compile(&Description::new().method("[number]", |_| Value::from(1))).unwrap(),
    ));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let shared = std::sync::Arc::clone(&shared);
            std::thread::spawn(move || shared.call(vec![Value::from(0)]).unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), Value::from(1));
    }
}

fn sample_description() -> Description {
    Description::new()
        .method("[array:list] [object:options]?", tagged("a"))
        .method("[object, string|array]", tagged("b"))
        .method("[number|string] [boolean]?", tagged("c"))
        .alias("[date]", "[array]")
}

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        Just(Value::Undefined),
        any::<bool>().prop_map(Value::from),
        (-100i32..100).prop_map(Value::from),
        "[a-z]{0,4}".prop_map(Value::from),
        any::<i64>().prop_map(Value::Date),
        prop::collection::vec(0i32..10, 0..3).prop_map(|items| Value::array(items)),
        Just(Value::object([("x", 1)])),
    ]
}

proptest! {
    #[test]
    fn test_compilation_is_idempotent(args in prop::collection::vec(arb_value(), 0..4)) {
        let desc = sample_description();
        let first = compile(&desc).unwrap();
        let second = compile(&desc).unwrap();
        prop_assert_eq!(first.table().render(), second.table().render());
        prop_assert_eq!(first.call(args.clone()), second.call(args));
    }

    #[test]
    fn test_expansion_count_and_prefix_law(
        choices in prop::collection::vec(1usize..4, 1..4),
        optional in any::<bool>(),
    ) {
        let params: Vec<String> = choices
            .iter()
            .enumerate()
            .map(|(i, n)| {
                (0..*n).map(|j| format!("t{i}x{j}")).collect::<Vec<_>>().join("|")
            })
            .collect();
        let mut text = format!("[{}]", params.join(", "));
        if optional {
            text.push_str(" [extra]?");
        }

        let signature = Signature::parse(&text).unwrap();
        let keys = polydispatch::expand(&signature);
        let product: usize = choices.iter().product();
        let expected = if optional { product * 2 } else { product };
        prop_assert_eq!(keys.len(), expected);
        if optional {
            // every extended key has its mandatory prefix in the table too
            for long in keys.iter().filter(|k| k.len() == choices.len() + 1) {
                let short = CanonicalKey::new(long.tokens()[..choices.len()].to_vec());
                prop_assert!(short.is_prefix_of(long));
                prop_assert!(keys.contains(&short));
                prop_assert_eq!(long.tokens().last().map(String::as_str), Some("extra"));
            }
            if product == 1 {
                for k in &keys {
                    prop_assert!(keys[0].is_prefix_of(k));
                }
            }
        }

        let table = compile(&Description::new().method(&text, |_| Value::Null)).unwrap();
        prop_assert_eq!(table.table().len(), expected);
    }
}
