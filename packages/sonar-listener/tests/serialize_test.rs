use serde_json::json;
use sonar_core::HostValue;
use sonar_listener::clone_value;
use sonar_listener::serialize::entries_of;

#[test]
fn test_exotic_values() {
    let value = HostValue::object([
        ("handler", HostValue::function("onClick", "function onClick() {}")),
        ("tag", HostValue::Symbol("Symbol(id)".to_string())),
        ("window", HostValue::Global),
        ("missing", HostValue::Undefined),
        ("flag", HostValue::Bool(true)),
        ("nothing", HostValue::Null),
    ]);

    assert_eq!(
        clone_value(&value),
        json!({
            "handler": { "isFunction": true, "source": "function onClick() {}", "name": "onClick" },
            "tag": { "isSymbol": true, "name": "Symbol(id)" },
            "window": null,
            "flag": true,
            "nothing": null,
        })
    );
}

#[test]
fn test_cycles_become_empty_objects() {
    let node = HostValue::object([("name", HostValue::string("root"))]);
    node.set("self", node.clone());
    let list = HostValue::array(vec![HostValue::Number(1.0), HostValue::Undefined]);
    if let HostValue::Array(items) = &list {
        items.borrow_mut().push(list.clone());
    }

    assert_eq!(clone_value(&node), json!({ "name": "root", "self": {} }));
    assert_eq!(clone_value(&list), json!([1, null, {}]));
}

#[test]
fn test_property_order_is_kept() {
    let value = HostValue::object([
        ("zeta", HostValue::Number(1.0)),
        ("alpha", HostValue::Number(2.0)),
    ]);
    let keys: Vec<_> = entries_of(clone_value(&value))
        .into_iter()
        .map(|e| e.key)
        .collect();
    assert_eq!(keys, vec!["zeta", "alpha"]);
}

#[test]
fn test_array_entries_use_indices() {
    let value = HostValue::array(vec![HostValue::string("a"), HostValue::string("b")]);
    let entries = entries_of(clone_value(&value));
    assert_eq!(entries[1].key, "1");
    assert_eq!(entries[1].value, json!("b"));
}
