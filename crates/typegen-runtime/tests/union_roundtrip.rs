use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use typegen_runtime::{capture_additional_properties, json_merge, Either, RawUnion};

// Hand-written stand-ins for the structs a generation run would emit for
// an anyOf of three object branches with additionalProperties.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Email {
    email: String,
    subject: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Sms {
    phone: String,
}

#[test]
fn matched_variant_plus_extras_round_trips_without_key_loss() {
    let input = json!({"email": "x@y.com", "subject": "Hi", "tracking": "abc"});

    // Decode path: capture raw, pick the matching variant, then collect
    // the keys the variant did not consume.
    let union: RawUnion = serde_json::from_value(input.clone()).unwrap();
    let email: Email = union.as_variant().unwrap();
    assert_eq!(email.email, "x@y.com");

    let Value::Object(object) = union.raw().unwrap() else {
        panic!("expected object payload");
    };
    let extras: IndexMap<String, String> =
        capture_additional_properties(object, &["email", "subject"]).unwrap();
    assert_eq!(extras.len(), 1);
    assert_eq!(extras["tracking"], "abc");

    // Encode path: variant first, extras folded on top.
    let mut encoded = serde_json::to_value(&email).unwrap();
    json_merge(
        &mut encoded,
        serde_json::to_value(&extras).unwrap(),
    );
    assert_eq!(encoded, input);
}

#[test]
fn non_matching_variant_is_rejected_lazily() {
    let union: RawUnion =
        serde_json::from_value(json!({"email": "x@y.com", "subject": "Hi"})).unwrap();
    let sms: Result<Sms, _> = union.as_variant();
    assert!(sms.is_err());
}

#[test]
fn either_decodes_the_second_branch_when_the_first_fails() {
    let value: Either<Email, Sms> =
        serde_json::from_value(json!({"phone": "+1555"})).unwrap();
    match &value {
        Either::B(sms) => assert_eq!(sms.phone, "+1555"),
        Either::A(_) => panic!("expected the Sms branch"),
    }

    let encoded = serde_json::to_value(&value).unwrap();
    assert_eq!(encoded, json!({"phone": "+1555"}));
}
