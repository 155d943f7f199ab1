//! Tests for the JSON serializer

use std::collections::HashSet;

use viewgate::db::ResultSet;
use viewgate::serialize::Serializer;

async fn json(strings: &[&str], rows: &ResultSet) -> String {
    let strings: HashSet<String> = strings.iter().map(|s| s.to_string()).collect();
    let mut out: Vec<u8> = Vec::new();
    Serializer::Json(&strings)
        .serialize(rows, &mut out)
        .await
        .unwrap();
    String::from_utf8(out).unwrap()
}

fn one_column(name: &str, value: Option<&str>) -> ResultSet {
    let mut rows = ResultSet::new(vec![name.to_string()]);
    rows.push_row(vec![value.map(|v| v.to_string())]);
    rows
}

#[tokio::test]
async fn test_zero_rows_is_an_empty_array_never_a_bare_object() {
    let rows = ResultSet::new(vec!["name".to_string()]);
    let out = json(&[], &rows).await;
    assert_eq!(out, "[]\n");
}

#[tokio::test]
async fn test_single_row_is_a_bare_object() {
    let mut rows = ResultSet::new(vec!["name".to_string(), "age".to_string()]);
    rows.push_row(vec![Some("Ada".to_string()), Some("37".to_string())]);

    let out = json(&["name"], &rows).await;
    assert_eq!(out, "{\n\t\"name\": \"Ada\",\n\t\"age\": 37\n}\n");
}

#[tokio::test]
async fn test_multiple_rows_are_wrapped_in_an_array() {
    let mut rows = ResultSet::new(vec!["name".to_string()]);
    rows.push_row(vec![Some("Ada".to_string())]);
    rows.push_row(vec![Some("Grace".to_string())]);

    let out = json(&["name"], &rows).await;
    assert_eq!(out, "[\n{\n\t\"name\": \"Ada\"\n}, {\n\t\"name\": \"Grace\"\n}\n]\n");
}

#[tokio::test]
async fn test_null_and_empty_both_sniff_to_null() {
    assert_eq!(json(&[], &one_column("v", None)).await, "{\n\t\"v\": null\n}\n");
    assert_eq!(
        json(&[], &one_column("v", Some(""))).await,
        "{\n\t\"v\": null\n}\n"
    );
}

#[tokio::test]
async fn test_boolean_sniffing_goes_by_first_letter() {
    for truthy in ["t", "true", "T", "yes", "Y"] {
        assert_eq!(
            json(&[], &one_column("v", Some(truthy))).await,
            "{\n\t\"v\": true\n}\n",
            "value '{truthy}'"
        );
    }
    for falsy in ["f", "false", "F", "no", "N"] {
        assert_eq!(
            json(&[], &one_column("v", Some(falsy))).await,
            "{\n\t\"v\": false\n}\n",
            "value '{falsy}'"
        );
    }
}

#[tokio::test]
async fn test_numbers_are_emitted_unquoted_as_is() {
    for number in ["37", "-12", "3.25", "007", "1e5"] {
        assert_eq!(
            json(&[], &one_column("v", Some(number))).await,
            format!("{{\n\t\"v\": {number}\n}}\n"),
            "value '{number}'"
        );
    }
}

#[tokio::test]
async fn test_non_numbers_are_quoted() {
    // Every value lands in exactly one class; nothing can fall through
    // half-classified. `inf` parses as f64 but is not a JSON number.
    for text in ["37a", "a37", "inf", "-inf", "0x10", "1.2.3", "e5"] {
        assert_eq!(
            json(&[], &one_column("v", Some(text))).await,
            format!("{{\n\t\"v\": \"{text}\"\n}}\n"),
            "value '{text}'"
        );
    }
}

#[tokio::test]
async fn test_string_hint_forces_string_output() {
    // The inherent collision: a literal "t" meant as text serializes as a
    // boolean unless the column is hinted.
    assert_eq!(
        json(&[], &one_column("flag", Some("t"))).await,
        "{\n\t\"flag\": true\n}\n"
    );
    assert_eq!(
        json(&["flag"], &one_column("flag", Some("t"))).await,
        "{\n\t\"flag\": \"t\"\n}\n"
    );

    // Hinted numerics stay strings too.
    assert_eq!(
        json(&["zip"], &one_column("zip", Some("02139"))).await,
        "{\n\t\"zip\": \"02139\"\n}\n"
    );
}

#[tokio::test]
async fn test_hinted_null_is_an_empty_string() {
    assert_eq!(
        json(&["name"], &one_column("name", None)).await,
        "{\n\t\"name\": \"\"\n}\n"
    );
}

#[tokio::test]
async fn test_keys_follow_database_column_order() {
    let mut rows = ResultSet::new(vec!["b".to_string(), "a".to_string()]);
    rows.push_row(vec![Some("1".to_string()), Some("2".to_string())]);

    let out = json(&[], &rows).await;
    assert_eq!(out, "{\n\t\"b\": 1,\n\t\"a\": 2\n}\n");
}

#[tokio::test]
async fn test_string_escaping_round_trips_every_char() {
    // All of 0x00..=0xFF as chars, through escape and back via a JSON parser.
    let original: String = (0u32..=0xff).map(|c| char::from_u32(c).unwrap()).collect();

    let out = json(&["s"], &one_column("s", Some(&original))).await;
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["s"].as_str().unwrap(), original);
}

#[tokio::test]
async fn test_multi_row_output_parses_as_json() {
    let mut rows = ResultSet::new(vec!["name".to_string(), "age".to_string()]);
    rows.push_row(vec![Some("Ada".to_string()), Some("37".to_string())]);
    rows.push_row(vec![None, Some("45".to_string())]);
    rows.push_row(vec![Some("say \"hi\"".to_string()), None]);

    let out = json(&["name"], &rows).await;
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();

    let list = parsed.as_array().unwrap();
    assert_eq!(list.len(), 3);
    assert_eq!(list[0]["name"], "Ada");
    assert_eq!(list[0]["age"], 37);
    assert_eq!(list[1]["name"], "");
    assert_eq!(list[2]["name"], "say \"hi\"");
    assert!(list[2]["age"].is_null());
}
