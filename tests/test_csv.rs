//! Tests for the CSV serializer

use viewgate::db::ResultSet;
use viewgate::serialize::{SerializeError, Serializer};

async fn csv(columns: &[&str], rows: &ResultSet) -> String {
    let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
    let mut out: Vec<u8> = Vec::new();
    Serializer::Csv(&columns)
        .serialize(rows, &mut out)
        .await
        .unwrap();
    String::from_utf8(out).unwrap()
}

fn users(rows: &[(&str, &str)]) -> ResultSet {
    let mut result = ResultSet::new(vec!["name".to_string(), "age".to_string()]);
    for (name, age) in rows {
        result.push_row(vec![Some(name.to_string()), Some(age.to_string())]);
    }
    result
}

#[tokio::test]
async fn test_zero_rows_is_header_only() {
    let out = csv(&["name", "age"], &users(&[])).await;
    assert_eq!(out, "name,age\r\n");
}

#[tokio::test]
async fn test_rows_are_crlf_terminated() {
    let out = csv(&["name", "age"], &users(&[("Ada", "37"), ("Grace", "45")])).await;
    assert_eq!(out, "name,age\r\nAda,37\r\nGrace,45\r\n");
}

#[tokio::test]
async fn test_projection_reorders_database_columns() {
    // The database reports (age, name); the view projects (name, age).
    let mut rows = ResultSet::new(vec!["age".to_string(), "name".to_string()]);
    rows.push_row(vec![Some("37".to_string()), Some("Ada".to_string())]);

    let out = csv(&["name", "age"], &rows).await;
    assert_eq!(out, "name,age\r\nAda,37\r\n");
}

#[tokio::test]
async fn test_null_is_an_empty_field() {
    let mut rows = ResultSet::new(vec!["name".to_string(), "age".to_string()]);
    rows.push_row(vec![None, Some("37".to_string())]);

    let out = csv(&["name", "age"], &rows).await;
    assert_eq!(out, "name,age\r\n,37\r\n");
}

#[tokio::test]
async fn test_specials_are_quoted_and_quotes_doubled() {
    let out = csv(
        &["name", "age"],
        &users(&[("Lovelace, Ada", "37"), ("say \"hi\"", "1"), ("two\nlines", "2")]),
    )
    .await;
    assert_eq!(
        out,
        "name,age\r\n\"Lovelace, Ada\",37\r\n\"say \"\"hi\"\"\",1\r\n\"two\nlines\",2\r\n"
    );
}

#[tokio::test]
async fn test_plain_values_are_byte_identical() {
    let values = ["Ada", "with space", "tabs\tallowed", "unicode-héllo"];
    for value in values {
        let out = csv(&["name"], &{
            let mut rows = ResultSet::new(vec!["name".to_string()]);
            rows.push_row(vec![Some(value.to_string())]);
            rows
        })
        .await;
        assert_eq!(out, format!("name\r\n{value}\r\n"));
    }
}

#[tokio::test]
async fn test_header_names_are_escaped_too() {
    let out = csv(&["a,b"], &ResultSet::new(vec!["a,b".to_string()])).await;
    assert_eq!(out, "\"a,b\"\r\n");
}

#[tokio::test]
async fn test_missing_projected_column_is_fatal() {
    let mut rows = ResultSet::new(vec!["name".to_string()]);
    rows.push_row(vec![Some("Ada".to_string())]);

    let columns = vec!["name".to_string(), "age".to_string()];
    let mut out: Vec<u8> = Vec::new();
    let err = Serializer::Csv(&columns)
        .serialize(&rows, &mut out)
        .await
        .unwrap_err();

    match err {
        SerializeError::MissingColumn(name) => assert_eq!(name, "age"),
        other => panic!("expected MissingColumn, got {other:?}"),
    }
}
