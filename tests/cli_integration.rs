use std::io::Write;
use std::process::Command;

fn write_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::with_suffix(suffix).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

const QUERY: &str = r#"
collection: posts
filter:
  all:
    - { field: status, op: eq, value: active }
    - any:
        - { field: views, op: gt, value: 100 }
        - { field: author.name, op: like, value: "O'Brien" }
"#;

const SCHEMA: &str = r#"
collections:
  posts:
    fields:
      - { name: status, type: select }
      - { name: views, type: number }
      - { name: author, type: relation, collection: users }
  users:
    fields:
      - { name: name, type: text }
"#;

#[test]
fn builds_rendered_filter() {
    let query = write_file(".yaml", QUERY);

    let output = Command::new(env!("CARGO_BIN_EXE_pbfilter"))
        .arg("build")
        .arg("--query")
        .arg(query.path())
        .arg("--verbose")
        .output()
        .expect("failed to execute process");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        stdout.trim_end(),
        r"status='active' && (views>100 || author.name~'O\'Brien')"
    );
}

#[test]
fn builds_raw_json_with_schema() {
    let query = write_file(".yaml", QUERY);
    let schema = write_file(".yaml", SCHEMA);

    let output = Command::new(env!("CARGO_BIN_EXE_pbfilter"))
        .arg("build")
        .arg("--query")
        .arg(query.path())
        .arg("--schema")
        .arg(schema.path())
        .arg("--output")
        .arg("json")
        .arg("--raw")
        .output()
        .expect("failed to execute process");

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        json["raw"],
        "status={:status1} && (views>{:views1} || author.name~{:author.name1})"
    );
    assert_eq!(json["values"]["status1"], "active");
    assert_eq!(json["values"]["views1"], 100);
    assert_eq!(json["values"]["author.name1"], "O'Brien");
}

#[test]
fn rejects_unknown_field_with_schema() {
    let query = write_file(
        ".yaml",
        r#"
collection: posts
filter: { field: author.email, op: eq, value: x }
"#,
    );
    let schema = write_file(".yaml", SCHEMA);

    let output = Command::new(env!("CARGO_BIN_EXE_pbfilter"))
        .arg("build")
        .arg("--query")
        .arg(query.path())
        .arg("--schema")
        .arg(schema.path())
        .output()
        .expect("failed to execute process");

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("email"));
}

#[test]
fn accepts_json_query_files() {
    let query = write_file(
        ".json",
        r#"{"filter": {"any": [{"field": "tags", "op": "anyEqual", "value": "rust"}, {"field": "created", "op": "gte", "value": "@monthStart"}]}}"#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_pbfilter"))
        .arg("build")
        .arg("--query")
        .arg(query.path())
        .output()
        .expect("failed to execute process");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.trim_end(), "tags?='rust' || created>=@monthStart");
}

#[test]
fn renders_expression() {
    let output = Command::new(env!("CARGO_BIN_EXE_pbfilter"))
        .arg("render")
        .arg("--expr")
        .arg("a={:a1} && b!={:b1}")
        .arg("--values")
        .arg(r#"{"a1": 1.5, "b1": null}"#)
        .output()
        .expect("failed to execute process");

    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap().trim_end(), "a=1.5 && b!=null");
}

#[test]
fn render_fails_on_missing_value() {
    let status = Command::new(env!("CARGO_BIN_EXE_pbfilter"))
        .arg("render")
        .arg("--expr")
        .arg("a={:a1}")
        .status()
        .expect("failed to execute process");
    assert!(!status.success());

    let output = Command::new(env!("CARGO_BIN_EXE_pbfilter"))
        .arg("render")
        .arg("--expr")
        .arg("a={:a1}")
        .arg("--lossy")
        .output()
        .expect("failed to execute process");
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap().trim_end(), "a={:a1}");
}
