use std::fs::File;
use std::io::{BufReader, Write};
use std::sync::OnceLock;

use rstest::rstest;
use svql_common::design::Design;
use svql_common::{import_json, Config, StringPair};
use svql_driver::{run_query, QueryError};

fn init_test_logger() {
    static INIT: OnceLock<()> = OnceLock::new();
    let _ = INIT.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn fixture(name: &str) -> Design {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    let file = File::open(&path).unwrap_or_else(|e| panic!("cannot open {path}: {e}"));
    import_json(BufReader::new(file)).expect("fixture parses")
}

lazy_static::lazy_static! {
    static ref AND_GATE: Design = fixture("and_gate.json");
    static ref NOT_AND: Design = fixture("not_and.json");
    static ref SWAPPED: Design = fixture("swapped.json");
    static ref ADDER: Design = fixture("adder.json");
}

fn config(module: &str) -> Config {
    Config {
        pat_filename: format!("{module}.json"),
        pat_module_name: module.to_string(),
        ..Config::default()
    }
}

#[test]
fn and_gate_in_itself() {
    init_test_logger();
    let matches = run_query(&AND_GATE, &AND_GATE, &config("and_gate")).unwrap();
    assert_eq!(matches.len(), 1);

    let m = &matches.matches[0];
    assert_eq!(m.haystack_module, "and_gate");
    assert_eq!(
        m.port_map,
        vec![
            StringPair::new("A", "A"),
            StringPair::new("B", "B"),
            StringPair::new("Y", "Y"),
        ]
    );
    assert_eq!(m.cell_map.len(), 1);
    assert_eq!(m.cell_map[0].needle, m.cell_map[0].haystack);
    assert_eq!(m.cell_map[0].haystack.cell_index, 0);
    assert_eq!(m.sources[0].ranges[0].line_begin, 6);
}

#[rstest]
#[case(false, false, 1)]
#[case(false, true, 1)]
#[case(true, false, 0)]
#[case(true, true, 0)]
fn swapped_operands(#[case] nodefaultswaps: bool, #[case] const_ports: bool, #[case] expected: usize) {
    init_test_logger();
    let cfg = Config {
        nodefaultswaps,
        const_ports,
        ..config("not_and")
    };
    let matches = run_query(&NOT_AND, &SWAPPED, &cfg).unwrap();
    assert_eq!(matches.len(), expected);
    // the module with unprocessed processes is never searched
    assert!(matches.matches.iter().all(|m| m.haystack_module == "top"));
}

#[test]
fn swapped_operands_report_boundary_ports_only() {
    let matches = run_query(&NOT_AND, &SWAPPED, &config("not_and")).unwrap();
    let m = &matches.matches[0];
    assert_eq!(
        m.port_map,
        vec![
            StringPair::new("B", "b"),
            StringPair::new("A", "a"),
            StringPair::new("Y", "y"),
        ]
    );
    let names: Vec<&str> = m.cell_map.iter().map(|c| c.haystack.cell_name.as_str()).collect();
    assert_eq!(names, ["$not$top.v:6$1", "$and$top.v:6$2"]);
}

#[test]
fn constant_ports_do_not_change_literal_free_matches() {
    let off = run_query(&NOT_AND, &SWAPPED, &config("not_and")).unwrap();
    let on = run_query(
        &NOT_AND,
        &SWAPPED,
        &Config {
            const_ports: true,
            ..config("not_and")
        },
    )
    .unwrap();
    assert_eq!(off, on);
}

#[rstest]
#[case(None, &[], 3)]
#[case(Some(r#"{ "mod": { "Y": "^sum_.*" } }"#), &[], 1)]
#[case(Some(r#"{ "\\mod": { "\\Y": "^carry_" } }"#), &[], 1)]
#[case(None, &["keep"], 2)]
fn adder_filters(#[case] regex: Option<&str>, #[case] cell_attr: &[&str], #[case] expected: usize) {
    init_test_logger();
    let dir = tempfile::tempdir().unwrap();
    let regex_map = regex.map(|json| {
        let path = dir.path().join("regex.json");
        File::create(&path).unwrap().write_all(json.as_bytes()).unwrap();
        path
    });
    let cfg = Config {
        regex_map,
        cell_attr: cell_attr.iter().map(|s| s.to_string()).collect(),
        ..config("mod")
    };
    let matches = run_query(&ADDER, &ADDER, &cfg).unwrap();
    assert_eq!(matches.len(), expected);
}

#[test]
fn regex_selects_the_named_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("regex.json");
    File::create(&path)
        .unwrap()
        .write_all(br#"{ "mod": { "Y": "^sum_.*" } }"#)
        .unwrap();
    let cfg = Config {
        regex_map: Some(path),
        ..config("mod")
    };
    let matches = run_query(&ADDER, &ADDER, &cfg).unwrap();
    assert_eq!(matches.matches[0].haystack_module, "adder");
    assert!(matches.matches[0].port_map.contains(&StringPair::new("Y", "sum_42")));
}

#[test]
fn unreadable_regex_map_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = Config {
        regex_map: Some(dir.path().join("missing.json")),
        ..config("mod")
    };
    assert!(matches!(
        run_query(&ADDER, &ADDER, &cfg),
        Err(QueryError::RegexMap(_))
    ));
}

#[test]
fn match_list_serialises() {
    let matches = run_query(&AND_GATE, &AND_GATE, &config("and_gate")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&matches.to_json_string().unwrap()).unwrap();
    assert_eq!(json["matches"][0]["haystack_module"], "and_gate");
    assert_eq!(json["matches"][0]["port_map"][0]["needle"], "A");
}
