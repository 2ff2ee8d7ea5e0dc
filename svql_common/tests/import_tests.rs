use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use quickcheck::quickcheck;
use rstest::rstest;
use svql_common::design::{Module, SigBit, SigMap, State};
use svql_common::{
    import_design, CompatPair, Config, ConfigError, ImportError, ImportOptions, RegexMap, RegexMapError,
};

const MUX_JSON: &str = r#"{
  "modules": {
    "mux": {
      "attributes": { "extract_order": "00000000000000000000000000000011" },
      "ports": {
        "a": { "direction": "input", "bits": [2] },
        "b": { "direction": "input", "bits": [3] },
        "s": { "direction": "input", "bits": [4] },
        "y": { "direction": "output", "bits": [5] }
      },
      "cells": {
        "$mux$mux.v:4$1": {
          "type": "$_MUX_",
          "parameters": {},
          "attributes": { "src": "mux.v:4.12-4.25" },
          "port_directions": { "A": "input", "B": "input", "S": "input", "Y": "output" },
          "connections": { "A": [2], "B": ["0"], "S": [4], "Y": [5] }
        }
      },
      "netnames": {
        "b": { "hide_name": 0, "bits": [3], "attributes": { "keep": "00000000000000000000000000000001" } }
      }
    }
  }
}"#;

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    File::create(&path)
        .unwrap()
        .write_all(contents.as_bytes())
        .unwrap();
    path
}

#[test]
fn json_designs_skip_yosys() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "mux.json", MUX_JSON);

    let design = import_design(&path, &ImportOptions::new()).unwrap();
    assert_eq!(design.len(), 1);
    let module = design.module("\\mux").expect("escaped lookup");
    assert_eq!(module.attribute("extract_order").map(|c| c.as_int()), Some(3));

    let cell = module.cell("$mux$mux.v:4$1").unwrap();
    assert_eq!(cell.ty, "$_MUX_");
    assert_eq!(cell.port("B"), Some(&vec![SigBit::Const(State::S0)]));
    assert!(cell.is_output("Y"));

    let b = module.wire("b").unwrap();
    assert!(b.port_input);
    assert!(b.attributes.contains_key("keep"));
}

#[rstest]
#[case("design.vhd")]
#[case("design")]
fn unknown_extensions_are_rejected(#[case] name: &str) {
    assert!(matches!(
        import_design(Path::new(name), &ImportOptions::new()),
        Err(ImportError::UnsupportedExtension(_))
    ));
}

#[test]
fn missing_json_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        import_design(&dir.path().join("absent.json"), &ImportOptions::new()),
        Err(ImportError::Io { .. })
    ));
}

#[test]
fn config_file_fills_defaults_and_unescapes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "svql.json",
        r#"{
          "pat_module_name": "\\and_gate",
          "compat_pairs": [ { "needle": "\\$and", "haystack": "$_AND_" } ],
          "cell_attr": [ "\\keep" ],
          "max_fanout": 4
        }"#,
    );

    let cfg = Config::from_json_file(&path).unwrap();
    assert_eq!(cfg.pat_module_name, "and_gate");
    assert_eq!(cfg.compat_pairs, vec![CompatPair::new("$and", "$_AND_")]);
    assert_eq!(cfg.cell_attr, ["keep"]);
    assert_eq!(cfg.max_fanout, Some(4));
    assert!(!cfg.const_ports);
    assert!(cfg.swap_ports.is_empty());
}

#[rstest]
#[case("{ not json")]
#[case("")]
#[case(r#"{ "max_fanout": "many" }"#)]
fn malformed_config_is_reported(#[case] contents: &str) {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "svql.json", contents);
    assert!(matches!(
        Config::from_json_file(&path),
        Err(ConfigError::Json { .. })
    ));
}

#[test]
fn regex_map_file_errors() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        RegexMap::from_json_file(dir.path().join("absent.json")),
        Err(RegexMapError::Io { .. })
    ));

    let bad = write_file(dir.path(), "bad.json", r#"{ "m": { "y": "(" } }"#);
    match RegexMap::from_json_file(&bad) {
        Err(RegexMapError::Pattern { module, signal, .. }) => {
            assert_eq!(module, "m");
            assert_eq!(signal, "y");
        },
        other => panic!("unexpected result: {other:?}"),
    }

    let good = write_file(dir.path(), "good.json", r#"{ "\\m": { "\\y": "^sum" } }"#);
    let map = RegexMap::from_json_file(&good).unwrap();
    assert!(map.get("m", "y").unwrap().is_match("carry_sum"));
    assert!(!map.get("\\m", "\\y").unwrap().is_match("carry"));
}

fn aliased_module(width: usize, pairs: &[(u8, u8)]) -> (Module, Vec<SigBit>) {
    let mut m = Module::new("alias");
    let w = m.add_wire("w", width);
    let bits: Vec<SigBit> = (0..width).map(|i| SigBit::wire(w, i)).collect();
    for (a, b) in pairs {
        let a = bits[*a as usize % width];
        let b = bits[*b as usize % width];
        m.connect(vec![a], vec![b]);
    }
    (m, bits)
}

quickcheck! {
    fn aliased_bits_share_a_representative(pairs: Vec<(u8, u8)>) -> bool {
        let (module, _) = aliased_module(16, &pairs);
        let sigmap = SigMap::new(&module);
        module.connections.iter().all(|(lhs, rhs)| {
            sigmap.resolve(lhs[0]) == sigmap.resolve(rhs[0])
        })
    }

    fn resolution_is_idempotent(pairs: Vec<(u8, u8)>) -> bool {
        let (module, bits) = aliased_module(16, &pairs);
        let sigmap = SigMap::new(&module);
        bits.iter().all(|b| {
            let rep = sigmap.resolve(*b);
            sigmap.resolve(rep) == rep
        })
    }
}
