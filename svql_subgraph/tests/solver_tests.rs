mod common;

use rstest::rstest;
use svql_common::design::{Const, Module, SigBit, State, WireId};
use svql_common::RegexMap;
use svql_subgraph::{
    module_to_graph, BuildOptions, CellComparator, CellRef, CompareOptions, Graph, SolveOptions, SolveResult,
    Solver,
};

use common::*;

lazy_static::lazy_static! {
    static ref AND_GATE: Module = and_gate();
    static ref AND_OR: Module = and_or();
    static ref AND_TREE: Module = and_tree();
    static ref AND_OR_PAIR: Module = and_or_pair();
}

fn search<'a>(
    needle: &'a Module,
    haystack: &'a Module,
    default_swaps: bool,
    const_ports: bool,
    options: CompareOptions,
) -> (Solver<CellRef<'a>, CellComparator>, Vec<SolveResult<CellRef<'a>>>) {
    init_test_logger();
    let mut solver = Solver::new(CellComparator::new(options));
    if default_swaps {
        solver.registry_mut().add_default_swaps();
    }
    let build = BuildOptions::default().with_const_ports(const_ports);
    solver
        .add_graph("needle", module_to_graph(needle, &build).unwrap())
        .unwrap();
    solver
        .add_graph("haystack", module_to_graph(haystack, &build).unwrap())
        .unwrap();
    let results = solver
        .solve("needle", "haystack", &SolveOptions::default())
        .unwrap();
    (solver, results)
}

fn count(needle: &Module, haystack: &Module, default_swaps: bool) -> usize {
    search(needle, haystack, default_swaps, false, CompareOptions::default())
        .1
        .len()
}

#[rstest]
#[case(&AND_GATE, &AND_GATE, 1)]
#[case(&AND_GATE, &AND_TREE, 3)]
#[case(&AND_GATE, &AND_OR_PAIR, 2)]
#[case(&AND_OR, &AND_OR, 1)]
#[case(&AND_OR, &AND_TREE, 0)]
#[case(&AND_OR, &AND_OR_PAIR, 1)]
#[case(&AND_TREE, &AND_GATE, 0)]
fn match_counts(#[case] needle: &Module, #[case] haystack: &Module, #[case] expected: usize) {
    assert_eq!(count(needle, haystack, true), expected);
}

#[rstest]
#[case(true, 2)]
#[case(false, 1)]
fn tree_automorphisms_need_swaps(#[case] default_swaps: bool, #[case] expected: usize) {
    assert_eq!(count(&AND_TREE, &AND_TREE, default_swaps), expected);
}

fn ties() -> Module {
    let mut m = Module::new("ties");
    let y = ["y0", "y1", "y2"].map(|n| output(&mut m, n));
    let a = ["a0", "a1", "a2"].map(|n| input(&mut m, n));
    gate2(&mut m, "b_one", "$_AND_", a[0], SigBit::Const(State::S1), y[0]);
    gate2(&mut m, "a_one", "$_AND_", SigBit::Const(State::S1), a[1], y[1]);
    gate2(&mut m, "b_zero", "$_AND_", a[2], SigBit::Const(State::S0), y[2]);
    m
}

#[rstest]
#[case(true, false, 2)]
#[case(true, true, 2)]
#[case(false, false, 1)]
#[case(false, true, 1)]
fn constants_match_in_both_modes(#[case] default_swaps: bool, #[case] const_ports: bool, #[case] expected: usize) {
    let needle = tied_and("tied", "B", State::S1);
    let haystack = ties();
    let (_, results) = search(&needle, &haystack, default_swaps, const_ports, CompareOptions::default());
    assert_eq!(results.len(), expected);
    assert!(results.iter().all(|r| r.mappings["g"].haystack_node != "b_zero"));
}

/// Every needle connection must be present between the mapped haystack pins.
fn assert_sound(needle: &Graph<CellRef<'_>>, haystack: &Graph<CellRef<'_>>, result: &SolveResult<CellRef<'_>>) {
    for conn in needle.connections() {
        let map = |pin: svql_subgraph::PinBit| {
            let n_node = needle.node(pin.node);
            let mapping = &result.mappings[&n_node.name];
            let port = &n_node.ports()[pin.port].name;
            haystack
                .pin(&mapping.haystack_node, &mapping.port_mapping[port], pin.bit)
                .unwrap()
        };
        assert!(haystack.connected(map(conn.from), map(conn.to)));
    }
}

#[test]
fn results_preserve_connectivity() {
    let (solver, results) = search(&AND_OR, &AND_OR_PAIR, true, true, CompareOptions::default());
    assert_eq!(results.len(), 1);
    let needle = solver.graph("needle").unwrap();
    let haystack = solver.graph("haystack").unwrap();
    for r in &results {
        assert_sound(needle, haystack, r);
        let hs: Vec<&str> = r.mappings.values().map(|m| m.haystack_node.as_str()).collect();
        let mut unique = hs.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(hs.len(), unique.len());
    }
    assert_eq!(results[0].mappings["and"].haystack_node, "and0");
}

#[test]
fn mapped_user_data_points_at_cells() {
    let (_, results) = search(&AND_GATE, &AND_TREE, true, false, CompareOptions::default());
    let cells: Vec<&str> = results
        .iter()
        .filter_map(|r| r.mappings["g"].haystack_user_data)
        .map(|c| c.cell().name.as_str())
        .collect();
    assert_eq!(cells, ["g0", "g1", "g2"]);
}

/// An AND driving `w`, read by `sinks` inverters onto output ports, plus an
/// optional buffer tap on `w`.
fn fanout_module(name: &str, sinks: usize, tap: bool) -> Module {
    let mut m = Module::new(name);
    let a = input(&mut m, "a");
    let b = input(&mut m, "b");
    let w = bit(&mut m, "w");
    gate2(&mut m, "g", "$_AND_", a, b, w);
    for i in 0..sinks {
        let y = output(&mut m, &format!("y{i}"));
        not(&mut m, &format!("n{i}"), w, y);
    }
    if tap {
        let t = output(&mut m, "t");
        m.add_cell("tap", "$_BUF_")
            .set_port("A", vec![w])
            .set_port("Y", vec![t]);
    }
    m
}

#[rstest]
#[case(None, 5)]
#[case(Some(0), 5)]
#[case(Some(5), 5)]
#[case(Some(4), 0)]
#[case(Some(3), 0)]
fn fanout_cap_drops_edges(#[case] max_fanout: Option<usize>, #[case] expected: usize) {
    let m = fanout_module("fan", 5, false);
    let graph = module_to_graph(&m, &BuildOptions::default().with_max_fanout(max_fanout)).unwrap();
    assert_eq!(graph.connections().len(), expected);
    if let Some(cap) = max_fanout.filter(|&c| c > 0) {
        assert!(graph.connections().len() <= cap);
    }
}

#[rstest]
#[case(None, 0)]
#[case(Some(3), 120)]
fn capped_needle_ignores_haystack_fanout(#[case] max_fanout: Option<usize>, #[case] expected: usize) {
    init_test_logger();
    let needle = fanout_module("pat", 5, false);
    let haystack = fanout_module("top", 5, true);

    let mut solver = Solver::new(CellComparator::default());
    solver.registry_mut().add_default_swaps();
    let needle_build = BuildOptions::default().with_max_fanout(max_fanout);
    solver
        .add_graph("needle", module_to_graph(&needle, &needle_build).unwrap())
        .unwrap();
    solver
        .add_graph("haystack", module_to_graph(&haystack, &BuildOptions::default()).unwrap())
        .unwrap();

    // the haystack `w` has one more reader than the needle's
    let results = solver
        .solve("needle", "haystack", &SolveOptions::default())
        .unwrap();
    assert_eq!(results.len(), expected);
    assert!(results.iter().all(|r| r.mappings["g"].haystack_node == "g"));
    assert!(
        results
            .iter()
            .all(|r| r.mappings.values().all(|m| m.haystack_node != "tap"))
    );
}

#[test]
fn regex_constrains_output_names() {
    let mut needle = Module::new("pat");
    let a = input(&mut needle, "a");
    let b = input(&mut needle, "b");
    let q = output(&mut needle, "q");
    gate2(&mut needle, "g", "$_AND_", a, b, q);

    let mut haystack = Module::new("top");
    for (cell, out) in [("u0", "state_a"), ("u1", "other_b")] {
        let a = bit(&mut haystack, &format!("{cell}_a"));
        let b = bit(&mut haystack, &format!("{cell}_b"));
        let y = bit(&mut haystack, out);
        gate2(&mut haystack, cell, "$_AND_", a, b, y);
    }

    let mut regex_map = RegexMap::new();
    regex_map.insert("pat", "q", "^state_").unwrap();
    let options = CompareOptions {
        regex_map,
        ..CompareOptions::default()
    };
    let (_, results) = search(&needle, &haystack, true, false, options);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].mappings["g"].haystack_node, "u0");
}

fn word_and(name: &str, a_width: Const) -> Module {
    let mut m = Module::new(name);
    let a = input(&mut m, "a");
    let b = input(&mut m, "b");
    let y = output(&mut m, "y");
    m.add_cell("g", "$and")
        .set_port("A", vec![a])
        .set_port("B", vec![b])
        .set_port("Y", vec![y])
        .set_param("A_WIDTH", a_width);
    m
}

#[rstest]
#[case(Const::from_int(1), false, 1)]
#[case(Const::from_int(2), false, 0)]
#[case(Const::from_int(2), true, 1)]
fn parameters_compare_unified(#[case] haystack_width: Const, #[case] ignore: bool, #[case] expected: usize) {
    let needle = word_and("n", Const::from_bit_string("1").unwrap());
    let haystack = word_and("h", haystack_width);
    let options = CompareOptions {
        ignore_parameters: ignore,
        ..CompareOptions::default()
    };
    let (_, results) = search(&needle, &haystack, true, false, options);
    assert_eq!(results.len(), expected);
}

#[test]
fn cell_attributes_are_compared_when_listed() {
    let mut needle = and_gate();
    needle
        .cell_mut("g")
        .unwrap()
        .set_attr("keep", Const::from_bool(true));
    let haystack = and_tree();

    let (_, results) = search(&needle, &haystack, true, false, CompareOptions::default());
    assert_eq!(results.len(), 3);

    let options = CompareOptions {
        cell_attr: ["keep".to_string()].into(),
        ..CompareOptions::default()
    };
    let (_, results) = search(&needle, &haystack, true, false, options);
    assert!(results.is_empty());
}

fn sig(wire: WireId, width: usize) -> Vec<SigBit> {
    (0..width).map(|i| SigBit::wire(wire, i)).collect()
}

fn set_keep(m: &mut Module, wire: &str) {
    m.wire_mut(wire)
        .unwrap()
        .attributes
        .insert("keep".to_string(), Const::from_bool(true));
}

/// `y = a & b` on `width` bits with `keep` on `y`.
fn kept_and(width: usize) -> Module {
    let mut m = Module::new("kept");
    let a = m.add_input("a", width);
    let b = m.add_input("b", width);
    let y = m.add_output("y", width);
    set_keep(&mut m, "y");
    m.add_cell("g", "$and")
        .set_port("A", sig(a, width))
        .set_port("B", sig(b, width))
        .set_port("Y", sig(y, width));
    m
}

/// Two `$and` cells; only `u0`'s output wire carries `keep`.
fn kept_and_pair(width: usize) -> Module {
    let mut m = Module::new("top");
    for cell in ["u0", "u1"] {
        let a = m.add_wire(&format!("{cell}_a"), width);
        let b = m.add_wire(&format!("{cell}_b"), width);
        let y = m.add_wire(&format!("{cell}_y"), width);
        m.add_cell(cell, "$and")
            .set_port("A", sig(a, width))
            .set_port("B", sig(b, width))
            .set_port("Y", sig(y, width));
    }
    set_keep(&mut m, "u0_y");
    m
}

#[rstest]
#[case(1, false, &["u0", "u1"])]
#[case(1, true, &["u0"])]
#[case(4, false, &["u0", "u1"])]
#[case(4, true, &["u0"])]
fn wire_attributes_are_compared_when_listed(#[case] width: usize, #[case] listed: bool, #[case] expected: &[&str]) {
    let needle = kept_and(width);
    let haystack = kept_and_pair(width);
    let options = CompareOptions {
        wire_attr: if listed { ["keep".to_string()].into() } else { Default::default() },
        ..CompareOptions::default()
    };
    let (_, results) = search(&needle, &haystack, true, false, options);
    let cells: Vec<&str> = results
        .iter()
        .map(|r| r.mappings["g"].haystack_node.as_str())
        .collect();
    assert_eq!(cells, expected);
}

#[test]
fn every_wire_of_a_split_bus_is_compared() {
    let needle = kept_and(2);
    let mut haystack = Module::new("top");
    let a = haystack.add_wire("a", 2);
    let b = haystack.add_wire("b", 2);
    let lo = haystack.add_wire("lo", 1);
    let hi = haystack.add_wire("hi", 1);
    set_keep(&mut haystack, "lo");
    haystack
        .add_cell("u", "$and")
        .set_port("A", sig(a, 2))
        .set_port("B", sig(b, 2))
        .set_port("Y", vec![SigBit::wire(lo, 0), SigBit::wire(hi, 0)]);

    let (_, results) = search(&needle, &haystack, true, false, CompareOptions::default());
    assert_eq!(results.len(), 1);

    let options = CompareOptions {
        wire_attr: ["keep".to_string()].into(),
        ..CompareOptions::default()
    };
    let (_, results) = search(&needle, &haystack, true, false, options);
    assert!(results.is_empty());
}

#[test]
fn solve_all_concatenates_in_order() {
    init_test_logger();
    let build = BuildOptions::default();
    let mut solver = Solver::new(CellComparator::default());
    solver.registry_mut().add_default_swaps();
    solver
        .add_graph("needle", module_to_graph(&AND_GATE, &build).unwrap())
        .unwrap();
    solver
        .add_graph("tree", module_to_graph(&AND_TREE, &build).unwrap())
        .unwrap();
    solver
        .add_graph("pair", module_to_graph(&AND_OR_PAIR, &build).unwrap())
        .unwrap();
    let results = solver
        .solve_all("needle", &["pair", "tree"], &SolveOptions::default())
        .unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.haystack_graph_id.as_str()).collect();
    assert_eq!(ids, ["pair", "pair", "tree", "tree", "tree"]);
}

quickcheck::quickcheck! {
    fn unified_params_are_idempotent(value: i32, flag: bool) -> bool {
        [("$and", "A_WIDTH"), ("$and", "A_SIGNED"), ("$_AND_", "WIDTH"), ("$dff", "INIT")]
            .iter()
            .all(|(ty, param)| {
                let c = if flag { Const::from_int(value) } else { Const::from_bool(value != 0) };
                let once = svql_subgraph::unified_param(ty, param, &c);
                svql_subgraph::unified_param(ty, param, &once) == once
            })
    }
}
