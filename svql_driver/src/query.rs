//! End-to-end query: build graphs, search every haystack module, fold the
//! solver results into match records.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use svql_common::design::{Design, Module, SigBit, SigMap, Selection};
use svql_common::id_string::{haystack_graph_id, needle_graph_id, strip_graph_prefix};
use svql_common::{
    CellData, CellPair, Config, MatchList, Pattern, QueryMatch, RegexMap, SourceLoc, StringPair,
};
use svql_subgraph::{
    module_to_graph, BuildOptions, CellComparator, CellRef, CompareOptions, Registry, SolveOptions, SolveResult,
    Solver,
};
use tracing::{debug, info};

use crate::error::QueryError;

/// Module attribute ordering needle modules in [`run_all_needles`].
pub const EXTRACT_ORDER_ATTR: &str = "extract_order";

/// Search the configured pattern module of `needle_design` in every module of
/// `haystack_design`.
pub fn run_query(needle_design: &Design, haystack_design: &Design, config: &Config) -> Result<MatchList, QueryError> {
    let config = config.clone().normalized();
    if config.pat_module_name.is_empty() {
        return Err(QueryError::MissingPattern);
    }
    let needle = needle_design
        .module(&config.pat_module_name)
        .ok_or_else(|| QueryError::ModuleNotFound(config.pat_module_name.clone()))?;
    search_needle(needle, haystack_design, &config)
}

/// Search every module of `needle_design`, ordered by the `extract_order`
/// attribute (default 0) and then by name. `pat_module_name` is ignored.
pub fn run_all_needles(
    needle_design: &Design,
    haystack_design: &Design,
    config: &Config,
) -> Result<IndexMap<String, MatchList>, QueryError> {
    let config = config.clone().normalized();
    let mut needles: Vec<&Module> = needle_design.modules().collect();
    needles.sort_by_key(|m| (extract_order(m), m.name.clone()));

    let mut out = IndexMap::new();
    for needle in needles {
        let matches = search_needle(needle, haystack_design, &config)?;
        info!("{}: {} match(es)", needle.name, matches.len());
        out.insert(needle.name.clone(), matches);
    }
    Ok(out)
}

fn extract_order(module: &Module) -> i32 {
    module.attribute(EXTRACT_ORDER_ATTR).map_or(0, |c| c.as_int())
}

/// Solver configured from `config`: default swaps unless disabled, then the
/// explicit compat, swap and permutation entries.
pub fn build_solver<'a>(config: &Config) -> Result<Solver<CellRef<'a>, CellComparator>, QueryError> {
    let regex_map = match &config.regex_map {
        Some(path) => RegexMap::from_json_file(path)?,
        None => RegexMap::new(),
    };

    let options = CompareOptions {
        ignore_parameters: config.ignore_parameters,
        ignored_params: config
            .ignore_param
            .iter()
            .map(|p| (p.type_name.clone(), p.param_name.clone()))
            .collect(),
        cell_attr: config.cell_attr.iter().cloned().collect(),
        wire_attr: config.wire_attr.iter().cloned().collect(),
        regex_map,
    };

    let mut registry = Registry::new();
    if !config.nodefaultswaps {
        registry.add_default_swaps();
    }
    for pair in &config.compat_pairs {
        registry.add_compatible_types(&pair.needle, &pair.haystack);
    }
    for swap in &config.swap_ports {
        registry.add_swappable_ports(&swap.type_name, &swap.ports);
    }
    for perm in &config.perm_ports {
        registry.add_swappable_ports_permutation(&perm.type_name, perm.left.as_slice(), perm.right.as_slice())?;
    }

    Ok(Solver::with_registry(CellComparator::new(options), registry))
}

fn search_needle(needle: &Module, haystack_design: &Design, config: &Config) -> Result<MatchList, QueryError> {
    let mut solver = build_solver(config)?;

    let needle_options = BuildOptions::default()
        .with_const_ports(config.const_ports)
        .with_max_fanout(config.max_fanout);
    let needle_graph = module_to_graph(needle, &needle_options).map_err(|reason| QueryError::NeedleConversion {
        module: needle.name.clone(),
        reason,
    })?;
    let needle_id = needle_graph_id(&needle.name);
    solver.add_graph(&needle_id, needle_graph)?;

    let selection = Selection::whole_design();
    let haystack_options = BuildOptions::default()
        .with_const_ports(config.const_ports)
        .with_selection(&selection);

    let mut haystack_ids = Vec::new();
    for module in haystack_design.modules() {
        match module_to_graph(module, &haystack_options) {
            Ok(graph) => {
                let id = haystack_graph_id(&module.name);
                solver.add_graph(&id, graph)?;
                haystack_ids.push(id);
            },
            Err(reason) => debug!("haystack module {} skipped: {}", module.name, reason),
        }
    }

    info!(
        "searching for {} in {} haystack module(s)",
        needle.name,
        haystack_ids.len()
    );
    let results = solver.solve_all(&needle_id, &haystack_ids, &SolveOptions::default())?;

    let ports = NeedlePorts::new(&Pattern::from_module(&config.pat_filename, needle), needle);
    Ok(MatchList {
        matches: results.iter().map(|r| to_query_match(&ports, r)).collect(),
    })
}

/// Canonical bits of the needle's boundary ports.
struct NeedlePorts {
    sigmap: SigMap,
    names: HashMap<SigBit, String>,
}

impl NeedlePorts {
    fn new(pattern: &Pattern, needle: &Module) -> Self {
        let sigmap = SigMap::new(needle);
        let mut names = HashMap::new();
        for wire in needle.port_wires().filter(|w| pattern.is_port(&w.name)) {
            for bit in wire.sig() {
                names.entry(sigmap.resolve(bit)).or_insert_with(|| wire.name.clone());
            }
        }
        Self { sigmap, names }
    }

    fn port_of(&self, bit: SigBit) -> Option<&str> {
        self.names.get(&self.sigmap.resolve(bit)).map(String::as_str)
    }
}

fn to_query_match(ports: &NeedlePorts, result: &SolveResult<CellRef<'_>>) -> QueryMatch {
    let mut port_map: Vec<StringPair> = Vec::new();
    let mut seen_ports: HashSet<(String, String)> = HashSet::new();
    let mut cell_map = Vec::new();
    let mut sources = Vec::new();

    for mapping in result.mappings.values() {
        // constant driver nodes carry no cell
        let (Some(n), Some(h)) = (mapping.needle_user_data, mapping.haystack_user_data) else {
            continue;
        };
        let (n_cell, h_cell) = (n.cell(), h.cell());
        cell_map.push(CellPair {
            needle: CellData::new(&n_cell.name, n.index),
            haystack: CellData::new(&h_cell.name, h.index),
        });
        sources.push(
            h_cell
                .src_attribute()
                .and_then(|src| SourceLoc::parse(&src))
                .unwrap_or_default(),
        );

        let mut connections: Vec<_> = n_cell.connections.iter().collect();
        connections.sort_by(|a, b| a.0.cmp(b.0));
        for (port, n_sig) in connections {
            let Some(h_sig) = mapping.port_mapping.get(port).and_then(|p| h_cell.port(p)) else {
                continue;
            };
            for (n_bit, h_bit) in n_sig.iter().zip(h_sig) {
                let Some(n_name) = ports.port_of(*n_bit) else {
                    continue;
                };
                let h_name = match h.module.wire_of(h_bit) {
                    Some(wire) => wire.name.clone(),
                    None => h_bit.as_const().map(|s| s.to_string()).unwrap_or_default(),
                };
                if seen_ports.insert((n_name.to_string(), h_name.clone())) {
                    port_map.push(StringPair::new(n_name, h_name));
                }
            }
        }
    }

    if sources.iter().all(SourceLoc::is_empty) {
        sources.clear();
    }

    QueryMatch {
        haystack_module: strip_graph_prefix(&result.haystack_graph_id).to_string(),
        port_map,
        cell_map,
        sources,
    }
}

#[cfg(test)]
mod tests {
    use svql_common::design::{Const, State};
    use svql_common::{PermPort, SwapPort};

    use super::*;

    fn and_gate(name: &str) -> Module {
        let mut m = Module::new(name);
        let a = SigBit::wire(m.add_input("A", 1), 0);
        let b = SigBit::wire(m.add_input("B", 1), 0);
        let y = SigBit::wire(m.add_output("Y", 1), 0);
        m.add_cell("g", "$_AND_")
            .set_port("A", vec![a])
            .set_port("B", vec![b])
            .set_port("Y", vec![y]);
        m
    }

    fn config(module: &str) -> Config {
        Config {
            pat_module_name: module.to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn missing_and_unknown_pattern() {
        let design: Design = [and_gate("and_gate")].into_iter().collect();
        assert!(matches!(
            run_query(&design, &design, &Config::default()),
            Err(QueryError::MissingPattern)
        ));
        assert!(matches!(
            run_query(&design, &design, &config("nope")),
            Err(QueryError::ModuleNotFound(name)) if name == "nope"
        ));
    }

    #[test]
    fn escaped_pattern_name_resolves() {
        let design: Design = [and_gate("and_gate")].into_iter().collect();
        let matches = run_query(&design, &design, &config("\\and_gate")).unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn bad_permutation_aborts() {
        let design: Design = [and_gate("and_gate")].into_iter().collect();
        let mut cfg = config("and_gate");
        cfg.perm_ports.push(PermPort::new("$_AND_", ["A", "B"], ["A", "C"]));
        assert!(matches!(
            run_query(&design, &design, &cfg),
            Err(QueryError::InvalidPermutation { type_name, .. }) if type_name == "$_AND_"
        ));
    }

    #[test]
    fn process_needle_is_a_conversion_error() {
        let mut needle = and_gate("and_gate");
        needle.add_process("$proc$and.v:1$1");
        let needle: Design = [needle].into_iter().collect();
        let haystack: Design = [and_gate("top")].into_iter().collect();
        assert!(matches!(
            run_query(&needle, &haystack, &config("and_gate")),
            Err(QueryError::NeedleConversion { .. })
        ));
    }

    #[test]
    fn needles_follow_extract_order() {
        let mut late = and_gate("a_late");
        late.attributes.insert(EXTRACT_ORDER_ATTR.to_string(), Const::from_int(2));
        let early = and_gate("z_early");
        let mut tie = and_gate("m_tie");
        tie.attributes.insert(EXTRACT_ORDER_ATTR.to_string(), Const::from_int(0));
        let needles: Design = [late, early, tie].into_iter().collect();
        let haystack: Design = [and_gate("top")].into_iter().collect();

        let all = run_all_needles(&needles, &haystack, &Config::default()).unwrap();
        let order: Vec<&str> = all.keys().map(String::as_str).collect();
        assert_eq!(order, ["m_tie", "z_early", "a_late"]);
        assert!(all.values().all(|m| m.len() == 1));
    }

    #[test]
    fn constant_haystack_bits_are_reported_by_value() {
        let needle: Design = [and_gate("and_gate")].into_iter().collect();
        let mut top = Module::new("top");
        let a = SigBit::wire(top.add_input("x", 1), 0);
        let y = SigBit::wire(top.add_output("z", 1), 0);
        top.add_cell("u", "$_AND_")
            .set_port("A", vec![a])
            .set_port("B", vec![SigBit::Const(State::S1)])
            .set_port("Y", vec![y]);
        let haystack: Design = [top].into_iter().collect();

        let mut cfg = config("and_gate");
        cfg.swap_ports.push(SwapPort::new("$_AND_", ["A", "B"]));
        let matches = run_query(&needle, &haystack, &cfg).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(
            matches.matches[0].port_map,
            vec![
                StringPair::new("A", "x"),
                StringPair::new("B", "1"),
                StringPair::new("Y", "z"),
            ]
        );
    }
}
