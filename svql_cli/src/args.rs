use std::path::PathBuf;

use clap::{ArgAction, Parser};
use svql_common::{CompatPair, Config, ConfigError, IgnoreParam, ImportOptions, PermPort, SwapPort};

/// SVQL subcircuit search - find every occurrence of a pattern module in a design
#[derive(Parser, Debug)]
#[command(name = "svql")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Design to search (Verilog, SystemVerilog, RTLIL or yosys JSON)
    #[arg(short = 'f', long)]
    pub design: PathBuf,

    /// Top module of the design; picked by yosys when omitted
    #[arg(long)]
    pub top: Option<String>,

    /// File containing the pattern module(s)
    #[arg(short = 'p', long)]
    pub pattern: PathBuf,

    /// Pattern module to search for
    #[arg(short = 'm', long, required_unless_present = "all_needles")]
    pub module: Option<String>,

    /// Search every module of the pattern file, ordered by `extract_order`
    #[arg(long, default_value_t = false)]
    pub all_needles: bool,

    /// Model constant bits as shared driver nodes
    #[arg(long, default_value_t = false)]
    pub constports: bool,

    /// Do not register the default commutative operand swaps
    #[arg(long, default_value_t = false)]
    pub nodefaultswaps: bool,

    /// Let needle cells of one type match haystack cells of another
    #[arg(long, num_args = 2, value_names = ["NEEDLE_TYPE", "HAYSTACK_TYPE"], action = ArgAction::Append)]
    pub compat: Vec<String>,

    /// Interchangeable ports of a cell type, comma separated
    #[arg(long, num_args = 2, value_names = ["TYPE", "PORTS"], action = ArgAction::Append)]
    pub swap: Vec<String>,

    /// Explicit port permutation of a cell type, comma separated
    #[arg(long, num_args = 3, value_names = ["TYPE", "LEFT", "RIGHT"], action = ArgAction::Append)]
    pub perm: Vec<String>,

    /// Cell attribute that must match
    #[arg(long = "cell-attr", action = ArgAction::Append)]
    pub cell_attr: Vec<String>,

    /// Wire attribute that must match
    #[arg(long = "wire-attr", action = ArgAction::Append)]
    pub wire_attr: Vec<String>,

    /// Do not compare cell parameters
    #[arg(long, default_value_t = false)]
    pub ignore_parameters: bool,

    /// Leave one parameter of a cell type out of the comparison
    #[arg(long = "ignore-param", num_args = 2, value_names = ["TYPE", "PARAM"], action = ArgAction::Append)]
    pub ignore_param: Vec<String>,

    /// JSON file of `{ module: { signal: regex } }` output name constraints
    #[arg(long)]
    pub regex: Option<PathBuf>,

    /// Drop needle edges of signals read by more than this many pins
    #[arg(long)]
    pub max_fanout: Option<usize>,

    /// JSON config file; command line options are added on top
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print matches as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Debug logging
    #[arg(short = 'v', long, default_value_t = false)]
    pub verbose: bool,
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Args {
    /// Merge the command line into the config file (or the defaults).
    pub fn to_config(&self) -> Result<Config, ConfigError> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };

        config.pat_filename = self.pattern.display().to_string();
        if let Some(module) = &self.module {
            config.pat_module_name = module.clone();
        }
        config.verbose |= self.verbose;
        config.const_ports |= self.constports;
        config.nodefaultswaps |= self.nodefaultswaps;
        config.ignore_parameters |= self.ignore_parameters;

        config.compat_pairs.extend(
            self.compat
                .chunks_exact(2)
                .map(|c| CompatPair::new(&c[0], &c[1])),
        );
        config.swap_ports.extend(
            self.swap
                .chunks_exact(2)
                .map(|c| SwapPort::new(&c[0], split_list(&c[1]))),
        );
        config.perm_ports.extend(
            self.perm
                .chunks_exact(3)
                .map(|c| PermPort::new(&c[0], split_list(&c[1]), split_list(&c[2]))),
        );
        config.cell_attr.extend(self.cell_attr.iter().cloned());
        config.wire_attr.extend(self.wire_attr.iter().cloned());
        config.ignore_param.extend(
            self.ignore_param
                .chunks_exact(2)
                .map(|c| IgnoreParam::new(&c[0], &c[1])),
        );
        if self.regex.is_some() {
            config.regex_map.clone_from(&self.regex);
        }
        if self.max_fanout.is_some() {
            config.max_fanout = self.max_fanout;
        }

        Ok(config.normalized())
    }

    pub fn haystack_options(&self) -> ImportOptions {
        match &self.top {
            Some(top) => ImportOptions::new().with_top(top),
            None => ImportOptions::new(),
        }
    }

    pub fn needle_options(&self) -> ImportOptions {
        match (&self.module, self.all_needles) {
            (Some(module), false) => ImportOptions::new().with_top(module),
            _ => ImportOptions::new(),
        }
    }
}
