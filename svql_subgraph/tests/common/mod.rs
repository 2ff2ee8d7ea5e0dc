#![allow(dead_code)]

use std::sync::OnceLock;

use svql_common::design::{Module, SigBit, State};

pub fn init_test_logger() {
    static INIT: OnceLock<()> = OnceLock::new();
    let _ = INIT.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Add a two-input gate `y = ty(a, b)`.
pub fn gate2(m: &mut Module, name: &str, ty: &str, a: SigBit, b: SigBit, y: SigBit) {
    m.add_cell(name, ty)
        .set_port("A", vec![a])
        .set_port("B", vec![b])
        .set_port("Y", vec![y]);
}

pub fn not(m: &mut Module, name: &str, a: SigBit, y: SigBit) {
    m.add_cell(name, "$_NOT_")
        .set_port("A", vec![a])
        .set_port("Y", vec![y]);
}

/// Bit 0 of a one-bit wire, created on first use.
pub fn bit(m: &mut Module, name: &str) -> SigBit {
    let id = match m.wire(name) {
        Some(w) => w.id(),
        None => m.add_wire(name, 1),
    };
    SigBit::wire(id, 0)
}

pub fn input(m: &mut Module, name: &str) -> SigBit {
    SigBit::wire(m.add_input(name, 1), 0)
}

pub fn output(m: &mut Module, name: &str) -> SigBit {
    SigBit::wire(m.add_output(name, 1), 0)
}

/// `y = a & b`
pub fn and_gate() -> Module {
    let mut m = Module::new("and_gate");
    let a = input(&mut m, "a");
    let b = input(&mut m, "b");
    let y = output(&mut m, "y");
    gate2(&mut m, "g", "$_AND_", a, b, y);
    m
}

/// `y = (a & b) | c` with the AND output internal.
pub fn and_or() -> Module {
    let mut m = Module::new("and_or");
    let a = input(&mut m, "a");
    let b = input(&mut m, "b");
    let c = input(&mut m, "c");
    let y = output(&mut m, "y");
    let x = bit(&mut m, "x");
    gate2(&mut m, "and", "$_AND_", a, b, x);
    gate2(&mut m, "or", "$_OR_", x, c, y);
    m
}

/// Three ANDs reducing four inputs.
pub fn and_tree() -> Module {
    let mut m = Module::new("and_tree");
    let a = input(&mut m, "a");
    let b = input(&mut m, "b");
    let c = input(&mut m, "c");
    let d = input(&mut m, "d");
    let y = output(&mut m, "y");
    let l = bit(&mut m, "l");
    let r = bit(&mut m, "r");
    gate2(&mut m, "g0", "$_AND_", a, b, l);
    gate2(&mut m, "g1", "$_AND_", c, d, r);
    gate2(&mut m, "g2", "$_AND_", l, r, y);
    m
}

/// Two AND/OR chains. The second AND output is also inverted onto a port,
/// and the second OR reads it on `B`.
pub fn and_or_pair() -> Module {
    let mut m = Module::new("and_or_pair");
    let a0 = input(&mut m, "a0");
    let b0 = input(&mut m, "b0");
    let c0 = input(&mut m, "c0");
    let a1 = input(&mut m, "a1");
    let b1 = input(&mut m, "b1");
    let c1 = input(&mut m, "c1");
    let y0 = output(&mut m, "y0");
    let y1 = output(&mut m, "y1");
    let tap = output(&mut m, "tap");
    let x0 = bit(&mut m, "x0");
    let x1 = bit(&mut m, "x1");
    gate2(&mut m, "and0", "$_AND_", a0, b0, x0);
    gate2(&mut m, "or0", "$_OR_", x0, c0, y0);
    gate2(&mut m, "and1", "$_AND_", a1, b1, x1);
    gate2(&mut m, "or1", "$_OR_", c1, x1, y1);
    not(&mut m, "inv", x1, tap);
    m
}

/// AND gate whose `port` input is tied to `tie`.
pub fn tied_and(name: &str, port: &str, tie: State) -> Module {
    let mut m = Module::new(name);
    let a = input(&mut m, "a");
    let y = output(&mut m, "y");
    let (pa, pb) = if port == "A" {
        (SigBit::Const(tie), a)
    } else {
        (a, SigBit::Const(tie))
    };
    gate2(&mut m, "g", "$_AND_", pa, pb, y);
    m
}
