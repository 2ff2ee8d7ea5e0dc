//! Signal bits, signal specs and constant values.
//!
//! The shapes follow RTLIL: a signal bit is either one bit of a named wire or a
//! literal logic state, and constants are LSB-first bit vectors that may carry a
//! string payload instead.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::wire::WireId;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// One of the four logic values a literal bit can take.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum State {
    /// Logic zero.
    S0,
    /// Logic one.
    S1,
    /// Undefined.
    Sx,
    /// High impedance.
    Sz,
}

impl State {
    /// Parse the single-character yosys spelling (`0`, `1`, `x`, `z`).
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(Self::S0),
            '1' => Some(Self::S1),
            'x' | 'X' => Some(Self::Sx),
            'z' | 'Z' => Some(Self::Sz),
            _ => None,
        }
    }

    /// The single-character spelling used by yosys.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::S0 => '0',
            Self::S1 => '1',
            Self::Sx => 'x',
            Self::Sz => 'z',
        }
    }

    /// Every state, in the order constant driver nodes are created.
    pub const ALL: [Self; 4] = [Self::S0, Self::S1, Self::Sx, Self::Sz];
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

// ---------------------------------------------------------------------------
// SigBit / SigSpec
// ---------------------------------------------------------------------------

/// A single-bit signal reference inside one module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SigBit {
    /// Bit `offset` of the wire `wire`.
    Wire {
        /// Wire holding the bit.
        wire: WireId,
        /// Bit position inside the wire.
        offset: usize,
    },
    /// A literal logic value.
    Const(State),
}

impl SigBit {
    /// Shorthand for a wire bit.
    #[must_use]
    pub const fn wire(wire: WireId, offset: usize) -> Self {
        Self::Wire { wire, offset }
    }

    /// The wire this bit belongs to, if it is not a literal.
    #[must_use]
    pub const fn as_wire(&self) -> Option<WireId> {
        match self {
            Self::Wire { wire, .. } => Some(*wire),
            Self::Const(_) => None,
        }
    }

    /// The literal value, if any.
    #[must_use]
    pub const fn as_const(&self) -> Option<State> {
        match self {
            Self::Const(s) => Some(*s),
            Self::Wire { .. } => None,
        }
    }

    /// Whether this bit is a literal.
    #[must_use]
    pub const fn is_const(&self) -> bool {
        matches!(self, Self::Const(_))
    }
}

impl From<State> for SigBit {
    fn from(value: State) -> Self {
        Self::Const(value)
    }
}

/// An ordered list of signal bits (LSB first).
pub type SigSpec = Vec<SigBit>;

// ---------------------------------------------------------------------------
// Const
// ---------------------------------------------------------------------------

/// A parameter or attribute value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Const {
    /// LSB-first bit vector.
    Bits(Vec<State>),
    /// String-valued constant.
    Str(String),
}

impl Const {
    /// A 32-bit two's complement constant, as RTLIL builds it from an `int`.
    #[must_use]
    pub fn from_int(value: i32) -> Self {
        let raw = value as u32;
        Self::Bits(
            (0..32)
                .map(|i| if (raw >> i) & 1 == 1 { State::S1 } else { State::S0 })
                .collect(),
        )
    }

    /// A single-bit constant.
    #[must_use]
    pub fn from_bool(value: bool) -> Self {
        Self::Bits(vec![if value { State::S1 } else { State::S0 }])
    }

    /// Parse an MSB-first string of `0 1 x z` characters.
    pub fn from_bit_string(s: &str) -> Option<Self> {
        if s.is_empty() {
            return None;
        }
        s.chars()
            .rev()
            .map(State::from_char)
            .collect::<Option<Vec<_>>>()
            .map(Self::Bits)
    }

    /// Bit view of the constant. Strings are encoded 8 bits per character with
    /// the last character in the least significant byte.
    #[must_use]
    pub fn bits(&self) -> Vec<State> {
        match self {
            Self::Bits(bits) => bits.clone(),
            Self::Str(s) => s
                .bytes()
                .rev()
                .flat_map(|byte| {
                    (0..8).map(move |i| if (byte >> i) & 1 == 1 { State::S1 } else { State::S0 })
                })
                .collect(),
        }
    }

    /// True when any bit is one.
    #[must_use]
    pub fn as_bool(&self) -> bool {
        self.bits().iter().any(|b| *b == State::S1)
    }

    /// Interpret the low 32 bits as an integer. Bits other than one count as zero.
    #[must_use]
    pub fn as_int(&self) -> i32 {
        let raw = self
            .bits()
            .iter()
            .take(32)
            .enumerate()
            .fold(0u32, |acc, (i, b)| if *b == State::S1 { acc | (1 << i) } else { acc });
        raw as i32
    }

    /// Number of bits in the bit view.
    #[must_use]
    pub fn width(&self) -> usize {
        match self {
            Self::Bits(bits) => bits.len(),
            Self::Str(s) => s.len() * 8,
        }
    }
}

impl From<&str> for Const {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl fmt::Display for Const {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bits(bits) => {
                for b in bits.iter().rev() {
                    write!(f, "{b}")?;
                }
                Ok(())
            }
            Self::Str(s) => write!(f, "\"{s}\""),
        }
    }
}
