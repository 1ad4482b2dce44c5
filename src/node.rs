/*
 * Filename: /src/node.rs
 * Project: rvhdl
 * Created Date: 2021-09-13, 09:17:55
 * Author: valerino <xoanino@gmail.com>
 * Copyright (c) 2021 valerino
 *
 * MIT License
 *
 * Copyright (c) 2021 valerino
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy of
 * this software and associated documentation files (the "Software"), to deal in
 * the Software without restriction, including without limitation the rights to
 * use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies
 * of the Software, and to permit persons to whom the Software is furnished to do
 * so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

use crate::bitvec::BitVector;
use crate::bus::Bus;
use bitflags::bitflags;
use lazy_static::*;
use std::fmt;

/// stable node identifier, unique within its context.
pub type NodeId = u32;

/// one simulated clock cycle.
pub type Tick = u64;

/// sentinel for "never evaluated".
pub const NEVER: Tick = !0u64;

/**
 * source location of the builder call that created a node, captured through
 * #[track_caller] on the public builder entry points.
 */
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceLoc {
    pub file: &'static str,
    pub line: u32,
}

impl SourceLoc {
    pub fn capture(loc: &'static std::panic::Location<'static>) -> SourceLoc {
        SourceLoc {
            file: loc.file(),
            line: loc.line(),
        }
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

bitflags! {
    /**
     * classification bits carried by every ALU op code, so that the width
     * checker and the compiler passes can reason about ops uniformly instead
     * of matching each code.
     */
    pub struct OpFlags : u16 {
        /// takes a single operand.
        const UNARY = 0b0000000001;
        /// takes two operands.
        const BINARY = 0b0000000010;
        /// equality/relational class, operands share a width, result is 1 bit.
        const COMPARE = 0b0000000100;
        /// reduce class, any operand width, result is 1 bit.
        const REDUCE = 0b0000001000;
        /// shift class, result width equals the left operand width.
        const SHIFT = 0b0000010000;
        /// arithmetic class, caller supplies the result width.
        const ARITH = 0b0000100000;
        /// bitwise class, operands and result share a width.
        const BITWISE = 0b0001000000;
        /// width adjustment (zero/sign extension).
        const PAD = 0b0010000000;
        /// commutative: a op b == b op a.
        const SYMMETRIC = 0b0100000000;
        /// a op a folds to a constant (eq, ne, sub, xor).
        const REDUCIBLE = 0b1000000000;
    }
}

/**
 * the closed set of combinational operators.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq = 0,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Inv,
    And,
    Or,
    Xor,
    Andr,
    Orr,
    Xorr,
    Shl,
    Shr,
    Neg,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pad,
}

/// per-op name and classification, indexed by the op code.
pub struct OpInfo {
    pub name: &'static str,
    pub flags: OpFlags,
}

lazy_static! {
    /**
     * the op info table. order must match the Op enum.
     */
    pub static ref OP_INFO: Vec<OpInfo> = vec![
        OpInfo { name: "eq",   flags: OpFlags::BINARY | OpFlags::COMPARE | OpFlags::SYMMETRIC | OpFlags::REDUCIBLE },
        OpInfo { name: "ne",   flags: OpFlags::BINARY | OpFlags::COMPARE | OpFlags::SYMMETRIC | OpFlags::REDUCIBLE },
        OpInfo { name: "lt",   flags: OpFlags::BINARY | OpFlags::COMPARE },
        OpInfo { name: "gt",   flags: OpFlags::BINARY | OpFlags::COMPARE },
        OpInfo { name: "le",   flags: OpFlags::BINARY | OpFlags::COMPARE },
        OpInfo { name: "ge",   flags: OpFlags::BINARY | OpFlags::COMPARE },
        OpInfo { name: "inv",  flags: OpFlags::UNARY | OpFlags::BITWISE },
        OpInfo { name: "and",  flags: OpFlags::BINARY | OpFlags::BITWISE | OpFlags::SYMMETRIC },
        OpInfo { name: "or",   flags: OpFlags::BINARY | OpFlags::BITWISE | OpFlags::SYMMETRIC },
        OpInfo { name: "xor",  flags: OpFlags::BINARY | OpFlags::BITWISE | OpFlags::SYMMETRIC | OpFlags::REDUCIBLE },
        OpInfo { name: "andr", flags: OpFlags::UNARY | OpFlags::REDUCE },
        OpInfo { name: "orr",  flags: OpFlags::UNARY | OpFlags::REDUCE },
        OpInfo { name: "xorr", flags: OpFlags::UNARY | OpFlags::REDUCE },
        OpInfo { name: "shl",  flags: OpFlags::BINARY | OpFlags::SHIFT },
        OpInfo { name: "shr",  flags: OpFlags::BINARY | OpFlags::SHIFT },
        OpInfo { name: "neg",  flags: OpFlags::UNARY | OpFlags::ARITH },
        OpInfo { name: "add",  flags: OpFlags::BINARY | OpFlags::ARITH | OpFlags::SYMMETRIC },
        OpInfo { name: "sub",  flags: OpFlags::BINARY | OpFlags::ARITH | OpFlags::REDUCIBLE },
        OpInfo { name: "mul",  flags: OpFlags::BINARY | OpFlags::ARITH | OpFlags::SYMMETRIC },
        OpInfo { name: "div",  flags: OpFlags::BINARY | OpFlags::ARITH },
        OpInfo { name: "mod",  flags: OpFlags::BINARY | OpFlags::ARITH },
        OpInfo { name: "pad",  flags: OpFlags::UNARY | OpFlags::PAD },
    ];
}

impl Op {
    pub fn name(self) -> &'static str {
        OP_INFO[self as usize].name
    }

    pub fn flags(self) -> OpFlags {
        OP_INFO[self as usize].flags
    }
}

/**
 * one entry of a proxy's range table: `length` bits of source `src_idx`
 * starting at `src_offset` land at `dst_offset` of the proxy output.
 */
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProxyRange {
    pub src_idx: u32,
    pub src_offset: u32,
    pub dst_offset: u32,
    pub length: u32,
}

/**
 * the closed set of node kinds, each carrying its own state.
 */
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// immutable constant, uniqued per context.
    Literal,
    /// width-only placeholder for a not-yet-written signal.
    Undef,
    /// externally driven value, optionally bound to a host bus.
    Input { bus: Option<Bus> },
    /// observable value driven into a host bus.
    Output { bus: Bus },
    /// named debug probe, live by definition.
    Tap,
    /// bit-level re-assembly of its sources.
    Proxy { ranges: Vec<ProxyRange> },
    /// pure combinational operator.
    Alu { op: Op, signed: bool },
    /**
     * multi-cycle combinational operator: both an alu and a tickable. the
     * result computed at tick t becomes visible at tick t+delay.
     */
    DelayedAlu {
        op: Op,
        signed: bool,
        cd: usize,
        pipe: Vec<BitVector>,
        staged: BitVector,
        pending: bool,
    },
    /// multiplexer: ternary (cond, then, else) or keyed (key, v0, k0, ..., default).
    Select { has_key: bool },
    /// clocked register: sources (next, init[, enable, reset]).
    Reg {
        cd: usize,
        enable_idx: Option<usize>,
        reset_idx: Option<usize>,
        next_value: BitVector,
        pending: bool,
    },
    /// memory backing store, owns the data array.
    Mem {
        data: BitVector,
        data_width: u32,
        num_items: u32,
        write_first: bool,
        has_init: bool,
        rdports: Vec<NodeId>,
        wrports: Vec<NodeId>,
    },
    /// memory read port, asynchronous (addr) or synchronous (addr, enable).
    MemRd {
        mem: NodeId,
        cd: Option<usize>,
        staged_addr: u64,
        staged_en: bool,
        staged_data: BitVector,
        pending: bool,
    },
    /// memory write port: sources (addr, data, enable).
    MemWr {
        mem: NodeId,
        cd: usize,
        staged: Option<(u64, BitVector)>,
    },
    /// free-running 64-bit cycle counter, one per context.
    TickCounter,
    /// per-tick check, aborts the simulation with a message when false.
    Assert { message: String, has_cond: bool },
    /// per-tick formatted debug print, `{}` placeholders consume sources.
    Print { format: String, has_cond: bool },
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Literal => "lit",
            NodeKind::Undef => "undef",
            NodeKind::Input { .. } => "input",
            NodeKind::Output { .. } => "output",
            NodeKind::Tap => "tap",
            NodeKind::Proxy { .. } => "proxy",
            NodeKind::Alu { .. } => "alu",
            NodeKind::DelayedAlu { .. } => "dalu",
            NodeKind::Select { .. } => "select",
            NodeKind::Reg { .. } => "reg",
            NodeKind::Mem { .. } => "mem",
            NodeKind::MemRd { .. } => "memrd",
            NodeKind::MemWr { .. } => "memwr",
            NodeKind::TickCounter => "tick",
            NodeKind::Assert { .. } => "assert",
            NodeKind::Print { .. } => "print",
        }
    }

    /**
     * tickables need the two-phase pre-edge sample / post-edge commit.
     */
    pub fn is_tickable(&self) -> bool {
        match self {
            NodeKind::Reg { .. } | NodeKind::DelayedAlu { .. } | NodeKind::MemWr { .. } => true,
            NodeKind::MemRd { cd, .. } => cd.is_some(),
            _ => false,
        }
    }

    /// memory ports escape conditional-frame locals (module scope).
    pub fn is_memport(&self) -> bool {
        match self {
            NodeKind::MemRd { .. } | NodeKind::MemWr { .. } => true,
            _ => false,
        }
    }
}

/**
 * a node of the IR graph. the context's arena owns every node, source
 * references are arena indices so that register feedback cycles need no
 * special ownership handling.
 */
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub width: u32,
    pub kind: NodeKind,
    pub srcs: Vec<NodeId>,
    pub value: BitVector,
    pub ctime: Tick,
    pub name: Option<String>,
    pub sloc: Option<SourceLoc>,
}

impl Node {
    pub fn new(id: NodeId, width: u32, kind: NodeKind, srcs: Vec<NodeId>) -> Node {
        Node {
            id,
            width,
            kind,
            srcs,
            value: BitVector::new(width),
            ctime: NEVER,
            name: None,
            sloc: None,
        }
    }

    /**
     * one-line AST dump representation: `#id <- kind<width>(#src, ...)`.
     */
    pub fn print_ast(&self) -> String {
        let mut s = format!("#{} <- {}{}", self.id, self.kind.name(), self.width);
        if let NodeKind::Alu { op, .. } = &self.kind {
            s = format!("#{} <- {}{}", self.id, op.name(), self.width);
        }
        if !self.srcs.is_empty() {
            s.push('(');
            for (i, src) in self.srcs.iter().enumerate() {
                if i > 0 {
                    s.push_str(", ");
                }
                s.push_str(&format!("#{}", src));
            }
            s.push(')');
        }
        if let Some(n) = &self.name {
            s.push_str(&format!(" '{}'", n));
        }
        s
    }
}
