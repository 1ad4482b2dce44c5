/*
 * Filename: /src/context/ctx_error.rs
 * Project: rvhdl
 * Created Date: 2021-09-13, 11:40:12
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

use crate::node::SourceLoc;
use std::fmt;

/**
 * type of hdl error.
 */
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum HdlErrorType {
    /// a source reference violates its kind's width rule.
    WidthMismatch,
    /// an undef node survived into compilation.
    UndefinedNode,
    /// two writes to the same signal within one conditional arm.
    DoubleAssign,
    /// a proxy range table does not tile its output width.
    ProxyRangeOverlap,
    /// query for a missing debug probe.
    UnknownTap,
    /// a tickable references a clock domain it does not belong to.
    ClockDomainMismatch,
    /// an assertion guard evaluated to zero (runtime).
    AssertionFailed,
    /// memory port address out of range (runtime).
    MemoryBounds,
    /// loads a file into a memory.
    MemoryLoad,
    /// builder called with no module under description.
    InvalidContext,
    /// generic error
    Generic,
}

impl fmt::Display for HdlErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HdlErrorType::WidthMismatch => write!(f, "WidthMismatch"),
            HdlErrorType::UndefinedNode => write!(f, "UndefinedNode"),
            HdlErrorType::DoubleAssign => write!(f, "DoubleAssign"),
            HdlErrorType::ProxyRangeOverlap => write!(f, "ProxyRangeOverlap"),
            HdlErrorType::UnknownTap => write!(f, "UnknownTap"),
            HdlErrorType::ClockDomainMismatch => write!(f, "ClockDomainMismatch"),
            HdlErrorType::AssertionFailed => write!(f, "AssertionFailed"),
            HdlErrorType::MemoryBounds => write!(f, "MemoryBounds"),
            HdlErrorType::MemoryLoad => write!(f, "MemLoad"),
            HdlErrorType::InvalidContext => write!(f, "InvalidContext"),
            HdlErrorType::Generic => write!(f, "Generic"),
        }
    }
}

/**
 * to report errors within the whole crate.
 */
#[derive(Debug, Clone)]
pub struct HdlError {
    /// one of the defined HdlErrorType enums.
    pub t: HdlErrorType,
    /// module (context) name, if known.
    pub module: Option<String>,
    /// offending node id.
    pub node: Option<u32>,
    /// offending node kind name.
    pub node_kind: Option<&'static str>,
    /// builder call site, if captured.
    pub sloc: Option<SourceLoc>,
    /// simulation cycle, for runtime errors.
    pub cycle: Option<u64>,
    /// an optional message.
    pub msg: Option<String>,
}

impl std::error::Error for HdlError {}

impl fmt::Display for HdlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error ({})", self.t)?;
        if let Some(m) = &self.module {
            write!(f, " in module '{}'", m)?;
        }
        if let Some(n) = self.node {
            write!(f, ", node {}#{}", self.node_kind.unwrap_or("?"), n)?;
        }
        if let Some(c) = self.cycle {
            write!(f, ", cycle {}", c)?;
        }
        if let Some(s) = &self.sloc {
            write!(f, " ({})", s)?;
        }
        if let Some(m) = &self.msg {
            write!(f, ": {}", m)?;
        }
        Ok(())
    }
}

impl From<std::io::Error> for HdlError {
    fn from(err: std::io::Error) -> Self {
        HdlError::new_default(HdlErrorType::MemoryLoad, Some(err.to_string()))
    }
}

impl HdlError {
    /**
     * constructs a new default error, with optional message.
     */
    pub fn new_default(t: HdlErrorType, m: Option<String>) -> Self {
        HdlError {
            t,
            module: None,
            node: None,
            node_kind: None,
            sloc: None,
            cycle: None,
            msg: m,
        }
    }

    /**
     * construction-time error tagged with the offending node.
     */
    pub fn for_node(
        t: HdlErrorType,
        module: &str,
        node: u32,
        node_kind: &'static str,
        sloc: Option<SourceLoc>,
        m: Option<String>,
    ) -> Self {
        HdlError {
            t,
            module: Some(module.to_string()),
            node: Some(node),
            node_kind: Some(node_kind),
            sloc,
            cycle: None,
            msg: m,
        }
    }

    /**
     * runtime error tagged with the simulation cycle.
     */
    pub fn at_cycle(mut self, cycle: u64) -> Self {
        self.cycle = Some(cycle);
        self
    }
}

/**
 * check an operand width against the expected one.
 */
pub(crate) fn check_width(
    op_name: &str,
    expected: u32,
    got: u32,
) -> Result<(), HdlError> {
    if expected != got {
        let e = HdlError::new_default(
            HdlErrorType::WidthMismatch,
            Some(format!(
                "{}: expected width {}, got {}",
                op_name, expected, got
            )),
        );
        return Err(e);
    }
    Ok(())
}

/**
 * check that a predicate signal (cond, enable, reset) is a single bit.
 */
pub(crate) fn check_predicate(op_name: &str, got: u32) -> Result<(), HdlError> {
    if got != 1 {
        let e = HdlError::new_default(
            HdlErrorType::WidthMismatch,
            Some(format!("{}: predicate must be 1 bit, got {}", op_name, got)),
        );
        return Err(e);
    }
    Ok(())
}

/**
 * check a memory address against the item count.
 */
pub(crate) fn check_mem_bounds(
    addr: u64,
    num_items: u32,
    node: u32,
    cycle: u64,
) -> Result<(), HdlError> {
    if addr >= num_items as u64 {
        let e = HdlError {
            t: HdlErrorType::MemoryBounds,
            module: None,
            node: Some(node),
            node_kind: Some("mem"),
            sloc: None,
            cycle: Some(cycle),
            msg: Some(format!("address {} out of range (0..{})", addr, num_items)),
        };
        return Err(e);
    }
    Ok(())
}
