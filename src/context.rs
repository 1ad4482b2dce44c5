/*
 * Filename: /src/context.rs
 * Project: rvhdl
 * Created Date: 2021-09-14, 10:31:08
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
use crate::cdomain::{dedup_events, ClockDomain, ClockEvent, Edge};
use crate::node::{Node, NodeId, NodeKind, Op, OpFlags, ProxyRange, SourceLoc, Tick};
use log::*;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub(crate) mod conds;
pub mod ctx_error;

use self::conds::{CondFrame, CondVal};
use self::ctx_error::{check_mem_bounds, check_predicate, check_width, HdlError, HdlErrorType};

thread_local! {
    /// the per-thread stack of modules under description, top = current.
    static CTX_STACK: RefCell<Vec<Rc<RefCell<Context>>>> = RefCell::new(Vec::new());
}

/**
 * makes `ctx` the current context of this thread. nested module description
 * saves and restores the previous current context.
 */
pub(crate) fn ctx_begin(ctx: &Rc<RefCell<Context>>) {
    CTX_STACK.with(|s| s.borrow_mut().push(Rc::clone(ctx)));
}

/**
 * restores the previous current context.
 */
pub(crate) fn ctx_end() {
    CTX_STACK.with(|s| {
        s.borrow_mut().pop();
    });
}

/**
 * the current context, or InvalidContext when no module is being described.
 */
pub(crate) fn ctx_curr() -> Result<Rc<RefCell<Context>>, HdlError> {
    CTX_STACK.with(|s| match s.borrow().last() {
        Some(ctx) => Ok(Rc::clone(ctx)),
        None => Err(HdlError::new_default(
            HdlErrorType::InvalidContext,
            Some(String::from("no module under description")),
        )),
    })
}

// internal tag used to run the two-phase protocol without holding a borrow
// on the node kind
enum TickableTag {
    Reg {
        enable_idx: Option<usize>,
        reset_idx: Option<usize>,
    },
    DAlu {
        op: Op,
        signed: bool,
    },
    SyncRd {
        mem: NodeId,
    },
    Wr {
        mem: NodeId,
    },
    Other,
}

/**
 * per-module container: owns the node arena, the literal pool, the
 * clock/reset scopes, the conditional frames and the clock domains.
 * node ids are arena indices, so register feedback cycles are plain index
 * cycles and teardown is the arena being dropped.
 */
#[derive(Debug)]
pub struct Context {
    pub(crate) name: String,
    nodes: Vec<Option<Node>>,
    pub(crate) literals: Vec<NodeId>,
    pub(crate) undefs: Vec<NodeId>,
    pub(crate) inputs: Vec<NodeId>,
    pub(crate) outputs: Vec<NodeId>,
    pub(crate) taps: Vec<NodeId>,
    /// asserts and prints, live by definition like taps.
    pub(crate) gtaps: Vec<NodeId>,
    pub(crate) cdomains: Vec<ClockDomain>,
    clk_stack: Vec<NodeId>,
    reset_stack: Vec<NodeId>,
    clk: Option<NodeId>,
    reset: Option<NodeId>,
    reset_bus: Option<Bus>,
    tick_node: Option<NodeId>,
    pub(crate) conds: Vec<CondFrame>,
    pub(crate) cond_vals: Vec<CondVal>,
    pub(crate) active_branches: u32,
    dup_taps: HashMap<String, u32>,
}

impl Context {
    pub fn new(name: &str) -> Context {
        Context {
            name: name.to_string(),
            nodes: Vec::new(),
            literals: Vec::new(),
            undefs: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            taps: Vec::new(),
            gtaps: Vec::new(),
            cdomains: Vec::new(),
            clk_stack: Vec::new(),
            reset_stack: Vec::new(),
            clk: None,
            reset: None,
            reset_bus: None,
            tick_node: None,
            conds: Vec::new(),
            cond_vals: Vec::new(),
            active_branches: 0,
            dup_taps: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // -- node arena

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        self.nodes[id as usize].as_ref().expect("invalid node id")
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id as usize].as_mut().expect("invalid node id")
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id as usize).and_then(|n| n.as_ref())
    }

    /// live node count.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// ids of all live nodes, in creation order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter_map(|n| n.as_ref().map(|n| n.id))
            .collect()
    }

    /**
     * adds a node to the arena and assigns the next id. nodes created inside
     * a conditional arm are recorded in that arm's locals, memory ports keep
     * module scope.
     */
    pub(crate) fn create_node(
        &mut self,
        width: u32,
        kind: NodeKind,
        srcs: Vec<NodeId>,
        sloc: Option<SourceLoc>,
    ) -> NodeId {
        let id = self.nodes.len() as NodeId;
        let is_undef = matches!(&kind, NodeKind::Undef);
        let is_memport = kind.is_memport();
        let mut node = Node::new(id, width, kind, srcs);
        node.sloc = sloc;
        self.nodes.push(Some(node));
        if is_undef {
            self.undefs.push(id);
        }
        if !self.conds.is_empty() && !is_memport {
            if let Some(frame) = self.conds.last_mut() {
                frame.locals.insert(id);
            }
        }
        id
    }

    /**
     * removes a node from the arena and from every side list referencing it.
     */
    pub(crate) fn destroy_node(&mut self, id: NodeId) {
        let memport_of = match self.get_node(id).map(|n| &n.kind) {
            Some(NodeKind::MemRd { mem, .. }) => Some(*mem),
            Some(NodeKind::MemWr { mem, .. }) => Some(*mem),
            _ => None,
        };
        if let Some(mem) = memport_of {
            if let Some(m) = self.nodes[mem as usize].as_mut() {
                if let NodeKind::Mem {
                    rdports, wrports, ..
                } = &mut m.kind
                {
                    rdports.retain(|p| *p != id);
                    wrports.retain(|p| *p != id);
                }
            }
        }
        self.nodes[id as usize] = None;
        self.literals.retain(|n| *n != id);
        self.undefs.retain(|n| *n != id);
        self.inputs.retain(|n| *n != id);
        self.outputs.retain(|n| *n != id);
        self.taps.retain(|n| *n != id);
        self.gtaps.retain(|n| *n != id);
        for cd in self.cdomains.iter_mut() {
            cd.remove_tickable(id);
        }
        if self.clk == Some(id) {
            self.clk = None;
        }
        if self.reset == Some(id) {
            self.reset = None;
        }
        if self.tick_node == Some(id) {
            self.tick_node = None;
        }
    }

    /**
     * replace every source reference to `old` with `new` (identity
     * elimination rewiring). clock domain sensitivity lists are patched too.
     */
    pub(crate) fn replace_uses(&mut self, old: NodeId, new: NodeId) {
        for slot in self.nodes.iter_mut() {
            if let Some(n) = slot {
                for s in n.srcs.iter_mut() {
                    if *s == old {
                        *s = new;
                    }
                }
            }
        }
        for cd in self.cdomains.iter_mut() {
            for ev in cd.sensitivity.iter_mut() {
                if ev.signal == old {
                    ev.signal = new;
                }
            }
        }
    }

    // -- literal pool

    /**
     * returns an existing literal node carrying the same value, else creates
     * one. this keeps invariant 5 (one literal node per value) by
     * construction.
     */
    pub(crate) fn literal(&mut self, value: BitVector) -> NodeId {
        for &id in &self.literals {
            if self.node(id).value == value {
                return id;
            }
        }
        let width = value.width();
        let id = self.create_node(width, NodeKind::Literal, vec![], None);
        self.node_mut(id).value = value;
        self.literals.push(id);
        id
    }

    // -- clock and reset scopes

    pub fn push_clock(&mut self, clk: NodeId) {
        self.clk_stack.push(clk);
    }

    pub fn pop_clock(&mut self) {
        self.clk_stack.pop();
    }

    pub fn push_reset(&mut self, reset: NodeId) {
        self.reset_stack.push(reset);
    }

    pub fn pop_reset(&mut self) {
        self.reset_stack.pop();
    }

    /**
     * the clock in scope. when no clock has been pushed, a single default
     * input named `clk` is lazily created and driven by the simulator as a
     * free-running clock.
     */
    pub(crate) fn get_clk(&mut self) -> NodeId {
        if let Some(&clk) = self.clk_stack.last() {
            return clk;
        }
        if let Some(clk) = self.clk {
            return clk;
        }
        let id = self.create_node(1, NodeKind::Input { bus: None }, vec![], None);
        self.node_mut(id).name = Some(String::from("clk"));
        self.inputs.push(id);
        self.clk = Some(id);
        id
    }

    /**
     * the reset in scope, lazily creating a default `reset` input bound to a
     * host bus (inactive until driven).
     */
    pub(crate) fn get_reset(&mut self) -> NodeId {
        if let Some(&reset) = self.reset_stack.last() {
            return reset;
        }
        if let Some(reset) = self.reset {
            return reset;
        }
        let bus = Bus::new(1);
        let id = self.create_node(
            1,
            NodeKind::Input {
                bus: Some(bus.clone()),
            },
            vec![],
            None,
        );
        self.node_mut(id).name = Some(String::from("reset"));
        self.inputs.push(id);
        self.reset = Some(id);
        self.reset_bus = Some(bus);
        id
    }

    pub(crate) fn default_clk(&self) -> Option<NodeId> {
        self.clk
    }

    pub(crate) fn default_reset_bus(&self) -> Option<Bus> {
        self.reset_bus.clone()
    }

    // -- clock domains

    /**
     * returns the domain with this sensitivity list, creating it if needed.
     * two domains with identical lists are the same domain.
     */
    pub(crate) fn create_cdomain(&mut self, events: Vec<ClockEvent>) -> usize {
        let events = dedup_events(&events);
        for (i, cd) in self.cdomains.iter().enumerate() {
            if cd.matches(&events) {
                return i;
            }
        }
        self.cdomains.push(ClockDomain::new(events));
        self.cdomains.len() - 1
    }

    /// the domain for the clock currently in scope (posedge).
    pub(crate) fn current_cdomain(&mut self) -> usize {
        let clk = self.get_clk();
        self.create_cdomain(vec![ClockEvent {
            signal: clk,
            edge: Edge::Pos,
        }])
    }

    pub(crate) fn add_tickable(&mut self, cd: usize, id: NodeId) {
        self.cdomains[cd].add_tickable(id);
    }

    pub fn num_cdomains(&self) -> usize {
        self.cdomains.len()
    }

    // -- tick counter

    /// the free-running 64-bit cycle counter, one per context.
    pub(crate) fn tick_counter(&mut self) -> NodeId {
        if let Some(id) = self.tick_node {
            return id;
        }
        let id = self.create_node(64, NodeKind::TickCounter, vec![], None);
        self.tick_node = Some(id);
        id
    }

    // -- io and taps

    pub(crate) fn bind_input(
        &mut self,
        name: &str,
        width: u32,
        sloc: Option<SourceLoc>,
    ) -> (NodeId, Bus) {
        let bus = Bus::new(width);
        let id = self.create_node(
            width,
            NodeKind::Input {
                bus: Some(bus.clone()),
            },
            vec![],
            sloc,
        );
        self.node_mut(id).name = Some(name.to_string());
        self.inputs.push(id);
        (id, bus)
    }

    pub(crate) fn bind_output(
        &mut self,
        name: &str,
        src: NodeId,
        sloc: Option<SourceLoc>,
    ) -> (NodeId, Bus) {
        let width = self.node(src).width;
        let bus = Bus::new(width);
        let id = self.create_node(width, NodeKind::Output { bus: bus.clone() }, vec![src], sloc);
        self.node_mut(id).name = Some(name.to_string());
        self.outputs.push(id);
        (id, bus)
    }

    /**
     * registers a named debug probe. duplicate names are auto-suffixed
     * `_0, _1, ...`, renaming the first instance as well.
     */
    pub(crate) fn register_tap(
        &mut self,
        name: &str,
        src: NodeId,
        sloc: Option<SourceLoc>,
    ) -> NodeId {
        let instances = {
            let e = self.dup_taps.entry(name.to_string()).or_insert(0);
            let i = *e;
            *e += 1;
            i
        };
        let mut full_name = name.to_string();
        if instances > 0 {
            if instances == 1 {
                // rename the first instance
                let first = self
                    .taps
                    .iter()
                    .copied()
                    .find(|&t| self.node(t).name.as_deref() == Some(name));
                if let Some(t) = first {
                    self.node_mut(t).name = Some(format!("{}_0", name));
                }
            }
            full_name = format!("{}_{}", name, instances);
        }
        let width = self.node(src).width;
        let id = self.create_node(width, NodeKind::Tap, vec![src], sloc);
        self.node_mut(id).name = Some(full_name);
        self.taps.push(id);
        id
    }

    /**
     * lookup a tap by name.
     */
    pub fn get_tap(&self, name: &str) -> Result<NodeId, HdlError> {
        for &t in &self.taps {
            if self.node(t).name.as_deref() == Some(name) {
                return Ok(t);
            }
        }
        Err(HdlError::new_default(
            HdlErrorType::UnknownTap,
            Some(format!("couldn't find tap '{}'", name)),
        ))
    }

    /**
     * the set of roots kept live regardless of fan-out: inputs, outputs,
     * taps, assertions and prints.
     */
    pub fn get_live_nodes(&self) -> Vec<NodeId> {
        let mut live = Vec::new();
        live.extend_from_slice(&self.inputs);
        live.extend_from_slice(&self.outputs);
        live.extend_from_slice(&self.taps);
        live.extend_from_slice(&self.gtaps);
        live
    }

    // -- builders

    /**
     * creates an alu node, width-checked per the op class.
     */
    pub(crate) fn create_alu(
        &mut self,
        op: Op,
        signed: bool,
        width: u32,
        srcs: Vec<NodeId>,
        sloc: Option<SourceLoc>,
    ) -> Result<NodeId, HdlError> {
        let out_width = self.check_alu(op, width, &srcs)?;
        Ok(self.create_node(out_width, NodeKind::Alu { op, signed }, srcs, sloc))
    }

    /**
     * width rules, shared by plain and delayed alus:
     * compare/reduce produce 1 bit, shift keeps the left width, bitwise
     * requires all widths equal, arithmetic takes the caller width.
     */
    pub(crate) fn check_alu(&self, op: Op, width: u32, srcs: &[NodeId]) -> Result<u32, HdlError> {
        let flags = op.flags();
        let arity = if flags.contains(OpFlags::BINARY) { 2 } else { 1 };
        if srcs.len() != arity {
            return Err(HdlError::new_default(
                HdlErrorType::Generic,
                Some(format!(
                    "{}: expected {} operands, got {}",
                    op.name(),
                    arity,
                    srcs.len()
                )),
            ));
        }
        let wa = self.node(srcs[0]).width;
        if flags.contains(OpFlags::COMPARE) {
            check_width(op.name(), wa, self.node(srcs[1]).width)?;
            return Ok(1);
        }
        if flags.contains(OpFlags::REDUCE) {
            return Ok(1);
        }
        if flags.contains(OpFlags::SHIFT) {
            // the right operand width is free
            return Ok(wa);
        }
        if flags.contains(OpFlags::BITWISE) {
            if arity == 2 {
                check_width(op.name(), wa, self.node(srcs[1]).width)?;
            }
            return Ok(wa);
        }
        if flags.contains(OpFlags::PAD) {
            if width < wa {
                return Err(HdlError::new_default(
                    HdlErrorType::WidthMismatch,
                    Some(format!(
                        "pad: target width {} below source width {}",
                        width, wa
                    )),
                ));
            }
            return Ok(width);
        }
        // arithmetic: caller-supplied result width
        Ok(width)
    }

    /**
     * creates a ternary select node `(cond, then, else)`.
     */
    pub(crate) fn create_select(
        &mut self,
        cond: NodeId,
        then_: NodeId,
        else_: NodeId,
        sloc: Option<SourceLoc>,
    ) -> Result<NodeId, HdlError> {
        check_predicate("select", self.node(cond).width)?;
        let wt = self.node(then_).width;
        check_width("select", wt, self.node(else_).width)?;
        Ok(self.create_node(
            wt,
            NodeKind::Select { has_key: false },
            vec![cond, then_, else_],
            sloc,
        ))
    }

    // -- proxies

    /// a proxy with an empty range table.
    pub(crate) fn create_proxy(&mut self, width: u32, sloc: Option<SourceLoc>) -> NodeId {
        self.create_node(width, NodeKind::Proxy { ranges: vec![] }, vec![], sloc)
    }

    /**
     * an undef-backed proxy: the not-yet-written signal of the builder api.
     */
    pub(crate) fn create_undef_proxy(&mut self, width: u32, sloc: Option<SourceLoc>) -> NodeId {
        let undef = self.create_node(width, NodeKind::Undef, vec![], sloc);
        let proxy = self.create_proxy(width, sloc);
        // infallible: the fresh proxy is empty
        let _ = self.proxy_add_source(proxy, 0, undef, 0, width);
        proxy
    }

    /**
     * a node reading `length` bits of `src` from `offset`. slicing the whole
     * width returns the source itself.
     */
    pub(crate) fn create_slice(
        &mut self,
        src: NodeId,
        offset: u32,
        length: u32,
        sloc: Option<SourceLoc>,
    ) -> Result<NodeId, HdlError> {
        let sw = self.node(src).width;
        if offset + length > sw {
            return Err(HdlError::new_default(
                HdlErrorType::WidthMismatch,
                Some(format!(
                    "slice [{}, {}) out of range for width {}",
                    offset,
                    offset + length,
                    sw
                )),
            ));
        }
        if offset == 0 && length == sw {
            return Ok(src);
        }
        let proxy = self.create_proxy(length, sloc);
        self.proxy_add_source(proxy, 0, src, offset, length)?;
        Ok(proxy)
    }

    /**
     * merge a new range into a proxy, splitting prior ranges it overlaps so
     * that the table stays non-overlapping and sorted.
     */
    pub(crate) fn proxy_add_source(
        &mut self,
        proxy: NodeId,
        dst_offset: u32,
        src: NodeId,
        src_offset: u32,
        length: u32,
    ) -> Result<(), HdlError> {
        let pw = self.node(proxy).width;
        let sw = self.node(src).width;
        if dst_offset + length > pw || src_offset + length > sw {
            return Err(HdlError::for_node(
                HdlErrorType::ProxyRangeOverlap,
                &self.name,
                proxy,
                "proxy",
                self.node(proxy).sloc,
                Some(format!(
                    "range [{}, {}) does not fit width {}",
                    dst_offset,
                    dst_offset + length,
                    pw
                )),
            ));
        }
        // find or add the source slot
        let pos = self.node(proxy).srcs.iter().position(|&s| s == src);
        let src_idx = match pos {
            Some(i) => i as u32,
            None => {
                let i = self.node(proxy).srcs.len() as u32;
                self.node_mut(proxy).srcs.push(src);
                i
            }
        };
        let (ws, we) = (dst_offset, dst_offset + length);
        if let NodeKind::Proxy { ranges } = &mut self.node_mut(proxy).kind {
            let mut out: Vec<ProxyRange> = Vec::with_capacity(ranges.len() + 1);
            for r in ranges.iter() {
                let (rs, re) = (r.dst_offset, r.dst_offset + r.length);
                if re <= ws || rs >= we {
                    out.push(*r);
                    continue;
                }
                // keep the non-overlapped parts
                if rs < ws {
                    out.push(ProxyRange {
                        src_idx: r.src_idx,
                        src_offset: r.src_offset,
                        dst_offset: rs,
                        length: ws - rs,
                    });
                }
                if re > we {
                    out.push(ProxyRange {
                        src_idx: r.src_idx,
                        src_offset: r.src_offset + (we - rs),
                        dst_offset: we,
                        length: re - we,
                    });
                }
            }
            out.push(ProxyRange {
                src_idx,
                src_offset,
                dst_offset,
                length,
            });
            out.sort_by_key(|r| r.dst_offset);
            *ranges = out;
        }
        Ok(())
    }

    /**
     * the update slices of a write window: the window split at existing
     * range boundaries, so each piece lies inside a single range (or a gap).
     */
    pub(crate) fn proxy_update_slices(
        &self,
        proxy: NodeId,
        offset: u32,
        length: u32,
    ) -> Vec<(u32, u32)> {
        let mut cuts = vec![offset, offset + length];
        if let NodeKind::Proxy { ranges } = &self.node(proxy).kind {
            for r in ranges {
                for b in &[r.dst_offset, r.dst_offset + r.length] {
                    if *b > offset && *b < offset + length {
                        cuts.push(*b);
                    }
                }
            }
        }
        cuts.sort_unstable();
        cuts.dedup();
        cuts.windows(2).map(|w| (w[0], w[1] - w[0])).collect()
    }

    /**
     * a node carrying the current content of proxy[offset, offset+length).
     * the window must not straddle a range boundary. gaps read as undef.
     */
    pub(crate) fn proxy_slice_value(
        &mut self,
        proxy: NodeId,
        offset: u32,
        length: u32,
        sloc: Option<SourceLoc>,
    ) -> Result<NodeId, HdlError> {
        let found = {
            if let NodeKind::Proxy { ranges } = &self.node(proxy).kind {
                ranges
                    .iter()
                    .find(|r| r.dst_offset <= offset && offset + length <= r.dst_offset + r.length)
                    .map(|r| (r.src_idx, r.src_offset + (offset - r.dst_offset)))
            } else {
                None
            }
        };
        match found {
            Some((src_idx, src_off)) => {
                let src = self.node(proxy).srcs[src_idx as usize];
                self.create_slice(src, src_off, length, sloc)
            }
            None => Ok(self.create_node(length, NodeKind::Undef, vec![], sloc)),
        }
    }

    /**
     * a proxy whose single range forwards a whole source is the source.
     */
    pub(crate) fn is_identity_proxy(&self, id: NodeId) -> bool {
        let n = self.node(id);
        if let NodeKind::Proxy { ranges } = &n.kind {
            if ranges.len() == 1 {
                let r = &ranges[0];
                let src = n.srcs[r.src_idx as usize];
                return r.dst_offset == 0
                    && r.src_offset == 0
                    && r.length == n.width
                    && r.length == self.node(src).width;
            }
        }
        false
    }

    // -- evaluation

    /**
     * evaluates a node for the given time stamp, memoized per stamp so that
     * repeated eval within a phase is idempotent. recursion terminates
     * because every cycle passes through a register or a memory, which do
     * not recurse into their sources here.
     */
    pub(crate) fn eval_node(&mut self, id: NodeId, t: Tick) -> Result<(), HdlError> {
        if self.node(id).ctime == t {
            return Ok(());
        }
        let recurse: Vec<NodeId> = match &self.node(id).kind {
            // tickables and stores update in the two-phase protocol only
            NodeKind::Reg { .. }
            | NodeKind::Mem { .. }
            | NodeKind::MemWr { .. }
            | NodeKind::DelayedAlu { .. } => vec![],
            NodeKind::MemRd { cd: Some(_), .. } => vec![],
            // only the sources the range table still references: overwritten
            // slots may keep a stale undef behind
            NodeKind::Proxy { ranges } => {
                let n = self.node(id);
                ranges
                    .iter()
                    .map(|r| n.srcs[r.src_idx as usize])
                    .collect()
            }
            _ => self.node(id).srcs.clone(),
        };
        for s in recurse {
            self.eval_node(s, t)?;
        }
        self.compute_node(id, t)?;
        self.node_mut(id).ctime = t;
        Ok(())
    }

    /// compute a node value from already-evaluated sources.
    fn compute_node(&mut self, id: NodeId, t: Tick) -> Result<(), HdlError> {
        let value: Option<BitVector> = match &self.node(id).kind {
            NodeKind::Literal
            | NodeKind::Reg { .. }
            | NodeKind::Mem { .. }
            | NodeKind::MemWr { .. }
            | NodeKind::DelayedAlu { .. } => None,
            NodeKind::MemRd { cd: Some(_), .. } => None,
            NodeKind::Undef => {
                let n = self.node(id);
                return Err(HdlError::for_node(
                    HdlErrorType::UndefinedNode,
                    &self.name,
                    id,
                    "undef",
                    n.sloc,
                    Some(String::from("undefined node evaluated")),
                )
                .at_cycle(t >> 2));
            }
            NodeKind::Input { bus } => bus.as_ref().map(|b| b.read()),
            NodeKind::Output { .. } | NodeKind::Tap => {
                let src = self.node(id).srcs[0];
                Some(self.node(src).value.clone())
            }
            NodeKind::Proxy { ranges } => {
                let n = self.node(id);
                let mut v = BitVector::new(n.width);
                for r in ranges {
                    let src = &self.node(n.srcs[r.src_idx as usize]).value;
                    v.copy_slice(r.dst_offset, src, r.src_offset, r.length);
                }
                Some(v)
            }
            NodeKind::Alu { op, signed } => {
                let n = self.node(id);
                let vals: Vec<&BitVector> = n.srcs.iter().map(|&s| &self.node(s).value).collect();
                Some(alu_eval(*op, *signed, n.width, &vals))
            }
            NodeKind::Select { has_key } => Some(self.eval_select(id, *has_key)),
            NodeKind::TickCounter => Some(BitVector::from_u64(t >> 2, 64)),
            NodeKind::MemRd { mem, cd: None, .. } => {
                let n = self.node(id);
                let addr = self.node(n.srcs[0]).value.to_u64();
                let items = match &self.node(*mem).kind {
                    NodeKind::Mem { num_items, .. } => *num_items,
                    _ => unreachable!(),
                };
                check_mem_bounds(addr, items, *mem, t >> 2)?;
                Some(self.mem_read(*mem, addr as u32))
            }
            NodeKind::Assert { message, has_cond } => {
                let n = self.node(id);
                let fire = if *has_cond {
                    !self.node(n.srcs[1]).value.is_zero()
                } else {
                    true
                };
                if fire && self.node(n.srcs[0]).value.is_zero() {
                    return Err(HdlError::for_node(
                        HdlErrorType::AssertionFailed,
                        &self.name,
                        id,
                        "assert",
                        n.sloc,
                        Some(message.clone()),
                    )
                    .at_cycle(t >> 2));
                }
                None
            }
            NodeKind::Print { format, has_cond } => {
                let n = self.node(id);
                let fire = if *has_cond {
                    !self.node(n.srcs[0]).value.is_zero()
                } else {
                    true
                };
                if fire {
                    let args = &n.srcs[if *has_cond { 1 } else { 0 }..];
                    let mut out = String::new();
                    let mut it = args.iter();
                    let mut rest = format.as_str();
                    while let Some(pos) = rest.find("{}") {
                        out.push_str(&rest[..pos]);
                        match it.next() {
                            Some(&a) => out.push_str(&format!("{}", self.node(a).value)),
                            None => out.push_str("{}"),
                        }
                        rest = &rest[pos + 2..];
                    }
                    out.push_str(rest);
                    println!("{}", out);
                }
                None
            }
        };
        if let Some(v) = value {
            self.node_mut(id).value = v;
        }
        Ok(())
    }

    fn eval_select(&self, id: NodeId, has_key: bool) -> BitVector {
        let n = self.node(id);
        if !has_key {
            let cond = &self.node(n.srcs[0]).value;
            let pick = if !cond.is_zero() { n.srcs[1] } else { n.srcs[2] };
            return self.node(pick).value.clone();
        }
        // keyed form: (key, v0, k0, v1, k1, ..., default)
        let key = &self.node(n.srcs[0]).value;
        let mut i = 1;
        while i + 1 < n.srcs.len() {
            if &self.node(n.srcs[i + 1]).value == key {
                return self.node(n.srcs[i]).value.clone();
            }
            i += 2;
        }
        self.node(n.srcs[n.srcs.len() - 1]).value.clone()
    }

    // -- two-phase clock domain protocol

    /**
     * pre-edge phase: detect edges against the previously observed levels,
     * then let every member tickable of a fired domain sample its next
     * state. domains run in creation order.
     */
    pub(crate) fn tick_next(&mut self, t: Tick) -> Result<(), HdlError> {
        for ci in 0..self.cdomains.len() {
            self.cd_tick_next(ci, t)?;
        }
        Ok(())
    }

    /**
     * post-edge phase: commit every member tickable of each fired domain.
     */
    pub(crate) fn tick(&mut self, t: Tick) -> Result<(), HdlError> {
        for ci in 0..self.cdomains.len() {
            self.cd_tick(ci, t)?;
        }
        Ok(())
    }

    fn tickable_tag(&self, id: NodeId) -> TickableTag {
        match &self.node(id).kind {
            NodeKind::Reg {
                enable_idx,
                reset_idx,
                ..
            } => TickableTag::Reg {
                enable_idx: *enable_idx,
                reset_idx: *reset_idx,
            },
            NodeKind::DelayedAlu { op, signed, .. } => TickableTag::DAlu {
                op: *op,
                signed: *signed,
            },
            NodeKind::MemRd { mem, cd: Some(_), .. } => TickableTag::SyncRd { mem: *mem },
            NodeKind::MemWr { mem, .. } => TickableTag::Wr { mem: *mem },
            _ => TickableTag::Other,
        }
    }

    fn cd_tick_next(&mut self, ci: usize, t: Tick) -> Result<(), HdlError> {
        let events = self.cdomains[ci].sensitivity.clone();
        let mut curs = Vec::with_capacity(events.len());
        for ev in &events {
            self.eval_node(ev.signal, t)?;
            curs.push(!self.node(ev.signal).value.is_zero());
        }
        let mut fired = false;
        for (i, ev) in events.iter().enumerate() {
            let prev = self.cdomains[ci].prev[i];
            fired |= match ev.edge {
                Edge::Pos => !prev && curs[i],
                Edge::Neg => prev && !curs[i],
            };
        }
        self.cdomains[ci].prev = curs;
        self.cdomains[ci].fired = fired;
        if fired {
            let ticks = self.cdomains[ci].tickables.clone();
            for id in ticks {
                self.tickable_tick_next(id, t)?;
            }
        }
        Ok(())
    }

    fn cd_tick(&mut self, ci: usize, t: Tick) -> Result<(), HdlError> {
        if !self.cdomains[ci].fired {
            return Ok(());
        }
        self.cdomains[ci].fired = false;
        let ticks = self.cdomains[ci].tickables.clone();
        // write ports commit first so that write-before-read ports resample
        // the committed data, registers next, read ports last
        for &id in &ticks {
            if matches!(&self.node(id).kind, NodeKind::MemWr { .. }) {
                self.tickable_tick(id, t)?;
            }
        }
        for &id in &ticks {
            let is_port = self.node(id).kind.is_memport();
            if !is_port {
                self.tickable_tick(id, t)?;
            }
        }
        for &id in &ticks {
            if matches!(&self.node(id).kind, NodeKind::MemRd { .. }) {
                self.tickable_tick(id, t)?;
            }
        }
        Ok(())
    }

    /**
     * sample the pre-edge state of a tickable.
     */
    fn tickable_tick_next(&mut self, id: NodeId, t: Tick) -> Result<(), HdlError> {
        let srcs = self.node(id).srcs.clone();
        match self.tickable_tag(id) {
            TickableTag::Reg {
                enable_idx,
                reset_idx,
            } => {
                let en = match enable_idx {
                    Some(i) => {
                        self.eval_node(srcs[i], t)?;
                        !self.node(srcs[i]).value.is_zero()
                    }
                    None => true,
                };
                let next = if !en {
                    self.node(id).value.clone()
                } else {
                    let rst = match reset_idx {
                        Some(i) => {
                            self.eval_node(srcs[i], t)?;
                            !self.node(srcs[i]).value.is_zero()
                        }
                        None => false,
                    };
                    let pick = if rst { srcs[1] } else { srcs[0] };
                    self.eval_node(pick, t)?;
                    self.node(pick).value.clone()
                };
                if let NodeKind::Reg {
                    next_value,
                    pending,
                    ..
                } = &mut self.node_mut(id).kind
                {
                    *next_value = next;
                    *pending = true;
                }
            }
            TickableTag::DAlu { op, signed } => {
                let width = self.node(id).width;
                let n_ops = srcs.len() - 1;
                for &s in &srcs {
                    self.eval_node(s, t)?;
                }
                let en = !self.node(srcs[n_ops]).value.is_zero();
                if en {
                    let v = {
                        let vals: Vec<&BitVector> =
                            srcs[..n_ops].iter().map(|&s| &self.node(s).value).collect();
                        alu_eval(op, signed, width, &vals)
                    };
                    if let NodeKind::DelayedAlu {
                        staged, pending, ..
                    } = &mut self.node_mut(id).kind
                    {
                        *staged = v;
                        *pending = true;
                    }
                }
            }
            TickableTag::SyncRd { mem } => {
                self.eval_node(srcs[0], t)?;
                let addr = self.node(srcs[0]).value.to_u64();
                let en = match srcs.get(1) {
                    Some(&e) => {
                        self.eval_node(e, t)?;
                        !self.node(e).value.is_zero()
                    }
                    None => true,
                };
                let (items, write_first) = match &self.node(mem).kind {
                    NodeKind::Mem {
                        num_items,
                        write_first,
                        ..
                    } => (*num_items, *write_first),
                    _ => unreachable!(),
                };
                // read-before-write ports sample here, pre-edge
                let pre = if en && !write_first {
                    check_mem_bounds(addr, items, mem, t >> 2)?;
                    Some(self.mem_read(mem, addr as u32))
                } else {
                    None
                };
                if let NodeKind::MemRd {
                    staged_addr,
                    staged_en,
                    staged_data,
                    pending,
                    ..
                } = &mut self.node_mut(id).kind
                {
                    *staged_addr = addr;
                    *staged_en = en;
                    if let Some(v) = pre {
                        *staged_data = v;
                    }
                    *pending = true;
                }
            }
            TickableTag::Wr { .. } => {
                for &s in &srcs {
                    self.eval_node(s, t)?;
                }
                let addr = self.node(srcs[0]).value.to_u64();
                let data = self.node(srcs[1]).value.clone();
                let en = !self.node(srcs[2]).value.is_zero();
                if let NodeKind::MemWr { staged, .. } = &mut self.node_mut(id).kind {
                    *staged = if en { Some((addr, data)) } else { None };
                }
            }
            TickableTag::Other => {}
        }
        Ok(())
    }

    /**
     * commit the post-edge state of a tickable.
     */
    fn tickable_tick(&mut self, id: NodeId, t: Tick) -> Result<(), HdlError> {
        match self.tickable_tag(id) {
            TickableTag::Reg { .. } => {
                let next = {
                    if let NodeKind::Reg {
                        next_value,
                        pending,
                        ..
                    } = &mut self.node_mut(id).kind
                    {
                        if !*pending {
                            return Ok(());
                        }
                        *pending = false;
                        next_value.clone()
                    } else {
                        unreachable!()
                    }
                };
                self.node_mut(id).value = next;
            }
            TickableTag::DAlu { .. } => {
                let out = {
                    if let NodeKind::DelayedAlu {
                        pipe,
                        staged,
                        pending,
                        ..
                    } = &mut self.node_mut(id).kind
                    {
                        if !*pending {
                            return Ok(());
                        }
                        *pending = false;
                        let out = pipe.remove(0);
                        pipe.push(staged.clone());
                        out
                    } else {
                        unreachable!()
                    }
                };
                self.node_mut(id).value = out;
            }
            TickableTag::Wr { mem } => {
                let staged = {
                    if let NodeKind::MemWr { staged, .. } = &mut self.node_mut(id).kind {
                        staged.take()
                    } else {
                        unreachable!()
                    }
                };
                if let Some((addr, data)) = staged {
                    let (items, dw) = self.mem_geometry(mem);
                    check_mem_bounds(addr, items, mem, t >> 2)?;
                    if let NodeKind::Mem { data: store, .. } = &mut self.node_mut(mem).kind {
                        store.copy_slice(addr as u32 * dw, &data, 0, dw);
                    }
                }
            }
            TickableTag::SyncRd { mem } => {
                let (addr, en, pre) = {
                    if let NodeKind::MemRd {
                        staged_addr,
                        staged_en,
                        staged_data,
                        pending,
                        ..
                    } = &mut self.node_mut(id).kind
                    {
                        if !*pending {
                            return Ok(());
                        }
                        *pending = false;
                        (*staged_addr, *staged_en, staged_data.clone())
                    } else {
                        unreachable!()
                    }
                };
                if !en {
                    return Ok(());
                }
                let (items, write_first) = match &self.node(mem).kind {
                    NodeKind::Mem {
                        num_items,
                        write_first,
                        ..
                    } => (*num_items, *write_first),
                    _ => unreachable!(),
                };
                let out = if write_first {
                    // resample after the write ports committed
                    check_mem_bounds(addr, items, mem, t >> 2)?;
                    self.mem_read(mem, addr as u32)
                } else {
                    pre
                };
                self.node_mut(id).value = out;
            }
            TickableTag::Other => {}
        }
        Ok(())
    }

    fn mem_geometry(&self, mem: NodeId) -> (u32, u32) {
        match &self.node(mem).kind {
            NodeKind::Mem {
                num_items,
                data_width,
                ..
            } => (*num_items, *data_width),
            _ => unreachable!(),
        }
    }

    fn mem_read(&self, mem: NodeId, addr: u32) -> BitVector {
        match &self.node(mem).kind {
            NodeKind::Mem {
                data, data_width, ..
            } => data.read_range(addr * data_width, *data_width),
            _ => unreachable!(),
        }
    }

    /**
     * evaluates outputs, taps, assertions and prints for the given stamp.
     */
    pub(crate) fn eval_roots(&mut self, t: Tick) -> Result<(), HdlError> {
        let outputs = self.outputs.clone();
        for id in outputs {
            self.eval_node(id, t)?;
            let (bus, v) = {
                let n = self.node(id);
                match &n.kind {
                    NodeKind::Output { bus } => (bus.clone(), n.value.clone()),
                    _ => unreachable!(),
                }
            };
            bus.write(&v);
        }
        let taps = self.taps.clone();
        for id in taps {
            self.eval_node(id, t)?;
        }
        let gtaps = self.gtaps.clone();
        for id in gtaps {
            self.eval_node(id, t)?;
        }
        Ok(())
    }

    /**
     * dump the whole node list, one line per node.
     */
    pub fn dump_ast(&self) -> String {
        let mut out = String::new();
        for n in self.nodes.iter().flatten() {
            out.push_str(&n.print_ast());
            out.push('\n');
        }
        out
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        debug!(
            "context '{}' dropped, {} nodes released",
            self.name,
            self.node_count()
        );
    }
}

/**
 * pure combinational evaluation of an alu op. operands are zero- or
 * sign-extended to the result width for the arithmetic class.
 */
pub(crate) fn alu_eval(op: Op, signed: bool, width: u32, vals: &[&BitVector]) -> BitVector {
    let ext = |v: &BitVector| -> BitVector {
        if signed {
            v.sign_extend(width)
        } else {
            v.zero_extend(width)
        }
    };
    let b1 = |b: bool| BitVector::from_u64(b as u64, 1);
    match op {
        Op::Eq => b1(vals[0] == vals[1]),
        Op::Ne => b1(vals[0] != vals[1]),
        Op::Lt | Op::Gt | Op::Le | Op::Ge => {
            let ord = if signed {
                vals[0].cmp_s(vals[1])
            } else {
                vals[0].cmp_u(vals[1])
            };
            b1(match op {
                Op::Lt => ord == std::cmp::Ordering::Less,
                Op::Gt => ord == std::cmp::Ordering::Greater,
                Op::Le => ord != std::cmp::Ordering::Greater,
                _ => ord != std::cmp::Ordering::Less,
            })
        }
        Op::Inv => vals[0].not(),
        Op::And => vals[0].and(vals[1]),
        Op::Or => vals[0].or(vals[1]),
        Op::Xor => vals[0].xor(vals[1]),
        Op::Andr => b1(vals[0].reduce_and()),
        Op::Orr => b1(vals[0].reduce_or()),
        Op::Xorr => b1(vals[0].reduce_xor()),
        Op::Shl => vals[0].shl(vals[1].to_u64().min(u32::MAX as u64) as u32),
        Op::Shr => {
            let amount = vals[1].to_u64().min(u32::MAX as u64) as u32;
            if signed {
                vals[0].sra(amount)
            } else {
                vals[0].shr(amount)
            }
        }
        Op::Neg => ext(vals[0]).neg(),
        Op::Add => ext(vals[0]).add(&ext(vals[1])),
        Op::Sub => ext(vals[0]).sub(&ext(vals[1])),
        Op::Mul => ext(vals[0]).mul(&ext(vals[1])),
        Op::Div => {
            if signed {
                ext(vals[0]).div_s(&ext(vals[1]))
            } else {
                ext(vals[0]).div(&ext(vals[1]))
            }
        }
        Op::Mod => {
            if signed {
                ext(vals[0]).rem_s(&ext(vals[1]))
            } else {
                ext(vals[0]).rem(&ext(vals[1]))
            }
        }
        Op::Pad => ext(vals[0]),
    }
}
