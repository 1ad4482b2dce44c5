/*
 * Filename: /src/cdomain.rs
 * Project: rvhdl
 * Created Date: 2021-09-14, 08:22:31
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

use crate::node::NodeId;

/**
 * the clock edge a domain is sensitive to.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Pos,
    Neg,
}

/**
 * one entry of a domain's sensitivity list.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockEvent {
    pub signal: NodeId,
    pub edge: Edge,
}

/**
 * a clock domain groups every tickable (register, delayed alu, synchronous
 * memory port) sharing the same sensitivity list. two domains with identical
 * sensitivity lists are the same domain, deduplicated at creation. domains
 * tick in creation order.
 */
#[derive(Debug, Clone)]
pub struct ClockDomain {
    /// ordered, deduplicated (signal, edge) pairs.
    pub sensitivity: Vec<ClockEvent>,
    /// member tickable nodes, in registration order.
    pub tickables: Vec<NodeId>,
    /// last observed level of each sensitivity signal.
    pub(crate) prev: Vec<bool>,
    /// set by the pre-edge phase when an edge was detected this tick.
    pub(crate) fired: bool,
}

impl ClockDomain {
    pub fn new(sensitivity: Vec<ClockEvent>) -> ClockDomain {
        let n = sensitivity.len();
        ClockDomain {
            sensitivity,
            tickables: Vec::new(),
            prev: vec![false; n],
            fired: false,
        }
    }

    /**
     * true if this domain has the exact same sensitivity list.
     */
    pub fn matches(&self, sensitivity: &[ClockEvent]) -> bool {
        self.sensitivity == sensitivity
    }

    pub fn add_tickable(&mut self, id: NodeId) {
        if !self.tickables.contains(&id) {
            self.tickables.push(id);
        }
    }

    pub fn remove_tickable(&mut self, id: NodeId) {
        self.tickables.retain(|t| *t != id);
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.tickables.contains(&id)
    }
}

/**
 * deduplicate a sensitivity list, keeping first occurrences in order.
 */
pub fn dedup_events(events: &[ClockEvent]) -> Vec<ClockEvent> {
    let mut out: Vec<ClockEvent> = Vec::with_capacity(events.len());
    for ev in events {
        if !out.contains(ev) {
            out.push(*ev);
        }
    }
    out
}
