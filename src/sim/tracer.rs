/*
 * Filename: /src/sim/tracer.rs
 * Project: rvhdl
 * Created Date: 2021-09-28, 19:31:02
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
use crate::context::ctx_error::HdlError;
use crate::node::{NodeId, NodeKind};
use crate::signal::Device;
use crate::sim::Simulator;
use log::*;

/// records per trace block before a new block is chained.
const TRACE_BLOCK_SIZE: usize = 4096;

#[derive(Debug)]
pub(crate) struct TraceSignal {
    pub id: NodeId,
    pub name: String,
    pub width: u32,
    prev: Option<BitVector>,
}

/// one `(signal, tick, value)` sample.
#[derive(Debug)]
pub(crate) struct TraceRecord {
    pub signal: usize,
    pub tick: u64,
    pub value: BitVector,
}

#[derive(Debug)]
struct TraceBlock {
    records: Vec<TraceRecord>,
}

/**
 * a simulator that additionally samples the enrolled signals after every
 * tick, appending change records to a chain of fixed-capacity trace blocks.
 * inputs, outputs and taps are enrolled up front.
 */
pub struct Tracer {
    sim: Simulator,
    pub(crate) signals: Vec<TraceSignal>,
    blocks: Vec<TraceBlock>,
    pub(crate) module: String,
}

impl Tracer {
    pub fn new(device: &Device) -> Tracer {
        let mut signals = Vec::new();
        {
            let ctx = device.ctx.borrow();
            let mut enroll = |ids: &[NodeId]| {
                for &id in ids {
                    let n = ctx.node(id);
                    // the sim-driven default clock carries no host bus and
                    // is not worth a waveform
                    if let NodeKind::Input { bus: None } = &n.kind {
                        continue;
                    }
                    signals.push(TraceSignal {
                        id,
                        name: n.name.clone().unwrap_or_else(|| format!("n{}", id)),
                        width: n.width,
                        prev: None,
                    });
                }
            };
            enroll(&ctx.inputs);
            enroll(&ctx.outputs);
            enroll(&ctx.taps);
        }
        debug!("tracer: {} signals enrolled", signals.len());
        Tracer {
            sim: Simulator::new(device),
            signals,
            blocks: Vec::new(),
            module: device.name(),
        }
    }

    pub fn sim(&self) -> &Simulator {
        &self.sim
    }

    fn append(&mut self, rec: TraceRecord) {
        let need_block = match self.blocks.last() {
            Some(b) => b.records.len() >= TRACE_BLOCK_SIZE,
            None => true,
        };
        if need_block {
            self.blocks.push(TraceBlock {
                records: Vec::with_capacity(TRACE_BLOCK_SIZE),
            });
        }
        if let Some(b) = self.blocks.last_mut() {
            b.records.push(rec);
        }
    }

    fn sample(&mut self) {
        let t = self.sim.cycle() - 1;
        let ctx = self.sim.ctx();
        let ctx = ctx.borrow();
        let mut changed: Vec<TraceRecord> = Vec::new();
        for (i, ts) in self.signals.iter_mut().enumerate() {
            let v = ctx.node(ts.id).value.clone();
            let same = match &ts.prev {
                Some(p) => *p == v,
                None => false,
            };
            if !same {
                ts.prev = Some(v.clone());
                changed.push(TraceRecord {
                    signal: i,
                    tick: t,
                    value: v,
                });
            }
        }
        drop(ctx);
        for rec in changed {
            self.append(rec);
        }
    }

    /**
     * one tick plus a sampling pass.
     */
    pub fn step(&mut self) -> Result<(), HdlError> {
        self.sim.step()?;
        self.sample();
        Ok(())
    }

    pub fn run(&mut self, n_cycles: u64) -> Result<u64, HdlError> {
        for _ in 0..n_cycles {
            self.step()?;
        }
        Ok(self.sim.cycle())
    }

    pub fn tap_value(&self, name: &str) -> Result<BitVector, HdlError> {
        self.sim.tap_value(name)
    }

    pub(crate) fn records(&self) -> impl Iterator<Item = &TraceRecord> {
        self.blocks.iter().flat_map(|b| b.records.iter())
    }

    /**
     * textual dump, one line per change record.
     */
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for r in self.records() {
            out.push_str(&format!(
                "#{} {} = {}\n",
                r.tick, self.signals[r.signal].name, r.value
            ));
        }
        out
    }
}
