/*
 * Filename: /src/sim.rs
 * Project: rvhdl
 * Created Date: 2021-09-26, 16:44:19
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
use crate::context::Context;
use crate::node::{NodeId, Tick};
use crate::signal::Device;
use crate::utils;
use log::*;
use std::cell::RefCell;
use std::rc::Rc;

pub mod tracer;
pub mod vcd;

/**
 * the tick-driven evaluator. each tick:
 *
 * 1. every clock domain samples (`tick_next`), in creation order;
 * 2. every clock domain commits (`tick`);
 * 3. outputs, taps, assertions and prints evaluate post-edge.
 *
 * the lazily-created default clock is driven free-running, one rising edge
 * per tick. internally each tick spans three evaluation stamps (pre-edge,
 * falling phase, post-edge) so that the per-stamp memoization never leaks a
 * pre-edge value into the post-edge evaluation.
 */
pub struct Simulator {
    ctx: Rc<RefCell<Context>>,
    t: Tick,
}

impl Simulator {
    /**
     * activate logging on stdout trough env_logger (max level).
     */
    pub fn enable_logging(enable: bool) {
        utils::enable_logging_internal(enable);
    }

    /**
     * creates a simulator over a compiled device.
     */
    pub fn new(device: &Device) -> Simulator {
        Simulator {
            ctx: Rc::clone(&device.ctx),
            t: 0,
        }
    }

    /// ticks executed so far.
    pub fn cycle(&self) -> u64 {
        self.t
    }

    fn drive(ctx: &mut Context, id: NodeId, level: bool, stamp: Tick) {
        ctx.node_mut(id).value = BitVector::from_u64(level as u64, 1);
        ctx.node_mut(id).ctime = stamp;
    }

    /**
     * executes one tick. host-bound inputs are read from their buses during
     * the pre-edge phase, edge detection compares against the prior tick's
     * level.
     */
    pub fn step(&mut self) -> Result<(), HdlError> {
        let t = self.t;
        let stamp0 = t << 2;
        let stamp1 = stamp0 | 1;
        let stamp2 = stamp0 | 2;
        let mut ctx = self.ctx.borrow_mut();
        let clk = ctx.default_clk();
        // rising phase of the free-running default clock
        if let Some(clk) = clk {
            Self::drive(&mut ctx, clk, true, stamp0);
        }
        ctx.tick_next(stamp0)?;
        ctx.tick(stamp0)?;
        if let Some(clk) = clk {
            // falling phase: rearms the edge detector and serves
            // negedge-sensitive domains
            Self::drive(&mut ctx, clk, false, stamp1);
            ctx.tick_next(stamp1)?;
            ctx.tick(stamp1)?;
        }
        ctx.eval_roots(stamp2)?;
        drop(ctx);
        self.t += 1;
        Ok(())
    }

    /**
     * runs for `n_cycles` ticks, returns the total tick count. a failed
     * assertion aborts the loop with the error.
     */
    pub fn run(&mut self, n_cycles: u64) -> Result<u64, HdlError> {
        for _ in 0..n_cycles {
            self.step()?;
        }
        Ok(self.t)
    }

    /**
     * runs while the host predicate holds, checking after every tick.
     */
    pub fn run_while<F>(&mut self, mut pred: F) -> Result<u64, HdlError>
    where
        F: FnMut(&Simulator) -> bool,
    {
        loop {
            self.step()?;
            if !pred(self) {
                break;
            }
        }
        Ok(self.t)
    }

    /**
     * the last evaluated value of a named debug probe.
     */
    pub fn tap_value(&self, name: &str) -> Result<BitVector, HdlError> {
        let ctx = self.ctx.borrow();
        let id = ctx.get_tap(name)?;
        Ok(ctx.node(id).value.clone())
    }

    /// one line per live node.
    pub fn dump_ast(&self) -> String {
        self.ctx.borrow().dump_ast()
    }

    pub(crate) fn ctx(&self) -> Rc<RefCell<Context>> {
        Rc::clone(&self.ctx)
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        debug!("simulator stopped after {} cycles", self.t);
    }
}
