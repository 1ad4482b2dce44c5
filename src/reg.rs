/*
 * Filename: /src/reg.rs
 * Project: rvhdl
 * Created Date: 2021-09-21, 09:02:50
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
use crate::cdomain::{ClockEvent, Edge};
use crate::context::ctx_error::{HdlError, HdlErrorType};
use crate::node::{NodeId, NodeKind, Op, SourceLoc};
use crate::signal::{Module, Signal};

/**
 * a clocked register of the clock domain in scope. `next` is an assignable
 * signal fed back into the register, `q` outputs the value latched at the
 * previous clock edge.
 */
pub struct Reg {
    pub next: Signal,
    pub q: Signal,
}

impl Module {
    fn make_reg(
        &mut self,
        next: NodeId,
        init: NodeId,
        enable: Option<NodeId>,
        reset: Option<NodeId>,
        async_reset: bool,
        sloc: SourceLoc,
    ) -> Result<NodeId, HdlError> {
        let mut ctx = self.ctx.borrow_mut();
        let width = ctx.node(next).width;
        if width != ctx.node(init).width {
            return Err(HdlError::new_default(
                HdlErrorType::WidthMismatch,
                Some(format!(
                    "reg: next width {} != init width {}",
                    width,
                    ctx.node(init).width
                )),
            ));
        }
        let mut srcs = vec![next, init];
        let enable_idx = enable.map(|e| {
            srcs.push(e);
            srcs.len() - 1
        });
        let reset_idx = reset.map(|r| {
            srcs.push(r);
            srcs.len() - 1
        });
        // an asynchronous reset joins the sensitivity list itself
        let cd = if async_reset {
            let clk = ctx.get_clk();
            let rst = reset.expect("async reset without reset source");
            ctx.create_cdomain(vec![
                ClockEvent {
                    signal: clk,
                    edge: Edge::Pos,
                },
                ClockEvent {
                    signal: rst,
                    edge: Edge::Pos,
                },
            ])
        } else {
            ctx.current_cdomain()
        };
        let id = ctx.create_node(
            width,
            NodeKind::Reg {
                cd,
                enable_idx,
                reset_idx,
                next_value: BitVector::new(width),
                pending: false,
            },
            srcs,
            Some(sloc),
        );
        // the register powers up holding its init value
        let iv = ctx.node(init).value.clone();
        ctx.node_mut(id).value = iv;
        ctx.add_tickable(cd, id);
        Ok(id)
    }

    /**
     * a register with a write-back `next` signal, initial value `init`.
     */
    #[track_caller]
    pub fn reg(&mut self, width: u32, init: u64) -> Result<Reg, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        let next = self.signal(width);
        let init = self.lit(init, width);
        let id = self.make_reg(next.id(), init.id(), None, None, false, sloc)?;
        Ok(Reg {
            next,
            q: Signal::from_id(&self.ctx, id),
        })
    }

    /**
     * a register gated by an enable predicate.
     */
    #[track_caller]
    pub fn reg_en(&mut self, width: u32, init: u64, enable: &Signal) -> Result<Reg, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        let next = self.signal(width);
        let init = self.lit(init, width);
        let id = self.make_reg(next.id(), init.id(), Some(enable.id()), None, false, sloc)?;
        Ok(Reg {
            next,
            q: Signal::from_id(&self.ctx, id),
        })
    }

    /**
     * feed-forward register: latches `next` every clock edge.
     */
    #[track_caller]
    pub fn reg_next(&mut self, next: &Signal, init: u64) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        let init = self.lit(init, next.width());
        let id = self.make_reg(next.id(), init.id(), None, None, false, sloc)?;
        Ok(Signal::from_id(&self.ctx, id))
    }

    /**
     * full latch form: `(next, init, enable, reset)`. a reset of none uses
     * the module's reset in scope (lazily created when absent). reset is
     * synchronous active-high, loading `init`.
     */
    #[track_caller]
    pub fn latch(
        &mut self,
        next: &Signal,
        enable: &Signal,
        init: &Signal,
        reset: Option<&Signal>,
    ) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        let reset = match reset {
            Some(r) => r.id(),
            None => self.ctx.borrow_mut().get_reset(),
        };
        let id = self.make_reg(next.id(), init.id(), Some(enable.id()), Some(reset), false, sloc)?;
        Ok(Signal::from_id(&self.ctx, id))
    }

    /**
     * latch with an asynchronous reset: the reset signal joins the clock
     * domain's sensitivity list, so its rising edge reloads `init` without
     * waiting for a clock edge.
     */
    #[track_caller]
    pub fn latch_async(
        &mut self,
        next: &Signal,
        enable: &Signal,
        init: &Signal,
        reset: &Signal,
    ) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        let id = self.make_reg(
            next.id(),
            init.id(),
            Some(enable.id()),
            Some(reset.id()),
            true,
            sloc,
        )?;
        Ok(Signal::from_id(&self.ctx, id))
    }

    /**
     * delays a signal by `n` clock cycles through a register chain.
     */
    #[track_caller]
    pub fn delay(&mut self, sig: &Signal, n: u32) -> Result<Signal, HdlError> {
        let mut out = sig.clone();
        for _ in 0..n {
            out = self.reg_next(&out, 0)?;
        }
        Ok(out)
    }

    fn make_delayed_alu(
        &mut self,
        op: Op,
        signed: bool,
        a: &Signal,
        b: &Signal,
        delay: u32,
        enable: Option<&Signal>,
        sloc: SourceLoc,
    ) -> Result<Signal, HdlError> {
        if delay == 0 {
            return Err(HdlError::new_default(
                HdlErrorType::Generic,
                Some(String::from("delayed alu needs a delay of at least 1")),
            ));
        }
        let enable = match enable {
            Some(e) => e.clone(),
            None => self.lit(1, 1),
        };
        let mut ctx = self.ctx.borrow_mut();
        let width = a.width().max(b.width());
        ctx.check_alu(op, width, &[a.id(), b.id()])?;
        let cd = ctx.current_cdomain();
        let id = ctx.create_node(
            width,
            NodeKind::DelayedAlu {
                op,
                signed,
                cd,
                pipe: vec![BitVector::new(width); delay as usize],
                staged: BitVector::new(width),
                pending: false,
            },
            vec![a.id(), b.id(), enable.id()],
            Some(sloc),
        );
        ctx.add_tickable(cd, id);
        drop(ctx);
        Ok(Signal::from_id(&self.ctx, id))
    }

    /**
     * multi-cycle multiplier: the product of the operands sampled at tick t
     * appears at tick t+delay. stalls while the enable is low.
     */
    #[track_caller]
    pub fn mul_delayed(
        &mut self,
        a: &Signal,
        b: &Signal,
        delay: u32,
        enable: Option<&Signal>,
    ) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        self.make_delayed_alu(Op::Mul, false, a, b, delay, enable, sloc)
    }

    /**
     * multi-cycle divider, same pipeline discipline as mul_delayed.
     */
    #[track_caller]
    pub fn div_delayed(
        &mut self,
        a: &Signal,
        b: &Signal,
        delay: u32,
        enable: Option<&Signal>,
    ) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        self.make_delayed_alu(Op::Div, false, a, b, delay, enable, sloc)
    }
}
