/*
 * Filename: /src/signal.rs
 * Project: rvhdl
 * Created Date: 2021-09-18, 12:11:27
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
use crate::compile::Compiler;
use crate::context::ctx_error::{HdlError, HdlErrorType};
use crate::context::{ctx_begin, ctx_curr, ctx_end, Context};
use crate::node::{NodeId, NodeKind, Op, SourceLoc};
use ::function_name::named;
use log::*;
use std::cell::RefCell;
use std::rc::Rc;

/**
 * a handle to an IR node, the value type of the builder api. every
 * expression over signals records a node in the owning module's context
 * instead of computing a number.
 */
#[derive(Clone, Debug)]
pub struct Signal {
    pub(crate) ctx: Rc<RefCell<Context>>,
    pub(crate) id: NodeId,
    width: u32,
}

impl Signal {
    /**
     * a fresh signal of the given width in the current module, backed by an
     * undef placeholder until written.
     */
    #[track_caller]
    pub fn new(width: u32) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        let ctx = ctx_curr()?;
        let id = ctx.borrow_mut().create_undef_proxy(width, Some(sloc));
        Ok(Signal { ctx, id, width })
    }

    pub(crate) fn from_id(ctx: &Rc<RefCell<Context>>, id: NodeId) -> Signal {
        let width = ctx.borrow().node(id).width;
        Signal {
            ctx: Rc::clone(ctx),
            id,
            width,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /**
     * a literal of this signal's width, interned in its context.
     */
    pub fn lit(&self, value: u64) -> Signal {
        let id = self
            .ctx
            .borrow_mut()
            .literal(BitVector::from_u64(value, self.width));
        Signal {
            ctx: Rc::clone(&self.ctx),
            id,
            width: self.width,
        }
    }

    fn same_ctx(&self, rhs: &Signal, what: &str) -> Result<(), HdlError> {
        if !Rc::ptr_eq(&self.ctx, &rhs.ctx) {
            return Err(HdlError::new_default(
                HdlErrorType::Generic,
                Some(format!("{}: operands belong to different modules", what)),
            ));
        }
        Ok(())
    }

    fn alu2(
        &self,
        op: Op,
        signed: bool,
        width: u32,
        rhs: &Signal,
        what: &str,
        sloc: SourceLoc,
    ) -> Result<Signal, HdlError> {
        self.same_ctx(rhs, what)?;
        let id = self
            .ctx
            .borrow_mut()
            .create_alu(op, signed, width, vec![self.id, rhs.id], Some(sloc))?;
        Ok(Signal::from_id(&self.ctx, id))
    }

    fn alu1(
        &self,
        op: Op,
        signed: bool,
        width: u32,
        sloc: SourceLoc,
    ) -> Result<Signal, HdlError> {
        let id = self
            .ctx
            .borrow_mut()
            .create_alu(op, signed, width, vec![self.id], Some(sloc))?;
        Ok(Signal::from_id(&self.ctx, id))
    }

    // -- bitwise

    #[track_caller]
    #[named]
    pub fn and(&self, rhs: &Signal) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        self.alu2(Op::And, false, self.width, rhs, function_name!(), sloc)
    }

    #[track_caller]
    #[named]
    pub fn or(&self, rhs: &Signal) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        self.alu2(Op::Or, false, self.width, rhs, function_name!(), sloc)
    }

    #[track_caller]
    #[named]
    pub fn xor(&self, rhs: &Signal) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        self.alu2(Op::Xor, false, self.width, rhs, function_name!(), sloc)
    }

    #[track_caller]
    pub fn inv(&self) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        self.alu1(Op::Inv, false, self.width, sloc)
    }

    // -- equality and relational, output is a single bit

    #[track_caller]
    #[named]
    pub fn eq(&self, rhs: &Signal) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        self.alu2(Op::Eq, false, 1, rhs, function_name!(), sloc)
    }

    #[track_caller]
    #[named]
    pub fn ne(&self, rhs: &Signal) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        self.alu2(Op::Ne, false, 1, rhs, function_name!(), sloc)
    }

    #[track_caller]
    #[named]
    pub fn lt(&self, rhs: &Signal) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        self.alu2(Op::Lt, false, 1, rhs, function_name!(), sloc)
    }

    #[track_caller]
    #[named]
    pub fn gt(&self, rhs: &Signal) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        self.alu2(Op::Gt, false, 1, rhs, function_name!(), sloc)
    }

    #[track_caller]
    #[named]
    pub fn le(&self, rhs: &Signal) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        self.alu2(Op::Le, false, 1, rhs, function_name!(), sloc)
    }

    #[track_caller]
    #[named]
    pub fn ge(&self, rhs: &Signal) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        self.alu2(Op::Ge, false, 1, rhs, function_name!(), sloc)
    }

    /// signed (two's complement) relational variants.
    #[track_caller]
    #[named]
    pub fn lt_s(&self, rhs: &Signal) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        self.alu2(Op::Lt, true, 1, rhs, function_name!(), sloc)
    }

    #[track_caller]
    #[named]
    pub fn gt_s(&self, rhs: &Signal) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        self.alu2(Op::Gt, true, 1, rhs, function_name!(), sloc)
    }

    // -- reduce

    #[track_caller]
    pub fn andr(&self) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        self.alu1(Op::Andr, false, 1, sloc)
    }

    #[track_caller]
    pub fn orr(&self) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        self.alu1(Op::Orr, false, 1, sloc)
    }

    #[track_caller]
    pub fn xorr(&self) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        self.alu1(Op::Xorr, false, 1, sloc)
    }

    // -- shift, result width follows the left operand

    #[track_caller]
    #[named]
    pub fn shl(&self, rhs: &Signal) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        self.alu2(Op::Shl, false, self.width, rhs, function_name!(), sloc)
    }

    #[track_caller]
    #[named]
    pub fn shr(&self, rhs: &Signal) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        self.alu2(Op::Shr, false, self.width, rhs, function_name!(), sloc)
    }

    /// arithmetic shift right, filling with the sign bit.
    #[track_caller]
    #[named]
    pub fn sra(&self, rhs: &Signal) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        self.alu2(Op::Shr, true, self.width, rhs, function_name!(), sloc)
    }

    // -- arithmetic, result width is the wider operand unless padded first

    #[track_caller]
    #[named]
    pub fn add(&self, rhs: &Signal) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        let w = self.width.max(rhs.width);
        self.alu2(Op::Add, false, w, rhs, function_name!(), sloc)
    }

    #[track_caller]
    #[named]
    pub fn sub(&self, rhs: &Signal) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        let w = self.width.max(rhs.width);
        self.alu2(Op::Sub, false, w, rhs, function_name!(), sloc)
    }

    #[track_caller]
    #[named]
    pub fn mul(&self, rhs: &Signal) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        let w = self.width.max(rhs.width);
        self.alu2(Op::Mul, false, w, rhs, function_name!(), sloc)
    }

    #[track_caller]
    #[named]
    pub fn div(&self, rhs: &Signal) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        let w = self.width.max(rhs.width);
        self.alu2(Op::Div, false, w, rhs, function_name!(), sloc)
    }

    #[track_caller]
    #[named]
    pub fn rem(&self, rhs: &Signal) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        let w = self.width.max(rhs.width);
        self.alu2(Op::Mod, false, w, rhs, function_name!(), sloc)
    }

    #[track_caller]
    #[named]
    pub fn div_s(&self, rhs: &Signal) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        let w = self.width.max(rhs.width);
        self.alu2(Op::Div, true, w, rhs, function_name!(), sloc)
    }

    #[track_caller]
    #[named]
    pub fn rem_s(&self, rhs: &Signal) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        let w = self.width.max(rhs.width);
        self.alu2(Op::Mod, true, w, rhs, function_name!(), sloc)
    }

    #[track_caller]
    pub fn neg(&self) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        self.alu1(Op::Neg, false, self.width, sloc)
    }

    /// zero extension to a wider width.
    #[track_caller]
    pub fn pad(&self, width: u32) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        self.alu1(Op::Pad, false, width, sloc)
    }

    /// sign extension to a wider width.
    #[track_caller]
    pub fn sext(&self, width: u32) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        self.alu1(Op::Pad, true, width, sloc)
    }

    // -- slicing and concatenation

    /**
     * a view of `length` bits starting at `offset`.
     */
    #[track_caller]
    pub fn slice(&self, offset: u32, length: u32) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        let id = self
            .ctx
            .borrow_mut()
            .create_slice(self.id, offset, length, Some(sloc))?;
        Ok(Signal::from_id(&self.ctx, id))
    }

    /// a single bit.
    #[track_caller]
    pub fn bit(&self, i: u32) -> Result<Signal, HdlError> {
        self.slice(i, 1)
    }

    /**
     * concatenation, `self` occupies the low bits and `high` the top ones.
     */
    #[track_caller]
    #[named]
    pub fn concat(&self, high: &Signal) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        self.same_ctx(high, function_name!())?;
        let mut ctx = self.ctx.borrow_mut();
        let p = ctx.create_proxy(self.width + high.width, Some(sloc));
        ctx.proxy_add_source(p, 0, self.id, 0, self.width)?;
        ctx.proxy_add_source(p, self.width, high.id, 0, high.width)?;
        drop(ctx);
        Ok(Signal::from_id(&self.ctx, p))
    }

    /// rotate left by a constant amount.
    #[track_caller]
    pub fn rotl(&self, amount: u32) -> Result<Signal, HdlError> {
        let n = amount % self.width;
        if n == 0 {
            return Ok(self.clone());
        }
        // low part moves up, top part wraps to the bottom
        let hi = self.slice(self.width - n, n)?;
        let lo = self.slice(0, self.width - n)?;
        hi.concat(&lo)
    }

    /// rotate right by a constant amount.
    #[track_caller]
    pub fn rotr(&self, amount: u32) -> Result<Signal, HdlError> {
        let n = amount % self.width;
        if n == 0 {
            return Ok(self.clone());
        }
        let lo = self.slice(0, n)?;
        let hi = self.slice(n, self.width - n)?;
        hi.concat(&lo)
    }

    // -- assignment

    /**
     * whole-signal assignment. inside a conditional scope the write routes
     * through the resolver and becomes a multiplexer chain.
     */
    #[track_caller]
    pub fn assign(&mut self, src: &Signal) -> Result<(), HdlError> {
        if src.width != self.width {
            return Err(HdlError::new_default(
                HdlErrorType::WidthMismatch,
                Some(format!(
                    "assign: source width {} != target width {}",
                    src.width, self.width
                )),
            ));
        }
        self.write(0, src, 0, src.width)
    }

    /**
     * partial assignment of `length` bits of `src` (from `src_offset`) into
     * this signal at `dst_offset`.
     */
    #[track_caller]
    #[named]
    pub fn write(
        &mut self,
        dst_offset: u32,
        src: &Signal,
        src_offset: u32,
        length: u32,
    ) -> Result<(), HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        self.same_ctx(src, function_name!())?;
        let mut ctx = self.ctx.borrow_mut();
        // writable targets are proxies, wrap anything else
        let is_proxy = matches!(&ctx.node(self.id).kind, NodeKind::Proxy { .. });
        if !is_proxy {
            let p = ctx.create_proxy(self.width, Some(sloc));
            ctx.proxy_add_source(p, 0, self.id, 0, self.width)?;
            self.id = p;
        }
        if ctx.has_conditionals() && ctx.conditional_enabled(self.id) {
            // split the window at existing range boundaries and mux each
            // slice independently
            let slices = ctx.proxy_update_slices(self.id, dst_offset, length);
            for (off, len) in slices {
                let s = if off == dst_offset && len == length && src_offset == 0 && length == src.width
                {
                    src.id
                } else {
                    ctx.create_slice(src.id, src_offset + (off - dst_offset), len, Some(sloc))?
                };
                ctx.conditional_assign(self.id, off, len, s, Some(sloc))?;
            }
        } else {
            ctx.proxy_add_source(self.id, dst_offset, src.id, src_offset, length)?;
        }
        Ok(())
    }
}

/**
 * concatenation of many parts, `parts[0]` at the low end.
 */
#[track_caller]
pub fn concat(parts: &[&Signal]) -> Result<Signal, HdlError> {
    if parts.is_empty() {
        return Err(HdlError::new_default(
            HdlErrorType::Generic,
            Some(String::from("concat: no parts")),
        ));
    }
    let mut out = parts[0].clone();
    for p in &parts[1..] {
        out = out.concat(p)?;
    }
    Ok(out)
}

/**
 * the module builder: owns a context, makes it current for the duration of
 * the description, and compiles it into a Device.
 */
pub struct Module {
    pub(crate) ctx: Rc<RefCell<Context>>,
    active: bool,
}

impl Module {
    /**
     * opens a new module and makes it the current context of this thread.
     * nesting is allowed, the enclosing module is restored on compile/drop.
     */
    pub fn new(name: &str) -> Module {
        let ctx = Rc::new(RefCell::new(Context::new(name)));
        ctx_begin(&ctx);
        debug!("module '{}' open", name);
        Module { ctx, active: true }
    }

    pub fn name(&self) -> String {
        self.ctx.borrow().name().to_string()
    }

    /// a fresh assignable signal, undef until written.
    #[track_caller]
    pub fn signal(&self, width: u32) -> Signal {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        let id = self.ctx.borrow_mut().create_undef_proxy(width, Some(sloc));
        Signal::from_id(&self.ctx, id)
    }

    /// an interned literal.
    pub fn lit(&self, value: u64, width: u32) -> Signal {
        let id = self
            .ctx
            .borrow_mut()
            .literal(BitVector::from_u64(value, width));
        Signal::from_id(&self.ctx, id)
    }

    /// an interned wide literal.
    pub fn lit_bv(&self, value: BitVector) -> Signal {
        let id = self.ctx.borrow_mut().literal(value);
        Signal::from_id(&self.ctx, id)
    }

    /**
     * an input port bound to a host bus the simulator samples every tick.
     */
    #[track_caller]
    pub fn input(&mut self, name: &str, width: u32) -> (Signal, Bus) {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        let (id, bus) = self.ctx.borrow_mut().bind_input(name, width, Some(sloc));
        (Signal::from_id(&self.ctx, id), bus)
    }

    /**
     * an output port driven into a host bus every tick.
     */
    #[track_caller]
    pub fn output(&mut self, name: &str, src: &Signal) -> Result<Bus, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        if !Rc::ptr_eq(&self.ctx, &src.ctx) {
            return Err(HdlError::new_default(
                HdlErrorType::Generic,
                Some(String::from("output: signal belongs to another module")),
            ));
        }
        let (_, bus) = self.ctx.borrow_mut().bind_output(name, src.id, Some(sloc));
        Ok(bus)
    }

    /**
     * a named debug probe, a root for dead code elimination and a tracing
     * hook. duplicate names get `_0, _1, ...` suffixes.
     */
    #[track_caller]
    pub fn tap(&mut self, name: &str, src: &Signal) -> Result<(), HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        if !Rc::ptr_eq(&self.ctx, &src.ctx) {
            return Err(HdlError::new_default(
                HdlErrorType::Generic,
                Some(String::from("tap: signal belongs to another module")),
            ));
        }
        self.ctx.borrow_mut().register_tap(name, src.id, Some(sloc));
        Ok(())
    }

    /// the free-running 64-bit cycle counter.
    pub fn tick(&mut self) -> Signal {
        let id = self.ctx.borrow_mut().tick_counter();
        Signal::from_id(&self.ctx, id)
    }

    /**
     * a per-tick check: aborts the simulation with the message when the
     * guard is zero. inside a conditional scope the check only fires when
     * the enclosing condition holds.
     */
    #[track_caller]
    pub fn assert_(&mut self, guard: &Signal, message: &str) -> Result<(), HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        let mut ctx = self.ctx.borrow_mut();
        let cond = ctx.effective_cond(None)?;
        let mut srcs = vec![guard.id];
        if let Some(c) = cond {
            srcs.push(c);
        }
        let id = ctx.create_node(
            1,
            NodeKind::Assert {
                message: message.to_string(),
                has_cond: cond.is_some(),
            },
            srcs,
            Some(sloc),
        );
        ctx.gtaps.push(id);
        Ok(())
    }

    /**
     * a per-tick formatted debug print, `{}` placeholders consume the
     * arguments in order. guarded by the enclosing condition like asserts.
     */
    #[track_caller]
    pub fn print(&mut self, format: &str, args: &[&Signal]) -> Result<(), HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        let mut ctx = self.ctx.borrow_mut();
        let cond = ctx.effective_cond(None)?;
        let mut srcs = Vec::new();
        if let Some(c) = cond {
            srcs.push(c);
        }
        srcs.extend(args.iter().map(|a| a.id));
        let id = ctx.create_node(
            1,
            NodeKind::Print {
                format: format.to_string(),
                has_cond: cond.is_some(),
            },
            srcs,
            Some(sloc),
        );
        ctx.gtaps.push(id);
        Ok(())
    }

    // -- clock and reset scopes

    pub fn push_clock(&mut self, clk: &Signal) {
        self.ctx.borrow_mut().push_clock(clk.id);
    }

    pub fn pop_clock(&mut self) {
        self.ctx.borrow_mut().pop_clock();
    }

    pub fn push_reset(&mut self, reset: &Signal) {
        self.ctx.borrow_mut().push_reset(reset.id);
    }

    pub fn pop_reset(&mut self) {
        self.ctx.borrow_mut().pop_reset();
    }

    /**
     * finalizes the module: runs the compiler passes and yields the
     * simulatable device. the enclosing module (if any) becomes current
     * again.
     */
    pub fn compile(mut self) -> Result<Device, HdlError> {
        self.active = false;
        ctx_end();
        Compiler::new().run(&mut self.ctx.borrow_mut())?;
        Ok(Device {
            ctx: Rc::clone(&self.ctx),
        })
    }
}

impl Drop for Module {
    fn drop(&mut self) {
        if self.active {
            ctx_end();
        }
    }
}

/**
 * a compiled module, ready for simulation.
 */
#[derive(Debug)]
pub struct Device {
    pub(crate) ctx: Rc<RefCell<Context>>,
}

impl Device {
    pub fn name(&self) -> String {
        self.ctx.borrow().name().to_string()
    }

    /// live node count after compilation.
    pub fn node_count(&self) -> usize {
        self.ctx.borrow().node_count()
    }

    /**
     * the host bus of a named input port.
     */
    pub fn input_bus(&self, name: &str) -> Result<Bus, HdlError> {
        let ctx = self.ctx.borrow();
        for &id in &ctx.inputs {
            let n = ctx.node(id);
            if n.name.as_deref() == Some(name) {
                if let NodeKind::Input { bus: Some(b) } = &n.kind {
                    return Ok(b.clone());
                }
            }
        }
        Err(HdlError::new_default(
            HdlErrorType::Generic,
            Some(format!("no input port '{}'", name)),
        ))
    }

    /**
     * the host bus of a named output port.
     */
    pub fn output_bus(&self, name: &str) -> Result<Bus, HdlError> {
        let ctx = self.ctx.borrow();
        for &id in &ctx.outputs {
            let n = ctx.node(id);
            if n.name.as_deref() == Some(name) {
                if let NodeKind::Output { bus } = &n.kind {
                    return Ok(bus.clone());
                }
            }
        }
        Err(HdlError::new_default(
            HdlErrorType::Generic,
            Some(format!("no output port '{}'", name)),
        ))
    }

    /**
     * the host bus of the default reset input, if the module uses one.
     */
    pub fn reset_bus(&self) -> Option<Bus> {
        self.ctx.borrow().default_reset_bus()
    }

    /// one line per live node.
    pub fn dump_ast(&self) -> String {
        self.ctx.borrow().dump_ast()
    }

    /**
     * live nodes of a given kind name, handy for structural checks.
     */
    pub fn count_kind(&self, kind: &str) -> usize {
        let ctx = self.ctx.borrow();
        ctx.node_ids()
            .iter()
            .filter(|&&id| ctx.node(id).kind.name() == kind)
            .count()
    }

    /**
     * re-runs the compiler passes. the pass set is idempotent, the live set
     * does not change on a second run.
     */
    pub fn recompile(&self) -> Result<usize, HdlError> {
        Compiler::new().run(&mut self.ctx.borrow_mut())?;
        Ok(self.node_count())
    }
}
