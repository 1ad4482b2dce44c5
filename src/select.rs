/*
 * Filename: /src/select.rs
 * Project: rvhdl
 * Created Date: 2021-09-19, 17:48:09
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

use crate::context::ctx_error::{HdlError, HdlErrorType};
use crate::node::SourceLoc;
use crate::signal::{Module, Signal};
use std::rc::Rc;

/**
 * the ternary multiplexer expression: `cond ? a : b`.
 */
#[track_caller]
pub fn select(cond: &Signal, a: &Signal, b: &Signal) -> Result<Signal, HdlError> {
    let sloc = SourceLoc::capture(std::panic::Location::caller());
    if !Rc::ptr_eq(&cond.ctx, &a.ctx) || !Rc::ptr_eq(&cond.ctx, &b.ctx) {
        return Err(HdlError::new_default(
            HdlErrorType::Generic,
            Some(String::from("select: operands belong to different modules")),
        ));
    }
    let id = cond
        .ctx
        .borrow_mut()
        .create_select(cond.id, a.id, b.id, Some(sloc))?;
    Ok(Signal::from_id(&cond.ctx, id))
}

/// the smaller of two signals (unsigned).
#[track_caller]
pub fn min(a: &Signal, b: &Signal) -> Result<Signal, HdlError> {
    let c = a.lt(b)?;
    select(&c, a, b)
}

/// the larger of two signals (unsigned).
#[track_caller]
pub fn max(a: &Signal, b: &Signal) -> Result<Signal, HdlError> {
    let c = a.gt(b)?;
    select(&c, a, b)
}

/**
 * the case arms of an open switch scope. arms lower to `key == case`
 * conditions, the compiler folds the resulting chain back to the keyed
 * select form.
 */
pub struct SwitchScope<'a> {
    m: &'a mut Module,
    key: Signal,
}

impl<'a> SwitchScope<'a> {
    /**
     * one case arm, selected when the key equals `value`.
     */
    #[track_caller]
    pub fn case<F>(&mut self, value: u64, body: F) -> Result<(), HdlError>
    where
        F: FnOnce(&mut Module) -> Result<(), HdlError>,
    {
        // the condition is built outside the arm so it survives the scope
        let k = self.key.lit(value);
        let c = self.key.eq(&k)?;
        self.m.ctx.borrow_mut().begin_cond(Some(c.id))?;
        let r = body(&mut *self.m);
        self.m.ctx.borrow_mut().end_cond()?;
        r
    }

    /**
     * the default arm, taken when no case matched.
     */
    pub fn default<F>(&mut self, body: F) -> Result<(), HdlError>
    where
        F: FnOnce(&mut Module) -> Result<(), HdlError>,
    {
        self.m.ctx.borrow_mut().begin_cond(None)?;
        let r = body(&mut *self.m);
        self.m.ctx.borrow_mut().end_cond()?;
        r
    }
}

impl Module {
    /**
     * brackets an if/else region. writes to signals that escape the region
     * route through the conditional resolver.
     */
    pub fn branch<F>(&mut self, body: F) -> Result<(), HdlError>
    where
        F: FnOnce(&mut Module) -> Result<(), HdlError>,
    {
        self.ctx.borrow_mut().begin_branch();
        let r = body(&mut *self);
        self.ctx.borrow_mut().end_branch()?;
        r
    }

    /**
     * one conditional arm within a branch.
     */
    pub fn cond<F>(&mut self, c: &Signal, body: F) -> Result<(), HdlError>
    where
        F: FnOnce(&mut Module) -> Result<(), HdlError>,
    {
        self.ctx.borrow_mut().begin_cond(Some(c.id))?;
        let r = body(&mut *self);
        self.ctx.borrow_mut().end_cond()?;
        r
    }

    /**
     * the else arm of a branch, must close the region.
     */
    pub fn otherwise<F>(&mut self, body: F) -> Result<(), HdlError>
    where
        F: FnOnce(&mut Module) -> Result<(), HdlError>,
    {
        self.ctx.borrow_mut().begin_cond(None)?;
        let r = body(&mut *self);
        self.ctx.borrow_mut().end_cond()?;
        r
    }

    /**
     * a switch region over a key signal, with case/default arms.
     */
    pub fn switch<F>(&mut self, key: &Signal, body: F) -> Result<(), HdlError>
    where
        F: FnOnce(&mut SwitchScope) -> Result<(), HdlError>,
    {
        self.ctx.borrow_mut().begin_branch();
        let r = {
            let mut scope = SwitchScope {
                key: key.clone(),
                m: self,
            };
            body(&mut scope)
        };
        self.ctx.borrow_mut().end_branch()?;
        r
    }
}
