/*
 * Filename: /src/context/conds.rs
 * Project: rvhdl
 * Created Date: 2021-09-16, 22:05:44
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

use crate::context::ctx_error::{check_predicate, check_width, HdlError, HdlErrorType};
use crate::context::Context;
use crate::node::{NodeId, NodeKind, Op, SourceLoc};
use log::*;
use std::collections::HashSet;

/**
 * one arm of an if/switch during description: its condition (none for the
 * default/else arm), the nodes created inside it, and the indices of the
 * conditional records it has defined.
 */
#[derive(Debug)]
pub(crate) struct CondFrame {
    pub cond: Option<NodeId>,
    pub locals: HashSet<NodeId>,
    pub defs: Vec<usize>,
}

impl CondFrame {
    pub fn new(cond: Option<NodeId>) -> CondFrame {
        CondFrame {
            cond,
            locals: HashSet::new(),
            defs: Vec::new(),
        }
    }
}

/**
 * the incremental mux chain of one written slice.
 *
 * `head` is what the target proxy range points at, `tail` is the deepest mux
 * whose else-slot holds the chain's fall-through (the pre-branch value or an
 * undef placeholder). sibling arms append at the tail so that earlier arms
 * keep priority, nested writes wrap the head so that the inner write wins
 * within its scope. `defined` is set while an open arm has written the
 * record and cleared when that arm closes.
 */
#[derive(Debug)]
pub(crate) struct CondVal {
    pub dst: NodeId,
    pub offset: u32,
    pub length: u32,
    pub head: NodeId,
    pub tail: NodeId,
    pub defined: bool,
}

impl Context {
    /**
     * brackets an if/switch region. arms of nested branches chain onto the
     * records of the enclosing region.
     */
    pub fn begin_branch(&mut self) {
        self.active_branches += 1;
    }

    pub fn end_branch(&mut self) -> Result<(), HdlError> {
        if self.active_branches == 0 {
            return Err(HdlError::new_default(
                HdlErrorType::Generic,
                Some(String::from("end_branch without begin_branch")),
            ));
        }
        self.active_branches -= 1;
        if self.active_branches == 0 {
            self.cond_vals.clear();
        }
        Ok(())
    }

    /**
     * opens one arm. `cond` is none for a default/else arm.
     */
    pub fn begin_cond(&mut self, cond: Option<NodeId>) -> Result<(), HdlError> {
        if self.active_branches == 0 {
            return Err(HdlError::new_default(
                HdlErrorType::Generic,
                Some(String::from("cond outside of a branch scope")),
            ));
        }
        if let Some(c) = cond {
            check_predicate("cond", self.node(c).width)?;
        }
        self.conds.push(CondFrame::new(cond));
        Ok(())
    }

    /**
     * closes the innermost arm, re-arming its records so that sibling arms
     * may each define the same signal once.
     */
    pub fn end_cond(&mut self) -> Result<(), HdlError> {
        let frame = self.conds.pop().ok_or_else(|| {
            HdlError::new_default(
                HdlErrorType::Generic,
                Some(String::from("end_cond without begin_cond")),
            )
        })?;
        for ri in frame.defs {
            self.cond_vals[ri].defined = false;
        }
        Ok(())
    }

    pub fn has_conditionals(&self) -> bool {
        self.active_branches != 0
    }

    /**
     * a write to `dst` must route through the resolver unless the target is
     * local to the innermost arm (the value cannot escape it).
     */
    pub(crate) fn conditional_enabled(&self, dst: NodeId) -> bool {
        match self.conds.last() {
            Some(frame) => !frame.locals.contains(&dst),
            None => false,
        }
    }

    /**
     * the effective condition of the current scope: the AND of every frame
     * condition from the innermost outward, stopping at the first frame that
     * owns `bound` in its locals. none when every contributing frame is a
     * default arm.
     */
    pub(crate) fn effective_cond(
        &mut self,
        bound: Option<NodeId>,
    ) -> Result<Option<NodeId>, HdlError> {
        let mut terms: Vec<NodeId> = Vec::new();
        for frame in self.conds.iter().rev() {
            if let Some(b) = bound {
                if frame.locals.contains(&b) {
                    break;
                }
            }
            if let Some(c) = frame.cond {
                terms.push(c);
            }
        }
        let mut cond: Option<NodeId> = None;
        for c in terms {
            cond = Some(match cond {
                None => c,
                Some(prev) => self.create_alu(Op::And, false, 1, vec![prev, c], None)?,
            });
        }
        Ok(cond)
    }

    /**
     * route one update slice of a conditional write through the mux chain of
     * its record, fabricating `select` nodes as needed. the target proxy
     * range ends up pointing at the chain head.
     */
    pub(crate) fn conditional_assign(
        &mut self,
        dst: NodeId,
        offset: u32,
        length: u32,
        src: NodeId,
        sloc: Option<SourceLoc>,
    ) -> Result<(), HdlError> {
        check_width("assign", length, self.node(src).width)?;
        let cond = self.effective_cond(Some(dst))?;
        let record = self
            .cond_vals
            .iter()
            .position(|v| v.dst == dst && v.offset == offset && v.length == length);
        let ri = match record {
            Some(ri) => ri,
            None => {
                match cond {
                    None => {
                        // no live condition applies, plain write
                        self.proxy_add_source(dst, offset, src, 0, length)?;
                        return Ok(());
                    }
                    Some(c) => {
                        // prior content of the slice, undef when never written
                        let old = self.proxy_slice_value(dst, offset, length, sloc)?;
                        let m = self.create_select(c, src, old, sloc)?;
                        debug!(
                            "conditional assign: proxy #{} [{}..{}) <- select #{}",
                            dst,
                            offset,
                            offset + length,
                            m
                        );
                        let ri = self.cond_vals.len();
                        self.cond_vals.push(CondVal {
                            dst,
                            offset,
                            length,
                            head: m,
                            tail: m,
                            defined: true,
                        });
                        if let Some(frame) = self.conds.last_mut() {
                            frame.defs.push(ri);
                        }
                        self.proxy_add_source(dst, offset, m, 0, length)?;
                        return Ok(());
                    }
                }
            }
        };

        // double assignment within the same arm is an error
        let already = self
            .conds
            .last()
            .map(|f| f.defs.contains(&ri))
            .unwrap_or(false);
        if already {
            let n = self.node(dst);
            return Err(HdlError::for_node(
                HdlErrorType::DoubleAssign,
                &self.name,
                dst,
                n.kind.name(),
                sloc.or(n.sloc),
                Some(format!(
                    "redundant assignment to node {}{}(#{})",
                    n.kind.name(),
                    n.width,
                    n.id
                )),
            ));
        }

        let defined = self.cond_vals[ri].defined;
        match (cond, defined) {
            (Some(c), true) => {
                // nested write inside the defining arm: the inner write wins
                // within its scope, so it wraps the chain head
                let head = self.cond_vals[ri].head;
                let m = self.create_select(c, src, head, sloc)?;
                self.proxy_add_source(dst, offset, m, 0, length)?;
                self.cond_vals[ri].head = m;
            }
            (Some(c), false) => {
                // sibling arm: append at the tail, earlier arms keep priority
                let tail = self.cond_vals[ri].tail;
                if matches!(&self.node(tail).kind, NodeKind::Select { .. }) {
                    let fall = self.node(tail).srcs[2];
                    let m = self.create_select(c, src, fall, sloc)?;
                    self.node_mut(tail).srcs[2] = m;
                    self.cond_vals[ri].tail = m;
                } else {
                    // the chain was sealed by an unconditional write
                    let head = self.cond_vals[ri].head;
                    let m = self.create_select(c, src, head, sloc)?;
                    self.proxy_add_source(dst, offset, m, 0, length)?;
                    self.cond_vals[ri].head = m;
                    self.cond_vals[ri].tail = m;
                }
            }
            (None, false) => {
                // default/else arm: the write becomes the chain fall-through
                let tail = self.cond_vals[ri].tail;
                if matches!(&self.node(tail).kind, NodeKind::Select { .. }) {
                    self.node_mut(tail).srcs[2] = src;
                } else {
                    self.proxy_add_source(dst, offset, src, 0, length)?;
                    self.cond_vals[ri].head = src;
                    self.cond_vals[ri].tail = src;
                }
            }
            (None, true) => {
                // unconditional override inside the defining arm: the write
                // replaces the whole chain
                self.proxy_add_source(dst, offset, src, 0, length)?;
                self.cond_vals[ri].head = src;
                self.cond_vals[ri].tail = src;
            }
        }
        self.cond_vals[ri].defined = true;
        if let Some(frame) = self.conds.last_mut() {
            frame.defs.push(ri);
        }
        Ok(())
    }
}
