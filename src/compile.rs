/*
 * Filename: /src/compile.rs
 * Project: rvhdl
 * Created Date: 2021-09-24, 11:55:40
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
use crate::context::Context;
use crate::node::{NodeId, NodeKind, Op, ProxyRange};
use log::*;
use std::collections::{HashMap, HashSet, VecDeque};

/**
 * the finalize-time compiler. passes run in order: syntax and invariant
 * checks, dead code elimination (with per-proxy used-range tracking),
 * identity elimination, literal cse (maintained by the pool), switch
 * reconstruction.
 */
pub struct Compiler {
    used_proxy_srcs: HashMap<NodeId, HashSet<u32>>,
}

impl Compiler {
    pub fn new() -> Compiler {
        Compiler {
            used_proxy_srcs: HashMap::new(),
        }
    }

    pub fn run(&mut self, ctx: &mut Context) -> Result<(), HdlError> {
        debug!("compiling '{}' ...", ctx.name());
        let orig = ctx.node_count();

        self.syntax_check(ctx)?;
        let dead = self.dead_code_elimination(ctx);
        let identities = self.remove_identity_nodes(ctx);
        // literal cse is maintained by the context's literal pool
        let folded = self.switch_reconstruction(ctx);
        if folded > 0 {
            // the folded chains leave orphaned muxes behind
            self.used_proxy_srcs.clear();
            self.dead_code_elimination(ctx);
        }

        debug!("*** deleted {} dead nodes", dead);
        debug!("*** deleted {} identity nodes", identities);
        debug!("*** folded {} switch chains", folded);
        debug!("before optimization: {}", orig);
        debug!("after optimization: {}", ctx.node_count());
        Ok(())
    }

    // sources implied by the kind but not listed in srcs
    fn kind_refs(ctx: &Context, id: NodeId) -> Vec<NodeId> {
        match &ctx.node(id).kind {
            NodeKind::MemRd { mem, .. } => vec![*mem],
            NodeKind::MemWr { mem, .. } => vec![*mem],
            _ => vec![],
        }
    }

    // reachability sources: proxies contribute only range-referenced slots
    fn walk_srcs(ctx: &Context, id: NodeId) -> Vec<NodeId> {
        let n = ctx.node(id);
        let mut out: Vec<NodeId> = match &n.kind {
            NodeKind::Proxy { ranges } => ranges
                .iter()
                .map(|r| n.srcs[r.src_idx as usize])
                .collect(),
            _ => n.srcs.clone(),
        };
        out.extend(Self::kind_refs(ctx, id));
        out
    }

    // roots for liveness: the context roots, plus memory write ports, plus
    // the clock domain sensitivity signals
    fn roots(ctx: &Context) -> Vec<NodeId> {
        let mut roots = ctx.get_live_nodes();
        for id in ctx.node_ids() {
            if matches!(&ctx.node(id).kind, NodeKind::MemWr { .. }) {
                roots.push(id);
            }
        }
        for cd in &ctx.cdomains {
            for ev in &cd.sensitivity {
                roots.push(ev.signal);
            }
        }
        roots
    }

    /**
     * pass 1: reject unbalanced scopes, reachable undef nodes,
     * non-tiling proxies, combinational cycles and clock domain strays.
     */
    fn syntax_check(&self, ctx: &Context) -> Result<(), HdlError> {
        if ctx.has_conditionals() || !ctx.conds.is_empty() {
            return Err(HdlError::new_default(
                HdlErrorType::Generic,
                Some(String::from("unbalanced conditional scopes at compile")),
            ));
        }

        // reachability from the roots
        let mut reach: HashSet<NodeId> = HashSet::new();
        let mut work: VecDeque<NodeId> = Self::roots(ctx).into();
        while let Some(id) = work.pop_front() {
            if !reach.insert(id) {
                continue;
            }
            for s in Self::walk_srcs(ctx, id) {
                if !reach.contains(&s) {
                    work.push_back(s);
                }
            }
        }

        // un-initialized nodes still visible from a root
        for &u in &ctx.undefs {
            if !reach.contains(&u) {
                continue;
            }
            // report the user-site that consumed it
            for &id in reach.iter() {
                let consumer = ctx.node(id);
                if Self::walk_srcs(ctx, id).contains(&u) {
                    error!("{}", ctx.dump_ast());
                    return Err(HdlError::for_node(
                        HdlErrorType::UndefinedNode,
                        ctx.name(),
                        id,
                        consumer.kind.name(),
                        consumer.sloc,
                        Some(format!(
                            "un-initialized node '{}' consumed here",
                            consumer.name.as_deref().unwrap_or("?")
                        )),
                    ));
                }
            }
            return Err(HdlError::for_node(
                HdlErrorType::UndefinedNode,
                ctx.name(),
                u,
                "undef",
                ctx.node(u).sloc,
                Some(String::from("un-initialized node")),
            ));
        }

        // proxy ranges must tile [0, width) exactly
        for &id in &reach {
            let n = ctx.node(id);
            if let NodeKind::Proxy { ranges } = &n.kind {
                let mut at = 0u32;
                for r in ranges {
                    if r.dst_offset != at {
                        return Err(HdlError::for_node(
                            HdlErrorType::ProxyRangeOverlap,
                            ctx.name(),
                            id,
                            "proxy",
                            n.sloc,
                            Some(format!(
                                "ranges do not tile: hole or overlap at bit {}",
                                at
                            )),
                        ));
                    }
                    at += r.length;
                }
                if at != n.width {
                    return Err(HdlError::for_node(
                        HdlErrorType::ProxyRangeOverlap,
                        ctx.name(),
                        id,
                        "proxy",
                        n.sloc,
                        Some(format!("ranges cover {} of {} bits", at, n.width)),
                    ));
                }
            }
        }

        // every cycle must pass through a register or a memory
        self.check_comb_cycles(ctx, &reach)?;

        // every tickable naming a domain must belong to it
        for &id in &reach {
            let cd = match &ctx.node(id).kind {
                NodeKind::Reg { cd, .. } => Some(*cd),
                NodeKind::DelayedAlu { cd, .. } => Some(*cd),
                NodeKind::MemWr { cd, .. } => Some(*cd),
                NodeKind::MemRd { cd, .. } => *cd,
                _ => None,
            };
            if let Some(cd) = cd {
                if cd >= ctx.cdomains.len() || !ctx.cdomains[cd].contains(id) {
                    return Err(HdlError::for_node(
                        HdlErrorType::ClockDomainMismatch,
                        ctx.name(),
                        id,
                        ctx.node(id).kind.name(),
                        ctx.node(id).sloc,
                        Some(format!("not a member of clock domain {}", cd)),
                    ));
                }
            }
        }
        Ok(())
    }

    // combinational edges stop at tickables and stores, like eval
    fn comb_srcs(ctx: &Context, id: NodeId) -> Vec<NodeId> {
        match &ctx.node(id).kind {
            NodeKind::Reg { .. }
            | NodeKind::Mem { .. }
            | NodeKind::MemWr { .. }
            | NodeKind::DelayedAlu { .. } => vec![],
            NodeKind::MemRd { cd: Some(_), .. } => vec![],
            NodeKind::Proxy { .. } => {
                let n = ctx.node(id);
                if let NodeKind::Proxy { ranges } = &n.kind {
                    ranges
                        .iter()
                        .map(|r| n.srcs[r.src_idx as usize])
                        .collect()
                } else {
                    vec![]
                }
            }
            _ => ctx.node(id).srcs.clone(),
        }
    }

    fn check_comb_cycles(&self, ctx: &Context, reach: &HashSet<NodeId>) -> Result<(), HdlError> {
        // iterative dfs, 1 = on stack, 2 = done
        let mut color: HashMap<NodeId, u8> = HashMap::new();
        for &root in reach.iter() {
            if color.get(&root).copied().unwrap_or(0) != 0 {
                continue;
            }
            let mut stack: Vec<(NodeId, usize)> = vec![(root, 0)];
            color.insert(root, 1);
            while let Some((id, i)) = stack.pop() {
                let srcs = Self::comb_srcs(ctx, id);
                if i < srcs.len() {
                    stack.push((id, i + 1));
                    let s = srcs[i];
                    match color.get(&s).copied().unwrap_or(0) {
                        0 => {
                            color.insert(s, 1);
                            stack.push((s, 0));
                        }
                        1 => {
                            let n = ctx.node(s);
                            return Err(HdlError::for_node(
                                HdlErrorType::Generic,
                                ctx.name(),
                                s,
                                n.kind.name(),
                                n.sloc,
                                Some(String::from(
                                    "combinational cycle (no register or memory in loop)",
                                )),
                            ));
                        }
                        _ => {}
                    }
                } else {
                    color.insert(id, 2);
                }
            }
        }
        Ok(())
    }

    /**
     * pass 2: delete every node not transitively reachable from a root.
     * proxy sources are tracked per used index, so a slice consumer keeps
     * only the ranges it actually reads alive.
     */
    fn dead_code_elimination(&mut self, ctx: &mut Context) -> usize {
        let mut live: HashSet<NodeId> = HashSet::new();
        let mut work: VecDeque<NodeId> = VecDeque::new();
        for r in Self::roots(ctx) {
            if live.insert(r) {
                work.push_back(r);
            }
        }

        while let Some(id) = work.pop_front() {
            let (n_is_proxy, srcs, n_ranges) = {
                let n = ctx.node(id);
                match &n.kind {
                    NodeKind::Proxy { ranges } => (true, n.srcs.clone(), Some(ranges.clone())),
                    _ => (false, n.srcs.clone(), None),
                }
            };
            let n_used = self.used_proxy_srcs.get(&id).cloned();
            let mut walk: Vec<(usize, NodeId)> = srcs.iter().copied().enumerate().collect();
            for extra in Self::kind_refs(ctx, id) {
                walk.push((usize::MAX, extra));
            }
            for (i, src) in walk {
                // skip proxy sources nothing consumes (yet)
                if n_is_proxy && i != usize::MAX {
                    if let Some(uset) = &n_used {
                        if !uset.contains(&(i as u32)) {
                            continue;
                        }
                    }
                }
                let mut new_proxy_source = false;
                let src_ranges: Option<Vec<ProxyRange>> = match &ctx.node(src).kind {
                    NodeKind::Proxy { ranges } => Some(ranges.clone()),
                    _ => None,
                };
                if let Some(src_ranges) = src_ranges {
                    let uses = self.used_proxy_srcs.entry(src).or_default();
                    match (&n_ranges, i != usize::MAX) {
                        (Some(nr), true) => {
                            // only the overlapped ranges of the source proxy
                            for curr in &src_ranges {
                                let curr_end = curr.dst_offset + curr.length;
                                for range in nr.iter().filter(|r| r.src_idx == i as u32) {
                                    let s_end = range.src_offset + range.length;
                                    if range.src_offset < curr_end && s_end > curr.dst_offset {
                                        if uses.insert(curr.src_idx) {
                                            new_proxy_source = true;
                                        }
                                    }
                                }
                            }
                        }
                        _ => {
                            for curr in &src_ranges {
                                if uses.insert(curr.src_idx) {
                                    new_proxy_source = true;
                                }
                            }
                        }
                    }
                }
                if live.insert(src) || new_proxy_source {
                    work.push_back(src);
                }
            }
        }

        // drop proxy sources nothing consumed, remapping range indices
        let pruned: Vec<(NodeId, HashSet<u32>)> = self
            .used_proxy_srcs
            .iter()
            .filter(|(id, _)| live.contains(id))
            .map(|(id, u)| (*id, u.clone()))
            .collect();
        for (id, used) in pruned {
            let n = ctx.node_mut(id);
            let old_len = n.srcs.len();
            if used.len() == old_len {
                continue;
            }
            let mut map: Vec<Option<u32>> = vec![None; old_len];
            let mut new_srcs = Vec::with_capacity(used.len());
            for (i, &s) in n.srcs.iter().enumerate() {
                if used.contains(&(i as u32)) {
                    map[i] = Some(new_srcs.len() as u32);
                    new_srcs.push(s);
                }
            }
            n.srcs = new_srcs;
            if let NodeKind::Proxy { ranges } = &mut n.kind {
                ranges.retain(|r| map[r.src_idx as usize].is_some());
                for r in ranges.iter_mut() {
                    r.src_idx = map[r.src_idx as usize].unwrap();
                }
            }
        }

        let mut deleted = 0;
        for id in ctx.node_ids() {
            if !live.contains(&id) {
                ctx.destroy_node(id);
                deleted += 1;
            }
        }
        deleted
    }

    /**
     * pass 3: a proxy with a single full-width range has the same value as
     * its source, replace it at every use-site.
     */
    fn remove_identity_nodes(&mut self, ctx: &mut Context) -> usize {
        let mut deleted = 0;
        loop {
            let victim = ctx
                .node_ids()
                .into_iter()
                .find(|&id| ctx.is_identity_proxy(id));
            match victim {
                None => break,
                Some(id) => {
                    let src = ctx.node(id).srcs[0];
                    ctx.replace_uses(id, src);
                    ctx.destroy_node(id);
                    deleted += 1;
                }
            }
        }
        deleted
    }

    /**
     * pass 5: fold `select(key == k0, v0, select(key == k1, v1, d))` chains
     * produced by switch lowering back into the keyed select form
     * `(key, v0, k0, v1, k1, d)`.
     */
    fn switch_reconstruction(&mut self, ctx: &mut Context) -> usize {
        // use counts decide which chain links are absorbable
        let mut uses: HashMap<NodeId, u32> = HashMap::new();
        for id in ctx.node_ids() {
            for s in Self::walk_srcs(ctx, id) {
                *uses.entry(s).or_insert(0) += 1;
            }
        }
        let mut folded = 0;
        for head in ctx.node_ids() {
            if ctx.get_node(head).is_none() {
                continue;
            }
            let first = match Self::eq_cond(ctx, head) {
                Some(k) => k,
                None => continue,
            };
            let (key, k0) = first;
            // walk the else chain collecting single-use links with the same key
            let mut arms: Vec<(NodeId, NodeId)> = vec![(ctx.node(head).srcs[1], k0)];
            let mut tail = ctx.node(head).srcs[2];
            while uses.get(&tail).copied().unwrap_or(0) == 1 {
                match Self::eq_cond(ctx, tail) {
                    Some((k, lit)) if k == key => {
                        arms.push((ctx.node(tail).srcs[1], lit));
                        tail = ctx.node(tail).srcs[2];
                    }
                    _ => break,
                }
            }
            if arms.len() < 2 {
                continue;
            }
            let mut srcs = vec![key];
            for (v, k) in &arms {
                srcs.push(*v);
                srcs.push(*k);
            }
            srcs.push(tail);
            let n = ctx.node_mut(head);
            n.kind = NodeKind::Select { has_key: true };
            n.srcs = srcs;
            folded += 1;
        }
        folded
    }

    // a ternary select whose condition is `key == literal` (either side)
    fn eq_cond(ctx: &Context, id: NodeId) -> Option<(NodeId, NodeId)> {
        let n = ctx.get_node(id)?;
        match &n.kind {
            NodeKind::Select { has_key: false } => {}
            _ => return None,
        }
        let c = ctx.get_node(n.srcs[0])?;
        match &c.kind {
            NodeKind::Alu { op: Op::Eq, .. } => {}
            _ => return None,
        }
        let (a, b) = (c.srcs[0], c.srcs[1]);
        let a_lit = matches!(&ctx.node(a).kind, NodeKind::Literal);
        let b_lit = matches!(&ctx.node(b).kind, NodeKind::Literal);
        match (a_lit, b_lit) {
            (false, true) => Some((a, b)),
            (true, false) => Some((b, a)),
            _ => None,
        }
    }
}
