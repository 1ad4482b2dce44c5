/*
 * Filename: /src/mem.rs
 * Project: rvhdl
 * Created Date: 2021-09-22, 14:27:33
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
use crate::context::ctx_error::{check_predicate, check_width, HdlError, HdlErrorType};
use crate::context::Context;
use crate::node::{NodeId, NodeKind, SourceLoc};
use crate::signal::{Module, Signal};
use hexplay::HexViewBuilder;
use log::*;
use std::cell::RefCell;
use std::rc::Rc;

/**
 * a random access memory of `2^addr_width` items of `data_width` bits,
 * with attachable read and write ports. the backing store lives in a `mem`
 * node, sized at construction.
 */
pub struct Ram {
    ctx: Rc<RefCell<Context>>,
    mem: NodeId,
    data_width: u32,
    addr_width: u32,
}

/**
 * a read-only memory: a `Ram` without write ports, contents loaded at
 * construction.
 */
pub struct Rom {
    inner: Ram,
}

impl Module {
    /**
     * creates a ram. with `write_first` a synchronous read at an address
     * written on the same cycle observes the new value.
     */
    #[track_caller]
    pub fn ram(&mut self, data_width: u32, addr_width: u32, write_first: bool) -> Ram {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        let num_items = 1u32 << addr_width;
        let mut ctx = self.ctx.borrow_mut();
        let mem = ctx.create_node(
            data_width * num_items,
            NodeKind::Mem {
                data: BitVector::new(data_width * num_items),
                data_width,
                num_items,
                write_first,
                has_init: false,
                rdports: vec![],
                wrports: vec![],
            },
            vec![],
            Some(sloc),
        );
        debug!(
            "ram #{}: {} items x {} bits, write_first={}",
            mem, num_items, data_width, write_first
        );
        drop(ctx);
        Ram {
            ctx: Rc::clone(&self.ctx),
            mem,
            data_width,
            addr_width,
        }
    }

    /**
     * creates a rom preloaded from a word vector, one item per word.
     */
    #[track_caller]
    pub fn rom(&mut self, data_width: u32, addr_width: u32, init: &[u64]) -> Result<Rom, HdlError> {
        let ram = self.ram(data_width, addr_width, false);
        ram.load_words(init)?;
        Ok(Rom { inner: ram })
    }

    /**
     * creates a rom preloaded from a packed little-endian image file.
     */
    #[track_caller]
    pub fn rom_from_file(
        &mut self,
        data_width: u32,
        addr_width: u32,
        path: &str,
    ) -> Result<Rom, HdlError> {
        let ram = self.ram(data_width, addr_width, false);
        ram.load_file(path)?;
        Ok(Rom { inner: ram })
    }
}

impl Ram {
    pub fn data_width(&self) -> u32 {
        self.data_width
    }

    pub fn addr_width(&self) -> u32 {
        self.addr_width
    }

    pub fn num_items(&self) -> u32 {
        1u32 << self.addr_width
    }

    fn check_addr(&self, addr: &Signal) -> Result<(), HdlError> {
        check_width("mem addr", self.addr_width, addr.width())
    }

    /**
     * asynchronous read port: `data = mem[addr]`, combinational.
     */
    #[track_caller]
    pub fn read(&self, addr: &Signal) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        self.check_addr(addr)?;
        let mut ctx = self.ctx.borrow_mut();
        let id = ctx.create_node(
            self.data_width,
            NodeKind::MemRd {
                mem: self.mem,
                cd: None,
                staged_addr: 0,
                staged_en: false,
                staged_data: BitVector::new(self.data_width),
                pending: false,
            },
            vec![addr.id()],
            Some(sloc),
        );
        if let NodeKind::Mem { rdports, .. } = &mut ctx.node_mut(self.mem).kind {
            rdports.push(id);
        }
        drop(ctx);
        Ok(Signal::from_id(&self.ctx, id))
    }

    /**
     * synchronous read port of the clock domain in scope: captures
     * `mem[addr]` on the clock edge while the enable is high.
     */
    #[track_caller]
    pub fn read_sync(&self, addr: &Signal, enable: &Signal) -> Result<Signal, HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        self.check_addr(addr)?;
        check_predicate("mem enable", enable.width())?;
        let mut ctx = self.ctx.borrow_mut();
        let cd = ctx.current_cdomain();
        let id = ctx.create_node(
            self.data_width,
            NodeKind::MemRd {
                mem: self.mem,
                cd: Some(cd),
                staged_addr: 0,
                staged_en: false,
                staged_data: BitVector::new(self.data_width),
                pending: false,
            },
            vec![addr.id(), enable.id()],
            Some(sloc),
        );
        ctx.add_tickable(cd, id);
        if let NodeKind::Mem { rdports, .. } = &mut ctx.node_mut(self.mem).kind {
            rdports.push(id);
        }
        drop(ctx);
        Ok(Signal::from_id(&self.ctx, id))
    }

    /**
     * write port of the clock domain in scope: stores `data` at `addr` on
     * the clock edge while the enable is high. inside a conditional scope
     * the enable is further gated by the enclosing condition.
     */
    #[track_caller]
    pub fn write(&self, addr: &Signal, data: &Signal, enable: &Signal) -> Result<(), HdlError> {
        let sloc = SourceLoc::capture(std::panic::Location::caller());
        self.check_addr(addr)?;
        check_width("mem data", self.data_width, data.width())?;
        check_predicate("mem enable", enable.width())?;
        let mut ctx = self.ctx.borrow_mut();
        let enable = match ctx.effective_cond(None)? {
            Some(c) => ctx.create_alu(
                crate::node::Op::And,
                false,
                1,
                vec![enable.id(), c],
                Some(sloc),
            )?,
            None => enable.id(),
        };
        let cd = ctx.current_cdomain();
        let id = ctx.create_node(
            self.data_width,
            NodeKind::MemWr {
                mem: self.mem,
                cd,
                staged: None,
            },
            vec![addr.id(), data.id(), enable],
            Some(sloc),
        );
        ctx.add_tickable(cd, id);
        if let NodeKind::Mem { wrports, .. } = &mut ctx.node_mut(self.mem).kind {
            wrports.push(id);
        }
        Ok(())
    }

    /**
     * preloads the backing store from a word vector, one item per word.
     */
    pub fn load_words(&self, words: &[u64]) -> Result<(), HdlError> {
        if words.len() > self.num_items() as usize {
            return Err(HdlError::new_default(
                HdlErrorType::MemoryLoad,
                Some(format!(
                    "init data has {} items, memory holds {}",
                    words.len(),
                    self.num_items()
                )),
            ));
        }
        let mut ctx = self.ctx.borrow_mut();
        let dw = self.data_width;
        if let NodeKind::Mem { data, has_init, .. } = &mut ctx.node_mut(self.mem).kind {
            for (i, w) in words.iter().enumerate() {
                data.copy_slice(i as u32 * dw, &BitVector::from_u64(*w, dw), 0, dw);
            }
            *has_init = true;
        }
        Ok(())
    }

    /**
     * preloads the backing store from a packed little-endian byte stream:
     * `ceil(data_width * num_items / 8)` bytes, excess trailing bits
     * ignored, missing bytes read as zero.
     */
    pub fn load_file(&self, path: &str) -> Result<(), HdlError> {
        let bytes = std::fs::read(path)?;
        info!("loaded {} bytes from '{}'", bytes.len(), path);
        let total = self.data_width * self.num_items();
        let image = BitVector::from_le_bytes(&bytes, total);
        let mut ctx = self.ctx.borrow_mut();
        if let NodeKind::Mem { data, has_init, .. } = &mut ctx.node_mut(self.mem).kind {
            *data = image;
            *has_init = true;
        }
        Ok(())
    }

    /**
     * a memory preloaded at construction and left without write ports is a
     * rom.
     */
    pub fn is_rom(&self) -> bool {
        let ctx = self.ctx.borrow();
        match &ctx.node(self.mem).kind {
            NodeKind::Mem {
                has_init, wrports, ..
            } => *has_init && wrports.is_empty(),
            _ => false,
        }
    }

    /**
     * hex dump of the current backing store contents.
     */
    pub fn dump(&self) -> String {
        let ctx = self.ctx.borrow();
        let bytes = match &ctx.node(self.mem).kind {
            NodeKind::Mem { data, .. } => data.to_le_bytes(),
            _ => vec![],
        };
        let view = HexViewBuilder::new(&bytes).row_width(16).finish();
        format!("{}", view)
    }
}

impl Rom {
    /// asynchronous read port.
    #[track_caller]
    pub fn read(&self, addr: &Signal) -> Result<Signal, HdlError> {
        self.inner.read(addr)
    }

    /// synchronous read port.
    #[track_caller]
    pub fn read_sync(&self, addr: &Signal, enable: &Signal) -> Result<Signal, HdlError> {
        self.inner.read_sync(addr, enable)
    }

    pub fn dump(&self) -> String {
        self.inner.dump()
    }
}
