/*
 * Filename: /src/bus.rs
 * Project: rvhdl
 * Created Date: 2021-09-12, 18:40:03
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
use std::cell::RefCell;
use std::rc::Rc;

/**
 * a Bus is the host side of an input or output port: a shared value buffer
 * the simulator samples (inputs) or drives (outputs) once per tick.
 */
#[derive(Debug, Clone)]
pub struct Bus {
    inner: Rc<RefCell<BitVector>>,
}

impl Bus {
    /**
     * creates a zeroed bus of the given width.
     */
    pub fn new(width: u32) -> Bus {
        Bus {
            inner: Rc::new(RefCell::new(BitVector::new(width))),
        }
    }

    pub fn width(&self) -> u32 {
        self.inner.borrow().width()
    }

    /**
     * snapshot of the current value.
     */
    pub fn read(&self) -> BitVector {
        self.inner.borrow().clone()
    }

    /**
     * low 64 bits of the current value.
     */
    pub fn read_u64(&self) -> u64 {
        self.inner.borrow().to_u64()
    }

    /**
     * drive a new value, truncated or zero-extended to the bus width.
     */
    pub fn write(&self, value: &BitVector) {
        let w = self.width();
        *self.inner.borrow_mut() = value.zero_extend(w);
    }

    /**
     * drive a new value from an integer, truncated to the bus width.
     */
    pub fn write_u64(&self, value: u64) {
        let w = self.width();
        *self.inner.borrow_mut() = BitVector::from_u64(value, w);
    }
}
