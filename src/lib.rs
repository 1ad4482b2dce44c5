/*
 * Filename: /src/lib.rs
 * Project: rvhdl
 * Created Date: 2021-09-12, 09:01:12
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

/*!
 * rvhdl is an embedded hardware description and simulation library: rust
 * expressions over `Signal` values record a typed node graph instead of
 * computing numbers, the graph is compiled (dead code, identity and switch
 * folding passes) and simulated cycle by cycle.
 *
 * a minimal counter:
 *
 * ```no_run
 * use rvhdl::signal::Module;
 * use rvhdl::sim::Simulator;
 *
 * let mut m = Module::new("counter");
 * let mut r = m.reg(8, 0).unwrap();
 * let one = r.q.lit(1);
 * let inc = r.q.add(&one).unwrap();
 * r.next.assign(&inc).unwrap();
 * m.tap("count", &r.q).unwrap();
 * let dev = m.compile().unwrap();
 * let mut sim = Simulator::new(&dev);
 * sim.run(100).unwrap();
 * ```
 */

pub mod bitvec;
pub mod bus;
pub mod cdomain;
pub mod compile;
pub mod context;
pub mod mem;
pub mod node;
pub mod reg;
pub mod select;
pub mod signal;
pub mod sim;
mod utils;
