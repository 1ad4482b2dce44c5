/*
 * Filename: /src/bin/bin.rs
 * Project: rvhdl
 * Created Date: 2021-10-02, 12:18:22
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

use rvhdl::context::ctx_error::HdlError;
use rvhdl::signal::Module;
use rvhdl::sim::tracer::Tracer;
use rvhdl::sim::vcd::write_vcd;
use rvhdl::sim::Simulator;

/**
 * builds a small demo design: an 8-bit wrapping counter that writes its
 * value into a ram and reads it back one address behind, with an assertion
 * watching the counter. the trace is dumped as text and VCD on stdout.
 */
fn demo() -> Result<(), HdlError> {
    let mut m = Module::new("counter_ram");

    // free-running 8-bit counter
    let mut cnt = m.reg(8, 0)?;
    let one = cnt.q.lit(1);
    let inc = cnt.q.add(&one)?;
    cnt.next.assign(&inc)?;

    // write the counter into ram[cnt % 16], read back the previous slot
    let ram = m.ram(8, 4, false);
    let waddr = cnt.q.slice(0, 4)?;
    let en = m.lit(1, 1);
    ram.write(&waddr, &cnt.q, &en)?;
    let raddr = waddr.sub(&waddr.lit(1))?;
    let behind = ram.read_sync(&raddr, &en)?;

    m.tap("count", &cnt.q)?;
    m.tap("behind", &behind)?;

    // the counter never sticks at 0xff for two cycles
    let top = cnt.q.eq(&cnt.q.lit(0xff))?;
    let held = m.reg_next(&top, 0)?;
    let stuck = top.and(&held)?;
    m.assert_(&stuck.inv()?, "counter stuck at top")?;

    let dev = m.compile()?;
    println!("compiled '{}', {} live nodes", dev.name(), dev.node_count());

    let mut tracer = Tracer::new(&dev);
    tracer.run(32)?;

    println!("--- text trace");
    print!("{}", tracer.to_text());

    println!("--- vcd");
    let mut out = Vec::new();
    write_vcd(&tracer, &mut out).map_err(HdlError::from)?;
    print!("{}", String::from_utf8_lossy(&out));
    Ok(())
}

fn main() {
    // enable stdout logger
    Simulator::enable_logging(true);

    match demo() {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
