/*
 * Filename: /src/sim/vcd.rs
 * Project: rvhdl
 * Created Date: 2021-09-29, 08:12:44
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

use crate::sim::tracer::Tracer;
use std::io::{self, Write};

// short ascii identifier codes, base 94 over the printable range
fn var_code(mut i: usize) -> String {
    let mut s = String::new();
    loop {
        s.push((33 + (i % 94) as u8) as char);
        i /= 94;
        if i == 0 {
            break;
        }
    }
    s
}

/**
 * emits the collected trace as IEEE-1364 VCD: header, one `$var wire` per
 * enrolled signal, then `#tick` blocks carrying only the changed signals.
 */
pub fn write_vcd<W: Write>(tracer: &Tracer, out: &mut W) -> io::Result<()> {
    writeln!(out, "$timescale 1 ns $end")?;
    writeln!(out, "$scope module {} $end", tracer.module)?;
    for (i, s) in tracer.signals.iter().enumerate() {
        writeln!(out, "$var wire {} {} {} $end", s.width, var_code(i), s.name)?;
    }
    writeln!(out, "$upscope $end")?;
    writeln!(out, "$enddefinitions $end")?;

    let mut cur_tick = None;
    for r in tracer.records() {
        if cur_tick != Some(r.tick) {
            writeln!(out, "#{}", r.tick)?;
            cur_tick = Some(r.tick);
        }
        if r.value.width() == 1 {
            writeln!(
                out,
                "{}{}",
                if r.value.is_zero() { '0' } else { '1' },
                var_code(r.signal)
            )?;
        } else {
            writeln!(out, "b{:b} {}", r.value, var_code(r.signal))?;
        }
    }
    Ok(())
}
