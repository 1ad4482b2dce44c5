/*
 * Filename: /tests/test.rs
 * Project: rvhdl
 * Created Date: 2021-10-03, 01:10:30
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

use log::*;
use rvhdl::context::ctx_error::HdlErrorType;
use rvhdl::select::{max, min, select};
use rvhdl::signal::{Device, Module, Signal};
use rvhdl::sim::tracer::Tracer;
use rvhdl::sim::vcd::write_vcd;
use rvhdl::sim::Simulator;

/**
 * 4-bit ripple adder: 0b1010 + 0b0110 = 0b0000 with carry out.
 */
#[test]
fn test_adder() {
    let mut m = Module::new("adder4");
    let (a, a_bus) = m.input("a", 4);
    let (b, b_bus) = m.input("b", 4);
    let wide = a.pad(5).unwrap().add(&b.pad(5).unwrap()).unwrap();
    let sum = wide.slice(0, 4).unwrap();
    let cout = wide.bit(4).unwrap();
    let s_bus = m.output("s", &sum).unwrap();
    let c_bus = m.output("cout", &cout).unwrap();
    let dev = m.compile().unwrap();

    let mut sim = Simulator::new(&dev);
    a_bus.write_u64(0b1010);
    b_bus.write_u64(0b0110);
    sim.step().unwrap();
    assert_eq!(s_bus.read_u64(), 0b0000);
    assert_eq!(c_bus.read_u64(), 1);

    a_bus.write_u64(0b0011);
    b_bus.write_u64(0b0100);
    sim.step().unwrap();
    assert_eq!(s_bus.read_u64(), 0b0111);
    assert_eq!(c_bus.read_u64(), 0);
}

fn build_fsm3() -> Device {
    let mut m = Module::new("fsm3");
    let mut r = m.reg(2, 0).unwrap();
    let q = r.q.clone();
    let mut next = m.signal(2);
    let v0 = next.lit(0);
    let v1 = next.lit(1);
    let v2 = next.lit(2);
    m.switch(&q, |sw| {
        sw.case(0, |_| next.assign(&v1))?;
        sw.case(1, |_| next.assign(&v2))?;
        sw.case(2, |_| next.assign(&v0))?;
        sw.default(|_| next.assign(&v0))
    })
    .unwrap();
    r.next.assign(&next).unwrap();
    m.tap("state", &r.q).unwrap();
    m.compile().unwrap()
}

/**
 * 3-state fsm cycling 00 -> 01 -> 10 -> 00 on the free-running clock,
 * after 7 ticks the register holds 01.
 */
#[test]
fn test_fsm() {
    let dev = build_fsm3();
    // the switch chain folds back to a single keyed select
    assert_eq!(dev.count_kind("select"), 1);
    let mut sim = Simulator::new(&dev);
    sim.run(7).unwrap();
    assert_eq!(sim.tap_value("state").unwrap().to_u64(), 0b01);
}

/**
 * if/else over an escaping signal resolves to exactly one select node.
 */
#[test]
fn test_conditional_mux() {
    let mut m = Module::new("condmux");
    let (sel, sel_bus) = m.input("sel", 1);
    let (a, a_bus) = m.input("a", 4);
    let (b, b_bus) = m.input("b", 4);
    let mut x = m.signal(4);
    m.branch(|mm| {
        mm.cond(&sel, |_| x.assign(&a))?;
        mm.otherwise(|_| x.assign(&b))
    })
    .unwrap();
    let x_bus = m.output("x", &x).unwrap();
    let dev = m.compile().unwrap();
    assert_eq!(dev.count_kind("select"), 1);

    let mut sim = Simulator::new(&dev);
    sel_bus.write_u64(1);
    a_bus.write_u64(7);
    b_bus.write_u64(3);
    sim.step().unwrap();
    assert_eq!(x_bus.read_u64(), 7);
    sel_bus.write_u64(0);
    sim.step().unwrap();
    assert_eq!(x_bus.read_u64(), 3);
}

/**
 * conditional write into a sub-range muxes only the covered slice.
 */
#[test]
fn test_conditional_partial_write() {
    let mut m = Module::new("partial");
    let (sel, sel_bus) = m.input("sel", 1);
    let (a, a_bus) = m.input("a", 4);
    let (b, b_bus) = m.input("b", 4);
    let lo = m.lit(0xa, 4);
    let mut x = m.signal(8);
    x.write(0, &lo, 0, 4).unwrap();
    m.branch(|mm| {
        mm.cond(&sel, |_| x.write(4, &a, 0, 4))?;
        mm.otherwise(|_| x.write(4, &b, 0, 4))
    })
    .unwrap();
    let x_bus = m.output("x", &x).unwrap();
    let dev = m.compile().unwrap();

    let mut sim = Simulator::new(&dev);
    sel_bus.write_u64(1);
    a_bus.write_u64(0xb);
    b_bus.write_u64(0xc);
    sim.step().unwrap();
    assert_eq!(x_bus.read_u64(), 0xba);
    sel_bus.write_u64(0);
    sim.step().unwrap();
    assert_eq!(x_bus.read_u64(), 0xca);
}

/**
 * synchronous ram, depth 4 x width 8, write-before-read disabled: the write
 * lands on the edge, the read of the same cycle still observes the old
 * value.
 */
#[test]
fn test_sync_ram_read_first() {
    let mut m = Module::new("ram4x8");
    let (we, we_bus) = m.input("we", 1);
    let (addr, addr_bus) = m.input("addr", 2);
    let (din, din_bus) = m.input("din", 8);
    let ram = m.ram(8, 2, false);
    ram.write(&addr, &din, &we).unwrap();
    let en = m.lit(1, 1);
    let q = ram.read_sync(&addr, &en).unwrap();
    let q_bus = m.output("q", &q).unwrap();
    let dev = m.compile().unwrap();

    let mut sim = Simulator::new(&dev);
    we_bus.write_u64(1);
    addr_bus.write_u64(2);
    din_bus.write_u64(0xab);
    sim.step().unwrap();
    // pre-write contents
    assert_eq!(q_bus.read_u64(), 0x00);
    we_bus.write_u64(0);
    sim.step().unwrap();
    assert_eq!(q_bus.read_u64(), 0xab);
}

/**
 * same setup with write-before-read: the read observes the new value on the
 * write cycle.
 */
#[test]
fn test_sync_ram_write_first() {
    let mut m = Module::new("ram_wf");
    let (we, we_bus) = m.input("we", 1);
    let (addr, addr_bus) = m.input("addr", 2);
    let (din, din_bus) = m.input("din", 8);
    let ram = m.ram(8, 2, true);
    ram.write(&addr, &din, &we).unwrap();
    let en = m.lit(1, 1);
    let q = ram.read_sync(&addr, &en).unwrap();
    let q_bus = m.output("q", &q).unwrap();
    let dev = m.compile().unwrap();

    let mut sim = Simulator::new(&dev);
    we_bus.write_u64(1);
    addr_bus.write_u64(2);
    din_bus.write_u64(0xab);
    sim.step().unwrap();
    assert_eq!(q_bus.read_u64(), 0xab);
}

/**
 * a rom reads back its init words combinationally.
 */
#[test]
fn test_rom() {
    let mut m = Module::new("rom4");
    let (addr, addr_bus) = m.input("addr", 2);
    let rom = m.rom(8, 2, &[0x11, 0x22, 0x33, 0x44]).unwrap();
    let q = rom.read(&addr).unwrap();
    let q_bus = m.output("q", &q).unwrap();
    let dev = m.compile().unwrap();

    let mut sim = Simulator::new(&dev);
    for (i, want) in [0x11u64, 0x22, 0x33, 0x44].iter().enumerate() {
        addr_bus.write_u64(i as u64);
        sim.step().unwrap();
        assert_eq!(q_bus.read_u64(), *want);
    }
}

/**
 * memory image files are packed little-endian bit streams.
 */
#[test]
fn test_rom_from_file() {
    let path = std::env::temp_dir().join("rvhdl_rom_test.bin");
    std::fs::write(&path, &[0xde, 0xad, 0xbe, 0xef]).unwrap();
    let mut m = Module::new("romfile");
    let (addr, addr_bus) = m.input("addr", 2);
    let rom = m
        .rom_from_file(8, 2, path.to_str().unwrap())
        .unwrap();
    let q = rom.read(&addr).unwrap();
    let q_bus = m.output("q", &q).unwrap();
    let dev = m.compile().unwrap();

    let mut sim = Simulator::new(&dev);
    for (i, want) in [0xdeu64, 0xad, 0xbe, 0xef].iter().enumerate() {
        addr_bus.write_u64(i as u64);
        sim.step().unwrap();
        assert_eq!(q_bus.read_u64(), *want);
    }
    let _ = std::fs::remove_file(&path);
}

/**
 * a failed assertion aborts the run with cycle, node and call site.
 */
#[test]
fn test_assertion() {
    let mut m = Module::new("asserts");
    let (a, a_bus) = m.input("a", 4);
    let (b, b_bus) = m.input("b", 4);
    let guard = a.ne(&b).unwrap();
    m.assert_(&guard, "a equals b").unwrap();
    let dev = m.compile().unwrap();

    let mut sim = Simulator::new(&dev);
    a_bus.write_u64(5);
    b_bus.write_u64(5);
    let e = sim.run(3).unwrap_err();
    assert_eq!(e.t, HdlErrorType::AssertionFailed);
    assert_eq!(e.cycle, Some(0));
    assert!(e.sloc.is_some());
    let msg = format!("{}", e);
    assert!(msg.contains("a equals b"));
}

/**
 * an assertion inside a conditional arm only fires under the condition.
 */
#[test]
fn test_assertion_guarded() {
    let mut m = Module::new("guarded");
    let (arm, arm_bus) = m.input("arm", 1);
    let zero = m.lit(0, 1);
    m.branch(|mm| {
        mm.cond(&arm, |mm| mm.assert_(&zero, "armed"))
    })
    .unwrap();
    let dev = m.compile().unwrap();

    let mut sim = Simulator::new(&dev);
    arm_bus.write_u64(0);
    sim.run(3).unwrap();
    arm_bus.write_u64(1);
    let e = sim.step().unwrap_err();
    assert_eq!(e.t, HdlErrorType::AssertionFailed);
    assert_eq!(e.cycle, Some(3));
}

/**
 * a computed but never consumed signal is gone after compilation.
 */
#[test]
fn test_dead_code() {
    let mut m = Module::new("dce");
    let (a, _) = m.input("a", 4);
    let (b, _) = m.input("b", 4);
    let live = a.and(&b).unwrap();
    let _dead = a.xor(&b).unwrap();
    m.output("y", &live).unwrap();
    let dev = m.compile().unwrap();
    assert_eq!(dev.count_kind("alu"), 1);

    // dead code elimination is idempotent
    let before = dev.node_count();
    let after = dev.recompile().unwrap();
    assert_eq!(before, after);
}

/**
 * a signal created and never written fails compilation as un-initialized.
 */
#[test]
fn test_undef_detected() {
    let mut m = Module::new("undef");
    let x = m.signal(4);
    m.output("y", &x).unwrap();
    let e = m.compile().unwrap_err();
    assert_eq!(e.t, HdlErrorType::UndefinedNode);
}

/**
 * two writes to the same signal within one arm is an error.
 */
#[test]
fn test_double_assign() {
    let mut m = Module::new("dblassign");
    let (sel, _) = m.input("sel", 1);
    let (a, _) = m.input("a", 4);
    let (b, _) = m.input("b", 4);
    let mut x = m.signal(4);
    let e = m
        .branch(|mm| {
            mm.cond(&sel, |_| {
                x.assign(&a)?;
                x.assign(&b)
            })
        })
        .unwrap_err();
    assert_eq!(e.t, HdlErrorType::DoubleAssign);
}

/**
 * mixed-width operands are a construction error.
 */
#[test]
fn test_width_mismatch() {
    let m = Module::new("widths");
    let a = m.lit(1, 4);
    let b = m.lit(1, 8);
    let e = a.and(&b).unwrap_err();
    assert_eq!(e.t, HdlErrorType::WidthMismatch);
    let e = a.eq(&b).unwrap_err();
    assert_eq!(e.t, HdlErrorType::WidthMismatch);
}

/**
 * concat of the two halves of a slice is the original value.
 */
#[test]
fn test_slice_concat_roundtrip() {
    let mut m = Module::new("roundtrip");
    let (x, x_bus) = m.input("x", 8);
    let lo = x.slice(0, 4).unwrap();
    let hi = x.slice(4, 4).unwrap();
    let y = lo.concat(&hi).unwrap();
    let y_bus = m.output("y", &y).unwrap();
    let dev = m.compile().unwrap();

    let mut sim = Simulator::new(&dev);
    for v in [0x00u64, 0x5a, 0xff, 0x81] {
        x_bus.write_u64(v);
        sim.step().unwrap();
        assert_eq!(y_bus.read_u64(), v);
    }
}

/**
 * switch lowering simulates identically to the equivalent nested selects.
 */
#[test]
fn test_switch_vs_selects() {
    // switch form
    let mut m1 = Module::new("sw");
    let (k1, k1_bus) = m1.input("k", 2);
    let mut x1 = m1.signal(4);
    let values = [0x3u64, 0x7, 0x9, 0x0];
    let v: Vec<Signal> = values.iter().map(|v| m1.lit(*v, 4)).collect();
    m1.switch(&k1, |sw| {
        sw.case(0, |_| x1.assign(&v[0]))?;
        sw.case(1, |_| x1.assign(&v[1]))?;
        sw.case(2, |_| x1.assign(&v[2]))?;
        sw.default(|_| x1.assign(&v[3]))
    })
    .unwrap();
    let x1_bus = m1.output("x", &x1).unwrap();
    let dev1 = m1.compile().unwrap();

    // nested select form
    let mut m2 = Module::new("sel");
    let (k2, k2_bus) = m2.input("k", 2);
    let w: Vec<Signal> = values.iter().map(|v| m2.lit(*v, 4)).collect();
    let c0 = k2.eq(&k2.lit(0)).unwrap();
    let c1 = k2.eq(&k2.lit(1)).unwrap();
    let c2 = k2.eq(&k2.lit(2)).unwrap();
    let inner = select(&c2, &w[2], &w[3]).unwrap();
    let mid = select(&c1, &w[1], &inner).unwrap();
    let x2 = select(&c0, &w[0], &mid).unwrap();
    let x2_bus = m2.output("x", &x2).unwrap();
    let dev2 = m2.compile().unwrap();

    let mut s1 = Simulator::new(&dev1);
    let mut s2 = Simulator::new(&dev2);
    for k in 0..4u64 {
        k1_bus.write_u64(k);
        k2_bus.write_u64(k);
        s1.step().unwrap();
        s2.step().unwrap();
        assert_eq!(x1_bus.read_u64(), x2_bus.read_u64());
        assert_eq!(x1_bus.read_u64(), values[k as usize]);
    }
}

/**
 * two contexts built by the same description produce identical traces.
 */
#[test]
fn test_deterministic_build() {
    let d1 = build_fsm3();
    let d2 = build_fsm3();
    assert_eq!(d1.node_count(), d2.node_count());
    let mut s1 = Simulator::new(&d1);
    let mut s2 = Simulator::new(&d2);
    for _ in 0..20 {
        s1.step().unwrap();
        s2.step().unwrap();
        assert_eq!(
            s1.tap_value("state").unwrap(),
            s2.tap_value("state").unwrap()
        );
    }
}

/**
 * register update: the counter holds n after n enabled ticks.
 */
#[test]
fn test_counter() {
    let mut m = Module::new("counter");
    let mut r = m.reg(8, 0).unwrap();
    let one = r.q.lit(1);
    let inc = r.q.add(&one).unwrap();
    r.next.assign(&inc).unwrap();
    m.tap("count", &r.q).unwrap();
    let dev = m.compile().unwrap();

    let mut sim = Simulator::new(&dev);
    for n in 1..=300u64 {
        sim.step().unwrap();
        assert_eq!(sim.tap_value("count").unwrap().to_u64(), n & 0xff);
    }
}

/**
 * a register with enable holds its value while the enable is low.
 */
#[test]
fn test_reg_enable() {
    let mut m = Module::new("regen");
    let (en, en_bus) = m.input("en", 1);
    let mut r = m.reg_en(4, 0, &en).unwrap();
    let inc = r.q.add(&r.q.lit(1)).unwrap();
    r.next.assign(&inc).unwrap();
    m.tap("q", &r.q).unwrap();
    let dev = m.compile().unwrap();

    let mut sim = Simulator::new(&dev);
    en_bus.write_u64(1);
    sim.run(3).unwrap();
    assert_eq!(sim.tap_value("q").unwrap().to_u64(), 3);
    en_bus.write_u64(0);
    sim.run(5).unwrap();
    assert_eq!(sim.tap_value("q").unwrap().to_u64(), 3);
    en_bus.write_u64(1);
    sim.step().unwrap();
    assert_eq!(sim.tap_value("q").unwrap().to_u64(), 4);
}

/**
 * synchronous reset through the default reset input reloads the init value.
 */
#[test]
fn test_latch_reset() {
    let mut m = Module::new("latchrst");
    let en = m.lit(1, 1);
    let init = m.lit(9, 4);
    let mut next = m.signal(4);
    let q = m.latch(&next, &en, &init, None).unwrap();
    let inc = q.add(&q.lit(1)).unwrap();
    next.assign(&inc).unwrap();
    m.tap("q", &q).unwrap();
    let dev = m.compile().unwrap();
    let reset = dev.reset_bus().unwrap();

    let mut sim = Simulator::new(&dev);
    reset.write_u64(1);
    sim.run(2).unwrap();
    assert_eq!(sim.tap_value("q").unwrap().to_u64(), 9);
    reset.write_u64(0);
    sim.step().unwrap();
    assert_eq!(sim.tap_value("q").unwrap().to_u64(), 10);
}

/**
 * a pushed clock is host-driven, registers tick on its rising edges only.
 */
#[test]
fn test_custom_clock() {
    let mut m = Module::new("gated_clk");
    let (clk2, clk2_bus) = m.input("clk2", 1);
    m.push_clock(&clk2);
    let mut r = m.reg(4, 0).unwrap();
    let inc = r.q.add(&r.q.lit(1)).unwrap();
    r.next.assign(&inc).unwrap();
    m.pop_clock();
    m.tap("q", &r.q).unwrap();
    let dev = m.compile().unwrap();

    let mut sim = Simulator::new(&dev);
    clk2_bus.write_u64(0);
    sim.step().unwrap();
    assert_eq!(sim.tap_value("q").unwrap().to_u64(), 0);
    clk2_bus.write_u64(1);
    sim.step().unwrap();
    assert_eq!(sim.tap_value("q").unwrap().to_u64(), 1);
    // level held, no new edge
    sim.step().unwrap();
    assert_eq!(sim.tap_value("q").unwrap().to_u64(), 1);
    clk2_bus.write_u64(0);
    sim.step().unwrap();
    clk2_bus.write_u64(1);
    sim.step().unwrap();
    assert_eq!(sim.tap_value("q").unwrap().to_u64(), 2);
}

/**
 * the delayed multiplier surfaces its product `delay` ticks later.
 */
#[test]
fn test_delayed_mul() {
    let mut m = Module::new("dmul");
    let (a, a_bus) = m.input("a", 8);
    let (b, b_bus) = m.input("b", 8);
    let p = m.mul_delayed(&a, &b, 2, None).unwrap();
    let p_bus = m.output("p", &p).unwrap();
    let dev = m.compile().unwrap();

    let mut sim = Simulator::new(&dev);
    a_bus.write_u64(3);
    b_bus.write_u64(5);
    sim.step().unwrap();
    assert_eq!(p_bus.read_u64(), 0);
    sim.step().unwrap();
    assert_eq!(p_bus.read_u64(), 0);
    sim.step().unwrap();
    assert_eq!(p_bus.read_u64(), 15);
}

/**
 * logic, reduce, shift, rotate and min/max behave like their software
 * counterparts.
 */
#[test]
fn test_alu_ops() {
    let mut m = Module::new("aluops");
    let a = m.lit(0b1100, 4);
    let b = m.lit(0b0101, 4);
    m.tap("inv", &a.inv().unwrap()).unwrap();
    m.tap("and", &a.and(&b).unwrap()).unwrap();
    m.tap("or", &a.or(&b).unwrap()).unwrap();
    m.tap("xor", &a.xor(&b).unwrap()).unwrap();
    m.tap("andr", &m.lit(0b1111, 4).andr().unwrap()).unwrap();
    m.tap("andr2", &a.andr().unwrap()).unwrap();
    m.tap("orr", &a.orr().unwrap()).unwrap();
    m.tap("xorr", &m.lit(0b1000, 4).xorr().unwrap()).unwrap();
    let sh = m.lit(0b1010, 4);
    m.tap("shl", &sh.shl(&m.lit(2, 4)).unwrap()).unwrap();
    m.tap("shr", &sh.shr(&m.lit(2, 4)).unwrap()).unwrap();
    m.tap("rotl", &m.lit(0b1000, 4).rotl(2).unwrap()).unwrap();
    m.tap("rotr", &m.lit(0b1000, 4).rotr(2).unwrap()).unwrap();
    m.tap("min", &min(&a, &b).unwrap()).unwrap();
    m.tap("max", &max(&a, &b).unwrap()).unwrap();
    m.tap("sub", &b.sub(&a).unwrap()).unwrap();
    m.tap("mul", &m.lit(3, 4).mul(&m.lit(5, 4)).unwrap()).unwrap();
    m.tap("div", &m.lit(14, 4).div(&m.lit(4, 4)).unwrap()).unwrap();
    m.tap("rem", &m.lit(14, 4).rem(&m.lit(4, 4)).unwrap()).unwrap();
    let dev = m.compile().unwrap();

    let mut sim = Simulator::new(&dev);
    sim.step().unwrap();
    let t = |n: &str| sim.tap_value(n).unwrap().to_u64();
    assert_eq!(t("inv"), 0b0011);
    assert_eq!(t("and"), 0b0100);
    assert_eq!(t("or"), 0b1101);
    assert_eq!(t("xor"), 0b1001);
    assert_eq!(t("andr"), 1);
    assert_eq!(t("andr2"), 0);
    assert_eq!(t("orr"), 1);
    assert_eq!(t("xorr"), 1);
    assert_eq!(t("shl"), 0b1000);
    assert_eq!(t("shr"), 0b0010);
    assert_eq!(t("rotl"), 0b0010);
    assert_eq!(t("rotr"), 0b0010);
    assert_eq!(t("min"), 0b0101);
    assert_eq!(t("max"), 0b1100);
    assert_eq!(t("sub"), 0b1001);
    assert_eq!(t("mul"), 15);
    assert_eq!(t("div"), 3);
    assert_eq!(t("rem"), 2);
}

/**
 * signed variants: compare, arithmetic shift, division.
 */
#[test]
fn test_signed_ops() {
    let mut m = Module::new("signed");
    let minus_one = m.lit(0xf, 4);
    let two = m.lit(0x2, 4);
    m.tap("lt_s", &minus_one.lt_s(&two).unwrap()).unwrap();
    m.tap("lt_u", &minus_one.lt(&two).unwrap()).unwrap();
    m.tap("sra", &m.lit(0x8, 4).sra(&m.lit(1, 4)).unwrap()).unwrap();
    let minus_four = m.lit(0xc, 4);
    m.tap("div_s", &minus_four.div_s(&two).unwrap()).unwrap();
    m.tap("sext", &minus_one.sext(8).unwrap()).unwrap();
    let dev = m.compile().unwrap();

    let mut sim = Simulator::new(&dev);
    sim.step().unwrap();
    let t = |n: &str| sim.tap_value(n).unwrap().to_u64();
    assert_eq!(t("lt_s"), 1);
    assert_eq!(t("lt_u"), 0);
    assert_eq!(t("sra"), 0xc);
    assert_eq!(t("div_s"), 0xe);
    assert_eq!(t("sext"), 0xff);
}

/**
 * literal values are interned: one node per value and width.
 */
#[test]
fn test_literal_pool() {
    let m = Module::new("lits");
    let a = m.lit(5, 8);
    let b = m.lit(5, 8);
    let c = m.lit(5, 4);
    assert_eq!(a.id(), b.id());
    assert_ne!(a.id(), c.id());
}

/**
 * duplicate tap names are auto-suffixed, renaming the first instance too.
 */
#[test]
fn test_tap_names() {
    let mut m = Module::new("taps");
    let (a, _) = m.input("a", 4);
    m.tap("probe", &a).unwrap();
    m.tap("probe", &a).unwrap();
    let dev = m.compile().unwrap();
    let mut sim = Simulator::new(&dev);
    sim.step().unwrap();
    assert!(sim.tap_value("probe_0").is_ok());
    assert!(sim.tap_value("probe_1").is_ok());
    let e = sim.tap_value("probe").unwrap_err();
    assert_eq!(e.t, HdlErrorType::UnknownTap);
}

/**
 * the tick counter leaf follows the cycle number.
 */
#[test]
fn test_tick_counter() {
    let mut m = Module::new("ticks");
    let t = m.tick();
    let low = t.slice(0, 8).unwrap();
    m.tap("t", &low).unwrap();
    let dev = m.compile().unwrap();
    let mut sim = Simulator::new(&dev);
    for want in 0..10u64 {
        sim.step().unwrap();
        assert_eq!(sim.tap_value("t").unwrap().to_u64(), want);
    }
}

/**
 * the tracer records change-only samples and emits well-formed vcd.
 */
#[test]
fn test_tracer_vcd() {
    let dev = build_fsm3();
    let mut tracer = Tracer::new(&dev);
    tracer.run(9).unwrap();
    let text = tracer.to_text();
    info!("trace:\n{}", text);
    // the state changes every tick, so every tick is recorded
    assert!(text.lines().count() >= 9);

    let mut out = Vec::new();
    write_vcd(&tracer, &mut out).unwrap();
    let vcd = String::from_utf8(out).unwrap();
    assert!(vcd.contains("$timescale"));
    assert!(vcd.contains("$scope module fsm3"));
    assert!(vcd.contains("$var wire 2"));
    assert!(vcd.contains("#0"));
    assert!(vcd.contains("#8"));
}

/**
 * print nodes format their sources once per tick without disturbing the
 * design.
 */
#[test]
fn test_print_node() {
    let mut m = Module::new("printer");
    let mut r = m.reg(4, 0).unwrap();
    let inc = r.q.add(&r.q.lit(1)).unwrap();
    r.next.assign(&inc).unwrap();
    m.print("count={}", &[&r.q]).unwrap();
    m.tap("q", &r.q).unwrap();
    let dev = m.compile().unwrap();
    let mut sim = Simulator::new(&dev);
    sim.run(3).unwrap();
    assert_eq!(sim.tap_value("q").unwrap().to_u64(), 3);
}
