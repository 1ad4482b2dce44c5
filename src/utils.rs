/*
 * Filename: /src/utils.rs
 * Project: rvhdl
 * Created Date: 2021-09-12, 09:16:30
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

/**
 * activate logging on stdout through env_logger (max level).
 */
pub(crate) fn enable_logging_internal(enable: bool) {
    if enable == true {
        let _ = env_logger::builder()
            .filter_level(log::LevelFilter::max())
            .try_init();
        log::set_max_level(log::LevelFilter::max());
    } else {
        let _ = env_logger::builder()
            .filter_level(log::LevelFilter::Off)
            .try_init();
        log::set_max_level(log::LevelFilter::Off);
    }
}

/**
 * check if log is enabled.
 */
#[allow(dead_code)]
pub(crate) fn log_enabled() -> bool {
    log::max_level() == Level::max()
}
