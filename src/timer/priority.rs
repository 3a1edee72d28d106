// Copyright (C) 2025 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use thread_priority::{set_current_thread_priority, ThreadPriority, ThreadPriorityValue};
use tracing::{info, warn};

use crate::util::env_flag;

const DEFAULT_TICK_THREAD_PRIORITY: u8 = 70;

/// Resolves the tick thread priority. PINREC_THREAD_PRIORITY wins over the configured
/// value; anything outside of 0..100 falls back to the default.
pub fn tick_thread_priority(configured: Option<u8>) -> ThreadPriorityValue {
    std::env::var("PINREC_THREAD_PRIORITY")
        .ok()
        .and_then(|v| v.parse::<u8>().ok())
        .or(configured)
        .and_then(|n| ThreadPriorityValue::try_from(n).ok())
        .unwrap_or_else(default_priority)
}

fn default_priority() -> ThreadPriorityValue {
    ThreadPriorityValue::try_from(DEFAULT_TICK_THREAD_PRIORITY)
        .expect("default tick thread priority is in range")
}

pub fn rt_enabled() -> bool {
    !env_flag("PINREC_DISABLE_RT")
}

/// Raises the calling tick thread's priority, asking for SCHED_FIFO on unix when allowed.
/// Failures are logged once per thread and otherwise ignored.
pub fn configure_tick_thread_priority(priority: ThreadPriorityValue, rt: bool) {
    let tp = ThreadPriority::Crossplatform(priority);
    let _ = set_current_thread_priority(tp);

    #[cfg(unix)]
    if rt {
        use thread_priority::unix::{
            set_thread_priority_and_policy, thread_native_id, RealtimeThreadSchedulePolicy,
            ThreadSchedulePolicy,
        };
        let tid = thread_native_id();
        match set_thread_priority_and_policy(
            tid,
            tp,
            ThreadSchedulePolicy::Realtime(RealtimeThreadSchedulePolicy::Fifo),
        ) {
            Ok(()) => info!("Enabled RT SCHED_FIFO for tick thread"),
            Err(e) => warn!(error = %e, "Failed to set RT SCHED_FIFO for tick thread"),
        }
    }

    #[cfg(not(unix))]
    let _ = rt;
}
