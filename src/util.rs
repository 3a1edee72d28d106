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
use std::time::Duration;

/// Formats a duration as milliseconds with microsecond precision.
pub fn duration_millis(duration: Duration) -> String {
    format!("{}.{:03} ms", duration.as_millis(), duration.subsec_micros() % 1000)
}

pub(crate) fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| {
            v == "1"
                || v.eq_ignore_ascii_case("true")
                || v.eq_ignore_ascii_case("yes")
                || v.eq_ignore_ascii_case("on")
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use serial_test::serial;

    use crate::util::{duration_millis, env_flag};

    #[test]
    fn test_duration_millis_strings() {
        assert_eq!("0.000 ms", duration_millis(Duration::ZERO));
        assert_eq!("50.000 ms", duration_millis(Duration::from_millis(50)));
        assert_eq!("0.003 ms", duration_millis(Duration::from_nanos(3333)));
        assert_eq!("1500.250 ms", duration_millis(Duration::from_micros(1_500_250)));
    }

    #[test]
    #[serial]
    fn test_env_flag() {
        std::env::set_var("PINREC_TEST_FLAG", "Yes");
        assert!(env_flag("PINREC_TEST_FLAG"));
        std::env::set_var("PINREC_TEST_FLAG", "0");
        assert!(!env_flag("PINREC_TEST_FLAG"));
        std::env::remove_var("PINREC_TEST_FLAG");
        assert!(!env_flag("PINREC_TEST_FLAG"));
    }
}
