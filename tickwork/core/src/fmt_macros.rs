//! Logging shims
//!
//! Forward to `defmt` when the `defmt` feature is enabled, otherwise to the
//! `log` facade when `log` is enabled, otherwise expand to nothing. Crates
//! using the defmt backend must depend on `defmt` themselves.
//!
//! Format strings must stick to plain `{}` placeholders so they are valid for
//! both backends.

#[cfg(feature = "defmt")]
#[macro_export]
macro_rules! tw_trace {
    ($($arg:tt)*) => { ::defmt::trace!($($arg)*) };
}

#[cfg(feature = "defmt")]
#[macro_export]
macro_rules! tw_debug {
    ($($arg:tt)*) => { ::defmt::debug!($($arg)*) };
}

#[cfg(feature = "defmt")]
#[macro_export]
macro_rules! tw_info {
    ($($arg:tt)*) => { ::defmt::info!($($arg)*) };
}

#[cfg(feature = "defmt")]
#[macro_export]
macro_rules! tw_warn {
    ($($arg:tt)*) => { ::defmt::warn!($($arg)*) };
}

#[cfg(all(feature = "log", not(feature = "defmt")))]
#[macro_export]
macro_rules! tw_trace {
    ($($arg:tt)*) => { $crate::__log::trace!($($arg)*) };
}

#[cfg(all(feature = "log", not(feature = "defmt")))]
#[macro_export]
macro_rules! tw_debug {
    ($($arg:tt)*) => { $crate::__log::debug!($($arg)*) };
}

#[cfg(all(feature = "log", not(feature = "defmt")))]
#[macro_export]
macro_rules! tw_info {
    ($($arg:tt)*) => { $crate::__log::info!($($arg)*) };
}

#[cfg(all(feature = "log", not(feature = "defmt")))]
#[macro_export]
macro_rules! tw_warn {
    ($($arg:tt)*) => { $crate::__log::warn!($($arg)*) };
}

#[cfg(not(any(feature = "log", feature = "defmt")))]
#[macro_export]
macro_rules! tw_trace {
    ($($arg:tt)*) => {{
        if false {
            let _ = ::core::format_args!($($arg)*);
        }
    }};
}

#[cfg(not(any(feature = "log", feature = "defmt")))]
#[macro_export]
macro_rules! tw_debug {
    ($($arg:tt)*) => {{
        if false {
            let _ = ::core::format_args!($($arg)*);
        }
    }};
}

#[cfg(not(any(feature = "log", feature = "defmt")))]
#[macro_export]
macro_rules! tw_info {
    ($($arg:tt)*) => {{
        if false {
            let _ = ::core::format_args!($($arg)*);
        }
    }};
}

#[cfg(not(any(feature = "log", feature = "defmt")))]
#[macro_export]
macro_rules! tw_warn {
    ($($arg:tt)*) => {{
        if false {
            let _ = ::core::format_args!($($arg)*);
        }
    }};
}
