cfg_if::cfg_if! {
    if #[cfg(unix)] {
        /// True when the effective UID is root. Cache dropping and fio's
        /// direct I/O both need it.
        pub fn is_elevated() -> bool {
            unsafe { libc::geteuid() == 0 }
        }
    } else {
        pub fn is_elevated() -> bool {
            false
        }
    }
}
