pub const ONE_KIB: u64 = 1 << 10;
pub const ONE_MIB: u64 = 1 << 20;
pub const ONE_GIB: u64 = 1 << 30;

/// A human label paired with the byte value it stands for.
#[derive(Debug, Clone, Copy)]
pub struct SizeSpec {
    pub label: &'static str,
    pub bytes: u64,
}

/// Test file sizes, iterated outermost. Labels are passed verbatim to fio
/// as its `--size` argument.
pub const FILE_SIZES: [SizeSpec; 3] = [
    SizeSpec { label: "2GiB", bytes: 2 * ONE_GIB },
    SizeSpec { label: "4GiB", bytes: 4 * ONE_GIB },
    SizeSpec { label: "8GiB", bytes: 8 * ONE_GIB },
];

/// Block sizes for the dd runs. Labels are passed verbatim as dd's `bs=`;
/// the byte values determine `count=` so every run transfers the full file
/// size.
pub const DD_BLOCK_SIZES: [SizeSpec; 6] = [
    SizeSpec { label: "512", bytes: 512 },
    SizeSpec { label: "4KiB", bytes: 4 * ONE_KIB },
    SizeSpec { label: "16KiB", bytes: 16 * ONE_KIB },
    SizeSpec { label: "64KiB", bytes: 64 * ONE_KIB },
    SizeSpec { label: "1MiB", bytes: ONE_MIB },
    SizeSpec { label: "50MiB", bytes: 50 * ONE_MIB },
];

/// Block sizes for the fio runs, in fio's own suffix notation. Same
/// magnitudes and order as [`DD_BLOCK_SIZES`].
pub const FIO_BLOCK_SIZES: [&str; 6] = ["512", "4k", "16k", "64k", "1M", "50M"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dd_and_fio_block_tables_line_up() {
        assert_eq!(DD_BLOCK_SIZES.len(), FIO_BLOCK_SIZES.len());
        // Both tables must walk the same magnitudes in the same order so the
        // two report sections are comparable row for row.
        let expected: [u64; 6] = [
            512,
            4 * ONE_KIB,
            16 * ONE_KIB,
            64 * ONE_KIB,
            ONE_MIB,
            50 * ONE_MIB,
        ];
        for (spec, bytes) in DD_BLOCK_SIZES.iter().zip(expected) {
            assert_eq!(spec.bytes, bytes);
        }
    }

    #[test]
    fn file_sizes_ascend() {
        assert!(FILE_SIZES.windows(2).all(|w| w[0].bytes < w[1].bytes));
    }
}
