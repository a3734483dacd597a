//! 位置编码的性质测试（property-based）
//!
//! 用随机形状/平移量验证正弦编码的两条代数性质：
//! - 平移线性：先平移再编码 == 编更大的表再取尾部切片
//! - 弱正交性：去掉第 0 行后，Gram 矩阵的对角线恒等于频带数
//!
//! 两条性质都在位置 0 处退化（该行 sin 列全零），因此一律丢弃第 0 行。

use ndarray::s;
use posenc::{gram_matrix, max_abs_diff, PositionalEncoding, ENCODING_ATOL};
use proptest::prelude::*;

// ============================================================================
// 平移线性
// ============================================================================

proptest! {
    /// shift_n(k) 去掉行 0 后，等于 (n+k) 行编码表的行 [k+1, k+n)
    #[test]
    fn prop_shift_linearity(
        n_positions in 2usize..=96,
        half_dim in 1usize..=64,
        shift in 1i64..=128,
    ) {
        let dimension = 2 * half_dim;

        let pe = PositionalEncoding::initial_value(n_positions, dimension).unwrap();
        let pe_shifted =
            PositionalEncoding::initial_value(n_positions + shift as usize, dimension).unwrap();

        let x = pe.sinusoidal_encode().shift_n(shift);
        let y = pe_shifted.sinusoidal_encode();

        // drop position 0 on both sides
        let x_tail = x.value.slice(s![1.., ..]);
        let y_tail = y.value.slice(s![(shift as usize + 1).., ..]);

        let diff = max_abs_diff(x_tail, y_tail);
        prop_assert!(
            diff < ENCODING_ATOL,
            "shift linearity violated: max diff {} (n={}, d={}, k={})",
            diff, n_positions, dimension, shift
        );
    }

    /// 平移可加：shift_n(a).shift_n(b) 与 shift_n(a+b) 逐位相等
    #[test]
    fn prop_shift_composition(
        n_positions in 2usize..=32,
        half_dim in 1usize..=16,
        a in -64i64..=64,
        b in -64i64..=64,
    ) {
        let dimension = 2 * half_dim;
        let encoded = PositionalEncoding::initial_value(n_positions, dimension)
            .unwrap()
            .sinusoidal_encode();

        let two_step = encoded.shift_n(a).shift_n(b);
        let one_step = encoded.shift_n(a + b);

        // 两条路径代入同一整数位置，f32 计算路径完全一致
        prop_assert_eq!(&two_step.value, &one_step.value);
    }

    /// 平移不改变表形状
    #[test]
    fn prop_shift_preserves_shape(
        n_positions in 1usize..=64,
        half_dim in 1usize..=32,
        shift in -256i64..=256,
    ) {
        let dimension = 2 * half_dim;
        let shifted = PositionalEncoding::initial_value(n_positions, dimension)
            .unwrap()
            .sinusoidal_encode()
            .shift_n(shift);

        prop_assert_eq!(shifted.value.dim(), (n_positions, dimension));
    }

    /// 平移线性对任意位置速率都成立
    #[test]
    fn prop_shift_linearity_with_rate(
        n_positions in 2usize..=32,
        half_dim in 1usize..=16,
        shift in 1i64..=64,
        rate in 0.25f32..4.0,
    ) {
        let dimension = 2 * half_dim;

        let x = PositionalEncoding::initial_value_with_rate(n_positions, dimension, rate)
            .unwrap()
            .sinusoidal_encode()
            .shift_n(shift);
        let y = PositionalEncoding::initial_value_with_rate(
            n_positions + shift as usize,
            dimension,
            rate,
        )
        .unwrap()
        .sinusoidal_encode();

        let diff = max_abs_diff(
            x.value.slice(s![1.., ..]),
            y.value.slice(s![(shift as usize + 1).., ..]),
        );
        prop_assert!(diff < ENCODING_ATOL, "max diff {} at rate {}", diff, rate);
    }
}

// ============================================================================
// 弱正交性
// ============================================================================

proptest! {
    /// 去掉行 0 后，X·Xᵀ 的对角线等于频带数 dimension/2
    ///
    /// 每个频带贡献 sin² + cos² = 1，因此每行的范数平方恒等于频带数。
    /// 非对角元素不受约束（行与行并不严格正交，所以叫"弱"正交）。
    #[test]
    fn prop_weakly_orthogonal(
        n_positions in 2usize..=10,
        half_dim in 1usize..=64,
    ) {
        let dimension = 2 * half_dim;
        let encoded = PositionalEncoding::initial_value(n_positions, dimension)
            .unwrap()
            .sinusoidal_encode();

        let x = encoded.value.slice(s![1.., ..]);
        let xx = gram_matrix(x);
        let expected = half_dim as f32;

        // 对角线量级随频带数增长，用相对容差覆盖 f32 点积的累加误差
        let tol = ENCODING_ATOL * expected.max(1.0);
        for row in 0..n_positions - 1 {
            let diag = xx[[row, row]];
            prop_assert!(
                (diag - expected).abs() <= tol,
                "row {} norm² = {}, expected {} (d={})",
                row, diag, expected, dimension
            );
        }
    }

    /// 任意形状下，位置 0 的行都是 [0, 1, 0, 1, ...]
    #[test]
    fn prop_row_zero_degenerate(
        n_positions in 1usize..=32,
        half_dim in 1usize..=64,
    ) {
        let dimension = 2 * half_dim;
        let encoded = PositionalEncoding::initial_value(n_positions, dimension)
            .unwrap()
            .sinusoidal_encode();

        for band in 0..half_dim {
            prop_assert!(encoded.get_encoding(0, 2 * band).abs() < 1e-6);
            prop_assert!((encoded.get_encoding(0, 2 * band + 1) - 1.0).abs() < 1e-6);
        }
    }
}
