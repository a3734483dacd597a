/// 工具函数模块
///
/// 包含编码表校验用到的数值工具
use ndarray::{Array2, ArrayView2};

/// Gram 矩阵 X·Xᵀ
///
/// 行向量两两内积组成的对称矩阵。正弦编码每行由 dimension/2 对
/// (sin, cos) 组成，因此对角线（行范数平方）恒等于频带数。
pub fn gram_matrix(x: ArrayView2<f32>) -> Array2<f32> {
    x.dot(&x.t())
}

/// 两个同形状矩阵的最大逐元素绝对差
///
/// # Panics
/// 形状不一致时 panic（调用方负责保证形状契约）。
pub fn max_abs_diff(a: ArrayView2<f32>, b: ArrayView2<f32>) -> f32 {
    assert_eq!(a.dim(), b.dim(), "Shape mismatch: {:?} vs {:?}", a.dim(), b.dim());

    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x - y).abs())
        .fold(0.0, f32::max)
}

/// 绝对容差下的矩阵近似相等
pub fn allclose(a: ArrayView2<f32>, b: ArrayView2<f32>, atol: f32) -> bool {
    max_abs_diff(a, b) <= atol
}
