//! # 正弦位置编码（Sinusoidal Positional Encoding）
//!
//! 注意力机制对输入顺序是置换不变的："我喜欢你" 和 "你喜欢我" 若不加位置
//! 信息会得到相同的注意力模式。位置编码为每个序列下标生成一个确定性的
//! 向量"标记"，与 token 嵌入逐元素相加后送入网络。
//!
//! ## 公式
//!
//! ```text
//! PE(pos, 2j)   = sin(w · pos · ω_j)      // 偶数列使用 sin
//! PE(pos, 2j+1) = cos(w · pos · ω_j)      // 奇数列使用 cos
//! ω_j = 1 / 10000^(2j / dimension)
//! ```
//!
//! 其中：
//! - `pos` = 序列中的位置 (0, 1, 2, ...)
//! - `j` = 频带下标 (0, 1, ..., dimension/2 - 1)
//! - `w` = 位置速率（DeepVoice3 的 encoder/decoder 各自取不同的 `w`
//!   来对齐文本轴与音频轴，默认 1.0）
//!
//! 每个频带贡献一对 (sin, cos) 列，因此 `dimension` 必须是偶数。
//! 列布局为按频带交错：`[sin_0, cos_0, sin_1, cos_1, ...]`，
//! `sinusoidal_encode` 与 `shift_n` 始终使用同一布局。
//!
//! ## 平移恒等式
//!
//! 正弦编码满足加法恒等式：`encode(p + k)` 可以写成只依赖 `k` 的线性变换
//! 作用在 `encode(p)` 上。因此"先平移再编码"等价于"编更大的表再取尾部切片"，
//! 这也是本模块测试的核心性质。唯一的例外是位置 0：该行所有 sin 列为 0，
//! 信息坍缩，校验线性关系时应丢弃第 0 行。

use ndarray::Array2;

use crate::{DEFAULT_POSITION_RATE, ENCODING_BASE};

/// **位置编码值对象**
///
/// 形状描述符加一张已实现（或尚未实现）的编码表。所有变换都返回新值，
/// 不修改自身。
pub struct PositionalEncoding {
    /// **位置数**: 表的行数，行 `i` 对应序列下标 `i`
    pub n_positions: usize,

    /// **编码维度**: 表的列数，必须是偶数（每个频带占一对 sin/cos 列）
    pub dimension: usize,

    /// **位置速率 w**: 角度缩放因子，标准公式取 1.0
    pub position_rate: f32,

    /// **编码表** (n_positions × dimension)
    ///
    /// `initial_value` 之后为全零占位；`sinusoidal_encode` / `shift_n`
    /// 返回的实例中才是真正的编码值。
    pub value: Array2<f32>,

    /// 行 0 在闭式公式中对应的绝对位置，由 shift_n 累加
    pub(crate) offset: i64,

    /// 编码表是否已经由闭式公式填充
    pub(crate) realized: bool,
}

impl PositionalEncoding {
    /// **构造形状描述符**
    ///
    /// 只做参数校验和零表分配，不进行任何三角函数计算。
    ///
    /// # 参数
    /// - `n_positions`: 位置数（≥ 1）
    /// - `dimension`: 编码维度（≥ 2 的偶数）
    ///
    /// # 错误
    /// 参数不满足上述约束时返回 `Err`，不产生部分计算结果。
    pub fn initial_value(n_positions: usize, dimension: usize) -> Result<Self, String> {
        Self::initial_value_with_rate(n_positions, dimension, DEFAULT_POSITION_RATE)
    }

    /// **构造带位置速率的形状描述符**
    ///
    /// DeepVoice3 风格模型中 encoder/decoder 使用不同的速率 `w` 缩放角度
    /// （`angle = w · pos · ω_j`）。`w = 1.0` 退化为标准公式。
    ///
    /// # 参数
    /// - `position_rate`: 正的有限速率
    pub fn initial_value_with_rate(
        n_positions: usize,
        dimension: usize,
        position_rate: f32,
    ) -> Result<Self, String> {
        if n_positions < 1 {
            return Err(format!("n_positions 必须 >= 1，当前为 {}", n_positions));
        }
        if dimension < 2 || dimension % 2 != 0 {
            return Err(format!("dimension 必须是 >= 2 的偶数，当前为 {}", dimension));
        }
        if !position_rate.is_finite() || position_rate <= 0.0 {
            return Err(format!(
                "position_rate 必须是正的有限值，当前为 {}",
                position_rate
            ));
        }

        Ok(Self {
            n_positions,
            dimension,
            position_rate,
            value: Array2::zeros((n_positions, dimension)),
            offset: 0,
            realized: false,
        })
    }

    /// 频带数 = dimension / 2
    pub fn n_frequency_bands(&self) -> usize {
        self.dimension / 2
    }

    /// 第 `band` 个频带的角频率 `ω = 1 / 10000^(2·band / dimension)`
    fn angular_rate(&self, band: usize) -> f32 {
        1.0 / ENCODING_BASE.powf(2.0 * band as f32 / self.dimension as f32)
    }

    /// **生成正弦编码表**
    ///
    /// 纯函数：返回一个编码表已填充的新实例，`self` 不变。
    /// 行 `i` 的角度在绝对位置 `offset + i` 处求值，因此对平移后的
    /// 实例同样适用。
    ///
    /// # 返回值
    /// 编码表形状与 `self` 相同（n_positions × dimension）的新实例
    pub fn sinusoidal_encode(&self) -> Self {
        let mut value = Array2::zeros((self.n_positions, self.dimension));

        for row in 0..self.n_positions {
            let position = (self.offset + row as i64) as f32 * self.position_rate;
            for band in 0..self.n_frequency_bands() {
                let angle = position * self.angular_rate(band);
                value[[row, 2 * band]] = angle.sin();
                value[[row, 2 * band + 1]] = angle.cos();
            }
        }

        Self {
            n_positions: self.n_positions,
            dimension: self.dimension,
            position_rate: self.position_rate,
            value,
            offset: self.offset,
            realized: true,
        }
    }

    /// **平移编码表**
    ///
    /// 返回一个新实例，其行 `i` 等于闭式公式在位置 `offset + i + k` 处的
    /// 取值。实现方式是把 `k` 累加进位置参数后重新编码，而不是对已有表
    /// 做下标搬移，因此 `i + k` 超出原表行数、以及 `k` 为负数都是合法的。
    ///
    /// 平移满足可加性：`shift_n(a).shift_n(b)` 与 `shift_n(a + b)` 逐位相等。
    ///
    /// # 参数
    /// - `k`: 平移量（任意整数）
    pub fn shift_n(&self, k: i64) -> Self {
        let shifted = Self {
            n_positions: self.n_positions,
            dimension: self.dimension,
            position_rate: self.position_rate,
            value: Array2::zeros((self.n_positions, self.dimension)),
            offset: self.offset + k,
            realized: false,
        };
        shifted.sinusoidal_encode()
    }

    /// 读取单个编码值，下标越界时 panic
    pub fn get_encoding(&self, position: usize, dimension: usize) -> f32 {
        if position >= self.n_positions || dimension >= self.dimension {
            panic!("Position or dimension out of bounds");
        }
        self.value[[position, dimension]]
    }

    /// **把位置编码叠加到输入嵌入上**
    ///
    /// input: (seq_len, embedding_dim)，逐元素相加，超出编码表覆盖范围的
    /// 行/列保持不变。
    pub fn apply_to_input(&self, input: &mut Array2<f32>) {
        if !self.realized {
            log::warn!("apply_to_input 在未调用 sinusoidal_encode 的情况下被调用，编码表为全零");
        }

        let (seq_len, embedding_dim) = input.dim();
        let positions_to_encode = std::cmp::min(seq_len, self.n_positions);
        let dims_to_encode = std::cmp::min(embedding_dim, self.dimension);

        for pos in 0..positions_to_encode {
            for dim in 0..dims_to_encode {
                input[[pos, dim]] += self.value[[pos, dim]];
            }
        }
    }
}
