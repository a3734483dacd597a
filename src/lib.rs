//! # posenc - 正弦位置编码模块
//!
//! 这是一个为 DeepVoice3 风格语音合成模型提供位置编码的纯 Rust 库。
//! Transformer 类网络的注意力机制本身没有位置概念，必须通过位置编码
//! 向序列注入顺序信息。本库只负责这一件事：生成正弦位置编码表，
//! 并提供纯函数式的平移变换。
//!
//! ## 核心设计理念
//!
//! 1. **纯 Rust 实现**：不依赖 PyTorch/TensorFlow，只使用 `ndarray` 进行矩阵运算
//! 2. **不可变值对象**：`sinusoidal_encode` 和 `shift_n` 都返回新表，原表不被修改
//! 3. **闭式计算**：平移通过重新代入角度公式实现，而不是对已有表做切片，
//!    因此平移后的位置可以超出原表范围
//!
//! ## 模块组织
//!
//! - `position_encoding`: 位置编码值对象（生成 + 平移）
//! - `encoding_serialization`: 编码表的二进制 / JSON 持久化
//! - `utils`: 数值工具函数（Gram 矩阵、误差度量）

// ============================================================================
// 模块声明
// ============================================================================

pub mod encoding_serialization; // 编码表持久化：保存和加载预计算的编码表
pub mod position_encoding; // 位置编码：为序列注入位置信息
pub mod utils; // 工具函数：Gram 矩阵与浮点比较辅助

// ============================================================================
// 重导出核心类型（简化外部使用）
// ============================================================================

pub use encoding_serialization::{
    SerializableEncoding, load_encoding_auto, load_encoding_binary, load_encoding_json,
    save_encoding_binary, save_encoding_json,
};
pub use position_encoding::PositionalEncoding;
pub use utils::{allclose, gram_matrix, max_abs_diff};

// ============================================================================
// 编码超参数（Encoding Hyperparameters）
// ============================================================================

/// **角频率基数**
///
/// 正弦位置编码的波长基数。第 `j` 个频带的角频率为
/// `ω_j = 1 / 10000^(2j / dimension)`，即波长从 `2π` 几何递增到 `10000·2π`。
///
/// **为什么是 10000？**
/// - 这是 Transformer 原始论文采用的值，几乎所有后续模型沿用
/// - 保证在常见序列长度（几百到几千）内任意两个位置的编码都不同
/// - 低频带变化缓慢，承载"粗粒度"位置；高频带承载"细粒度"位置
pub const ENCODING_BASE: f32 = 10000.0;

/// **默认位置速率（position rate）**
///
/// DeepVoice3 中 encoder/decoder 两侧的位置编码允许按各自的速率 `w`
/// 缩放角度（`angle = w · pos · ω_j`），以对齐文本与音频的时间轴。
/// 默认值 1.0 即标准 Transformer 公式。
pub const DEFAULT_POSITION_RATE: f32 = 1.0;

/// **编码表比较的绝对容差**
///
/// 编码表全程使用 `f32` 单精度计算（与三角函数的精度相匹配）。
/// 平移线性等代数恒等式在单精度下成立到约 1e-5 量级，
/// 取 1e-4 作为对外承诺的绝对容差。
pub const ENCODING_ATOL: f32 = 1e-4;
