// ============================================================================
// 编码表持久化模块 - 支持二进制和 JSON 两种格式
// ============================================================================
//
// 编码表是确定性的，但在长序列、高维度下重算并不免费。本模块把已实现的
// 编码表持久化到磁盘，供推理端直接加载，支持两种序列化格式：
//
// 1. **二进制格式** (推荐用于生产):
//    - 使用 bincode 序列化，文件小、速度快
//    - 文件扩展名: .bin
//
// 2. **JSON 格式** (推荐用于调试):
//    - 人类可读，方便检查编码值
//    - 跨语言兼容，可用 Python 读取
//    - 文件扩展名: .json
//
// ============================================================================

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use bincode::{Decode, Encode};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::position_encoding::PositionalEncoding;

/// **编码表的可序列化表示**
///
/// `ndarray` 的数组不直接参与序列化，按 `(shape, data)` 展平存储，
/// 与加载端解耦。
#[derive(Clone, Encode, Decode, Serialize, Deserialize)]
pub struct SerializableEncoding {
    /// 文件格式版本号
    pub version: u32,
    pub n_positions: usize,
    pub dimension: usize,
    pub position_rate: f32,
    /// 行 0 对应的绝对位置（平移过的表不从 0 开始）
    pub offset: i64,
    /// 表是否已由闭式公式填充
    pub realized: bool,
    pub table_shape: (usize, usize),
    pub table_data: Vec<f32>,
}

impl SerializableEncoding {
    pub fn from_encoding(encoding: &PositionalEncoding) -> Self {
        Self {
            version: 1,
            n_positions: encoding.n_positions,
            dimension: encoding.dimension,
            position_rate: encoding.position_rate,
            offset: encoding.offset,
            realized: encoding.realized,
            table_shape: encoding.value.dim(),
            table_data: encoding
                .value
                .iter()
                .map(|&x| if x.is_finite() { x } else { 0.0 })
                .collect(),
        }
    }

    pub fn to_encoding(&self) -> Result<PositionalEncoding, String> {
        // 经过构造器校验，拒绝奇数维度等非法形状
        let mut encoding = PositionalEncoding::initial_value_with_rate(
            self.n_positions,
            self.dimension,
            self.position_rate,
        )?;

        if self.table_shape != (self.n_positions, self.dimension) {
            log::error!(
                "编码表形状 {:?} 与元数据 ({}, {}) 不一致",
                self.table_shape,
                self.n_positions,
                self.dimension
            );
            return Err("编码表形状与元数据不一致".to_string());
        }

        let value = match Array2::from_shape_vec(self.table_shape, self.table_data.clone()) {
            Ok(arr) => arr,
            Err(e) => {
                log::error!("Failed to reconstruct encoding table: {}", e);
                return Err(format!("编码表数据损坏: {}", e));
            }
        };

        encoding.value = value;
        encoding.offset = self.offset;
        encoding.realized = self.realized;
        Ok(encoding)
    }
}

/// 保存编码表到二进制文件
pub fn save_encoding_binary<P: AsRef<Path>>(
    encoding: &PositionalEncoding,
    path: P,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("💾 开始保存编码表到二进制文件...");
    println!("   路径: {:?}", path.as_ref());

    let serializable = SerializableEncoding::from_encoding(encoding);

    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);

    let config = bincode::config::standard();
    bincode::encode_into_std_write(&serializable, &mut writer, config)?;

    let file_size = std::fs::metadata(path.as_ref())?.len();
    println!("   文件大小: {:.2} KB", file_size as f64 / 1024.0);
    println!("✅ 编码表保存成功!");

    Ok(())
}

/// 从二进制文件加载编码表
pub fn load_encoding_binary<P: AsRef<Path>>(
    path: P,
) -> Result<PositionalEncoding, Box<dyn std::error::Error>> {
    println!("📂 开始从二进制文件加载编码表...");
    println!("   路径: {:?}", path.as_ref());

    let file = File::open(path.as_ref())?;
    let mut reader = BufReader::new(file);

    let config = bincode::config::standard();
    let serializable: SerializableEncoding = bincode::decode_from_std_read(&mut reader, config)?;

    println!("   ✓ 文件读取成功");
    println!("   格式版本: {}", serializable.version);
    println!(
        "   表形状: ({}, {})",
        serializable.n_positions, serializable.dimension
    );

    let encoding = serializable.to_encoding()?;
    println!("✅ 编码表加载成功!");

    Ok(encoding)
}

/// 保存编码表到 JSON 文件
pub fn save_encoding_json<P: AsRef<Path>>(
    encoding: &PositionalEncoding,
    path: P,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("💾 开始保存编码表到 JSON 文件...");
    println!("   路径: {:?}", path.as_ref());

    let serializable = SerializableEncoding::from_encoding(encoding);

    let file = File::create(path.as_ref())?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &serializable)?;

    let file_size = std::fs::metadata(path.as_ref())?.len();
    println!("   文件大小: {:.2} KB", file_size as f64 / 1024.0);
    println!("✅ 编码表保存成功!");

    Ok(())
}

/// 从 JSON 文件加载编码表
pub fn load_encoding_json<P: AsRef<Path>>(
    path: P,
) -> Result<PositionalEncoding, Box<dyn std::error::Error>> {
    println!("📂 开始从 JSON 文件加载编码表...");
    println!("   路径: {:?}", path.as_ref());

    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);
    let serializable: SerializableEncoding = serde_json::from_reader(reader)?;

    println!("   ✓ 文件读取成功");
    println!("   格式版本: {}", serializable.version);
    println!(
        "   表形状: ({}, {})",
        serializable.n_positions, serializable.dimension
    );

    let encoding = serializable.to_encoding()?;
    println!("✅ 编码表加载成功!");

    Ok(encoding)
}

/// 自动选择加载方法
pub fn load_encoding_auto<P: AsRef<Path>>(
    path: P,
) -> Result<PositionalEncoding, Box<dyn std::error::Error>> {
    let path_str = path.as_ref().to_str().unwrap_or("");

    if path_str.ends_with(".json") {
        load_encoding_json(path)
    } else {
        load_encoding_binary(path)
    }
}
