//! # 张量规格模块
//!
//! 只描述张量的元信息（标识、名称、批大小、形状、元素类型、维度顺序），不含实际数据。

mod shape;
mod spec;

pub use shape::{Shape, fixed_shape, format_shape, num_elements, parse_shape};
pub use spec::{DimensionOrder, ElementType, TensorId, TensorSpec};

#[cfg(test)]
mod tests;
