//! # 常用工具模块
//!
//! 本模块提供单元测试用的断言宏，以及生成后端（Python/Keras）代码时用到的字面量转换

#[cfg(test)]
mod tests;

pub mod macro_for_unit_test;
pub mod python;
