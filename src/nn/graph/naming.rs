/*
 * @Author       : 老董
 * @Date         : 2026-10-10
 * @Description  : Keras风格的层名/张量名生成
 *
 * 层名为`前缀_序号`（如`dense_3`），每个前缀单独计数，从1开始；
 * 张量名为`层名/算子名:端口`（如`dense_3/BiasAdd:0`），输入层为`层名:端口`。
 * 追加到基础网络上时，计数器以基础网络中已出现的名称为起点，保证新名称不与之冲突。
 */

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct TensorNameGenerator {
    counters: HashMap<String, u64>,
}

impl TensorNameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个已存在的张量名，使后续生成的序号大于它
    pub fn reserve(&mut self, tensor_name: &str) {
        let layer_name = tensor_name
            .split(['/', ':'])
            .next()
            .unwrap_or(tensor_name);
        let Some((prefix, number)) = layer_name.rsplit_once('_') else {
            return;
        };
        let Ok(number) = number.parse::<u64>() else {
            return;
        };
        let counter = self.counters.entry(prefix.to_string()).or_insert(0);
        *counter = (*counter).max(number);
    }

    /// 生成下一个层名，如`dense_1`
    pub fn next_layer_name(&mut self, prefix: &str) -> String {
        let counter = self.counters.entry(prefix.to_string()).or_insert(0);
        *counter += 1;
        format!("{prefix}_{counter}")
    }

    pub fn input_tensor_name(layer_name: &str, port: usize) -> String {
        format!("{layer_name}:{port}")
    }

    pub fn inner_tensor_name(layer_name: &str, op_name: &str, port: usize) -> String {
        format!("{layer_name}/{op_name}:{port}")
    }
}
