/*
 * @Author       : 老董
 * @Date         : 2026-09-13
 * @Description  : LayerGraph describe/summary 相关方法
 */

use super::{LayerGraph, LayerId};
use crate::errors::LayerGraphError;
use crate::nn::descriptor::{GraphDescriptor, NodeDescriptor, NodeKind};
use crate::nn::params::ParameterBlock;
use crate::tensor::{TensorSpec, format_shape};

impl LayerGraph {
    // ========== 图描述（describe）==========

    /// 导出从`outputs`可达的层图的描述符（会先完成张量规格推断）
    ///
    /// # 示例
    /// ```ignore
    /// let descriptor = graph.describe("model", &[out])?;
    /// println!("{}", descriptor.to_json()?);
    /// ```
    pub fn describe(&self, name: &str, outputs: &[LayerId]) -> Result<GraphDescriptor, LayerGraphError> {
        let inferred = self.infer_specs(outputs)?;
        let mut descriptor = GraphDescriptor::new(name);

        for &id in inferred.order() {
            let layer = self.layer(id)?;
            let node = layer.node();
            let mut parameters = ParameterBlock::new();
            node.as_layer()
                .save_parameters(&mut parameters)
                .map_err(|e| e.at_layer(id, &layer.display_name()))?;
            let name = inferred
                .layer_name(id)
                .map_or_else(|| layer.display_name(), str::to_string);
            descriptor.add_node(NodeDescriptor {
                id: id.0,
                name,
                kind: if node.is_input() {
                    NodeKind::Input
                } else {
                    NodeKind::Inner
                },
                type_tag: node.type_tag().to_string(),
                parameters,
                output_specs: inferred.layer_specs(id).unwrap_or_default().to_vec(),
                parents: layer.parents().iter().flatten().copied().collect(),
            });
        }
        descriptor.outputs = outputs.iter().map(|id| id.0).collect();

        Ok(descriptor)
    }

    // ========== 模型摘要（summary）==========

    /// 返回模型摘要字符串（Unicode 文本表格，类似 Keras 的 `model.summary()`）
    ///
    /// ```text
    /// ┌──────────┬────────────────────┬──────────┬────────┐
    /// │ 层名称   │ 类型               │ 输出形状 │ 父节点 │
    /// ├──────────┼────────────────────┼──────────┼────────┤
    /// │ input_1  │ keras.layers.Input │ (32, 1)  │ -      │
    /// ...
    /// ```
    pub fn summary_string(&self, name: &str, outputs: &[LayerId]) -> Result<String, LayerGraphError> {
        let desc = self.describe(name, outputs)?;
        let rows: Vec<[String; 4]> = desc
            .nodes
            .iter()
            .map(|node| {
                [
                    node.name.clone(),
                    node.type_tag.clone(),
                    node.output_specs
                        .iter()
                        .map(Self::format_spec_shape)
                        .collect::<Vec<_>>()
                        .join("; "),
                    Self::format_parent_names(&desc, node),
                ]
            })
            .collect();

        let headers = ["层名称", "类型", "输出形状", "父节点"];
        let mut widths = headers.map(Self::display_width);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(Self::display_width(cell));
            }
        }
        let total_width = widths.iter().map(|w| w + 3).sum::<usize>() + 1;

        let line = |left: &str, mid: &str, right: &str| -> String {
            let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("{left}{}{right}\n", segments.join(mid))
        };
        let row_line = |cells: &[String]| -> String {
            let padded: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(cell, &w)| {
                    format!("{cell}{}", " ".repeat(w - Self::display_width(cell)))
                })
                .collect();
            format!("│ {} │\n", padded.join(" │ "))
        };

        let mut output = String::new();
        output.push_str(&format!("模型摘要: {}\n", desc.name));
        output.push_str(&line("┌", "┬", "┐"));
        output.push_str(&row_line(&headers.map(str::to_string)));
        output.push_str(&line("├", "┼", "┤"));
        for row in &rows {
            output.push_str(&row_line(row));
        }
        output.push_str(&line("├", "┴", "┤"));

        // 统计信息
        let stats = format!("层数: {}，输入层: {}", desc.nodes.len(), desc.num_inputs());
        output.push_str(&format!(
            "│ {stats}{} │\n",
            " ".repeat((total_width - 4).saturating_sub(Self::display_width(&stats)))
        ));
        output.push_str(&format!("└{}┘\n", "─".repeat(total_width - 2)));

        Ok(output)
    }

    /// 含批维度的形状，如`(32, 1)`、`(?, 10, 4)`
    fn format_spec_shape(spec: &TensorSpec) -> String {
        let batch = spec
            .batch_size()
            .map_or_else(|| "?".to_string(), |b| b.to_string());
        if spec.rank() == 0 {
            format!("({batch})")
        } else {
            format!("({batch}, {})", format_shape(spec.shape()))
        }
    }

    /// 格式化父节点名称列表
    fn format_parent_names(desc: &GraphDescriptor, node: &NodeDescriptor) -> String {
        if node.parents.is_empty() {
            "-".to_string()
        } else {
            node.parents
                .iter()
                .filter_map(|p| desc.node(p.layer.0))
                .map(|n| n.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        }
    }

    /// 计算字符串显示宽度（考虑中文字符）
    fn display_width(s: &str) -> usize {
        s.chars().map(|c| if c.is_ascii() { 1 } else { 2 }).sum()
    }
}
