/*
 * @Author       : 老董
 * @Date         : 2026-08-28
 * @Description  : 层图的持久化（GraphSerializer）
 *
 * 持久化格式（JSON键值树）：
 * ```text
 * {
 *   "1": { "class": "keras.layers.Dense", "parameters": {...}, "parents": [2] },
 *   "2": { "class": "keras.layers.Input", "parameters": {...} },
 *   "outputs": [1]
 * }
 * ```
 * - 节点以"1".."N"为键（0保留不用），"outputs"为输出层下标的有序列表
 * - 内部层的"parents"按槽位顺序记录父节点下标；仅当引用了非0输出端口时才写"parent_outputs"
 * - 用户为层指定了名称时写"name"
 *
 * 编码：输出层按列表顺序分配1..k；随后按逆拓扑顺序遍历，父节点在首次被引用时
 * 用同一个计数器分配下标（共享父节点只分配一次），因此每个层在输出时都已拥有下标，且下标连续。
 * 解码：按下标降序创建节点、加载并校验参数，第二遍再绑定父节点（与父子下标的相对大小无关），
 * 最后按"outputs"取出输出层并检查是否有环。
 */

use super::iterator::{GraphIterator, LayerVisitor};
use super::{LayerGraph, LayerHandle, LayerId};
use crate::errors::LayerGraphError;
use crate::nn::layer::{InnerLayerType, InputLayerType, TraitLayer};
use crate::nn::params::ParameterBlock;
use crate::nn::registry::LayerRegistry;
use serde_json::{Map, Value};
use std::io::{Read, Write};
use tracing::{debug, error};

/// 输出层下标列表的键
pub const KEY_OUTPUTS: &str = "outputs";
const KEY_CLASS: &str = "class";
const KEY_NAME: &str = "name";
const KEY_PARAMETERS: &str = "parameters";
const KEY_PARENTS: &str = "parents";
const KEY_PARENT_OUTPUTS: &str = "parent_outputs";

pub struct GraphSerializer<'r> {
    registry: &'r LayerRegistry,
}

impl<'r> GraphSerializer<'r> {
    pub fn new(registry: &'r LayerRegistry) -> Self {
        Self { registry }
    }

    // ========== 编码 ==========

    /// 把`outputs`可达的层图编码为持久化结构
    pub fn encode(&self, graph: &LayerGraph, outputs: &[LayerId]) -> Result<Value, LayerGraphError> {
        Self::encode_graph(graph, outputs).map_err(|e| {
            error!(error = %e, "保存层图失败");
            LayerGraphError::serialization("无法编码层图，详见日志", e)
        })
    }

    fn encode_graph(graph: &LayerGraph, outputs: &[LayerId]) -> Result<Value, LayerGraphError> {
        let iterator = GraphIterator::new(graph, outputs)?;
        let mut indices: Vec<Option<usize>> = vec![None; graph.len()];
        let mut counter = 0usize;
        let mut output_indices = Vec::with_capacity(outputs.len());
        for &output in outputs {
            let index = *indices[output.0].get_or_insert_with(|| {
                counter += 1;
                counter
            });
            output_indices.push(index);
        }
        for layer in iterator.iter().collect::<Vec<_>>().into_iter().rev() {
            for parent in layer.parents().iter().flatten() {
                indices[parent.layer.0].get_or_insert_with(|| {
                    counter += 1;
                    counter
                });
            }
        }

        let mut encoder = NodeEncoder {
            indices,
            entries: vec![None; counter + 1],
        };
        iterator.accept(&mut encoder)?;

        let mut root = Map::new();
        for (index, entry) in encoder.entries.into_iter().enumerate().skip(1) {
            let entry = entry.ok_or_else(|| {
                LayerGraphError::InvalidOperation(format!("下标{index}没有对应的层"))
            })?;
            root.insert(index.to_string(), entry);
        }
        root.insert(
            KEY_OUTPUTS.to_string(),
            Value::Array(output_indices.into_iter().map(Value::from).collect()),
        );
        debug!(nodes = counter, outputs = outputs.len(), "层图编码完成");
        Ok(Value::Object(root))
    }

    /// 编码并以JSON写入`writer`（不持有也不关闭`writer`）
    pub fn write_graph_to<W: Write>(
        &self,
        graph: &LayerGraph,
        outputs: &[LayerId],
        writer: W,
    ) -> Result<(), LayerGraphError> {
        let value = self.encode(graph, outputs)?;
        serde_json::to_writer_pretty(writer, &value).map_err(|e| {
            error!(error = %e, "写入层图失败");
            LayerGraphError::serialization("无法写入层图", e)
        })
    }

    // ========== 解码 ==========

    /// 从持久化结构重建层图，返回层图与输出层列表（保持原顺序）
    pub fn decode(&self, value: &Value) -> Result<(LayerGraph, Vec<LayerId>), LayerGraphError> {
        self.decode_graph(value).map_err(|e| {
            error!(error = %e, "加载层图失败");
            match e {
                LayerGraphError::UnknownLayerType(_) | LayerGraphError::GraphDeserialization { .. } => e,
                other => LayerGraphError::deserialization_caused_by("层图结构不一致", other),
            }
        })
    }

    /// 从`reader`读取JSON并解码
    pub fn read_graph_from<R: Read>(&self, reader: R) -> Result<(LayerGraph, Vec<LayerId>), LayerGraphError> {
        let value: Value = serde_json::from_reader(reader).map_err(|e| {
            error!(error = %e, "读取层图失败");
            LayerGraphError::deserialization_caused_by("无法读取层图", e)
        })?;
        self.decode(&value)
    }

    fn decode_graph(&self, value: &Value) -> Result<(LayerGraph, Vec<LayerId>), LayerGraphError> {
        let root = value
            .as_object()
            .ok_or_else(|| LayerGraphError::deserialization("层图的根节点必须是键值结构"))?;
        let outputs = root
            .get(KEY_OUTPUTS)
            .ok_or_else(|| LayerGraphError::deserialization("缺少输出层列表"))?;
        let outputs = index_list(outputs, KEY_OUTPUTS)?;
        let count = root.len() - 1;

        // 第一遍：按下标降序创建节点并加载参数
        let mut graph = LayerGraph::new();
        let mut ids: Vec<Option<LayerId>> = vec![None; count + 1];
        for index in (1..=count).rev() {
            let entry = node_entry(root, index)?;
            let tag = entry
                .get(KEY_CLASS)
                .and_then(Value::as_str)
                .ok_or_else(|| LayerGraphError::deserialization(format!("节点{index}缺少类型标记")))?;
            let mut node = self.registry.create(tag)?;
            let params = match entry.get(KEY_PARAMETERS) {
                Some(params) => ParameterBlock::from_value(params.clone()),
                None => Ok(ParameterBlock::new()),
            };
            params
                .and_then(|params| node.as_layer_mut().load_parameters(&params))
                .and_then(|()| node.as_layer().validate_parameters())
                .map_err(|e| {
                    LayerGraphError::deserialization_caused_by(
                        format!("无法加载节点{index}（{tag}）的参数"),
                        e,
                    )
                })?;
            // 父节点个数在分配槽位之前核对
            let recorded = match entry.get(KEY_PARENTS) {
                Some(parents) => parents.as_array().map_or(0, Vec::len),
                None => 0,
            };
            if recorded != node.num_parents() {
                return Err(LayerGraphError::deserialization(format!(
                    "节点{index}应有{}个父节点，实际记录了{recorded}个",
                    node.num_parents()
                )));
            }
            let id = match entry.get(KEY_NAME).and_then(Value::as_str) {
                Some(name) => graph.add_named_layer(name, node),
                None => graph.add_layer(node),
            };
            ids[index] = Some(id);
        }
        let lookup = |index: usize, context: &str| -> Result<LayerId, LayerGraphError> {
            ids.get(index).copied().flatten().ok_or_else(|| {
                LayerGraphError::deserialization(format!("{context}引用了不存在的节点{index}"))
            })
        };

        // 第二遍：绑定父节点
        for index in 1..=count {
            let entry = node_entry(root, index)?;
            let child = lookup(index, "节点")?;
            let num_slots = graph.parents(child)?.len();
            let parents = match entry.get(KEY_PARENTS) {
                Some(parents) => index_list(parents, KEY_PARENTS)?,
                None => Vec::new(),
            };
            if parents.len() != num_slots {
                return Err(LayerGraphError::deserialization(format!(
                    "节点{index}应有{num_slots}个父节点，实际记录了{}个",
                    parents.len()
                )));
            }
            let ports = match entry.get(KEY_PARENT_OUTPUTS) {
                Some(ports) => index_list(ports, KEY_PARENT_OUTPUTS)?,
                None => vec![0; parents.len()],
            };
            if ports.len() != parents.len() {
                return Err(LayerGraphError::deserialization(format!(
                    "节点{index}的父节点端口数与父节点数不一致"
                )));
            }
            for (slot, (&parent, &port)) in parents.iter().zip(&ports).enumerate() {
                let parent = lookup(parent, &format!("节点{index}的第{slot}个槽位"))?;
                graph.set_parent_output(child, slot, parent, port)?;
            }
        }

        let outputs = outputs
            .into_iter()
            .map(|index| lookup(index, "输出层列表"))
            .collect::<Result<Vec<_>, _>>()?;
        GraphIterator::new(&graph, &outputs)?;
        debug!(nodes = count, outputs = outputs.len(), "层图解码完成");
        Ok((graph, outputs))
    }
}

/// 编码时逐层生成节点条目
struct NodeEncoder {
    indices: Vec<Option<usize>>,
    entries: Vec<Option<Value>>,
}

impl NodeEncoder {
    fn index_of(&self, id: LayerId) -> Result<usize, LayerGraphError> {
        self.indices
            .get(id.0)
            .copied()
            .flatten()
            .ok_or_else(|| LayerGraphError::InvalidOperation(format!("层{id}尚未分配下标")))
    }

    fn base_entry(&self, layer: &LayerHandle, node: &dyn TraitLayer) -> Result<Map<String, Value>, LayerGraphError> {
        let mut params = ParameterBlock::new();
        node.save_parameters(&mut params)
            .map_err(|e| e.at_layer(layer.id(), &layer.display_name()))?;
        let mut entry = Map::new();
        entry.insert(KEY_CLASS.to_string(), Value::from(node.type_tag()));
        if let Some(name) = layer.name() {
            entry.insert(KEY_NAME.to_string(), Value::from(name));
        }
        entry.insert(KEY_PARAMETERS.to_string(), params.into_value());
        Ok(entry)
    }

    fn store(&mut self, layer: &LayerHandle, entry: Map<String, Value>) -> Result<(), LayerGraphError> {
        let index = self.index_of(layer.id())?;
        self.entries[index] = Some(Value::Object(entry));
        Ok(())
    }
}

impl LayerVisitor for NodeEncoder {
    fn visit_input(
        &mut self,
        layer: &LayerHandle,
        input: &InputLayerType,
    ) -> Result<(), LayerGraphError> {
        let entry = self.base_entry(layer, input)?;
        self.store(layer, entry)
    }

    fn visit_inner(
        &mut self,
        layer: &LayerHandle,
        inner: &InnerLayerType,
    ) -> Result<(), LayerGraphError> {
        let mut entry = self.base_entry(layer, inner)?;
        let mut parents = Vec::with_capacity(layer.parents().len());
        let mut ports = Vec::with_capacity(layer.parents().len());
        for (slot, parent) in layer.parents().iter().enumerate() {
            let parent = parent.ok_or_else(|| LayerGraphError::UnboundParent {
                layer: layer.id(),
                name: layer.display_name(),
                slot,
            })?;
            parents.push(Value::from(self.index_of(parent.layer)?));
            ports.push(Value::from(parent.output));
        }
        entry.insert(KEY_PARENTS.to_string(), Value::Array(parents));
        if ports.iter().any(|p| p.as_u64() != Some(0)) {
            entry.insert(KEY_PARENT_OUTPUTS.to_string(), Value::Array(ports));
        }
        self.store(layer, entry)
    }
}

fn node_entry(root: &Map<String, Value>, index: usize) -> Result<&Map<String, Value>, LayerGraphError> {
    root.get(&index.to_string())
        .ok_or_else(|| LayerGraphError::deserialization(format!("缺少节点{index}")))?
        .as_object()
        .ok_or_else(|| LayerGraphError::deserialization(format!("节点{index}必须是键值结构")))
}

fn index_list(value: &Value, key: &str) -> Result<Vec<usize>, LayerGraphError> {
    let items = value
        .as_array()
        .ok_or_else(|| LayerGraphError::deserialization(format!("`{key}`必须是整数列表")))?;
    items
        .iter()
        .map(|item| {
            item.as_u64()
                .and_then(|i| usize::try_from(i).ok())
                .ok_or_else(|| {
                    LayerGraphError::deserialization(format!("`{key}`中的`{item}`不是有效的下标"))
                })
        })
        .collect()
}
