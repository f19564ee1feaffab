/*
 * @Author       : 老董
 * @Date         : 2026-09-28
 * @Description  : 张量规格推断（SpecInferrer）
 *
 * 按拓扑顺序访问每个层：
 * - 输入层：用户声明的输入生成新的规格（`input_n:0`）；引用基础网络输出的输入层原样复制该规格
 * - 内部层：检查槽位均已绑定 -> 校验参数 -> 校验父节点规格 -> 推断输出规格
 * 任一步失败即中止整个推断（不返回部分结果）。
 *
 * 批大小传播：只有新声明的输入带有固定批大小；任何依赖基础网络输出的层的批大小均为空，
 * 父节点批大小不一致时同样为空。
 *
 * 网络级规格的组合规则：
 * - 输入：按遍历顺序，新声明的输入，以及每个（按位置去重的）基础网络首次出现时的全部输入
 * - 输出：对每个基础网络的每个输出，若被本图引用，则在其位置放置依赖它且尚未放置的输出层的输出，
 *   否则保留该基础网络输出本身；其余输出层按列表顺序追加
 * - 隐藏输出：基础网络的隐藏输出、被引用的基础网络输出、以及不在输出中的内部层输出
 * 去重只针对同一来源（同一基础网络的同一张量，或同一层的同一输出），
 * 不同基础网络中同名的张量各自保留。
 */

use super::iterator::{GraphIterator, LayerVisitor};
use super::naming::TensorNameGenerator;
use super::{LayerGraph, LayerHandle, LayerId, ParentRef};
use crate::errors::{LayerError, LayerGraphError};
use crate::nn::layer::{InnerLayerType, InputLayerType, InputSource, TraitInnerLayer, TraitInputLayer, TraitLayer};
use crate::nn::network::{BaseNetwork, NetworkSpec};
use crate::tensor::TensorSpec;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::debug;

/// 对基础网络某个输出的引用：(基础网络在`base_networks`中的下标, 输出下标)
type BaseRef = (usize, usize);

/// 网络级规格中一个张量的来源
///
/// 不同基础网络中的张量可能重名（如各自的`input_1:0`），因此网络级规格按来源而不是按名称去重。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TensorSource {
    /// `base_networks()[network]`的第`index`个输入
    BaseInput { network: usize, index: usize },
    /// `base_networks()[network]`的第`index`个隐藏输出
    BaseHiddenOutput { network: usize, index: usize },
    /// `base_networks()[network]`的第`index`个输出
    BaseOutput { network: usize, index: usize },
    /// 本图中某个层的第`port`个输出
    Layer { layer: LayerId, port: usize },
}

/// 按来源去重的规格列表
#[derive(Debug, Clone, Default)]
struct SourcedSpecs {
    sources: Vec<TensorSource>,
    specs: Vec<TensorSpec>,
}

impl SourcedSpecs {
    fn contains(&self, source: &TensorSource) -> bool {
        self.sources.contains(source)
    }

    fn push(&mut self, source: TensorSource, spec: &TensorSpec) {
        if !self.contains(&source) {
            self.sources.push(source);
            self.specs.push(spec.clone());
        }
    }
}

/// 推断结果：网络级规格 + 每个层的输出规格
#[derive(Debug, Clone)]
pub struct InferredNetwork {
    spec: NetworkSpec,
    input_sources: Vec<TensorSource>,
    hidden_output_sources: Vec<TensorSource>,
    output_sources: Vec<TensorSource>,
    order: Vec<LayerId>,
    layer_specs: Vec<Option<Vec<TensorSpec>>>,
    layer_names: Vec<Option<String>>,
    base_networks: Vec<Arc<BaseNetwork>>,
}

impl InferredNetwork {
    pub fn spec(&self) -> &NetworkSpec {
        &self.spec
    }

    pub fn into_spec(self) -> NetworkSpec {
        self.spec
    }

    /// 与`spec().inputs()`一一对应的来源
    pub fn input_sources(&self) -> &[TensorSource] {
        &self.input_sources
    }

    /// 与`spec().hidden_outputs()`一一对应的来源
    pub fn hidden_output_sources(&self) -> &[TensorSource] {
        &self.hidden_output_sources
    }

    /// 与`spec().outputs()`一一对应的来源
    pub fn output_sources(&self) -> &[TensorSource] {
        &self.output_sources
    }

    /// 推断时使用的遍历顺序
    pub fn order(&self) -> &[LayerId] {
        &self.order
    }

    /// 某个层的全部输出规格（不可达的层为`None`）
    pub fn layer_specs(&self, id: LayerId) -> Option<&[TensorSpec]> {
        self.layer_specs.get(id.0)?.as_deref()
    }

    /// 父节点引用所指向的输出规格
    pub fn output_spec(&self, parent: ParentRef) -> Option<&TensorSpec> {
        self.layer_specs(parent.layer)?.get(parent.output)
    }

    /// 生成的Keras层名（如`dense_1`）；引用基础网络输出的输入层没有层名
    pub fn layer_name(&self, id: LayerId) -> Option<&str> {
        self.layer_names.get(id.0)?.as_deref()
    }

    /// 图中引用到的基础网络（按首次出现的顺序，按位置去重）
    pub fn base_networks(&self) -> &[Arc<BaseNetwork>] {
        &self.base_networks
    }
}

impl LayerGraph {
    /// 推断从`outputs`可达的所有层的张量规格，并组合出网络级规格
    pub fn infer_specs(&self, outputs: &[LayerId]) -> Result<InferredNetwork, LayerGraphError> {
        let iterator = GraphIterator::new(self, outputs)?;
        let mut inferrer = SpecInferrer::new(self, &iterator)?;
        iterator.accept(&mut inferrer)?;
        let network = inferrer.finish(outputs, iterator.order().to_vec());
        debug!(
            inputs = network.spec.inputs().len(),
            outputs = network.spec.outputs().len(),
            hidden_outputs = network.spec.hidden_outputs().len(),
            "完成张量规格推断"
        );
        Ok(network)
    }
}

struct SpecInferrer {
    names: TensorNameGenerator,
    base_networks: Vec<Arc<BaseNetwork>>,
    /// 已把输入并入网络输入的基础网络
    base_inputs_added: Vec<bool>,
    inputs: SourcedSpecs,
    layer_specs: Vec<Option<Vec<TensorSpec>>>,
    layer_names: Vec<Option<String>>,
    /// 引用基础网络输出的输入层所指向的输出
    base_sources: Vec<Option<BaseRef>>,
    /// 层（直接或间接）依赖的基础网络输出
    base_refs: Vec<BTreeSet<BaseRef>>,
    /// 被引用（消费）的基础网络输出
    consumed: BTreeSet<BaseRef>,
    inner_layers: Vec<LayerId>,
}

impl SpecInferrer {
    /// 预先收集图中引用的基础网络，并以其张量名为命名计数器的起点
    fn new(graph: &LayerGraph, iterator: &GraphIterator<'_>) -> Result<Self, LayerGraphError> {
        let mut names = TensorNameGenerator::new();
        let mut base_networks: Vec<Arc<BaseNetwork>> = Vec::new();
        for layer in iterator.iter() {
            let Some(input) = layer.node().as_input() else {
                continue;
            };
            let source = input
                .input_source()
                .map_err(|e| e.at_layer(layer.id(), &layer.display_name()))?;
            if let InputSource::BaseNetwork { network, .. } = source {
                if base_networks
                    .iter()
                    .all(|b| b.location() != network.location())
                {
                    for spec in network.spec().all_specs() {
                        names.reserve(spec.name());
                    }
                    base_networks.push(Arc::clone(network));
                }
            }
        }
        let n = graph.len();
        Ok(Self {
            names,
            base_inputs_added: vec![false; base_networks.len()],
            base_networks,
            inputs: SourcedSpecs::default(),
            layer_specs: vec![None; n],
            layer_names: vec![None; n],
            base_sources: vec![None; n],
            base_refs: vec![BTreeSet::new(); n],
            consumed: BTreeSet::new(),
            inner_layers: Vec::new(),
        })
    }

    fn base_index(&self, network: &BaseNetwork) -> Result<usize, LayerGraphError> {
        self.base_networks
            .iter()
            .position(|b| b.location() == network.location())
            .ok_or_else(|| {
                LayerGraphError::InvalidOperation(format!(
                    "基础网络`{}`未被预先收集",
                    network.location()
                ))
            })
    }

    fn parent_spec(
        &self,
        layer: &LayerHandle,
        parent: ParentRef,
    ) -> Result<&TensorSpec, LayerGraphError> {
        self.layer_specs
            .get(parent.layer.0)
            .and_then(Option::as_ref)
            .and_then(|specs| specs.get(parent.output))
            .ok_or_else(|| {
                LayerGraphError::InvalidOperation(format!(
                    "层{}的父节点{}（输出{}）尚无张量规格",
                    layer.id(),
                    parent.layer,
                    parent.output
                ))
            })
    }

    /// 某个层的输出及其来源；引用基础网络输出的输入层沿用该基础网络输出的来源
    fn sourced_outputs(&self, id: LayerId) -> Vec<(TensorSource, &TensorSpec)> {
        let specs = self
            .layer_specs
            .get(id.0)
            .and_then(Option::as_deref)
            .unwrap_or_default();
        match self.base_sources.get(id.0).copied().flatten() {
            Some((network, index)) => specs
                .iter()
                .map(|spec| (TensorSource::BaseOutput { network, index }, spec))
                .collect(),
            None => specs
                .iter()
                .enumerate()
                .map(|(port, spec)| (TensorSource::Layer { layer: id, port }, spec))
                .collect(),
        }
    }

    fn finish(self, outputs: &[LayerId], order: Vec<LayerId>) -> InferredNetwork {
        // 输出层列表（按id去重，保留首次出现）
        let mut designated: Vec<LayerId> = Vec::new();
        for &id in outputs {
            if !designated.contains(&id) {
                designated.push(id);
            }
        }

        let mut output_specs = SourcedSpecs::default();
        let mut placed: HashSet<LayerId> = HashSet::new();
        for (b, network) in self.base_networks.iter().enumerate() {
            for (i, base_output) in network.spec().outputs().iter().enumerate() {
                if !self.consumed.contains(&(b, i)) {
                    output_specs.push(TensorSource::BaseOutput { network: b, index: i }, base_output);
                    continue;
                }
                for &id in &designated {
                    if !placed.contains(&id) && self.base_refs[id.0].contains(&(b, i)) {
                        for (source, spec) in self.sourced_outputs(id) {
                            output_specs.push(source, spec);
                        }
                        placed.insert(id);
                    }
                }
            }
        }
        for &id in &designated {
            if placed.insert(id) {
                for (source, spec) in self.sourced_outputs(id) {
                    output_specs.push(source, spec);
                }
            }
        }

        // 隐藏输出：排除已在输出中的张量（按来源判断）
        let mut hidden = SourcedSpecs::default();
        let mut push_hidden = |source: TensorSource, spec: &TensorSpec| {
            if !output_specs.contains(&source) {
                hidden.push(source, spec);
            }
        };
        for (b, network) in self.base_networks.iter().enumerate() {
            for (i, spec) in network.spec().hidden_outputs().iter().enumerate() {
                push_hidden(TensorSource::BaseHiddenOutput { network: b, index: i }, spec);
            }
        }
        for &(b, i) in &self.consumed {
            if let Some(spec) = self.base_networks[b].output_spec(i) {
                push_hidden(TensorSource::BaseOutput { network: b, index: i }, spec);
            }
        }
        for &id in &self.inner_layers {
            for (source, spec) in self.sourced_outputs(id) {
                push_hidden(source, spec);
            }
        }

        InferredNetwork {
            spec: NetworkSpec::new(
                self.inputs.specs,
                hidden.specs,
                output_specs.specs,
            ),
            input_sources: self.inputs.sources,
            hidden_output_sources: hidden.sources,
            output_sources: output_specs.sources,
            order,
            layer_specs: self.layer_specs,
            layer_names: self.layer_names,
            base_networks: self.base_networks,
        }
    }
}

impl LayerVisitor for SpecInferrer {
    fn visit_input(
        &mut self,
        layer: &LayerHandle,
        input: &InputLayerType,
    ) -> Result<(), LayerGraphError> {
        let id = layer.id();
        let at_layer = |e: LayerError| e.at_layer(id, &layer.display_name());
        input.validate_parameters().map_err(at_layer)?;

        let spec = match input.input_source().map_err(at_layer)? {
            InputSource::Declared {
                shape,
                batch_size,
                element_type,
                dimension_order,
            } => {
                let layer_name = self.names.next_layer_name(input.name_prefix());
                let tensor_name = TensorNameGenerator::input_tensor_name(&layer_name, 0);
                self.layer_names[id.0] = Some(layer_name);
                let spec = TensorSpec::named(&tensor_name, shape, element_type)
                    .with_batch_size(batch_size)
                    .with_dimension_order(dimension_order);
                self.inputs.push(TensorSource::Layer { layer: id, port: 0 }, &spec);
                spec
            }
            InputSource::BaseNetwork {
                network,
                output_index,
            } => {
                let b = self.base_index(network)?;
                if !self.base_inputs_added[b] {
                    for (index, spec) in network.spec().inputs().iter().enumerate() {
                        self.inputs
                            .push(TensorSource::BaseInput { network: b, index }, spec);
                    }
                    self.base_inputs_added[b] = true;
                }
                self.base_sources[id.0] = Some((b, output_index));
                self.base_refs[id.0].insert((b, output_index));
                self.consumed.insert((b, output_index));
                network
                    .output_spec(output_index)
                    .cloned()
                    .ok_or_else(|| {
                        at_layer(LayerError::InvalidParameters(format!(
                            "基础网络`{}`没有第{}个输出",
                            network.location(),
                            output_index
                        )))
                    })?
            }
        };
        debug!(layer = %id, tensor = spec.name(), "推断输入层规格");
        self.layer_specs[id.0] = Some(vec![spec]);
        Ok(())
    }

    fn visit_inner(
        &mut self,
        layer: &LayerHandle,
        inner: &InnerLayerType,
    ) -> Result<(), LayerGraphError> {
        let id = layer.id();
        let display_name = layer.display_name();
        if let Some(slot) = layer.first_unbound_slot() {
            return Err(LayerGraphError::UnboundParent {
                layer: id,
                name: display_name,
                slot,
            });
        }
        let at_layer = |e: LayerError| e.at_layer(id, &display_name);
        inner.validate_parameters().map_err(at_layer)?;

        let parents: Vec<ParentRef> = layer.parents().iter().flatten().copied().collect();
        let mut inputs: Vec<&TensorSpec> = Vec::with_capacity(parents.len());
        for &parent in &parents {
            inputs.push(self.parent_spec(layer, parent)?);
        }
        inner.validate_inputs(&inputs).map_err(at_layer)?;
        let inferred = inner.infer_outputs(&inputs).map_err(at_layer)?;

        // 依赖基础网络的层不再保证固定的批大小
        let mut base_refs = BTreeSet::new();
        for parent in &parents {
            base_refs.extend(self.base_refs[parent.layer.0].iter().copied());
        }
        let first_batch = inputs.first().and_then(|s| s.batch_size());
        let batch_size = if !base_refs.is_empty()
            || inputs.iter().any(|s| s.batch_size() != first_batch)
        {
            None
        } else {
            first_batch
        };
        let dimension_order = inputs
            .first()
            .map(|s| s.dimension_order())
            .unwrap_or_default();

        let layer_name = self.names.next_layer_name(inner.name_prefix());
        let op_name = inner.tensor_op_name();
        let specs: Vec<TensorSpec> = inferred
            .into_iter()
            .enumerate()
            .map(|(port, tensor)| {
                let name = TensorNameGenerator::inner_tensor_name(&layer_name, op_name, port);
                TensorSpec::named(&name, tensor.shape, tensor.element_type)
                    .with_batch_size(batch_size)
                    .with_dimension_order(dimension_order)
            })
            .collect();
        debug!(layer = %id, name = %layer_name, outputs = specs.len(), "推断内部层规格");

        self.base_refs[id.0] = base_refs;
        self.layer_names[id.0] = Some(layer_name);
        self.layer_specs[id.0] = Some(specs);
        self.inner_layers.push(id);
        Ok(())
    }
}
