/*
 * @Author       : 老董
 * @Date         : 2026-10-03
 * @Description  : 层图的确定性拓扑遍历（GraphIterator）与访问者协议（LayerVisitor）
 *
 * 遍历顺序：
 * 1. 从输出层（按列表顺序）出发做深度优先后序遍历，父节点按槽位顺序访问，
 *    得到每个层的后序序号；
 * 2. 每个层的深度 = 1 + 父节点深度的最大值（无父节点的层为0）；
 * 3. 按（深度，后序序号）稳定排序。
 * 这样每个层一定排在其所有父节点之后，输入层排在最前，且顺序与Keras的层命名顺序一致。
 *
 * 未绑定的槽位在遍历时被跳过（由推断器报告`UnboundParent`）。
 */

use super::{LayerGraph, LayerHandle, LayerId};
use crate::errors::LayerGraphError;
use crate::nn::layer::{InnerLayerType, InputLayerType, LayerNode};
use tracing::debug;

/// 遍历时对每个层的回调（严格按遍历顺序、单线程调用）
pub trait LayerVisitor {
    fn visit_input(
        &mut self,
        layer: &LayerHandle,
        input: &InputLayerType,
    ) -> Result<(), LayerGraphError>;

    fn visit_inner(
        &mut self,
        layer: &LayerHandle,
        inner: &InnerLayerType,
    ) -> Result<(), LayerGraphError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    /// 正在访问（仍在DFS栈上）
    Visiting,
    Done,
}

/// 一次遍历的结果：可达层的拓扑顺序
#[derive(Debug, Clone)]
pub struct GraphIterator<'g> {
    graph: &'g LayerGraph,
    order: Vec<LayerId>,
    depths: Vec<Option<usize>>,
}

impl<'g> GraphIterator<'g> {
    /// 计算从`outputs`反向可达的所有层的遍历顺序
    pub fn new(graph: &'g LayerGraph, outputs: &[LayerId]) -> Result<Self, LayerGraphError> {
        let n = graph.len();
        let mut marks = vec![Mark::Unvisited; n];
        let mut depths: Vec<Option<usize>> = vec![None; n];
        let mut postorder = Vec::new();

        for &output in outputs {
            graph.layer(output)?;
            if marks[output.0] != Mark::Unvisited {
                continue;
            }
            // 栈元素：(层, 下一个待检查的槽位)
            let mut stack = vec![(output, 0usize)];
            marks[output.0] = Mark::Visiting;
            while let Some(top) = stack.last_mut() {
                let (id, next_slot) = *top;
                let parents = graph.parents(id)?;
                if next_slot < parents.len() {
                    top.1 += 1;
                    let Some(parent) = parents[next_slot] else {
                        continue;
                    };
                    let parent = parent.layer;
                    graph.layer(parent)?;
                    match marks[parent.0] {
                        Mark::Visiting => {
                            return Err(LayerGraphError::CyclicGraph { layer: parent });
                        }
                        Mark::Unvisited => {
                            marks[parent.0] = Mark::Visiting;
                            stack.push((parent, 0));
                        }
                        Mark::Done => {}
                    }
                    continue;
                }
                let depth = parents
                    .iter()
                    .flatten()
                    .filter_map(|p| depths[p.layer.0])
                    .max()
                    .map_or(0, |d| d + 1);
                depths[id.0] = Some(depth);
                marks[id.0] = Mark::Done;
                postorder.push(id);
                stack.pop();
            }
        }

        // 后序序号即`postorder`中的位置，稳定排序保留它作为第二关键字
        let mut order = postorder;
        order.sort_by_key(|id| depths[id.0]);
        debug!(layers = order.len(), outputs = outputs.len(), "计算层图遍历顺序");
        Ok(Self {
            graph,
            order,
            depths,
        })
    }

    pub fn graph(&self) -> &'g LayerGraph {
        self.graph
    }

    /// 拓扑顺序（每个层都在其所有父节点之后）
    pub fn order(&self) -> &[LayerId] {
        &self.order
    }

    /// 层到最远源头的距离（不可达的层为`None`）
    pub fn depth(&self, id: LayerId) -> Option<usize> {
        self.depths.get(id.0).copied().flatten()
    }

    /// 层在遍历中的位置
    pub fn index_of(&self, id: LayerId) -> Option<usize> {
        self.order.iter().position(|&l| l == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'g LayerHandle> + '_ {
        let graph = self.graph;
        self.order
            .iter()
            .filter_map(move |&id| graph.layers.get(id.0))
    }

    /// 按遍历顺序依次调用访问者，任一回调出错即停止
    pub fn accept<V: LayerVisitor + ?Sized>(&self, visitor: &mut V) -> Result<(), LayerGraphError> {
        for layer in self.iter() {
            match layer.node() {
                LayerNode::Input(input) => visitor.visit_input(layer, input)?,
                LayerNode::Inner(inner) => visitor.visit_inner(layer, inner)?,
            }
        }
        Ok(())
    }
}

impl LayerGraph {
    /// 从`outputs`出发的拓扑顺序
    pub fn topological_order(&self, outputs: &[LayerId]) -> Result<Vec<LayerId>, LayerGraphError> {
        Ok(GraphIterator::new(self, outputs)?.order)
    }

    /// 按拓扑顺序访问从`outputs`可达的所有层
    pub fn visit<V: LayerVisitor + ?Sized>(
        &self,
        outputs: &[LayerId],
        visitor: &mut V,
    ) -> Result<(), LayerGraphError> {
        GraphIterator::new(self, outputs)?.accept(visitor)
    }
}
