use super::input;
use crate::assert_err;
use crate::errors::LayerGraphError;
use crate::nn::layer::{AddLayer, DenseLayer, InnerLayerType, InputLayerType};
use crate::nn::{GraphIterator, LayerGraph, LayerHandle, LayerId, LayerVisitor};

/// in -> d1 -> {d2, d3} -> add
fn fork_join() -> (LayerGraph, [LayerId; 5]) {
    let mut graph = LayerGraph::new();
    let in1 = graph.add_layer(input(&[4]));
    let d1 = graph.add_layer_with_parents(DenseLayer::new(4), &[in1]).unwrap();
    let d2 = graph.add_layer_with_parents(DenseLayer::new(4), &[d1]).unwrap();
    let d3 = graph.add_layer_with_parents(DenseLayer::new(4), &[d1]).unwrap();
    let add = graph.add_layer_with_parents(AddLayer::new(), &[d2, d3]).unwrap();
    (graph, [in1, d1, d2, d3, add])
}

#[derive(Default)]
struct Recorder {
    visited: Vec<(LayerId, bool)>,
}

impl LayerVisitor for Recorder {
    fn visit_input(&mut self, layer: &LayerHandle, _input: &InputLayerType) -> Result<(), LayerGraphError> {
        self.visited.push((layer.id(), true));
        Ok(())
    }

    fn visit_inner(&mut self, layer: &LayerHandle, _inner: &InnerLayerType) -> Result<(), LayerGraphError> {
        self.visited.push((layer.id(), false));
        Ok(())
    }
}

#[test]
fn test_fork_join_order_and_depth() {
    let (graph, [in1, d1, d2, d3, add]) = fork_join();
    let iterator = GraphIterator::new(&graph, &[add]).unwrap();
    assert_eq!(iterator.order(), &[in1, d1, d2, d3, add]);
    assert_eq!(iterator.depth(in1), Some(0));
    assert_eq!(iterator.depth(d3), Some(2));
    assert_eq!(iterator.depth(add), Some(3));
    assert_eq!(iterator.index_of(d3), Some(3));
}

#[test]
fn test_inputs_come_first_in_slot_order() {
    let mut graph = LayerGraph::new();
    let in1 = graph.add_layer(input(&[4]));
    let in2 = graph.add_layer(input(&[4]));
    let d1 = graph.add_layer_with_parents(DenseLayer::new(4), &[in2]).unwrap();
    let d2 = graph.add_layer_with_parents(DenseLayer::new(4), &[in1]).unwrap();
    let add = graph.add_layer_with_parents(AddLayer::new(), &[d1, d2]).unwrap();
    assert_eq!(
        graph.topological_order(&[add]).unwrap(),
        vec![in2, in1, d1, d2, add]
    );
}

#[test]
fn test_output_list_order_drives_traversal() {
    let mut graph = LayerGraph::new();
    let in1 = graph.add_layer(input(&[4]));
    let d1 = graph.add_layer_with_parents(DenseLayer::new(4), &[in1]).unwrap();
    let d2 = graph.add_layer_with_parents(DenseLayer::new(2), &[d1]).unwrap();
    let d3 = graph.add_layer_with_parents(DenseLayer::new(3), &[d1]).unwrap();
    assert_eq!(
        graph.topological_order(&[d3, d2]).unwrap(),
        vec![in1, d1, d3, d2]
    );
    // 重复的输出层只访问一次
    assert_eq!(
        graph.topological_order(&[d2, d2]).unwrap(),
        vec![in1, d1, d2]
    );
}

#[test]
fn test_unreachable_layers_are_skipped() {
    let (mut graph, [in1, d1, ..]) = fork_join();
    let orphan = graph.add_layer(input(&[2]));
    let iterator = GraphIterator::new(&graph, &[d1]).unwrap();
    assert_eq!(iterator.order(), &[in1, d1]);
    assert_eq!(iterator.depth(orphan), None);
    assert_eq!(iterator.index_of(orphan), None);
}

#[test]
fn test_visitor_called_in_order() {
    let (graph, [in1, d1, d2, d3, add]) = fork_join();
    let mut recorder = Recorder::default();
    graph.visit(&[add], &mut recorder).unwrap();
    assert_eq!(
        recorder.visited,
        vec![(in1, true), (d1, false), (d2, false), (d3, false), (add, false)]
    );
}

#[test]
fn test_cycle_is_detected() {
    let mut graph = LayerGraph::new();
    let in1 = graph.add_layer(input(&[4]));
    let add = graph.add_layer(AddLayer::new());
    let dense = graph.add_layer_with_parents(DenseLayer::new(4), &[add]).unwrap();
    graph.set_parent(add, 0, in1).unwrap();
    graph.set_parent(add, 1, dense).unwrap();
    assert_err!(
        GraphIterator::new(&graph, &[dense]),
        LayerGraphError::CyclicGraph { .. }
    );
}

#[test]
fn test_missing_output_layer() {
    let (graph, _) = fork_join();
    assert_err!(
        graph.topological_order(&[LayerId(99)]),
        LayerGraphError::LayerNotFound(LayerId(99))
    );
}
