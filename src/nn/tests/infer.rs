use super::{input, names};
use crate::assert_err;
use crate::errors::LayerGraphError;
use crate::nn::layer::{
    Activation, AddLayer, DefaultInputLayer, DenseLayer, EmbeddingLayer, LstmLayer,
};
use crate::nn::{LayerGraph, ParentRef};
use crate::tensor::ElementType;

#[test]
fn test_single_dense_layer() {
    let mut graph = LayerGraph::new();
    let in1 = graph.add_layer(input(&[4]));
    let dense = graph.add_layer_with_parents(DenseLayer::new(3), &[in1]).unwrap();

    let inferred = graph.infer_specs(&[dense]).unwrap();
    let spec = inferred.spec();
    assert_eq!(names(spec.inputs()), vec!["input_1:0"]);
    assert_eq!(names(spec.outputs()), vec!["dense_1/BiasAdd:0"]);
    assert!(spec.hidden_outputs().is_empty());

    let output = &spec.outputs()[0];
    assert_eq!(output.shape(), &[Some(3)]);
    assert_eq!(output.batch_size(), Some(32));
    assert_eq!(output.element_type(), ElementType::Float32);
    assert_eq!(inferred.layer_name(in1), Some("input_1"));
    assert_eq!(inferred.layer_name(dense), Some("dense_1"));
    assert_eq!(inferred.output_spec(ParentRef::from(dense)), Some(output));
}

#[test]
fn test_sequential_names_and_hidden_outputs() {
    let mut graph = LayerGraph::new();
    let mut last = graph.add_layer(input(&[10]));
    for units in [8, 6, 4, 2] {
        last = graph.add_layer_with_parents(DenseLayer::new(units), &[last]).unwrap();
    }
    let spec = graph.infer_specs(&[last]).unwrap().into_spec();
    assert_eq!(names(spec.outputs()), vec!["dense_4/BiasAdd:0"]);
    assert_eq!(spec.outputs()[0].shape(), &[Some(2)]);
    assert_eq!(
        names(spec.hidden_outputs()),
        vec!["dense_1/BiasAdd:0", "dense_2/BiasAdd:0", "dense_3/BiasAdd:0"]
    );
}

#[test]
fn test_multiple_inputs() {
    let mut graph = LayerGraph::new();
    let in1 = graph.add_layer(input(&[4]));
    let in2 = graph.add_layer(input(&[6]));
    let d1 = graph.add_layer_with_parents(DenseLayer::new(5), &[in1]).unwrap();
    let d2 = graph.add_layer_with_parents(DenseLayer::new(5), &[in2]).unwrap();
    let add = graph.add_layer_with_parents(AddLayer::new(), &[d1, d2]).unwrap();

    let inferred = graph.infer_specs(&[add]).unwrap();
    let spec = inferred.spec();
    assert_eq!(names(spec.inputs()), vec!["input_1:0", "input_2:0"]);
    assert_eq!(inferred.layer_name(in2), Some("input_2"));
    assert_eq!(inferred.layer_name(d2), Some("dense_2"));
    assert_eq!(names(spec.outputs()), vec!["add_1/add:0"]);
    assert_eq!(spec.outputs()[0].shape(), &[Some(5)]);
}

#[test]
fn test_multiple_outputs_follow_list_order() {
    let mut graph = LayerGraph::new();
    let in1 = graph.add_layer(input(&[4]));
    let d1 = graph.add_layer_with_parents(DenseLayer::new(4), &[in1]).unwrap();
    let d2 = graph.add_layer_with_parents(DenseLayer::new(2), &[d1]).unwrap();
    let d3 = graph.add_layer_with_parents(DenseLayer::new(3), &[d1]).unwrap();

    let spec = graph.infer_specs(&[d3, d2]).unwrap().into_spec();
    assert_eq!(
        names(spec.outputs()),
        vec!["dense_2/BiasAdd:0", "dense_3/BiasAdd:0"]
    );
    assert_eq!(spec.outputs()[0].shape(), &[Some(3)]);
    assert_eq!(spec.outputs()[1].shape(), &[Some(2)]);
    assert_eq!(names(spec.hidden_outputs()), vec!["dense_1/BiasAdd:0"]);
}

#[test]
fn test_inference_is_deterministic() {
    let mut graph = LayerGraph::new();
    let in1 = graph.add_layer(input(&[4]));
    let d1 = graph.add_layer_with_parents(DenseLayer::new(4), &[in1]).unwrap();
    let d2 = graph.add_layer_with_parents(DenseLayer::new(4), &[d1]).unwrap();
    let d3 = graph.add_layer_with_parents(DenseLayer::new(4), &[d1]).unwrap();
    let add = graph.add_layer_with_parents(AddLayer::new(), &[d2, d3]).unwrap();

    let first = graph.infer_specs(&[add, d2]).unwrap().into_spec();
    let second = graph.infer_specs(&[add, d2]).unwrap().into_spec();
    assert_eq!(first, second);
    assert_eq!(names(first.outputs()), vec!["add_1/add:0", "dense_2/BiasAdd:0"]);
}

#[test]
fn test_fork_join_with_three_inputs_and_three_outputs() {
    let mut graph = LayerGraph::new();
    let in0 = graph.add_layer(input(&[1]));
    let in1 = graph.add_layer(input(&[1]));
    let in2 = graph.add_layer(input(&[1]));
    let h0 = graph.add_layer_with_parents(DenseLayer::new(1), &[in0]).unwrap();
    let h1 = graph.add_layer_with_parents(AddLayer::new(), &[h0, in1]).unwrap();
    let h2 = graph.add_layer_with_parents(AddLayer::new(), &[h1, in2]).unwrap();
    let h3 = graph.add_layer_with_parents(AddLayer::new(), &[h0, h2]).unwrap();
    let h4 = graph.add_layer_with_parents(DenseLayer::new(1), &[h2]).unwrap();
    let h5 = graph.add_layer_with_parents(DenseLayer::new(1), &[h3]).unwrap();
    let h6 = graph.add_layer_with_parents(DenseLayer::new(1), &[h3]).unwrap();
    let h7 = graph.add_layer_with_parents(DenseLayer::new(1), &[h4]).unwrap();
    let out0 = graph.add_layer_with_parents(DenseLayer::new(1), &[h5]).unwrap();
    let out1 = graph.add_layer_with_parents(DenseLayer::new(1), &[h5]).unwrap();
    let out2 = graph.add_layer_with_parents(AddLayer::new(), &[h6, h7]).unwrap();

    let inferred = graph.infer_specs(&[out0, out1, out2]).unwrap();
    let spec = inferred.spec();
    assert_eq!(names(spec.inputs()), vec!["input_1:0", "input_2:0", "input_3:0"]);
    assert_eq!(
        names(spec.outputs()),
        vec!["dense_6/BiasAdd:0", "dense_7/BiasAdd:0", "add_4/add:0"]
    );
    for output in spec.outputs() {
        assert_eq!(output.batch_size(), Some(32));
        assert_eq!(output.shape(), &[Some(1)]);
    }
    // 同一深度内按后序序号命名
    assert_eq!(inferred.layer_name(h3), Some("add_3"));
    assert_eq!(inferred.layer_name(h4), Some("dense_2"));
    assert_eq!(
        names(spec.hidden_outputs()),
        vec![
            "dense_1/BiasAdd:0",
            "add_1/add:0",
            "add_2/add:0",
            "add_3/add:0",
            "dense_2/BiasAdd:0",
            "dense_3/BiasAdd:0",
            "dense_4/BiasAdd:0",
            "dense_5/BiasAdd:0",
        ]
    );
}

#[test]
fn test_op_name_and_multiple_ports() {
    let mut graph = LayerGraph::new();
    let in1 = graph.add_layer(input(&[7, 3]));
    let lstm = graph
        .add_layer_with_parents(LstmLayer::new(5).with_return_state(true), &[in1])
        .unwrap();
    let dense = graph
        .add_layer_with_parents(DenseLayer::new(2).with_activation(Activation::Relu), &[in1])
        .unwrap();
    let spec = graph.infer_specs(&[lstm, dense]).unwrap().into_spec();
    assert_eq!(
        names(spec.outputs()),
        vec![
            "lstm_1/while/Exit:0",
            "lstm_1/while/Exit:1",
            "lstm_1/while/Exit:2",
            "dense_1/Relu:0"
        ]
    );
}

#[test]
fn test_batch_size_propagation() {
    let mut graph = LayerGraph::new();
    let in1 = graph.add_layer(input(&[4]));
    let in2 = graph.add_layer(input(&[4]).with_batch_size(Some(16)));
    let in3 = graph.add_layer(input(&[4]));
    let mismatched = graph.add_layer_with_parents(AddLayer::new(), &[in1, in2]).unwrap();
    let matched = graph.add_layer_with_parents(AddLayer::new(), &[in1, in3]).unwrap();

    let inferred = graph.infer_specs(&[mismatched, matched]).unwrap();
    assert_eq!(inferred.layer_specs(mismatched).unwrap()[0].batch_size(), None);
    assert_eq!(inferred.layer_specs(matched).unwrap()[0].batch_size(), Some(32));
}

#[test]
fn test_embedding_on_integer_input() {
    let mut graph = LayerGraph::new();
    let tokens = graph.add_layer(DefaultInputLayer::new(vec![Some(12)], ElementType::Int32));
    let embedding = graph
        .add_layer_with_parents(EmbeddingLayer::new(1000, 16), &[tokens])
        .unwrap();
    let spec = graph.infer_specs(&[embedding]).unwrap().into_spec();
    let output = &spec.outputs()[0];
    assert_eq!(output.name(), "embedding_1/embedding_lookup:0");
    assert_eq!(output.shape(), &[Some(12), Some(16)]);
    assert_eq!(output.element_type(), ElementType::Float32);
}

#[test]
fn test_embedding_rejects_float_input() {
    let mut graph = LayerGraph::new();
    let in1 = graph.add_layer(input(&[12]));
    let embedding = graph
        .add_layer_with_parents(EmbeddingLayer::new(1000, 16), &[in1])
        .unwrap();
    assert_err!(
        graph.infer_specs(&[embedding]),
        LayerGraphError::InvalidTensorSpec { layer, .. } if *layer == embedding
    );
}

#[test]
fn test_unbound_parent_is_reported() {
    let mut graph = LayerGraph::new();
    let in1 = graph.add_layer(input(&[4]));
    let add = graph.add_named_layer("merge", AddLayer::new());
    graph.set_parent(add, 0, in1).unwrap();
    assert_err!(
        graph.infer_specs(&[add]),
        LayerGraphError::UnboundParent { layer, name, slot }
            if *layer == add && name == "merge" && *slot == 1
    );
}

#[test]
fn test_invalid_parameters_abort_inference() {
    let mut graph = LayerGraph::new();
    let in1 = graph.add_layer(input(&[4]));
    let dense = graph.add_layer_with_parents(DenseLayer::new(0), &[in1]).unwrap();
    assert_err!(
        graph.infer_specs(&[dense]),
        LayerGraphError::InvalidParameters { .. }
    );

    let mut graph = LayerGraph::new();
    let in1 = graph.add_layer(DefaultInputLayer::new(vec![Some(4), None], ElementType::Float32));
    let dense = graph.add_layer_with_parents(DenseLayer::new(2), &[in1]).unwrap();
    assert_err!(
        graph.infer_specs(&[dense]),
        LayerGraphError::InvalidTensorSpec { .. }
    );
}

#[test]
fn test_unreachable_invalid_layer_is_ignored() {
    let mut graph = LayerGraph::new();
    let in1 = graph.add_layer(input(&[4]));
    let dense = graph.add_layer_with_parents(DenseLayer::new(2), &[in1]).unwrap();
    graph.add_layer(AddLayer::new());
    let inferred = graph.infer_specs(&[dense]).unwrap();
    assert_eq!(inferred.order().len(), 2);
}
