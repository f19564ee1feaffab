use super::spec;
use crate::assert_err;
use crate::errors::LayerError;
use crate::nn::ParameterBlock;
use crate::nn::layer::{
    ActivationLayer, Activation, DropoutLayer, FlattenLayer, ReshapeLayer, TraitInnerLayer, TraitLayer,
};
use crate::tensor::ElementType;

#[test]
fn test_reshape_infers_wildcard() {
    let reshape = ReshapeLayer::new(vec![-1, 4]);
    let input = spec(vec![Some(2), Some(6)], ElementType::Float32);
    reshape.validate_inputs(&[&input]).unwrap();
    let outputs = reshape.infer_outputs(&[&input]).unwrap();
    assert_eq!(outputs[0].shape, vec![Some(3), Some(4)]);
}

#[test]
fn test_reshape_element_count_mismatch() {
    let input = spec(vec![Some(2), Some(5)], ElementType::Float32);
    assert_err!(
        ReshapeLayer::new(vec![3, 3]).validate_inputs(&[&input]),
        LayerError::InvalidTensorSpec(_)
    );
    assert_err!(
        ReshapeLayer::new(vec![-1, 3]).validate_inputs(&[&input]),
        LayerError::InvalidTensorSpec(_)
    );
}

#[test]
fn test_reshape_unknown_input_keeps_wildcard_unknown() {
    let input = spec(vec![None, Some(4)], ElementType::Float32);
    let outputs = ReshapeLayer::new(vec![2, -1])
        .infer_outputs(&[&input])
        .unwrap();
    assert_eq!(outputs[0].shape, vec![Some(2), None]);
}

#[test]
fn test_reshape_parameters() {
    assert_err!(
        ReshapeLayer::new(vec![-1, -1]).validate_parameters(),
        LayerError::InvalidParameters(_)
    );
    assert_err!(
        ReshapeLayer::new(vec![0]).validate_parameters(),
        LayerError::InvalidParameters(_)
    );
    let reshape = ReshapeLayer::new(vec![2, -1, 3]);
    let mut params = ParameterBlock::new();
    reshape.save_parameters(&mut params).unwrap();
    let mut loaded = ReshapeLayer::default();
    loaded.load_parameters(&params).unwrap();
    assert_eq!(loaded.target_shape(), &[2, -1, 3]);
}

#[test]
fn test_flatten_counts_elements() {
    let input = spec(vec![Some(2), Some(3), Some(4)], ElementType::Float32);
    let outputs = FlattenLayer::new().infer_outputs(&[&input]).unwrap();
    assert_eq!(outputs[0].shape, vec![Some(24)]);
}

#[test]
fn test_element_count_overflow() {
    let input = spec(vec![Some(1 << 32), Some(1 << 32)], ElementType::Float32);
    assert_err!(
        FlattenLayer::new().validate_inputs(&[&input]),
        LayerError::InvalidTensorSpec(_)
    );
    assert_err!(
        FlattenLayer::new().infer_outputs(&[&input]),
        LayerError::InvalidTensorSpec(_)
    );
    assert_err!(
        ReshapeLayer::new(vec![-1, 4]).validate_inputs(&[&input]),
        LayerError::InvalidTensorSpec(_)
    );

    let small = spec(vec![Some(4)], ElementType::Float32);
    assert_err!(
        ReshapeLayer::new(vec![i64::MAX, i64::MAX, -1]).validate_inputs(&[&small]),
        LayerError::InvalidTensorSpec(_)
    );
}

#[test]
fn test_dropout_rate_range_and_identity_shape() {
    assert_err!(
        DropoutLayer::new(1.0).validate_parameters(),
        LayerError::InvalidParameters(_)
    );
    let dropout = DropoutLayer::new(0.25).with_seed(Some(7));
    dropout.validate_parameters().unwrap();
    let input = spec(vec![None, Some(3)], ElementType::Float64);
    let outputs = dropout.infer_outputs(&[&input]).unwrap();
    assert_eq!(outputs[0].shape, vec![None, Some(3)]);
    assert_eq!(outputs[0].element_type, ElementType::Float64);

    let mut params = ParameterBlock::new();
    dropout.save_parameters(&mut params).unwrap();
    let mut loaded = DropoutLayer::default();
    loaded.load_parameters(&params).unwrap();
    assert_eq!(loaded.seed(), Some(7));
    approx::assert_abs_diff_eq!(loaded.rate(), 0.25);
}

#[test]
fn test_activation_layer_requires_float() {
    let layer = ActivationLayer::new(Activation::Softmax);
    assert_eq!(layer.tensor_op_name(), "Softmax");
    assert_err!(
        layer.validate_inputs(&[&spec(vec![Some(3)], ElementType::Int32)]),
        LayerError::InvalidTensorSpec(_)
    );
    layer
        .validate_inputs(&[&spec(vec![Some(3)], ElementType::Float32)])
        .unwrap();
}
