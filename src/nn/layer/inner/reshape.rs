/*
 * @Author       : 老董
 * @Date         : 2026-10-14
 * @Description  : 变形层（Reshape）
 *
 * 目标形状不含批维度，最多一个`-1`（由元素总数推出）；
 * 输入形状完全已知时校验元素总数是否一致。
 */

use crate::errors::{LayerError, check_input_spec, check_parameter};
use crate::nn::layer::{InferredTensor, TraitInnerLayer, TraitLayer, single_input};
use crate::nn::params::ParameterBlock;
use crate::tensor::{Shape, TensorSpec, format_shape, num_elements};
use crate::utils::python;

const CFG_KEY_TARGET_SHAPE: &str = "target_shape";

#[derive(Debug, Clone, PartialEq)]
pub struct ReshapeLayer {
    target_shape: Vec<i64>,
}

impl Default for ReshapeLayer {
    fn default() -> Self {
        Self {
            target_shape: vec![-1],
        }
    }
}

impl ReshapeLayer {
    pub const TYPE_TAG: &'static str = "keras.layers.Reshape";

    pub fn new(target_shape: Vec<i64>) -> Self {
        Self { target_shape }
    }

    pub fn target_shape(&self) -> &[i64] {
        &self.target_shape
    }

    fn output_shape(&self, input: &TensorSpec) -> Result<Shape, LayerError> {
        let known_product = self
            .target_shape
            .iter()
            .filter(|&&d| d != -1)
            .try_fold(1u64, |acc, &d| {
                u64::try_from(d).ok().and_then(|d| acc.checked_mul(d))
            })
            .ok_or_else(|| {
                LayerError::InvalidTensorSpec(format!(
                    "目标形状{:?}的元素个数超出了u64范围",
                    self.target_shape
                ))
            })?;
        let has_wildcard = self.target_shape.contains(&-1);
        let total = num_elements(input.shape()).map_err(LayerError::InvalidTensorSpec)?;
        let mismatch = || {
            LayerError::InvalidTensorSpec(format!(
                "无法把形状[{}]变形为{:?}",
                format_shape(input.shape()),
                self.target_shape
            ))
        };
        let inferred = match (has_wildcard, total) {
            (true, Some(total)) => {
                if known_product == 0 || total % known_product != 0 {
                    return Err(mismatch());
                }
                Some(total / known_product)
            }
            (false, Some(total)) if total != known_product => return Err(mismatch()),
            _ => None,
        };
        Ok(self
            .target_shape
            .iter()
            .map(|&d| if d == -1 { inferred } else { u64::try_from(d).ok() })
            .collect())
    }
}

impl TraitLayer for ReshapeLayer {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn name_prefix(&self) -> &'static str {
        "reshape"
    }

    fn validate_parameters(&self) -> Result<(), LayerError> {
        check_parameter(!self.target_shape.is_empty(), || "目标形状不能为空".to_string())?;
        check_parameter(
            self.target_shape.iter().filter(|&&d| d == -1).count() <= 1,
            || "目标形状中最多只能有一个-1".to_string(),
        )?;
        check_parameter(self.target_shape.iter().all(|&d| d == -1 || d >= 1), || {
            format!("目标形状{:?}中的维度必须为正数或-1", self.target_shape)
        })
    }

    fn save_parameters(&self, params: &mut ParameterBlock) -> Result<(), LayerError> {
        params.add_value(CFG_KEY_TARGET_SHAPE, &self.target_shape)
    }

    fn load_parameters(&mut self, params: &ParameterBlock) -> Result<(), LayerError> {
        self.target_shape = params.get_value(CFG_KEY_TARGET_SHAPE)?;
        Ok(())
    }

    fn populate_call(&self, positional: &mut Vec<String>, _named: &mut Vec<(String, String)>) {
        let dims = self
            .target_shape
            .iter()
            .map(|&d| python::int_to_python(d))
            .collect::<Vec<_>>();
        positional.push(python::tuple_to_python(&dims));
    }
}

impl TraitInnerLayer for ReshapeLayer {
    fn num_parents(&self) -> usize {
        1
    }

    fn tensor_op_name(&self) -> &'static str {
        "Reshape"
    }

    fn validate_inputs(&self, inputs: &[&TensorSpec]) -> Result<(), LayerError> {
        let input = single_input(inputs)?;
        check_input_spec(input.rank() >= 1, "Reshape层的输入至少需要1维")?;
        self.output_shape(input).map(|_| ())
    }

    fn infer_outputs(&self, inputs: &[&TensorSpec]) -> Result<Vec<InferredTensor>, LayerError> {
        let input = single_input(inputs)?;
        Ok(vec![InferredTensor::new(
            self.output_shape(input)?,
            input.element_type(),
        )])
    }
}
