/*
 * @Author       : 老董
 * @Date         : 2026-10-10
 * @Description  : 拼接层（Concatenate）
 *
 * 沿`axis`拼接任意多个（至少2个）输入。`axis`与Keras一致，按包含批维度的下标计数：
 * 负数从最后一维倒数，0指批维度（不允许）。
 * 输出在拼接轴上的长度为各输入之和（任一未知则未知），其余维度必须兼容。
 */

use crate::errors::{LayerError, check_input_spec, check_parameter};
use crate::nn::layer::{InferredTensor, TraitInnerLayer, TraitLayer, common_element_type, merge_dim};
use crate::nn::params::ParameterBlock;
use crate::tensor::{Shape, TensorSpec, format_shape};
use crate::utils::python;

const CFG_KEY_NUM_INPUTS: &str = "num_inputs";
const CFG_KEY_AXIS: &str = "axis";

#[derive(Debug, Clone, PartialEq)]
pub struct ConcatenateLayer {
    num_inputs: usize,
    axis: i64,
}

impl Default for ConcatenateLayer {
    fn default() -> Self {
        Self {
            num_inputs: 2,
            axis: -1,
        }
    }
}

impl ConcatenateLayer {
    pub const TYPE_TAG: &'static str = "keras.layers.Concatenate";
    /// 输入个数上限
    pub const MAX_INPUTS: usize = 1024;

    pub fn new(num_inputs: usize, axis: i64) -> Self {
        Self { num_inputs, axis }
    }

    pub fn axis(&self) -> i64 {
        self.axis
    }

    /// 把`axis`换算为不含批维度的形状下标
    fn resolve_axis(&self, rank: usize) -> Result<usize, LayerError> {
        let index = if self.axis < 0 {
            usize::try_from(self.axis.unsigned_abs())
                .ok()
                .and_then(|back| rank.checked_sub(back))
        } else {
            usize::try_from(self.axis - 1).ok()
        };
        index.filter(|&i| i < rank).ok_or_else(|| {
            LayerError::InvalidTensorSpec(format!("拼接轴{}超出了输入的秩{}", self.axis, rank))
        })
    }

    fn concatenated_shape(&self, inputs: &[&TensorSpec]) -> Result<Shape, LayerError> {
        let (first, rest) = inputs
            .split_first()
            .ok_or_else(|| LayerError::InvalidTensorSpec("Concatenate层缺少输入".to_string()))?;
        let axis = self.resolve_axis(first.rank())?;
        let mut shape = first.shape().to_vec();
        for other in rest {
            check_input_spec(
                other.rank() == shape.len(),
                "Concatenate层的所有输入必须具有相同的秩",
            )?;
            for (i, (dim, &incoming)) in shape.iter_mut().zip(other.shape()).enumerate() {
                if i == axis {
                    *dim = match dim.zip(incoming) {
                        Some((a, b)) => Some(a.checked_add(b).ok_or_else(|| {
                            LayerError::InvalidTensorSpec(format!(
                                "Concatenate层拼接轴长度{a}+{b}溢出"
                            ))
                        })?),
                        None => None,
                    };
                    continue;
                }
                *dim = merge_dim(*dim, incoming).map_err(|e| {
                    LayerError::InvalidTensorSpec(format!(
                        "Concatenate层输入形状[{}]与[{}]在非拼接轴上不兼容：{}",
                        format_shape(first.shape()),
                        format_shape(other.shape()),
                        e
                    ))
                })?;
            }
        }
        Ok(shape)
    }
}

impl TraitLayer for ConcatenateLayer {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn name_prefix(&self) -> &'static str {
        "concatenate"
    }

    fn validate_parameters(&self) -> Result<(), LayerError> {
        check_parameter(self.num_inputs >= 2, || {
            format!("Concatenate层至少需要2个输入，实际为{}", self.num_inputs)
        })?;
        check_parameter(self.num_inputs <= Self::MAX_INPUTS, || {
            format!(
                "Concatenate层最多支持{}个输入，实际为{}",
                Self::MAX_INPUTS,
                self.num_inputs
            )
        })?;
        check_parameter(self.axis != 0, || "不能沿批维度（axis=0）拼接".to_string())
    }

    fn save_parameters(&self, params: &mut ParameterBlock) -> Result<(), LayerError> {
        params.add_usize(CFG_KEY_NUM_INPUTS, self.num_inputs)?;
        params.add_int(CFG_KEY_AXIS, self.axis);
        Ok(())
    }

    fn load_parameters(&mut self, params: &ParameterBlock) -> Result<(), LayerError> {
        self.num_inputs = params.get_usize(CFG_KEY_NUM_INPUTS)?;
        self.axis = params.get_int(CFG_KEY_AXIS)?;
        Ok(())
    }

    fn populate_call(&self, _positional: &mut Vec<String>, named: &mut Vec<(String, String)>) {
        named.push(("axis".into(), python::int_to_python(self.axis)));
    }
}

impl TraitInnerLayer for ConcatenateLayer {
    fn num_parents(&self) -> usize {
        self.num_inputs
    }

    fn tensor_op_name(&self) -> &'static str {
        "concat"
    }

    fn validate_inputs(&self, inputs: &[&TensorSpec]) -> Result<(), LayerError> {
        common_element_type(inputs)?;
        self.concatenated_shape(inputs).map(|_| ())
    }

    fn infer_outputs(&self, inputs: &[&TensorSpec]) -> Result<Vec<InferredTensor>, LayerError> {
        Ok(vec![InferredTensor::new(
            self.concatenated_shape(inputs)?,
            common_element_type(inputs)?,
        )])
    }
}
