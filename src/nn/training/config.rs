/*
 * @Author       : 老董
 * @Date         : 2026-09-25
 * @Description  : 训练配置（TrainingConfig）
 *
 * 以JSON持久化；在交给后端之前针对推断出的网络规格校验：
 * 每个网络输出都必须指定损失函数，且损失函数只能指向已存在的输出。
 */

use super::{LossFunction, Optimizer};
use crate::errors::LayerGraphError;
use crate::nn::network::NetworkSpec;
use crate::tensor::TensorId;
use crate::utils::python;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const fn default_shuffle() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub epochs: u64,
    pub batch_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_batch_size: Option<u64>,
    #[serde(default = "default_shuffle")]
    pub shuffle: bool,
    pub optimizer: Optimizer,
    /// 输出张量标识 -> 损失函数
    #[serde(default)]
    pub losses: BTreeMap<TensorId, LossFunction>,
}

impl TrainingConfig {
    pub fn new(epochs: u64, batch_size: u64, optimizer: Optimizer) -> Self {
        Self {
            epochs,
            batch_size,
            validation_batch_size: None,
            shuffle: default_shuffle(),
            optimizer,
            losses: BTreeMap::new(),
        }
    }

    pub fn with_loss(mut self, output: TensorId, loss: LossFunction) -> Self {
        self.losses.insert(output, loss);
        self
    }

    pub fn with_validation_batch_size(mut self, batch_size: Option<u64>) -> Self {
        self.validation_batch_size = batch_size;
        self
    }

    /// 针对网络规格校验
    pub fn validate(&self, spec: &NetworkSpec) -> Result<(), LayerGraphError> {
        let invalid = LayerGraphError::InvalidTrainingConfig;
        if self.epochs == 0 {
            return Err(invalid("训练轮数必须大于0".to_string()));
        }
        if self.batch_size == 0 {
            return Err(invalid("批大小必须大于0".to_string()));
        }
        if self.validation_batch_size == Some(0) {
            return Err(invalid("验证批大小必须大于0".to_string()));
        }
        self.optimizer.validate().map_err(invalid)?;

        for output in spec.outputs() {
            let loss = self.losses.get(output.id()).ok_or_else(|| {
                invalid(format!("输出`{}`没有指定损失函数", output.name()))
            })?;
            loss.check_target(output).map_err(invalid)?;
        }
        if let Some(unknown) = self
            .losses
            .keys()
            .find(|id| spec.outputs().iter().all(|o| o.id() != *id))
        {
            return Err(invalid(format!("损失函数指向了不存在的输出`{unknown}`")));
        }
        Ok(())
    }

    /// 生成`model.compile(...)`调用（损失函数按网络输出顺序排列）
    pub fn compile_call(&self, spec: &NetworkSpec) -> Result<String, LayerGraphError> {
        self.validate(spec)?;
        let losses = spec
            .outputs()
            .iter()
            .filter_map(|o| self.losses.get(o.id()))
            .map(LossFunction::to_python)
            .collect::<Vec<_>>();
        Ok(format!(
            "model.compile(optimizer={}, loss={})",
            self.optimizer.to_python(),
            python::list_to_python(&losses)
        ))
    }

    pub fn to_json(&self) -> Result<String, LayerGraphError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| LayerGraphError::InvalidTrainingConfig(format!("无法保存训练配置：{e}")))
    }

    pub fn from_json(json: &str) -> Result<Self, LayerGraphError> {
        serde_json::from_str(json)
            .map_err(|e| LayerGraphError::InvalidTrainingConfig(format!("无法读取训练配置：{e}")))
    }
}
