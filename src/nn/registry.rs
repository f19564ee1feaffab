/*
 * @Author       : 老董
 * @Date         : 2026-09-04 17:14:02
 * @LastEditors  : 老董
 * @LastEditTime : 2026-10-05 16:50:19
 * @Description  : 层类型注册表：类型标记 -> 无参构造函数
 *
 * 反序列化时根据持久化的类型标记重建层。注册表由调用方显式构造并按引用传入，
 * 内置层通过`with_builtin_layers`登记，扩展层（`ExtensionLayer`）通过`register`追加。
 */

use crate::errors::LayerGraphError;
use crate::nn::layer::{
    ActivationLayer, AddLayer, BaseNetworkOutputLayer, ConcatenateLayer, DefaultInputLayer,
    DenseLayer, DropoutLayer, EmbeddingLayer, FlattenLayer, LayerNode, LstmLayer, ReshapeLayer,
};
use std::collections::BTreeMap;

/// 创建一个处于默认参数状态的层
pub type LayerFactory = fn() -> LayerNode;

#[derive(Debug, Clone, Default)]
pub struct LayerRegistry {
    factories: BTreeMap<String, LayerFactory>,
}

impl LayerRegistry {
    /// 空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记了所有内置层的注册表
    pub fn with_builtin_layers() -> Self {
        let builtin: [(&str, LayerFactory); 11] = [
            (DefaultInputLayer::TYPE_TAG, || DefaultInputLayer::default().into()),
            (BaseNetworkOutputLayer::TYPE_TAG, || BaseNetworkOutputLayer::default().into()),
            (DenseLayer::TYPE_TAG, || DenseLayer::default().into()),
            (AddLayer::TYPE_TAG, || AddLayer::default().into()),
            (ConcatenateLayer::TYPE_TAG, || ConcatenateLayer::default().into()),
            (EmbeddingLayer::TYPE_TAG, || EmbeddingLayer::default().into()),
            (ActivationLayer::TYPE_TAG, || ActivationLayer::default().into()),
            (DropoutLayer::TYPE_TAG, || DropoutLayer::default().into()),
            (FlattenLayer::TYPE_TAG, || FlattenLayer::default().into()),
            (ReshapeLayer::TYPE_TAG, || ReshapeLayer::default().into()),
            (LstmLayer::TYPE_TAG, || LstmLayer::default().into()),
        ];
        Self {
            factories: builtin
                .into_iter()
                .map(|(tag, factory)| (tag.to_string(), factory))
                .collect(),
        }
    }

    /// 登记一种层类型；同一标记重复登记，或构造出的层自报的标记与`type_tag`不一致时报错
    pub fn register(&mut self, type_tag: &str, factory: LayerFactory) -> Result<(), LayerGraphError> {
        if self.factories.contains_key(type_tag) {
            return Err(LayerGraphError::DuplicateLayerType(type_tag.to_string()));
        }
        let created = factory().type_tag();
        if created != type_tag {
            return Err(LayerGraphError::InvalidOperation(format!(
                "以`{type_tag}`登记的构造函数创建的层类型标记为`{created}`，重新编码时无法还原"
            )));
        }
        self.factories.insert(type_tag.to_string(), factory);
        Ok(())
    }

    /// 按类型标记创建层
    pub fn create(&self, type_tag: &str) -> Result<LayerNode, LayerGraphError> {
        self.factories
            .get(type_tag)
            .map(|factory| factory())
            .ok_or_else(|| LayerGraphError::UnknownLayerType(type_tag.to_string()))
    }

    pub fn contains(&self, type_tag: &str) -> bool {
        self.factories.contains_key(type_tag)
    }

    /// 已登记的类型标记（按字典序）
    pub fn type_tags(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
