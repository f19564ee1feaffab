/*
 * @Author       : 老董
 * @Date         : 2026-09-27
 * @Description  : 训练目录：损失函数、优化器与训练配置
 *
 * 训练循环本身由外部后端执行，这里只描述“用什么训练”：
 * - `LossFunction` / `Optimizer`：Keras中可用的选项及其Python表示
 * - `TrainingRegistry`：显式构造的可用选项列表
 * - `TrainingConfig`：可持久化的训练配置，针对推断出的网络规格校验
 */

mod config;
mod loss;
mod optimizer;

pub use config::TrainingConfig;
pub use loss::LossFunction;
pub use optimizer::Optimizer;

/// 可用的损失函数与优化器
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingRegistry {
    losses: Vec<LossFunction>,
    optimizers: Vec<Optimizer>,
}

impl TrainingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记所有内置损失函数与优化器（优化器为默认超参数）
    pub fn with_builtin() -> Self {
        Self {
            losses: LossFunction::ALL.to_vec(),
            optimizers: vec![Optimizer::rms_prop(), Optimizer::sgd(), Optimizer::adam()],
        }
    }

    pub fn add_loss(&mut self, loss: LossFunction) {
        if !self.losses.contains(&loss) {
            self.losses.push(loss);
        }
    }

    pub fn add_optimizer(&mut self, optimizer: Optimizer) {
        self.optimizers.retain(|o| o.name() != optimizer.name());
        self.optimizers.push(optimizer);
    }

    pub fn losses(&self) -> &[LossFunction] {
        &self.losses
    }

    pub fn optimizers(&self) -> &[Optimizer] {
        &self.optimizers
    }

    pub fn find_loss(&self, identifier: &str) -> Option<LossFunction> {
        self.losses
            .iter()
            .copied()
            .find(|l| l.identifier() == identifier)
    }

    pub fn find_optimizer(&self, name: &str) -> Option<&Optimizer> {
        self.optimizers.iter().find(|o| o.name() == name)
    }
}
