use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, AvgPool2d, AvgPool2dConfig},
        BatchNorm, BatchNormConfig,
        Linear, LinearConfig,
        PaddingConfig2d,
    },
    prelude::*,
    tensor::{activation::relu, Distribution},
};

const STEM_WIDTH: usize = 16;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
/// Shake-shake residual network. Defaults give shake-shake 26 2x32d.
#[derive(Config, Debug)]
pub struct ShakeShakeConfig {
    #[config(default = 10)]
    pub num_classes: usize,
    /// Total depth; each of the three stages gets (depth - 2) / 6 blocks
    #[config(default = 26)]
    pub depth:       usize,
    /// Width of the first stage; later stages double it
    #[config(default = 32)]
    pub base_width:  usize,
}

impl ShakeShakeConfig {
    pub fn blocks_per_stage(&self) -> usize {
        (self.depth.saturating_sub(2) / 6).max(1)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> ShakeShake<B> {
        let stem    = conv3x3(3, STEM_WIDTH, 1, device);
        let stem_bn = BatchNormConfig::new(STEM_WIDTH).init(device);

        let mut blocks  = Vec::new();
        let mut in_ch   = STEM_WIDTH;
        for (stage, stride) in [1usize, 2, 2].into_iter().enumerate() {
            let out_ch = self.base_width << stage;
            for i in 0..self.blocks_per_stage() {
                let s = if i == 0 { stride } else { 1 };
                blocks.push(build_block(in_ch, out_ch, s, device));
                in_ch = out_ch;
            }
        }

        let pool = AdaptiveAvgPool2dConfig::new([1, 1]).init();
        let head = LinearConfig::new(in_ch, self.num_classes).init(device);
        ShakeShake { stem, stem_bn, blocks, pool, head }
    }
}

fn conv3x3<B: Backend>(in_ch: usize, out_ch: usize, stride: usize, device: &B::Device) -> Conv2d<B> {
    Conv2dConfig::new([in_ch, out_ch], [3, 3])
        .with_stride([stride, stride])
        .with_padding(PaddingConfig2d::Explicit(1, 1))
        .with_bias(false)
        .init(device)
}

fn conv1x1<B: Backend>(in_ch: usize, out_ch: usize, device: &B::Device) -> Conv2d<B> {
    Conv2dConfig::new([in_ch, out_ch], [1, 1])
        .with_bias(false)
        .init(device)
}

fn build_branch<B: Backend>(in_ch: usize, out_ch: usize, stride: usize, device: &B::Device) -> Branch<B> {
    Branch {
        conv1: conv3x3(in_ch, out_ch, stride, device),
        bn1:   BatchNormConfig::new(out_ch).init(device),
        conv2: conv3x3(out_ch, out_ch, 1, device),
        bn2:   BatchNormConfig::new(out_ch).init(device),
    }
}

fn build_block<B: Backend>(in_ch: usize, out_ch: usize, stride: usize, device: &B::Device) -> ShakeBlock<B> {
    let shortcut = (in_ch != out_ch || stride != 1).then(|| {
        let half = out_ch / 2;
        Shortcut {
            conv_a: conv1x1(in_ch, half, device),
            conv_b: conv1x1(in_ch, out_ch - half, device),
            bn:     BatchNormConfig::new(out_ch).init(device),
            pool:   AvgPool2dConfig::new([1, 1]).with_strides([stride, stride]).init(),
        }
    });
    ShakeBlock {
        branch1: build_branch(in_ch, out_ch, stride, device),
        branch2: build_branch(in_ch, out_ch, stride, device),
        shortcut,
    }
}

/// Mix two branch outputs per sample.
///
/// With autodiff enabled the forward pass uses `alpha ~ U(0,1)` while the
/// gradient sees an independent `beta ~ U(0,1)`. Without autodiff
/// (evaluation) both branches are weighted 0.5.
pub fn shake<B: Backend>(a: Tensor<B, 4>, b: Tensor<B, 4>) -> Tensor<B, 4> {
    if !B::ad_enabled() {
        return (a + b).mul_scalar(0.5);
    }

    let [n, _, _, _] = a.dims();
    let device = a.device();
    let alpha = Tensor::<B, 4>::random([n, 1, 1, 1], Distribution::Uniform(0.0, 1.0), &device);
    let beta  = Tensor::<B, 4>::random([n, 1, 1, 1], Distribution::Uniform(0.0, 1.0), &device);

    // value: b + alpha*(a-b), gradient: b + beta*(a-b)
    let diff = a - b.clone();
    b + diff.clone() * beta.clone() + ((alpha - beta) * diff).detach()
}

/// ReLU → conv → BN → ReLU → conv → BN
#[derive(Module, Debug)]
pub struct Branch<B: Backend> {
    pub conv1: Conv2d<B>,
    pub bn1:   BatchNorm<B, 2>,
    pub conv2: Conv2d<B>,
    pub bn2:   BatchNorm<B, 2>,
}

impl<B: Backend> Branch<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.bn1.forward(self.conv1.forward(relu(x)));
        self.bn2.forward(self.conv2.forward(relu(x)))
    }
}

/// Downsampling shortcut: two 1×1 convs over the pooled input and its
/// one-pixel-shifted copy, concatenated on the channel axis.
#[derive(Module, Debug)]
pub struct Shortcut<B: Backend> {
    pub conv_a: Conv2d<B>,
    pub conv_b: Conv2d<B>,
    pub bn:     BatchNorm<B, 2>,
    pub pool:   AvgPool2d,
}

impl<B: Backend> Shortcut<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = relu(x);
        let [n, c, h, w] = x.dims();

        let a = self.conv_a.forward(self.pool.forward(x.clone()));
        let shifted = x
            .slice([0..n, 0..c, 1..h, 1..w])
            .pad((0, 1, 0, 1), 0.0);
        let b = self.conv_b.forward(self.pool.forward(shifted));

        self.bn.forward(Tensor::cat(vec![a, b], 1))
    }
}

#[derive(Module, Debug)]
pub struct ShakeBlock<B: Backend> {
    pub branch1:  Branch<B>,
    pub branch2:  Branch<B>,
    pub shortcut: Option<Shortcut<B>>,
}

impl<B: Backend> ShakeBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let residual = match &self.shortcut {
            Some(shortcut) => shortcut.forward(x.clone()),
            None           => x.clone(),
        };
        let mixed = shake(self.branch1.forward(x.clone()), self.branch2.forward(x));
        residual + mixed
    }
}

#[derive(Module, Debug)]
pub struct ShakeShake<B: Backend> {
    pub stem:    Conv2d<B>,
    pub stem_bn: BatchNorm<B, 2>,
    pub blocks:  Vec<ShakeBlock<B>>,
    pub pool:    AdaptiveAvgPool2d,
    pub head:    Linear<B>,
}

impl<B: Backend> ShakeShake<B> {
    /// images: [batch, 3, 32, 32] → logits: [batch, num_classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = self.stem_bn.forward(self.stem.forward(images));
        for block in &self.blocks {
            x = block.forward(x);
        }

        let x = self.pool.forward(relu(x)); // [batch, channels, 1, 1]
        let [n, c, _, _] = x.dims();
        self.head.forward(x.reshape([n, c]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = NdArray;

    fn tiny() -> ShakeShakeConfig {
        ShakeShakeConfig::new().with_depth(8).with_base_width(4)
    }

    #[test]
    fn test_default_is_26_2x32d() {
        let cfg = ShakeShakeConfig::new();
        assert_eq!(cfg.blocks_per_stage(), 4);
        assert_eq!(cfg.base_width, 32);
        assert_eq!(cfg.num_classes, 10);
    }

    #[test]
    fn test_forward_produces_class_logits() {
        let device = Default::default();
        let model: ShakeShake<TestBackend> = tiny().init(&device);
        assert_eq!(model.blocks.len(), 3);

        let images = Tensor::<TestBackend, 4>::zeros([2, 3, 32, 32], &device);
        assert_eq!(model.forward(images).dims(), [2, 10]);
    }

    #[test]
    fn test_only_stage_transitions_get_a_shortcut() {
        let device = Default::default();
        let model: ShakeShake<TestBackend> = ShakeShakeConfig::new()
            .with_depth(14)
            .with_base_width(4)
            .init(&device);
        let with_shortcut: Vec<bool> = model.blocks.iter().map(|b| b.shortcut.is_some()).collect();
        assert_eq!(with_shortcut, vec![true, false, true, false, true, false]);
    }

    #[test]
    fn test_shake_averages_without_autodiff() {
        let device = Default::default();
        let a = Tensor::<TestBackend, 4>::ones([2, 1, 2, 2], &device);
        let b = Tensor::<TestBackend, 4>::zeros([2, 1, 2, 2], &device);
        let out = shake(a, b).into_data().to_vec::<f32>().unwrap();
        assert!(out.iter().all(|&v| (v - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_shake_mixes_between_branches_in_training() {
        let device = Default::default();
        let a = Tensor::<Autodiff<TestBackend>, 4>::ones([4, 2, 2, 2], &device);
        let b = Tensor::<Autodiff<TestBackend>, 4>::zeros([4, 2, 2, 2], &device);
        let out = shake(a, b).into_data().to_vec::<f32>().unwrap();
        assert!(out.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }
}
