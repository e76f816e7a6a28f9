use super::{FeatureLayout, ModelMeta, Regressor};
use crate::features::PropertyFeatures;
use anyhow::{bail, Context, Result};
use std::path::Path;
use tch::{CModule, Device, Tensor};

/// TorchScript regression model plus the column layout it was exported with.
pub struct TorchRegressor {
    model: CModule,
    device: Device,
    layout: FeatureLayout,
}

impl TorchRegressor {
    pub fn load(model_path: &Path, meta_path: &Path) -> Result<Self> {
        let device = Device::Cpu;

        let meta = ModelMeta::load(meta_path)?;
        let layout = FeatureLayout::from_meta(&meta)
            .with_context(|| format!("invalid meta at {}", meta_path.display()))?;

        let model = CModule::load_on_device(model_path, device)
            .with_context(|| format!("failed to load TorchScript {}", model_path.display()))?;

        let this = Self {
            model,
            device,
            layout,
        };

        // Probe with a dummy row; the output must be a single value per row
        this.forward(&vec![0.0; this.layout.len()])
            .context("warmup forward failed")?;
        Ok(this)
    }

    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    fn forward(&self, x: &[f32]) -> Result<f64> {
        let input = Tensor::from_slice(x)
            .reshape([1, x.len() as i64])
            .to_device(self.device);

        let t = self.model.forward_ts(&[input])?;
        if t.numel() != 1 {
            bail!("unexpected model output size: {:?}", t.size());
        }
        Ok(t.reshape([-1]).double_value(&[0]))
    }
}

impl Regressor for TorchRegressor {
    fn predict(&self, row: &PropertyFeatures) -> Result<f64> {
        let x = self.layout.encode(row);
        self.forward(&x)
    }
}
