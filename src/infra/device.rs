use burn::backend::wgpu::WgpuDevice;

/// Pick the wgpu device once at startup.
///
/// `--cpu` wins; otherwise an explicit GPU id selects that discrete
/// adapter, and no id falls back to the best adapter wgpu can find.
pub fn select_device(gpu_id: Option<usize>, cpu: bool) -> WgpuDevice {
    let device = match (cpu, gpu_id) {
        (true, _)         => WgpuDevice::Cpu,
        (false, Some(id)) => WgpuDevice::DiscreteGpu(id),
        (false, None)     => WgpuDevice::DefaultDevice,
    };
    tracing::info!("Using WGPU device: {:?}", device);
    device
}
