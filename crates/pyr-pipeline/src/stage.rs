//! The fallback state machine driving one pyramid stage.

use std::sync::Arc;

use tracing::debug;

use pyr_compute::{
    ComputeContext, ComputeError, DeviceImage, FactoryDirectory, FactoryProvider, GpuPyramid,
    PyramidSchedule, RegistrationTransaction, TypeMatrix, PYRAMID_FAMILIES,
};
use pyr_core::{Image, PixelKind};

use crate::notice::{Notice, NoticeCategory, NoticeSink, Severity};
use crate::cpu::CpuPyramidFilter;
use crate::PipelineResult;

/// Phases of one stage invocation.
///
/// `Succeeded` and `FellBackToCpu` are terminal; every other phase can
/// transition to `FellBackToCpu`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagePhase {
    /// Stage entry; nothing attempted yet.
    NotAttempted,
    /// Querying whether a compute context exists.
    ProbingCapability,
    /// Resolving the device filter graph through the factory directory.
    ConstructingGpuObjects,
    /// Allocating and uploading the device input.
    PreparingGpuInput,
    /// Running the device filter graph.
    ExecutingGpu,
    /// Device path produced the stage output.
    Succeeded,
    /// CPU reference filter produced the stage output.
    FellBackToCpu,
}

/// Capability facts established during one stage invocation.
///
/// Monotonic within the invocation: once a fact is false it stays false; a
/// failed device step is never retried until the next invocation, which
/// starts fresh (device availability can change between stages).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapabilityState {
    /// A compute context existed when probed.
    pub context_available: bool,
    /// The device filter graph was constructed.
    pub gpu_constructed: bool,
    /// The device input was prepared; execution can start.
    pub gpu_ready: bool,
}

/// One pyramid pipeline stage with guaranteed CPU fallback.
pub struct GpuPyramidStage {
    schedule: PyramidSchedule,
    output_kind: PixelKind,
    use_gpu: bool,
    matrix: TypeMatrix,
    directory: Arc<FactoryDirectory>,
    provider: Arc<dyn FactoryProvider>,
    context: Arc<dyn ComputeContext>,
    cpu: Box<dyn CpuPyramidFilter>,
    notices: Arc<dyn NoticeSink>,
    phase: StagePhase,
    capability: CapabilityState,
}

impl GpuPyramidStage {
    /// Assemble a stage from its collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        schedule: PyramidSchedule,
        output_kind: PixelKind,
        matrix: TypeMatrix,
        directory: Arc<FactoryDirectory>,
        provider: Arc<dyn FactoryProvider>,
        context: Arc<dyn ComputeContext>,
        cpu: Box<dyn CpuPyramidFilter>,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        Self {
            schedule,
            output_kind,
            use_gpu: true,
            matrix,
            directory,
            provider,
            context,
            cpu,
            notices,
            phase: StagePhase::NotAttempted,
            capability: CapabilityState::default(),
        }
    }

    /// Enable or disable device use for this stage.
    ///
    /// Disabling is an explicit user choice: the stage goes straight to CPU
    /// with no probe and no notice.
    pub fn set_use_gpu(&mut self, use_gpu: bool) {
        self.use_gpu = use_gpu;
    }

    /// Whether device use is requested.
    pub fn use_gpu(&self) -> bool {
        self.use_gpu
    }

    /// Phase the last invocation ended in.
    pub fn phase(&self) -> StagePhase {
        self.phase
    }

    /// Capability facts from the last invocation.
    pub fn capability(&self) -> CapabilityState {
        self.capability
    }

    /// Produce every pyramid level for `input`, on the device if every
    /// precondition holds, on CPU otherwise. Always returns a valid result;
    /// the only errors crossing this boundary are registry inconsistencies
    /// and genuine input defects.
    pub fn generate(&mut self, input: &Image) -> PipelineResult<Vec<Image>> {
        self.phase = StagePhase::NotAttempted;
        self.capability = CapabilityState::default();

        if !self.use_gpu {
            self.phase = StagePhase::FellBackToCpu;
            return self.run_cpu(input);
        }

        // Structural policy, checked before probing: low-dimensional
        // pyramids are not worth the device round-trip.
        if input.dimension() <= 2 {
            self.report(
                Severity::Warning,
                NoticeCategory::GpuUnprofitable,
                format!(
                    "building a {}-dimensional pyramid on the device is not \
                     beneficial; the stage is switching to CPU",
                    input.dimension()
                ),
            );
            self.phase = StagePhase::FellBackToCpu;
            return self.run_cpu(input);
        }

        self.phase = StagePhase::ProbingCapability;
        self.capability.context_available = self.context.is_created();
        if !self.capability.context_available {
            self.report(
                Severity::Warning,
                NoticeCategory::ContextNotCreated,
                "the compute context has not been created; the stage is \
                 switching to CPU"
                    .to_owned(),
            );
            self.phase = StagePhase::FellBackToCpu;
            return self.run_cpu(input);
        }

        self.phase = StagePhase::ConstructingGpuObjects;
        let mut txn = match RegistrationTransaction::open(
            self.directory.clone(),
            &self.matrix,
            &PYRAMID_FAMILIES,
            self.provider.as_ref(),
        ) {
            Ok(txn) => txn,
            Err(fatal @ ComputeError::RegistryInconsistency(_)) => {
                // Build/configuration defect; the one tier that propagates.
                return Err(fatal.into());
            }
            Err(other) => {
                self.report(
                    Severity::Error,
                    NoticeCategory::ConstructionFailed,
                    format!("factory registration failed: {other}"),
                );
                self.phase = StagePhase::FellBackToCpu;
                return self.run_cpu(input);
            }
        };

        let attempt = self.attempt_gpu(input);
        // The bracket closes before the stage reports its final state, on
        // success and fallback alike.
        txn.close();

        match attempt {
            Ok(levels) => {
                self.phase = StagePhase::Succeeded;
                debug!(device = self.context.device_name(), "stage ran on device");
                Ok(levels)
            }
            Err((category, cause)) => {
                self.report(
                    Severity::Error,
                    category,
                    format!("device pyramid failed: {cause}; the stage is \
                             switching to CPU"),
                );
                self.phase = StagePhase::FellBackToCpu;
                self.run_cpu(input)
            }
        }
    }

    /// The device attempt: construct, prepare input, execute.
    fn attempt_gpu(
        &mut self,
        input: &Image,
    ) -> Result<Vec<Image>, (NoticeCategory, ComputeError)> {
        let mut pyramid = GpuPyramid::from_directory(
            &self.directory,
            self.context.clone(),
            input.kind(),
            self.output_kind,
            input.dimension(),
            self.schedule.clone(),
        )
        .map_err(|e| (NoticeCategory::ConstructionFailed, e))?;
        self.capability.gpu_constructed = true;

        self.phase = StagePhase::PreparingGpuInput;
        let device_input = self
            .prepare_input(input)
            .map_err(|e| (NoticeCategory::InputPreparationFailed, e))?;
        pyramid
            .set_input(device_input)
            .map_err(|e| (NoticeCategory::InputPreparationFailed, e))?;
        self.capability.gpu_ready = true;

        self.phase = StagePhase::ExecutingGpu;
        // Execution failure after committing to the device still falls back:
        // the stage contract is a valid result, so the CPU filter recomputes.
        pyramid
            .update()
            .map_err(|e| (NoticeCategory::ExecutionFailed, e))?;
        let outputs = pyramid
            .take_outputs()
            .map_err(|e| (NoticeCategory::ExecutionFailed, e))?;
        Ok(outputs.into_iter().map(DeviceImage::into_host).collect())
    }

    /// Graft, allocate, lock, and force-upload the device input.
    fn prepare_input(&self, input: &Image) -> Result<DeviceImage, ComputeError> {
        let mut device_input = DeviceImage::graft(input.clone());
        device_input.allocate_device(self.context.as_ref())?;
        device_input.set_host_lock(true);
        device_input.mark_device_dirty();
        device_input.update_device_buffer(self.context.as_ref())?;
        Ok(device_input)
    }

    fn run_cpu(&self, input: &Image) -> PipelineResult<Vec<Image>> {
        self.cpu.run(input, &self.schedule, self.output_kind)
    }

    fn report(&self, severity: Severity, category: NoticeCategory, message: String) {
        self.notices.notify(Notice { severity, category, message });
    }
}
