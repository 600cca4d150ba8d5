#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Splitting,
    Simulation,
}

#[derive(Debug, Clone, Default)]
pub struct WorkerStatus {
    pub progress: f32,
    pub file_index: usize,
    pub stage: Stage,
}

impl WorkerStatus {
    pub fn new(progress: f32, file_index: usize, stage: Stage) -> Self {
        Self {
            progress,
            file_index,
            stage,
        }
    }
}
