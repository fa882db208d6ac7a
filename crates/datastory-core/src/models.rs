pub mod catalog;
pub mod execution;
pub mod problem;
pub mod setup;
pub mod transcription;

pub use catalog::{
    CatalogErrorBody, CatalogResource, CatalogResponse, DatasetRef, NewResource, Package,
    PackageChanges, PackageSearchResult, Resource, ResourceChanges,
};
pub use execution::{
    Execution, ExecutionOutput, ExecutionSummary, ExecutionsResponse, ModelIo, OutputResource,
    SubmitRequest, SubmitSubtaskResponse, Thread, DEFAULT_TERMINAL_STATUSES, FAILURE_STATUSES,
    SUCCESS_STATUSES,
};
pub use problem::{
    dataset_task_name, NewProblemStatement, NewSubtask, NewTask, ProblemStatement, Subtask, Task,
    TimePeriod,
};
pub use setup::{DataItem, DataItemDataset, DatasetResource, SetupParameter, SetupRequest};
pub use transcription::{
    dashboard_url, StepStatus, TranscriptionConfig, TranscriptionResult, TranscriptionStep,
};
