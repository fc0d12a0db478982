pub mod config;
pub mod metrics;
pub mod processor;
pub mod task;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, ServerConfig,
    ValidationConfig,
};
pub use processor::{
    ArchiveError, ArchiveProcessor, FetchError, Fetcher, HttpFetcher, ProcessorConfig,
    ProcessorStatus,
};
pub use task::{
    Item, ItemStatus, MemoryTaskStore, Task, TaskError, TaskStatus, TaskStore, MAX_ITEMS_PER_TASK,
};
