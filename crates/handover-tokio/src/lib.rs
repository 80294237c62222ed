mod abortable_task;
mod timeout;

pub use abortable_task::AbortableTask;
pub use timeout::{Elapsed, FutureTimeoutExt};
