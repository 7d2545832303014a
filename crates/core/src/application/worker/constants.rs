// Worker constants (no magic values)
use std::time::Duration;

/// Sleep duration when no task is claimable (100ms)
pub const IDLE_SLEEP_DURATION: Duration = Duration::from_millis(100);

/// Sleep duration after a repository error before trying again (1s)
pub const ERROR_RECOVERY_SLEEP_DURATION: Duration = Duration::from_secs(1);

/// Parallelism used for queues without a concurrency cap
pub const DEFAULT_UNCAPPED_PARALLELISM: usize = 16;

/// How long shutdown waits for in-flight tasks (5s)
pub const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on in-process parallelism for one queue
pub const MAX_PARALLELISM: usize = 1024;
