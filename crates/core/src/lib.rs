//! Match director for a matchmaking backend, plus the helpers around it.

pub mod backend;
pub mod config;
pub mod director;
pub mod dump;
pub mod extensions;
pub mod metrics;
pub mod retry;
pub mod testing;

pub use backend::{
    AssignTicketsRequest, AssignTicketsResponse, Assignment, AssignmentFailure, AssignmentGroup,
    Backend, Code, FailureCause, FetchMatchesRequest, FetchMatchesResponse, FunctionConfig,
    FunctionKind, Match, MatchProfile, MatchStream, Pool, SearchFields, Status, Ticket,
};
pub use config::{load_config, load_config_from_str, validate_config, ConfigError};
pub use director::{Assigner, AssignerError, Director, DirectorConfig, DirectorError, DirectorState};
pub use dump::{dump, dump_assignment};
pub use extensions::{
    get_ext, get_int_ext, get_str_ext, Any, ExtensionError, ExtensionValue, Extensions,
    HasExtensions, Int32Value, StringValue,
};
pub use retry::{
    as_status, has_status_code, is_retryable, retry, Backoff, ErrorClassifier, RetryConfig,
    RetryError,
};
