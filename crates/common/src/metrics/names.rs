//! Well-known metric names
//!
//! Shared constants so callers across the codebase record into the same
//! series instead of inventing near-duplicate names.

// HTTP
pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION: &str = "http_request_duration_ms";
pub const HTTP_ERRORS_TOTAL: &str = "http_errors_total";

// Database
pub const DB_QUERIES_TOTAL: &str = "db_queries_total";
pub const DB_QUERY_DURATION: &str = "db_query_duration_ms";
pub const DB_ERRORS_TOTAL: &str = "db_errors_total";
pub const DB_CONNECTION_POOL_SIZE: &str = "db_connection_pool_size";

// Tasks
pub const TASKS_CREATED_TOTAL: &str = "tasks_created_total";
pub const TASKS_UPDATED_TOTAL: &str = "tasks_updated_total";
pub const TASKS_DELETED_TOTAL: &str = "tasks_deleted_total";
pub const TASKS_COMPLETED_TOTAL: &str = "tasks_completed_total";

// Auth
pub const AUTH_LOGIN_TOTAL: &str = "auth_login_total";
pub const AUTH_LOGIN_FAILURES: &str = "auth_login_failures";
pub const AUTH_SIGNUP_TOTAL: &str = "auth_signup_total";

// Performance
pub const PAGE_LOAD_TIME: &str = "page_load_time_ms";
pub const API_RESPONSE_TIME: &str = "api_response_time_ms";
pub const RENDER_TIME: &str = "render_time_ms";

// Business
pub const ACTIVE_USERS: &str = "active_users";
pub const TOTAL_TASKS: &str = "total_tasks";
pub const COMPLETION_RATE: &str = "completion_rate_percent";
