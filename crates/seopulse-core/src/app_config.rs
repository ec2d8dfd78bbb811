use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub content_request_timeout_secs: u64,
    pub content_user_agent: String,
    pub content_page_size: u32,
    pub content_inter_request_delay_ms: u64,
    pub content_max_retries: u32,
    pub content_retry_backoff_base_secs: u64,
    pub audit_cooldown_secs: u64,
    pub audit_fetch_timeout_secs: u64,
    pub audit_checks_timeout_secs: u64,
    pub link_probe_limit: usize,
    pub link_probe_timeout_secs: u64,
    pub api_rate_limit_per_minute: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "content_request_timeout_secs",
                &self.content_request_timeout_secs,
            )
            .field("content_user_agent", &self.content_user_agent)
            .field("content_page_size", &self.content_page_size)
            .field(
                "content_inter_request_delay_ms",
                &self.content_inter_request_delay_ms,
            )
            .field("content_max_retries", &self.content_max_retries)
            .field(
                "content_retry_backoff_base_secs",
                &self.content_retry_backoff_base_secs,
            )
            .field("audit_cooldown_secs", &self.audit_cooldown_secs)
            .field("audit_fetch_timeout_secs", &self.audit_fetch_timeout_secs)
            .field("audit_checks_timeout_secs", &self.audit_checks_timeout_secs)
            .field("link_probe_limit", &self.link_probe_limit)
            .field("link_probe_timeout_secs", &self.link_probe_timeout_secs)
            .field("api_rate_limit_per_minute", &self.api_rate_limit_per_minute)
            .finish()
    }
}
