use clap::Parser;

/// Typed, env-driven process configuration (C11). Every field is settable as
/// `--flag value` or via the matching environment variable; defaults are
/// suitable for a local/in-memory run.
#[derive(Parser, Debug, Clone)]
#[command(name = "ims-server")]
pub struct Config {
    /// Address of the local store replica. The in-memory store ignores this
    /// value; a real deployment points it at its memcached/Redis instance.
    #[arg(long, env = "LOCAL_STORE_ADDR", default_value = "")]
    pub local_store_addr: String,

    /// Comma-separated addresses of remote store replicas.
    #[arg(long, env = "REMOTE_STORE_ADDRS", default_value = "")]
    pub remote_store_addrs: String,

    #[arg(long, env = "HSS_PEER", default_value = "hss.example.com")]
    pub hss_peer: String,

    #[arg(long, env = "DEST_REALM", default_value = "example.com")]
    pub dest_realm: String,

    #[arg(long, env = "DEST_HOST", default_value = "hss.example.com")]
    pub dest_host: String,

    #[arg(long, env = "SERVER_NAME", default_value = "scscf.example.com")]
    pub server_name: String,

    /// Base URL of the call-control layer's notification endpoint.
    #[arg(long, env = "NOTIFY_ENDPOINT", default_value = "http://localhost:9888")]
    pub notify_endpoint: String,

    #[arg(long, env = "CACHE_CAS_RETRIES", default_value_t = 3)]
    pub cache_cas_retries: u32,

    #[arg(long, env = "STORE_RETRIES", default_value_t = 3)]
    pub store_retries: u32,

    #[arg(long, env = "OP_TIMEOUT_MS", default_value_t = 200)]
    pub op_timeout_ms: u64,

    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: String,
}

impl Config {
    /// Remote store addresses, parsed from the comma-separated env var.
    /// Blank entries (including an entirely empty variable) are dropped.
    pub fn remote_store_addrs(&self) -> Vec<String> {
        self.remote_store_addrs
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}
