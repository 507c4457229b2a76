//! Authentication types

/// Client metadata recorded for refresh-token audit columns.
///
/// Both fields are optional; nothing in the lifecycle depends on them.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta {
    /// Remote IP address, if known
    pub ip: Option<String>,
    /// User-Agent header, if sent
    pub user_agent: Option<String>,
}

impl ClientMeta {
    pub fn new(ip: Option<String>, user_agent: Option<String>) -> Self {
        Self { ip, user_agent }
    }
}
