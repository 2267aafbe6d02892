use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub name: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RevocationStatsResponse {
    pub backend: &'static str,
    // None when the backend cannot count cheaply (valkey).
    pub entries: Option<usize>,
}
