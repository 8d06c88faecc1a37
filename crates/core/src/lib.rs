pub mod domain;
pub mod kpi;
pub mod store;
pub mod time;

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub store_base_url: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                store_base_url: std::env::var("CRM_STORE_BASE_URL")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
                sentry_dsn: std::env::var("SENTRY_DSN")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
            })
        }

        pub fn require_store_base_url(&self) -> anyhow::Result<&str> {
            self.store_base_url
                .as_deref()
                .context("CRM_STORE_BASE_URL is required")
        }
    }
}
