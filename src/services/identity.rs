//! Best-effort resolution of the submitting user's email

use std::env;

use crate::repository::warehouse::WarehouseApi;

/// Request header set by the hosting platform's proxy
pub const FORWARDED_EMAIL_HEADER: &str = "x-forwarded-email";

#[derive(Clone, Debug, Default)]
pub struct IdentityService {
    fallback: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl IdentityService {
    pub fn new(fallback: Option<String>) -> Self {
        Self {
            fallback: non_empty(fallback),
        }
    }

    /// Resolve the process-wide fallback once at startup: the workspace
    /// profile when a warehouse is configured, then `DATABRICKS_USER`, then
    /// `USER`. Failures are tolerated.
    pub async fn discover(api: Option<&dyn WarehouseApi>) -> Self {
        if let Some(api) = api {
            match api.current_user().await {
                Ok(user) => {
                    if let Some(email) = user.best_email() {
                        return Self::new(Some(email));
                    }
                }
                Err(e) => tracing::warn!("Unable to resolve workspace user: {}", e),
            }
        }

        let from_env = non_empty(env::var("DATABRICKS_USER").ok())
            .or_else(|| non_empty(env::var("USER").ok()));
        Self::new(from_env)
    }

    /// Email for one request; the forwarded header wins over the fallback
    pub fn resolve(&self, forwarded: Option<&str>) -> Option<String> {
        non_empty(forwarded.map(str::to_string)).or_else(|| self.fallback.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::AppError,
        repository::warehouse::{MockWarehouseApi, ScimUser},
    };

    #[test]
    fn test_header_wins() {
        let identity = IdentityService::new(Some("app@example.org".to_string()));
        assert_eq!(
            identity.resolve(Some(" nurse@example.org ")).as_deref(),
            Some("nurse@example.org")
        );
        assert_eq!(identity.resolve(Some("")).as_deref(), Some("app@example.org"));
        assert_eq!(identity.resolve(None).as_deref(), Some("app@example.org"));
        assert_eq!(IdentityService::default().resolve(None), None);
    }

    #[tokio::test]
    async fn test_discover_from_workspace_profile() {
        let mut api = MockWarehouseApi::new();
        api.expect_current_user().returning(|| {
            Ok(ScimUser {
                user_name: Some("alex".to_string()),
                emails: Vec::new(),
            })
        });
        let identity = IdentityService::discover(Some(&api)).await;
        assert_eq!(identity.resolve(None).as_deref(), Some("alex"));
    }

    #[tokio::test]
    async fn test_discover_tolerates_failure() {
        let mut api = MockWarehouseApi::new();
        api.expect_current_user()
            .returning(|| Err(AppError::Store("401 Unauthorized: invalid token".to_string())));
        let identity = IdentityService::discover(Some(&api)).await;
        assert_eq!(
            identity.resolve(Some("nurse@example.org")).as_deref(),
            Some("nurse@example.org")
        );
    }
}
