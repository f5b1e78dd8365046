//! Wiring of the authorization services on top of one backend.

use std::sync::Arc;
use uuid::Uuid;
use valyan_authz::{
    Authorizer, Evaluator, PermissionResolver, PermissionService, PolicyRegistry,
    RoleAdministration,
};
use valyan_config::AdminConfig;
use valyan_storage::PrincipalId;

use crate::backend::StoreBackend;

pub struct App {
    pub backend: Arc<StoreBackend>,
    pub resolver: Arc<dyn PermissionResolver>,
    pub admin: RoleAdministration,
    pub authorizer: Authorizer,
    /// Actor recorded on administrative audit events.
    pub operator: PrincipalId,
}

impl App {
    pub async fn new(
        backend: StoreBackend,
        config: &AdminConfig,
        operator: Option<Uuid>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let backend = Arc::new(backend);
        let resolver: Arc<dyn PermissionResolver> =
            Arc::new(PermissionService::new(backend.clone()));
        let admin = RoleAdministration::new(backend.clone(), resolver.clone(), backend.clone())
            .allow_custom_codes(config.allow_custom_permission_codes);
        let evaluator = Evaluator::new(resolver.clone(), backend.clone(), backend.clone());
        let authorizer = Authorizer::new(evaluator, Arc::new(PolicyRegistry::clinic_defaults()?));

        // The nil UUID stands for the local system operator.
        let operator = PrincipalId(operator.or(config.operator_uuid()?).unwrap_or(Uuid::nil()));

        let app = Self {
            backend,
            resolver,
            admin,
            authorizer,
            operator,
        };

        // A throwaway store is only useful with the clinic roles in it.
        if app.backend.is_memory() {
            app.admin.seed_default_roles(&app.operator).await?;
        }

        Ok(app)
    }
}
